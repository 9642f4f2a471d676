//! Publication: push the finished post to WordPress via its REST API,
//! with an optional generated header image.

use async_trait::async_trait;
use serde::Deserialize;

use squeeze_llm::OpenAiChat;
use squeeze_types::{Result, RunRecord, StageStatus, StageUpdate};

use crate::graph::Stage;
use crate::stage::PipelineStage;

const TITLE_LIMIT: usize = 200;

pub struct WordPressPublisher {
    client: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
    image_client: Option<OpenAiChat>,
    category_ids: Vec<u64>,
    tag_ids: Vec<u64>,
}

impl WordPressPublisher {
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: reqwest::Client::new(),
            base_url,
            username: username.into(),
            password: password.into(),
            image_client: None,
            category_ids: vec![1],
            tag_ids: vec![10],
        }
    }

    /// Enable header image generation for published posts.
    pub fn with_image_client(mut self, client: OpenAiChat) -> Self {
        self.image_client = Some(client);
        self
    }

    pub fn with_terms(mut self, category_ids: Vec<u64>, tag_ids: Vec<u64>) -> Self {
        self.category_ids = category_ids;
        self.tag_ids = tag_ids;
        self
    }

    /// The image is decoration; any failure here downgrades to a log line.
    async fn generate_header_image(&self, record: &RunRecord) -> Option<String> {
        let image_client = self.image_client.as_ref()?;
        let brief = record.image_brief.as_deref()?;
        match image_client.generate_image(brief, "1792x1024").await {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::warn!(error = %e, "Header image generation failed");
                None
            }
        }
    }
}

#[async_trait]
impl PipelineStage for WordPressPublisher {
    fn stage(&self) -> Stage {
        Stage::Publication
    }

    async fn run(&self, record: &RunRecord) -> Result<StageUpdate> {
        let Some(final_text) = &record.final_text else {
            return Ok(StageUpdate::new(
                StageStatus::Skip,
                "No final copy; skipping publish",
            ));
        };

        let image_url = self.generate_header_image(record).await;

        let mut content = final_text.clone();
        if let Some(url) = &image_url {
            content = format!("![header]({url})\n\n{content}");
        }

        let body = serde_json::json!({
            "title": derive_title(final_text),
            "content": content,
            "status": "publish",
            "categories": self.category_ids,
            "tags": self.tag_ids,
        });

        let url = format!("{}/wp-json/wp/v2/posts", self.base_url);
        let response = match self
            .client
            .post(&url)
            .basic_auth(&self.username, Some(&self.password))
            .json(&body)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(error = %e, "WordPress request failed");
                return Ok(StageUpdate::new(
                    StageStatus::WpError,
                    format!("Failed to connect to WordPress: {e}"),
                ));
            }
        };

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        if status.as_u16() != 201 {
            tracing::warn!(status = status.as_u16(), "WordPress rejected the post");
            return Ok(StageUpdate::new(
                StageStatus::WpError,
                format!("WordPress error {status}: {}", snippet(&text)),
            ));
        }

        match parse_publish_response(&text) {
            Some((id, link)) => {
                tracing::info!(post_id = id, link = %link, "Published to WordPress");
                let mut update = StageUpdate::new(StageStatus::Published, "Published to WordPress")
                    .with_publication(id, link);
                if let Some(url) = image_url {
                    update = update.with_image_url(url);
                }
                Ok(update)
            }
            None => Ok(StageUpdate::new(
                StageStatus::WpError,
                "WordPress returned an unreadable response",
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Response and title helpers
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct PublishedPost {
    id: u64,
    link: String,
}

fn parse_publish_response(body: &str) -> Option<(u64, String)> {
    let post: PublishedPost = serde_json::from_str(body).ok()?;
    Some((post.id, post.link))
}

/// Title is the first non-empty line of the post, heading markers stripped,
/// clamped to 200 characters.
fn derive_title(text: &str) -> String {
    let line = text
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("Trend Squeeze");
    let line = line.trim_start_matches('#').trim();
    let title = if line.is_empty() { "Trend Squeeze" } else { line };
    title.chars().take(TITLE_LIMIT).collect()
}

fn snippet(body: &str) -> &str {
    let end = body
        .char_indices()
        .nth(200)
        .map(|(i, _)| i)
        .unwrap_or(body.len());
    &body[..end]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_comes_from_first_heading() {
        let text = "# The Big Shift\n\nBody text here.";
        assert_eq!(derive_title(text), "The Big Shift");
    }

    #[test]
    fn title_skips_blank_lines_and_falls_back() {
        assert_eq!(derive_title("\n\nPlain opener\nmore"), "Plain opener");
        assert_eq!(derive_title("   \n  "), "Trend Squeeze");
        assert_eq!(derive_title("###   "), "Trend Squeeze");
    }

    #[test]
    fn title_is_clamped_to_two_hundred_chars() {
        let long = "x".repeat(500);
        assert_eq!(derive_title(&long).chars().count(), 200);
    }

    #[test]
    fn publish_response_yields_id_and_link() {
        let body = r#"{"id": 321, "link": "https://blog.example/post-321", "status": "publish"}"#;
        assert_eq!(
            parse_publish_response(body),
            Some((321, "https://blog.example/post-321".to_string()))
        );
    }

    #[test]
    fn unreadable_publish_response_is_none() {
        assert_eq!(parse_publish_response("<html>error</html>"), None);
        assert_eq!(parse_publish_response(r#"{"link": "x"}"#), None);
    }

    #[test]
    fn snippet_respects_char_boundaries() {
        let body = "é".repeat(300);
        assert_eq!(snippet(&body).chars().count(), 200);
    }

    #[tokio::test]
    async fn missing_final_text_skips() {
        let stage = WordPressPublisher::new("https://blog.example", "bot", "pw");
        let update = stage.run(&RunRecord::new()).await.unwrap();
        assert_eq!(update.status, StageStatus::Skip);
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let stage = WordPressPublisher::new("https://blog.example/", "bot", "pw");
        assert_eq!(stage.base_url, "https://blog.example");
    }
}
