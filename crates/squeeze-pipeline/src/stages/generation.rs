//! Content generation: turn the curated item into a Markdown draft plus
//! a one-line brief for the header image.

use async_trait::async_trait;

use squeeze_llm::{ChatRequest, DynProvider, Message};
use squeeze_types::{Category, Result, RunRecord, StageStatus, StageUpdate};

use crate::graph::Stage;
use crate::stage::PipelineStage;

const IMAGE_MARKER: &str = "[IMAGE_PROMPT]:";
const DEFAULT_IMAGE_BRIEF: &str =
    "Neutral editorial header, technology/innovation, minimal, wide 1792x1024";

const PROMPT: &str = "Write a blog post in clean Markdown for Trend Squeeze.
Constraints:
- Language: English (en)
- Audience: tech/AI/marketing-savvy readers
- Structure: H1 title, intro, 3-5 H2 sections, short paragraphs, bullets where useful, conclusion
- Tone: clear, practical, mildly energetic
- Include sources/links if useful (few, credible)
- Avoid clickbait; be specific
- End the output with exactly one line:
  [IMAGE_PROMPT]: <short description for a wide 1792x1024 header>

Category guidance: {guidance}

Context:
Category: {category}
Original Title: {title}
Summary/Notes: {summary}
Source URL: {url}
";

pub struct Writer {
    chat: DynProvider,
    model: String,
}

impl Writer {
    pub fn new(chat: DynProvider) -> Self {
        Self {
            chat,
            model: "gpt-4o-mini".to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

#[async_trait]
impl PipelineStage for Writer {
    fn stage(&self) -> Stage {
        Stage::Generation
    }

    async fn run(&self, record: &RunRecord) -> Result<StageUpdate> {
        let Some(item) = &record.item else {
            return Ok(StageUpdate::new(
                StageStatus::Skip,
                "No candidate item; skipping writer",
            ));
        };

        let category = record
            .category
            .or(item.category_hint)
            .unwrap_or(Category::Interesting);

        let prompt = PROMPT
            .replace("{guidance}", category.tone_guideline())
            .replace("{category}", category.label())
            .replace("{title}", &item.title)
            .replace("{summary}", &item.summary)
            .replace("{url}", &item.url);
        let request = ChatRequest::new(&self.model, vec![Message::user(prompt)])
            .with_temperature(0.5)
            .with_max_tokens(1200);

        let response = match self.chat.complete(&request).await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(error = %e, "Draft generation call failed");
                return Ok(StageUpdate::new(
                    StageStatus::Error,
                    format!("Writer failed: {e}"),
                ));
            }
        };

        let content = response.text.trim().to_string();
        let image_brief = extract_image_brief(&content);
        let note = format!("Draft ready ({} chars)", content.len());

        Ok(StageUpdate::new(StageStatus::DraftReady, note)
            .with_draft(content)
            .with_image_brief(image_brief))
    }
}

/// The brief is the text after the last-line marker; trailing brackets
/// and whitespace from sloppy model output are trimmed away.
fn extract_image_brief(content: &str) -> String {
    match content.split_once(IMAGE_MARKER) {
        Some((_, rest)) => {
            let brief = rest.trim().trim_matches(|c| c == '[' || c == ']').trim();
            if brief.is_empty() {
                DEFAULT_IMAGE_BRIEF.to_string()
            } else {
                brief.to_string()
            }
        }
        None => DEFAULT_IMAGE_BRIEF.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
