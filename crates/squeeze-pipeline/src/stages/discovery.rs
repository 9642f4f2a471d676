//! Source discovery: poll a fixed table of category feeds and select the
//! hottest candidate item.

use async_trait::async_trait;

use squeeze_types::{CandidateItem, Category, Result, RunRecord, StageStatus, StageUpdate};

use crate::graph::Stage;
use crate::stage::PipelineStage;

const SUMMARY_LIMIT: usize = 500;

/// Polls RSS/Atom feeds and picks the max-ups entry above a threshold.
///
/// Per-feed fetch or parse trouble is skipped, never surfaced: a cycle
/// with zero usable feeds simply reports `no_posts`.
pub struct FeedDiscovery {
    client: reqwest::Client,
    feeds: Vec<(Category, String)>,
    min_ups: u64,
    per_feed: usize,
}

impl FeedDiscovery {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            feeds: default_feeds(),
            min_ups: 1000,
            per_feed: 5,
        }
    }

    pub fn with_feeds(mut self, feeds: Vec<(Category, String)>) -> Self {
        self.feeds = feeds;
        self
    }

    pub fn with_min_ups(mut self, min_ups: u64) -> Self {
        self.min_ups = min_ups;
        self
    }

    async fn fetch_feed(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .header("User-Agent", "trend-squeeze-worker/0.3")
            .send()
            .await
            .map_err(|e| squeeze_types::SqueezeError::Other(format!("feed fetch error: {e}")))?;

        if !response.status().is_success() {
            return Err(squeeze_types::SqueezeError::Other(format!(
                "feed fetch returned status {}",
                response.status()
            )));
        }

        response
            .text()
            .await
            .map_err(|e| squeeze_types::SqueezeError::Other(format!("feed body read error: {e}")))
    }
}

impl Default for FeedDiscovery {
    fn default() -> Self {
        Self::new()
    }
}

fn default_feeds() -> Vec<(Category, String)> {
    [
        (Category::Ai, "https://www.reddit.com/r/artificial/.rss"),
        (Category::Tech, "https://www.reddit.com/r/technology/.rss"),
        (Category::Science, "https://www.reddit.com/r/science/.rss"),
        (Category::Futurology, "https://www.reddit.com/r/futurology/.rss"),
        (
            Category::Interesting,
            "https://www.reddit.com/r/interestingasfuck/.rss",
        ),
        (Category::Marketing, "https://www.reddit.com/r/marketing/.rss"),
    ]
    .into_iter()
    .map(|(c, u)| (c, u.to_string()))
    .collect()
}

#[async_trait]
impl PipelineStage for FeedDiscovery {
    fn stage(&self) -> Stage {
        Stage::Discovery
    }

    async fn run(&self, _record: &RunRecord) -> Result<StageUpdate> {
        let mut hot_posts: Vec<CandidateItem> = Vec::new();

        for (category, url) in &self.feeds {
            let xml = match self.fetch_feed(url).await {
                Ok(xml) => xml,
                Err(e) => {
                    tracing::debug!(feed = %url, error = %e, "Skipping feed");
                    continue;
                }
            };

            for entry in parse_entries(&xml, self.per_feed) {
                if entry.ups > self.min_ups {
                    hot_posts.push(entry_to_item(entry, *category));
                }
            }
        }

        match hot_posts.into_iter().max_by_key(|item| item.ups) {
            Some(best) => {
                let note = format!("Found post: {}", best.title);
                Ok(StageUpdate::new(StageStatus::ResearchDone, note).with_item(best))
            }
            None => Ok(StageUpdate::new(
                StageStatus::NoPosts,
                "No trending posts found",
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Feed parsing — string scanning over RSS 2.0 <item> / Atom <entry>
// ---------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq)]
struct FeedEntry {
    title: String,
    summary: String,
    link: String,
    ups: u64,
}

fn entry_to_item(entry: FeedEntry, category: Category) -> CandidateItem {
    CandidateItem {
        title: entry.title,
        summary: truncate_chars(&entry.summary, SUMMARY_LIMIT),
        url: entry.link,
        ups: entry.ups,
        category_hint: Some(category),
    }
}

fn truncate_chars(s: &str, limit: usize) -> String {
    s.chars().take(limit).collect()
}

fn parse_entries(xml: &str, max_items: usize) -> Vec<FeedEntry> {
    let mut entries = Vec::new();

    // Try RSS 2.0 <item> tags first, then Atom <entry> tags.
    for tag in ["item", "entry"] {
        let open = format!("<{tag}");
        let close = format!("</{tag}>");
        let mut search_from = 0;

        while entries.len() < max_items {
            let start = match xml[search_from..].find(&open) {
                Some(pos) => search_from + pos,
                None => break,
            };
            let end = match xml[start..].find(&close) {
                Some(pos) => start + pos + close.len(),
                None => break,
            };
            let entry_xml = &xml[start..end];

            let title = extract_tag(entry_xml, "title").unwrap_or_default();
            let link = extract_tag(entry_xml, "link")
                .or_else(|| extract_attr(entry_xml, "link", "href"))
                .unwrap_or_default();
            let summary = extract_tag(entry_xml, "description")
                .or_else(|| extract_tag(entry_xml, "summary"))
                .or_else(|| extract_tag(entry_xml, "content"))
                .map(|s| strip_html_tags(&s))
                .unwrap_or_default();
            let ups = extract_tag(entry_xml, "ups")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(0);

            entries.push(FeedEntry {
                title,
                summary,
                link,
                ups,
            });
            search_from = end;
        }

        if !entries.is_empty() {
            break;
        }
    }

    entries
}

fn extract_tag(xml: &str, tag: &str) -> Option<String> {
    let open = format!("<{tag}");
    let close = format!("</{tag}>");

    let start_pos = xml.find(&open)?;
    let after_open = &xml[start_pos + open.len()..];
    // Skip past the > of the opening tag (handles attributes)
    let content_start = after_open.find('>')? + 1;
    let content = &after_open[content_start..];
    let end_pos = content.find(&close)?;

    let text = &content[..end_pos];
    let text = text
        .trim()
        .strip_prefix("<![CDATA[")
        .and_then(|s| s.strip_suffix("]]>"))
        .unwrap_or(text.trim());

    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

fn extract_attr(xml: &str, tag: &str, attr: &str) -> Option<String> {
    let open = format!("<{tag}");
    let start_pos = xml.find(&open)?;
    let after_open = &xml[start_pos + open.len()..];
    let tag_end = after_open.find('>')?;
    let tag_content = &after_open[..tag_end];

    let attr_prefix = format!("{attr}=\"");
    let attr_start = tag_content.find(&attr_prefix)?;
    let value_start = attr_start + attr_prefix.len();
    let value_end = tag_content[value_start..].find('"')?;
    Some(tag_content[value_start..value_start + value_end].to_string())
}

fn strip_html_tags(html: &str) -> String {
    let mut result = String::with_capacity(html.len());
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => result.push(ch),
            _ => {}
        }
    }
    result
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const RSS_SAMPLE: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
  <item>
    <title>First post</title>
    <link>https://example.com/1</link>
    <description><![CDATA[<p>Body of the &amp; first post</p>]]></description>
    <ups>2400</ups>
  </item>
  <item>
    <title>Second post</title>
    <link>https://example.com/2</link>
    <description>Plain body</description>
    <ups>500</ups>
  </item>
</channel></rss>"#;

    const ATOM_SAMPLE: &str = r#"<?xml version="1.0"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <entry>
    <title>Atom post</title>
    <link href="https://example.com/atom/1"/>
    <summary>Atom body</summary>
  </entry>
</feed>"#;

    #[test]
    fn parses_rss_items() {
        let entries = parse_entries(RSS_SAMPLE, 5);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].title, "First post");
        assert_eq!(entries[0].link, "https://example.com/1");
        assert_eq!(entries[0].summary, "Body of the & first post");
        assert_eq!(entries[0].ups, 2400);
        assert_eq!(entries[1].ups, 500);
    }

    #[test]
    fn parses_atom_entries_with_href_links() {
        let entries = parse_entries(ATOM_SAMPLE, 5);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title, "Atom post");
        assert_eq!(entries[0].link, "https://example.com/atom/1");
        assert_eq!(entries[0].summary, "Atom body");
        assert_eq!(entries[0].ups, 0);
    }

    #[test]
    fn respects_per_feed_limit() {
        let entries = parse_entries(RSS_SAMPLE, 1);
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn garbage_input_yields_no_entries() {
        assert!(parse_entries("not xml at all", 5).is_empty());
        assert!(parse_entries("<rss><item><title>unclosed", 5).is_empty());
    }

    #[test]
    fn summary_is_truncated_to_the_limit() {
        let long = "x".repeat(SUMMARY_LIMIT * 2);
        let entry = FeedEntry {
            title: "t".into(),
            summary: long,
            link: "l".into(),
            ups: 1,
        };
        let item = entry_to_item(entry, Category::Tech);
        assert_eq!(item.summary.chars().count(), SUMMARY_LIMIT);
        assert_eq!(item.category_hint, Some(Category::Tech));
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let s = "éèê".repeat(300);
        let out = truncate_chars(&s, SUMMARY_LIMIT);
        assert_eq!(out.chars().count(), SUMMARY_LIMIT);
    }

    #[test]
    fn strip_html_removes_tags_and_decodes_entities() {
        assert_eq!(
            strip_html_tags("<p>a &lt;b&gt; &quot;c&quot;</p>"),
            "a <b> \"c\""
        );
    }
}
