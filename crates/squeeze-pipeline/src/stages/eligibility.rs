//! Eligibility: an LLM judges whether the candidate item is worth a full
//! post and assigns its final category.

use async_trait::async_trait;
use serde::Deserialize;

use squeeze_llm::{ChatRequest, DynProvider, Message};
use squeeze_types::{Category, Result, RunRecord, StageStatus, StageUpdate};

use crate::graph::Stage;
use crate::stage::PipelineStage;

const PROMPT: &str = "You are a senior content curator. Analyze this post:

Title: {title}
Summary: {summary}

Decide:
1. Final category: AI, Tech, Science, Futurology, Marketing, Interesting
2. Is it worth a full blog post? (Yes/No)
3. Brief reason

Respond in JSON:
{ \"category\": \"...\", \"worthy\": true/false, \"reason\": \"...\" }";

pub struct Curator {
    chat: DynProvider,
    model: String,
}

impl Curator {
    pub fn new(chat: DynProvider) -> Self {
        Self {
            chat,
            model: "gpt-4o".to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

#[async_trait]
impl PipelineStage for Curator {
    fn stage(&self) -> Stage {
        Stage::Eligibility
    }

    async fn run(&self, record: &RunRecord) -> Result<StageUpdate> {
        let Some(item) = &record.item else {
            return Ok(StageUpdate::new(
                StageStatus::Skip,
                "No candidate item; skipping curation",
            ));
        };

        let prompt = PROMPT
            .replace("{title}", &item.title)
            .replace("{summary}", &item.summary);
        let request =
            ChatRequest::new(&self.model, vec![Message::user(prompt)]).with_temperature(0.0);

        let response = match self.chat.complete(&request).await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(error = %e, "Curation call failed");
                return Ok(StageUpdate::new(
                    StageStatus::Error,
                    format!("Curation failed: {e}"),
                ));
            }
        };

        let verdict = parse_verdict(&response.text);
        if !verdict.worthy {
            return Ok(StageUpdate::new(
                StageStatus::Rejected,
                format!("Rejected: {}", verdict.reason),
            )
            .with_worthy(false));
        }

        let category: Category = verdict
            .category
            .parse()
            .unwrap_or(Category::Interesting);
        Ok(
            StageUpdate::new(StageStatus::Curated, format!("Curated as: {category}"))
                .with_worthy(true)
                .with_category(category),
        )
    }
}

// ---------------------------------------------------------------------------
// Verdict parsing
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, PartialEq)]
struct Verdict {
    category: String,
    worthy: bool,
    #[serde(default)]
    reason: String,
}

/// Pull the first JSON object out of the reply and deserialize it.
/// Models wrap JSON in prose or code fences often enough that a plain
/// `from_str` on the whole reply is not good enough.
fn parse_verdict(text: &str) -> Verdict {
    let fallback = Verdict {
        category: "Interesting".to_string(),
        worthy: true,
        reason: "Fallback".to_string(),
    };

    let re = regex::Regex::new(r"(?s)\{.*\}").expect("static pattern");
    let Some(m) = re.find(text) else {
        return fallback;
    };
    serde_json::from_str(m.as_str()).unwrap_or(fallback)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
