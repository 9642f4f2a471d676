//! Refinement: a second model pass that tightens the draft before it is
//! published.

use async_trait::async_trait;

use squeeze_llm::{ChatRequest, DynProvider, Message};
use squeeze_types::{Result, RunRecord, StageStatus, StageUpdate};

use crate::graph::Stage;
use crate::stage::PipelineStage;

const PROMPT: &str = "You are a strict copy editor for the Trend Squeeze blog.
Improve the following Markdown post:
- Fix grammar, spelling and awkward phrasing
- Keep the structure (H1, H2 sections) and the author's voice
- Tighten wordy paragraphs; do not add new sections or claims
- Keep all links intact
- Remove any [IMAGE_PROMPT] line if one slipped through
Return ONLY the edited Markdown, nothing else.

Post:
{draft}
";

pub struct Editor {
    chat: DynProvider,
    model: String,
}

impl Editor {
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
impl PipelineStage for Editor {
    fn stage(&self) -> Stage {
        Stage::Refinement
    }

    async fn run(&self, record: &RunRecord) -> Result<StageUpdate> {
        let Some(draft) = &record.draft else {
            return Ok(StageUpdate::new(
                StageStatus::Skip,
                "No draft; skipping editor",
            ));
        };

        let prompt = PROMPT.replace("{draft}", draft);
        let request = ChatRequest::new(&self.model, vec![Message::user(prompt)])
            .with_temperature(0.2)
            .with_max_tokens(1200);

        match self.chat.complete(&request).await {
            Ok(response) => {
                let final_text = response.text.trim().to_string();
                let note = format!("Final copy ready ({} chars)", final_text.len());
                Ok(StageUpdate::new(StageStatus::FinalReady, note).with_final_text(final_text))
            }
            Err(e) => {
                tracing::warn!(error = %e, "Editing call failed");
                Ok(StageUpdate::new(
                    StageStatus::Error,
                    format!("Editing failed: {e}"),
                ))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use squeeze_llm::{ChatProvider, ChatResponse};
    use squeeze_types::SqueezeError;

    struct ScriptedChat {
        reply: std::result::Result<String, ()>,
    }

    #[async_trait]
    impl ChatProvider for ScriptedChat {
        async fn complete(&self, _request: &ChatRequest) -> Result<ChatResponse> {
            match &self.reply {
                Ok(text) => Ok(ChatResponse {
                    text: text.clone(),
                    model: "scripted".into(),
                }),
                Err(()) => Err(SqueezeError::Provider {
                    provider: "scripted".into(),
                    status: 500,
                    message: "boom".into(),
                    retryable: true,
                }),
            }
        }

        fn name(&self) -> &str {
            "scripted"
        }

        fn default_model(&self) -> &str {
            "scripted"
        }
    }

    fn record_with_draft() -> RunRecord {
        let mut record = RunRecord::new();
        record.status = StageStatus::DraftReady;
        record.draft = Some("# Rough\n\nsome text".into());
        record
    }

    #[tokio::test]
    async fn polished_text_lands_in_final_text() {
        let stage = Editor::new(DynProvider::new(ScriptedChat {
            reply: Ok("  # Polished\n\nBetter text.  ".into()),
        }));
        let update = stage.run(&record_with_draft()).await.unwrap();
        assert_eq!(update.status, StageStatus::FinalReady);
        assert_eq!(update.final_text.as_deref(), Some("# Polished\n\nBetter text."));
        assert!(update.note.starts_with("Final copy ready ("));
    }

    #[tokio::test]
    async fn missing_draft_skips() {
        let stage = Editor::new(DynProvider::new(ScriptedChat {
            reply: Ok("unused".into()),
        }));
        let update = stage.run(&RunRecord::new()).await.unwrap();
        assert_eq!(update.status, StageStatus::Skip);
        assert!(update.final_text.is_none());
    }

    #[tokio::test]
    async fn transport_failure_is_tagged_not_raised() {
        let stage = Editor::new(DynProvider::new(ScriptedChat { reply: Err(()) }));
        let update = stage.run(&record_with_draft()).await.unwrap();
        assert_eq!(update.status, StageStatus::Error);
        assert!(update.note.starts_with("Editing failed:"));
    }
}
