//! The run record and the partial updates stages merge into it.
//!
//! The record has one field per piece of state a stage can hand to its
//! successors, all optional, so "not produced yet" is visible in the type
//! instead of being a missing map key. A stage never mutates the record it
//! reads; it returns a [`StageUpdate`] and the executor applies it.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// StageStatus
// ---------------------------------------------------------------------------

/// The token a stage sets to signal its own outcome.
///
/// Routing reads exactly one of these per edge; everything else in the
/// record is payload for later stages or for the logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    /// Fresh record, no stage has run yet.
    Idle,
    /// Discovery found a candidate item.
    ResearchDone,
    /// Discovery came up empty.
    NoPosts,
    /// Eligibility judged the item worth a post.
    Curated,
    /// Eligibility turned the item down.
    Rejected,
    /// A stage had nothing to work with and stepped aside.
    Skip,
    /// Generation produced a draft.
    DraftReady,
    /// Refinement produced the final text.
    FinalReady,
    /// Publication went through.
    Published,
    /// WordPress refused or was unreachable.
    WpError,
    /// A stage recovered from an internal fault.
    Error,
}

impl StageStatus {
    /// The snake_case token used in logs and edge decisions.
    pub fn as_str(&self) -> &'static str {
        match self {
            StageStatus::Idle => "idle",
            StageStatus::ResearchDone => "research_done",
            StageStatus::NoPosts => "no_posts",
            StageStatus::Curated => "curated",
            StageStatus::Rejected => "rejected",
            StageStatus::Skip => "skip",
            StageStatus::DraftReady => "draft_ready",
            StageStatus::FinalReady => "final_ready",
            StageStatus::Published => "published",
            StageStatus::WpError => "wp_error",
            StageStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for StageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

/// The fixed set of content categories the curator may assign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "AI")]
    Ai,
    Tech,
    Science,
    Futurology,
    Marketing,
    Interesting,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Ai,
        Category::Tech,
        Category::Science,
        Category::Futurology,
        Category::Marketing,
        Category::Interesting,
    ];

    /// Display label, matching what the curator is asked to reply with.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Ai => "AI",
            Category::Tech => "Tech",
            Category::Science => "Science",
            Category::Futurology => "Futurology",
            Category::Marketing => "Marketing",
            Category::Interesting => "Interesting",
        }
    }

    /// Tone guideline the writer appends to its prompt for this category.
    pub fn tone_guideline(&self) -> &'static str {
        match self {
            Category::Ai => {
                "Write as an AI engineer. Focus on how it works, not just what it does. Add technical depth."
            }
            Category::Tech => {
                "Friendly, clear, explain for non-experts. Focus on real-world impact."
            }
            Category::Science => {
                "Be precise. Mention the study, methodology, and limitations. Avoid hype."
            }
            Category::Futurology => {
                "Explore societal implications. Add a 'What if?' scenario. Consider risks and ethics."
            }
            Category::Marketing => {
                "Give actionable tips. Use real examples. Be practical and results-oriented."
            }
            Category::Interesting => {
                "Tell a story. Focus on wonder, surprise, and human emotion. Be engaging."
            }
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for Category {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.label().eq_ignore_ascii_case(s.trim()))
            .ok_or(())
    }
}

// ---------------------------------------------------------------------------
// CandidateItem
// ---------------------------------------------------------------------------

/// A source item discovery selected for the rest of the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateItem {
    pub title: String,
    pub summary: String,
    pub url: String,
    pub ups: u64,
    pub category_hint: Option<Category>,
}

// ---------------------------------------------------------------------------
// RunRecord
// ---------------------------------------------------------------------------

/// Mutable state of one pipeline run.
///
/// Created empty at run start, discarded at run end. Stages only add or
/// overwrite fields via [`RunRecord::apply`]; nothing is ever removed and
/// `trace` is append-only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunRecord {
    pub status: StageStatus,
    pub item: Option<CandidateItem>,
    pub worthy: Option<bool>,
    pub category: Option<Category>,
    pub draft: Option<String>,
    pub image_brief: Option<String>,
    pub final_text: Option<String>,
    pub image_url: Option<String>,
    pub publication_id: Option<u64>,
    pub publication_link: Option<String>,
    /// Human-readable notes, one per stage invocation. Never read by routing.
    pub trace: Vec<String>,
}

impl Default for StageStatus {
    fn default() -> Self {
        StageStatus::Idle
    }
}

impl RunRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a stage's partial update. `Some` fields overwrite, `None`
    /// fields leave whatever a previous stage wrote in place.
    pub fn apply(&mut self, update: StageUpdate) {
        self.status = update.status;
        if let Some(item) = update.item {
            self.item = Some(item);
        }
        if let Some(worthy) = update.worthy {
            self.worthy = Some(worthy);
        }
        if let Some(category) = update.category {
            self.category = Some(category);
        }
        if let Some(draft) = update.draft {
            self.draft = Some(draft);
        }
        if let Some(brief) = update.image_brief {
            self.image_brief = Some(brief);
        }
        if let Some(text) = update.final_text {
            self.final_text = Some(text);
        }
        if let Some(url) = update.image_url {
            self.image_url = Some(url);
        }
        if let Some(id) = update.publication_id {
            self.publication_id = Some(id);
        }
        if let Some(link) = update.publication_link {
            self.publication_link = Some(link);
        }
        if !update.note.is_empty() {
            self.trace.push(update.note);
        }
    }
}

// ---------------------------------------------------------------------------
// StageUpdate
// ---------------------------------------------------------------------------

/// The partial record a stage hands back: a mandatory status, a trace note,
/// and whichever payload fields the stage produced.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StageUpdate {
    pub status: StageStatus,
    pub note: String,
    pub item: Option<CandidateItem>,
    pub worthy: Option<bool>,
    pub category: Option<Category>,
    pub draft: Option<String>,
    pub image_brief: Option<String>,
    pub final_text: Option<String>,
    pub image_url: Option<String>,
    pub publication_id: Option<u64>,
    pub publication_link: Option<String>,
}

impl StageUpdate {
    pub fn new(status: StageStatus, note: impl Into<String>) -> Self {
        Self {
            status,
            note: note.into(),
            ..Self::default()
        }
    }

    pub fn with_item(mut self, item: CandidateItem) -> Self {
        self.item = Some(item);
        self
    }

    pub fn with_worthy(mut self, worthy: bool) -> Self {
        self.worthy = Some(worthy);
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_draft(mut self, draft: impl Into<String>) -> Self {
        self.draft = Some(draft.into());
        self
    }

    pub fn with_image_brief(mut self, brief: impl Into<String>) -> Self {
        self.image_brief = Some(brief.into());
        self
    }

    pub fn with_final_text(mut self, text: impl Into<String>) -> Self {
        self.final_text = Some(text.into());
        self
    }

    pub fn with_image_url(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }

    pub fn with_publication(mut self, id: u64, link: impl Into<String>) -> Self {
        self.publication_id = Some(id);
        self.publication_link = Some(link.into());
        self
    }
}
