//! Shared types for the Trend Squeeze content worker.
//!
//! This crate provides the foundational types used across the other crates:
//! - `SqueezeError` — unified error taxonomy
//! - `StageStatus` / `Category` — the token vocabulary stages speak
//! - `RunRecord` / `StageUpdate` — the record threaded through one run

mod record;

pub use record::{CandidateItem, Category, RunRecord, StageStatus, StageUpdate};

/// Unified error type for all worker subsystems.
#[derive(Debug, thiserror::Error)]
pub enum SqueezeError {
    // === Provider Errors ===
    #[error("Provider {provider} returned HTTP {status}: {message}")]
    Provider {
        provider: String,
        status: u16,
        message: String,
        retryable: bool,
    },

    #[error("Rate limited by {provider}, retry after {retry_after_ms}ms")]
    RateLimited {
        provider: String,
        retry_after_ms: u64,
    },

    #[error("Authentication failed for provider {provider}")]
    AuthError { provider: String },

    // === Pipeline Errors ===
    #[error("Stage '{stage}' violated its contract: {message}")]
    StageContract { stage: String, message: String },

    #[error("No implementation registered for stage '{0}'")]
    MissingStage(String),

    // === Generic ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl SqueezeError {
    /// Returns `true` if the error is transient and the operation may succeed on retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SqueezeError::RateLimited { .. } | SqueezeError::Provider { retryable: true, .. }
        )
    }

    /// Returns `true` if the error is permanent and retrying will not help.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SqueezeError::AuthError { .. } | SqueezeError::Config(_)
        )
    }
}

/// A convenience alias for `Result<T, SqueezeError>`.
pub type Result<T> = std::result::Result<T, SqueezeError>;
