//! Minimal LLM client for the Trend Squeeze worker.
//!
//! One provider trait, one boxed wrapper for dynamic dispatch, and an
//! OpenAI-compatible adapter covering chat completions and image
//! generation. No streaming, no tool calls — the pipeline stages only
//! need single request/response exchanges.

mod openai;
mod provider;
mod types;

pub use openai::OpenAiChat;
pub use provider::{ChatProvider, DynProvider};
pub use types::{ChatRequest, ChatResponse, Message, Role};
