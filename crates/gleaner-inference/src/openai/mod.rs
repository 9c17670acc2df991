//! OpenAI-compatible generation backend.
//!
//! Works with any endpoint that speaks the chat completions API: the
//! OpenAI cloud API, Azure OpenAI, Ollama in compatibility mode, vLLM,
//! LocalAI or LM Studio.

mod backend;
mod error;
mod types;

pub use backend::{OpenAIBackend, OpenAIConfig};
pub use error::{to_gleaner_error, OpenAIErrorCode};
pub use types::*;
