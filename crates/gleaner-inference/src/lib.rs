//! # gleaner-inference
//!
//! Classification backends for gleaner.
//!
//! - [`LlmClassifier`]: categorization and task parsing through any
//!   [`GenerationBackend`](gleaner_core::GenerationBackend), with lenient
//!   decoding of model output into schema-valid values
//! - [`openai`]: OpenAI-compatible chat completions backend
//! - [`HeuristicClassifier`]: keyword rules, no network
//! - [`ResilientClassifier`]: pacing and rate-limit retry around any classifier

pub mod heuristic;
pub mod json;
pub mod llm;
pub mod openai;
pub mod prompts;
mod resilient;

pub use heuristic::HeuristicClassifier;
pub use llm::LlmClassifier;
pub use openai::{OpenAIBackend, OpenAIConfig};
pub use resilient::ResilientClassifier;
