//! Structured logging field names for gleaner.
//!
//! Fields declared `Empty` on a span and filled in later through
//! [`tracing::Span::record`] are named here, so the declaring and the
//! recording sites agree.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | A document or record failed and was skipped for this cycle |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Lifecycle events, cycle and pass completions, records created |
//! | DEBUG | Decision points (reprocess gate, inference, routing targets) |
//! | TRACE | Per-node iteration during scans |

/// Project name resolved for a document or bundle.
pub const PROJECT: &str = "project";

/// Inference confidence score.
pub const CONFIDENCE: &str = "confidence";
