//! # gleaner-core
//!
//! Core types, traits, and extraction primitives for gleaner.
//!
//! This crate provides the data model shared by every other gleaner crate,
//! the boundary traits for the document store and the classification
//! service, and the pure building blocks of the extraction engine:
//!
//! - heading-bounded section scanning over a flat block sequence
//! - idempotency fingerprints for extracted work items
//! - the reprocessing decision for source documents
//! - project inference from override tags and title keywords
//! - the resilient call policy applied to every remote call

pub mod classify;
pub mod defaults;
pub mod error;
pub mod idempotency;
pub mod keywords;
pub mod logging;
pub mod models;
pub mod projects;
pub mod reprocess;
pub mod retry;
pub mod scanner;
pub mod schema;
pub mod traits;
pub mod tree;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use idempotency::idempotency_key;
pub use models::*;
pub use projects::{needs_review, ProjectCatalog, ProjectEntry};
pub use reprocess::should_process;
pub use retry::{ResilientCaller, RetryPolicy};
pub use scanner::{collect_work_items, extract_leaf_text, find_section, find_section_by};
pub use schema::PropertyNames;
pub use traits::*;
pub use tree::{on_inaccessible_child, ChildPolicy};
