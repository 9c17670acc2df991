//! # gleaner-store
//!
//! Document store adapters for gleaner.
//!
//! - [`notion`]: REST client for the Notion API, paced and retried per
//!   request
//! - [`memory`]: in-memory store with fault injection, for tests and dry runs

pub mod memory;
pub mod notion;

pub use memory::{AppendCall, FaultKind, InMemoryStore, StoreOp};
pub use notion::{NotionConfig, NotionStore};
