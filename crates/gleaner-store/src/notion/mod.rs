//! Notion-backed document store.
//!
//! Databases are collections, pages are records and blocks are content
//! nodes. Every payload is decoded at this boundary; the rest of gleaner
//! only sees the model types from `gleaner-core`.
//!
//! # Example
//!
//! ```rust,no_run
//! use gleaner_core::{DocumentStore, FetchDepth};
//! use gleaner_store::notion::NotionStore;
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = NotionStore::from_env().unwrap();
//!     let nodes = store
//!         .get_children("page-id", FetchDepth::Recursive)
//!         .await
//!         .unwrap();
//!     println!("{} blocks", nodes.len());
//! }
//! ```

mod client;
mod error;
mod types;

pub use client::{NotionConfig, NotionStore};
pub use error::{to_gleaner_error, NotionErrorCode};
pub use types::{block_to_node, filter_json, parse_date, property_json, RICH_TEXT_LIMIT};
