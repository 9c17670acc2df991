//! Core traits for gleaner's external collaborators.
//!
//! The engine talks to two remote services, a hierarchical document store
//! and a classification capability. Both are reached only through these
//! traits so concrete clients can be swapped for in-memory fakes in tests.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// DOCUMENT STORE
// =============================================================================

/// Adapter over the hierarchical document store.
///
/// Implementations convert the store's wire payloads into the strict model
/// types before returning; no raw payload escapes the adapter.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// List records of a collection matching `query`.
    async fn list_due(&self, collection_id: &str, query: &RecordQuery) -> Result<Vec<StoreRecord>>;

    /// Direct children of a node, in order.
    async fn list_children(&self, node_id: &str) -> Result<Vec<ContentNode>>;

    /// Children of a node, either top-level only or as a depth-first
    /// flattened sequence that never enters embedded pages or databases.
    async fn get_children(&self, node_id: &str, depth: FetchDepth) -> Result<Vec<ContentNode>> {
        match depth {
            FetchDepth::TopLevel => self.list_children(node_id).await,
            FetchDepth::Recursive => crate::tree::walk(self, node_id).await,
        }
    }

    /// Create a record in a collection, returning its id.
    async fn create(&self, collection_id: &str, properties: PropertyMap) -> Result<String>;

    /// Update the given properties of a record. Unlisted properties are kept.
    async fn update(&self, id: &str, properties: PropertyMap) -> Result<()>;

    /// Insert one bulleted list item per line directly after `after_id`
    /// under `parent_id`, preserving line order.
    async fn append_after(&self, parent_id: &str, after_id: &str, lines: &[String]) -> Result<()>;

    /// Delete a single content node.
    async fn delete_node(&self, id: &str) -> Result<()>;

    /// Soft-delete a record.
    async fn archive(&self, id: &str) -> Result<()>;
}

// =============================================================================
// CLASSIFICATION
// =============================================================================

/// The external classification capability.
///
/// Both operations return fully populated values; missing fields are
/// defaulted rather than absent.
#[async_trait]
pub trait ClassificationBackend: Send + Sync {
    /// Sort raw bullets into the five knowledge categories.
    async fn categorize(&self, bullets: &[String]) -> Result<CategorizedBundle>;

    /// Split free text into tasks. Returns at least one task for
    /// non-empty input.
    async fn parse_tasks(&self, text: &str) -> Result<Vec<ParsedTask>>;

    /// Short backend name for logs.
    fn name(&self) -> &str;
}

/// Backend for text generation (LLM).
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Generate text given a prompt.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Generate text with system context.
    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String>;

    /// Get the model name being used.
    fn model_name(&self) -> &str;
}
