//! Centralized default constants for gleaner.
//!
//! **This module is the single source of truth** for shared default values.
//! Config structs in every crate take their `Default` from here.

use std::time::Duration;

// =============================================================================
// REMOTE CALLS
// =============================================================================

/// Maximum attempts for a rate-limited remote call (first try included).
pub const REMOTE_MAX_ATTEMPTS: u32 = 5;

/// Base delay for exponential backoff on rate limiting.
pub const REMOTE_BACKOFF_BASE: Duration = Duration::from_secs(1);

/// Upper bound for a single backoff delay (before jitter).
pub const REMOTE_BACKOFF_CAP: Duration = Duration::from_secs(10);

/// Maximum random jitter added to or subtracted from a backoff delay.
pub const REMOTE_BACKOFF_JITTER: Duration = Duration::from_secs(1);

/// Minimum delay before every remote call, keeps us under the store's
/// steady-state limit of roughly three requests per second.
pub const REMOTE_PACING: Duration = Duration::from_millis(350);

// =============================================================================
// DOCUMENT STORE
// =============================================================================

/// Default document store API base URL.
pub const STORE_URL: &str = "https://api.notion.com/v1";

/// API version header sent with every store request.
pub const STORE_API_VERSION: &str = "2022-06-28";

/// Per-request timeout for store calls in seconds.
pub const STORE_TIMEOUT_SECS: u64 = 30;

/// Page size for paginated list endpoints (store maximum).
pub const STORE_PAGE_SIZE: u32 = 100;

/// Maximum children per append request accepted by the store.
pub const STORE_MAX_APPEND: usize = 100;

// =============================================================================
// CLASSIFICATION
// =============================================================================

/// Default OpenAI-compatible endpoint for the classification model.
pub const CHAT_URL: &str = "https://api.openai.com/v1";

/// Default classification model.
pub const CHAT_MODEL: &str = "gpt-4o-mini";

/// Timeout for classification requests in seconds.
pub const CHAT_TIMEOUT_SECS: u64 = 60;

// =============================================================================
// EXTRACTION
// =============================================================================

/// Heading phrase of the action-items section in source documents.
pub const ACTION_ITEMS_HEADING: &str = "action items";

/// Heading phrase of the project-info section (documents and quick entries).
pub const PROJECT_INFO_HEADING: &str = "project info";

/// Paragraphs longer than this (in characters) count as section content.
pub const MIN_PARAGRAPH_CHARS: usize = 10;

/// Confidence below which an inferred project is flagged for review.
pub const REVIEW_THRESHOLD: f32 = 0.6;

/// Confidence of an explicit `#proj:` override.
pub const OVERRIDE_CONFIDENCE: f32 = 1.0;

/// Confidence of a title keyword match.
pub const KEYWORD_CONFIDENCE: f32 = 0.8;

/// Confidence of the fallback project.
pub const FALLBACK_CONFIDENCE: f32 = 0.0;

// =============================================================================
// ROUTING
// =============================================================================

/// Retries for a failed append before the category counts as failed.
pub const APPEND_RETRIES: u32 = 2;

/// Linear backoff step between append retries (3s, then 6s).
pub const APPEND_BACKOFF_STEP: Duration = Duration::from_secs(3);

// =============================================================================
// QUICK ENTRY
// =============================================================================

/// Titles shorter than this (in characters) count as unset.
pub const QUICK_ENTRY_MIN_TITLE_CHARS: usize = 5;

/// Placeholder title fragment the store uses for new records.
pub const QUICK_ENTRY_PLACEHOLDER: &str = "untitled";

/// Consecutive failures before a quick entry is put on cooldown.
pub const QUICK_ENTRY_MAX_ATTEMPTS: u32 = 3;

/// How long a repeatedly failing quick entry is skipped.
pub const QUICK_ENTRY_COOLDOWN: Duration = Duration::from_secs(30 * 60);

// =============================================================================
// WORKER
// =============================================================================

/// Default interval between poll cycles in seconds.
pub const POLL_INTERVAL_SECS: u64 = 300;

/// Worker event broadcast channel capacity.
pub const EVENT_BUS_CAPACITY: usize = 64;
