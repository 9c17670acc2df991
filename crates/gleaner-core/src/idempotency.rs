//! Idempotency fingerprints for harvested work items.
//!
//! Two items with the same parent document and the same text (ignoring
//! case and whitespace) share a key, so reprocessing a document after a
//! partial failure never creates the same task twice.

use sha2::{Digest, Sha256};

/// Separator between parent id and canonical text.
pub const KEY_SEPARATOR: &str = "::";

/// Length of a key in hex characters.
pub const KEY_LEN: usize = 64;

/// Canonical form of item text: trimmed, case-folded, inner whitespace
/// collapsed to single spaces.
pub fn canonical_text(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// SHA-256 hex digest of `parent_id` + separator + canonical text.
pub fn idempotency_key(parent_id: &str, text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(parent_id.trim().as_bytes());
    hasher.update(KEY_SEPARATOR.as_bytes());
    hasher.update(canonical_text(text).as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_deterministic() {
        assert_eq!(
            idempotency_key("doc-1", "Email Karen"),
            idempotency_key("doc-1", "Email Karen")
        );
    }

    #[test]
    fn test_key_ignores_case_and_whitespace() {
        let a = idempotency_key("doc-1", "Email Karen");
        assert_eq!(a, idempotency_key("doc-1", "  EMAIL   karen\t"));
        assert_eq!(a, idempotency_key("doc-1", "email karen"));
    }

    #[test]
    fn test_key_differs_by_parent() {
        assert_ne!(
            idempotency_key("doc-1", "Email Karen"),
            idempotency_key("doc-2", "Email Karen")
        );
    }

    #[test]
    fn test_key_differs_by_text() {
        assert_ne!(
            idempotency_key("doc-1", "Email Karen"),
            idempotency_key("doc-1", "Email Karin")
        );
    }

    #[test]
    fn test_key_has_fixed_length() {
        assert_eq!(idempotency_key("p", "").len(), KEY_LEN);
        assert_eq!(idempotency_key("p", &"x".repeat(10_000)).len(), KEY_LEN);
        assert!(idempotency_key("p", "t").chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_separator_prevents_boundary_collisions() {
        assert_ne!(idempotency_key("ab", "c"), idempotency_key("a", "bc"));
    }
}
