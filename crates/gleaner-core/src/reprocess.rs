//! Reprocessing decision for source documents.

use crate::models::SourceDocument;

/// Whether a source document must be (re)processed this cycle.
///
/// Unprocessed documents always are. Processed ones are only picked up
/// again when edited strictly after the last completed pass; a processed
/// document without a pass timestamp is left alone.
pub fn should_process(doc: &SourceDocument) -> bool {
    if !doc.processed {
        return true;
    }
    match doc.last_processed_at {
        Some(processed_at) => doc.last_edited_at > processed_at,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn doc(processed: bool, processed_at: Option<i64>, edited_at: i64) -> SourceDocument {
        SourceDocument {
            id: "doc".to_string(),
            title: "Weekly".to_string(),
            processed,
            last_processed_at: processed_at.map(|s| Utc.timestamp_opt(s, 0).unwrap()),
            last_edited_at: Utc.timestamp_opt(edited_at, 0).unwrap(),
            project: None,
            needs_review: false,
        }
    }

    #[test]
    fn test_unprocessed_is_processed() {
        assert!(should_process(&doc(false, None, 100)));
        assert!(should_process(&doc(false, Some(500), 100)));
    }

    #[test]
    fn test_equal_timestamps_do_not_reprocess() {
        assert!(!should_process(&doc(true, Some(100), 100)));
    }

    #[test]
    fn test_later_edit_reprocesses() {
        let mut d = doc(true, Some(100), 100);
        d.last_edited_at = d.last_edited_at + Duration::milliseconds(1);
        assert!(should_process(&d));
    }

    #[test]
    fn test_earlier_edit_does_not_reprocess() {
        assert!(!should_process(&doc(true, Some(200), 100)));
    }

    #[test]
    fn test_processed_without_timestamp_is_skipped() {
        assert!(!should_process(&doc(true, None, 100)));
    }
}
