//! Property names of the store collections and conversions between
//! [`StoreRecord`] property maps and the model types.

use chrono::{DateTime, Utc};

use crate::models::{
    DateValue, PropertyMap, PropertyValue, QuickEntryRecord, RecordFilter, SourceDocument,
    StoreRecord, TaskRecord,
};

/// Column names used in the notes, tasks and knowledge collections.
///
/// Every name can be overridden with a `GLEANER_PROP_*` environment
/// variable, e.g. `GLEANER_PROP_NEEDS_REVIEW="Review?"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyNames {
    pub title: String,
    pub processed: String,
    pub last_processed_at: String,
    pub project: String,
    pub needs_review: String,
    pub status: String,
    pub priority: String,
    pub due: String,
    pub source_document: String,
    pub idempotency_key: String,
    pub quick_add: String,
    pub info_pending: String,
}

impl Default for PropertyNames {
    fn default() -> Self {
        Self {
            title: "Name".to_string(),
            processed: "Processed".to_string(),
            last_processed_at: "Last Processed".to_string(),
            project: "Project".to_string(),
            needs_review: "Needs Review".to_string(),
            status: "Status".to_string(),
            priority: "Priority".to_string(),
            due: "Due".to_string(),
            source_document: "Source Document".to_string(),
            idempotency_key: "Idempotency Key".to_string(),
            quick_add: "Quick Add".to_string(),
            info_pending: "Info Pending".to_string(),
        }
    }
}

impl PropertyNames {
    pub fn from_env() -> Self {
        let mut names = Self::default();
        let fields: [(&str, &mut String); 12] = [
            ("GLEANER_PROP_TITLE", &mut names.title),
            ("GLEANER_PROP_PROCESSED", &mut names.processed),
            ("GLEANER_PROP_LAST_PROCESSED", &mut names.last_processed_at),
            ("GLEANER_PROP_PROJECT", &mut names.project),
            ("GLEANER_PROP_NEEDS_REVIEW", &mut names.needs_review),
            ("GLEANER_PROP_STATUS", &mut names.status),
            ("GLEANER_PROP_PRIORITY", &mut names.priority),
            ("GLEANER_PROP_DUE", &mut names.due),
            ("GLEANER_PROP_SOURCE_DOCUMENT", &mut names.source_document),
            ("GLEANER_PROP_IDEMPOTENCY_KEY", &mut names.idempotency_key),
            ("GLEANER_PROP_QUICK_ADD", &mut names.quick_add),
            ("GLEANER_PROP_INFO_PENDING", &mut names.info_pending),
        ];
        for (var, slot) in fields {
            if let Ok(value) = std::env::var(var) {
                if !value.trim().is_empty() {
                    *slot = value.trim().to_string();
                }
            }
        }
        names
    }

    // ---- reading ------------------------------------------------------------

    pub fn source_document(&self, record: &StoreRecord) -> SourceDocument {
        SourceDocument {
            id: record.id.clone(),
            title: record.text(&self.title).unwrap_or_default().to_string(),
            processed: record.checkbox(&self.processed),
            last_processed_at: record.date(&self.last_processed_at).map(|d| d.instant()),
            last_edited_at: record.last_edited_at,
            project: record.select(&self.project).map(str::to_string),
            needs_review: record.checkbox(&self.needs_review),
        }
    }

    /// Unparseable select values read as unset.
    pub fn quick_entry(&self, record: &StoreRecord) -> QuickEntryRecord {
        QuickEntryRecord {
            id: record.id.clone(),
            title: record.text(&self.title).unwrap_or_default().to_string(),
            task_text: record
                .text(&self.quick_add)
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string),
            project: record.select(&self.project).map(str::to_string),
            priority: record.select(&self.priority).and_then(|p| p.parse().ok()),
            status: record.select(&self.status).and_then(|s| s.parse().ok()),
            due: record.date(&self.due).map(|d| d.day()),
            info_pending: record.checkbox(&self.info_pending),
        }
    }

    // ---- writing ------------------------------------------------------------

    /// Properties of a new task. Optional fields that are unset are left out.
    pub fn task_properties(&self, task: &TaskRecord) -> PropertyMap {
        let mut props = PropertyMap::new();
        props.insert(self.title.clone(), PropertyValue::Title(task.title.clone()));
        props.insert(
            self.status.clone(),
            PropertyValue::Select(Some(task.status.as_str().to_string())),
        );
        props.insert(
            self.priority.clone(),
            PropertyValue::Select(Some(task.priority.as_str().to_string())),
        );
        if let Some(due) = task.due {
            props.insert(self.due.clone(), PropertyValue::Date(Some(DateValue::Day(due))));
        }
        if let Some(project) = &task.project {
            props.insert(self.project.clone(), PropertyValue::Select(Some(project.clone())));
        }
        if let Some(source) = &task.source_document_id {
            props.insert(
                self.source_document.clone(),
                PropertyValue::Relation(vec![source.clone()]),
            );
        }
        if let Some(key) = &task.idempotency_key {
            props.insert(self.idempotency_key.clone(), PropertyValue::Text(key.clone()));
        }
        props
    }

    /// Marks a source document as processed at `now`.
    pub fn processed_properties(&self, now: DateTime<Utc>) -> PropertyMap {
        let mut props = PropertyMap::new();
        props.insert(self.processed.clone(), PropertyValue::Checkbox(true));
        props.insert(
            self.last_processed_at.clone(),
            PropertyValue::Date(Some(DateValue::Instant(now))),
        );
        props
    }

    /// Inferred project together with its review flag.
    pub fn inference_properties(&self, project: &str, needs_review: bool) -> PropertyMap {
        let mut props = PropertyMap::new();
        props.insert(
            self.project.clone(),
            PropertyValue::Select(Some(project.to_string())),
        );
        props.insert(self.needs_review.clone(), PropertyValue::Checkbox(needs_review));
        props
    }

    /// Empties the quick-add text channel.
    pub fn clear_quick_add(&self) -> PropertyMap {
        let mut props = PropertyMap::new();
        props.insert(self.quick_add.clone(), PropertyValue::Text(String::new()));
        props
    }

    /// Sets or clears the marker for an info section awaiting a retry.
    pub fn info_pending_properties(&self, pending: bool) -> PropertyMap {
        let mut props = PropertyMap::new();
        props.insert(self.info_pending.clone(), PropertyValue::Checkbox(pending));
        props
    }

    // ---- filters ------------------------------------------------------------

    pub fn idempotency_filter(&self, key: &str) -> RecordFilter {
        RecordFilter::TextEquals {
            property: self.idempotency_key.clone(),
            value: key.to_string(),
        }
    }

    /// Exact, case-sensitive title match used to find a knowledge record.
    pub fn title_filter(&self, title: &str) -> RecordFilter {
        RecordFilter::TitleEquals {
            property: self.title.clone(),
            value: title.to_string(),
        }
    }

    /// Server-side prefilter for quick-entry candidates: project or
    /// priority unset, or an info section still pending. The full
    /// predicate is evaluated locally.
    pub fn quick_entry_filter(&self) -> RecordFilter {
        RecordFilter::Or(vec![
            RecordFilter::SelectIsEmpty {
                property: self.project.clone(),
            },
            RecordFilter::SelectIsEmpty {
                property: self.priority.clone(),
            },
            RecordFilter::CheckboxEquals {
                property: self.info_pending.clone(),
                value: true,
            },
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Priority, TaskStatus};
    use chrono::{NaiveDate, TimeZone};

    fn record(props: Vec<(&str, PropertyValue)>) -> StoreRecord {
        StoreRecord {
            id: "rec-1".to_string(),
            last_edited_at: Utc.with_ymd_and_hms(2026, 10, 17, 9, 30, 0).unwrap(),
            archived: false,
            properties: props
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        }
    }

    #[test]
    fn test_source_document_from_record() {
        let names = PropertyNames::default();
        let processed_at = Utc.with_ymd_and_hms(2026, 10, 16, 8, 0, 0).unwrap();
        let doc = names.source_document(&record(vec![
            ("Name", PropertyValue::Title("ClickUp Sync".into())),
            ("Processed", PropertyValue::Checkbox(true)),
            (
                "Last Processed",
                PropertyValue::Date(Some(DateValue::Instant(processed_at))),
            ),
            ("Project", PropertyValue::Select(None)),
        ]));
        assert_eq!(doc.title, "ClickUp Sync");
        assert!(doc.processed);
        assert_eq!(doc.last_processed_at, Some(processed_at));
        assert_eq!(doc.project, None);
        assert!(!doc.needs_review);
    }

    #[test]
    fn test_source_document_missing_properties() {
        let doc = PropertyNames::default().source_document(&record(vec![]));
        assert_eq!(doc.title, "");
        assert!(!doc.processed);
        assert_eq!(doc.last_processed_at, None);
    }

    #[test]
    fn test_quick_entry_from_record() {
        let names = PropertyNames::default();
        let entry = names.quick_entry(&record(vec![
            ("Name", PropertyValue::Title("".into())),
            ("Quick Add", PropertyValue::Text("  call the bank  ".into())),
            ("Priority", PropertyValue::Select(Some("bogus".into()))),
            ("Status", PropertyValue::Select(Some("Backlog".into()))),
        ]));
        assert_eq!(entry.task_text.as_deref(), Some("call the bank"));
        assert_eq!(entry.priority, None);
        assert_eq!(entry.status, Some(TaskStatus::Backlog));
    }

    #[test]
    fn test_quick_entry_blank_channel_is_absent() {
        let entry = PropertyNames::default().quick_entry(&record(vec![(
            "Quick Add",
            PropertyValue::Text("   ".into()),
        )]));
        assert_eq!(entry.task_text, None);
    }

    #[test]
    fn test_task_properties() {
        let names = PropertyNames::default();
        let props = names.task_properties(&TaskRecord {
            title: "Email Karen".into(),
            status: TaskStatus::Done,
            priority: Priority::Medium,
            due: NaiveDate::from_ymd_opt(2026, 10, 23),
            project: Some("ClickUp".into()),
            source_document_id: Some("doc-1".into()),
            idempotency_key: Some("abc".into()),
        });
        assert_eq!(props["Name"], PropertyValue::Title("Email Karen".into()));
        assert_eq!(props["Status"], PropertyValue::Select(Some("Done".into())));
        assert_eq!(
            props["Source Document"],
            PropertyValue::Relation(vec!["doc-1".into()])
        );
        assert_eq!(props["Idempotency Key"], PropertyValue::Text("abc".into()));
        assert!(props.contains_key("Due"));
    }

    #[test]
    fn test_task_properties_omit_unset() {
        let props = PropertyNames::default().task_properties(&TaskRecord {
            title: "x".into(),
            status: TaskStatus::Backlog,
            priority: Priority::Low,
            due: None,
            project: None,
            source_document_id: None,
            idempotency_key: None,
        });
        assert_eq!(props.len(), 3);
    }

    #[test]
    fn test_processed_properties() {
        let now = Utc::now();
        let props = PropertyNames::default().processed_properties(now);
        assert_eq!(props["Processed"], PropertyValue::Checkbox(true));
        assert_eq!(
            props["Last Processed"],
            PropertyValue::Date(Some(DateValue::Instant(now)))
        );
    }

    #[test]
    fn test_quick_entry_filter_matches_unset_project() {
        let names = PropertyNames::default();
        let filter = names.quick_entry_filter();
        assert!(filter.matches(&record(vec![(
            "Priority",
            PropertyValue::Select(Some("High".into()))
        )])));
        assert!(!filter.matches(&record(vec![
            ("Priority", PropertyValue::Select(Some("High".into()))),
            ("Project", PropertyValue::Select(Some("HubSpot".into()))),
        ])));
    }

    #[test]
    fn test_quick_entry_filter_matches_pending_info() {
        let names = PropertyNames::default();
        let pending = record(vec![
            ("Name", PropertyValue::Title("Call the bank tomorrow".into())),
            ("Priority", PropertyValue::Select(Some("High".into()))),
            ("Project", PropertyValue::Select(Some("Finance".into()))),
            ("Info Pending", PropertyValue::Checkbox(true)),
        ]);
        assert!(names.quick_entry_filter().matches(&pending));
        assert!(names.quick_entry(&pending).info_pending);
    }
}
