//! Task synthesis: work items to persisted task records.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info};

use gleaner_core::classify::{priority_from_text, resolve_due};
use gleaner_core::{
    idempotency_key, DocumentStore, PropertyNames, RecordQuery, Result, TaskRecord, TaskStatus,
    WorkItem,
};

/// Outcome of a synthesis run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SynthesisReport {
    pub created: usize,
    pub existing: usize,
}

/// Build the task for a harvested work item.
///
/// Checked items are recorded as done, open ones land in the backlog.
pub fn task_from_work_item(
    item: &WorkItem,
    document_id: &str,
    project: Option<&str>,
    today: NaiveDate,
) -> TaskRecord {
    let title = item.text.trim().to_string();
    TaskRecord {
        status: if item.checked {
            TaskStatus::Done
        } else {
            TaskStatus::Backlog
        },
        priority: priority_from_text(&title),
        due: resolve_due(&title, today),
        project: project.map(str::to_string),
        source_document_id: Some(document_id.to_string()),
        idempotency_key: Some(idempotency_key(document_id, &title)),
        title,
    }
}

/// Creates tasks in the task collection, at most one per idempotency key.
pub struct TaskSynthesizer {
    store: Arc<dyn DocumentStore>,
    tasks_db: String,
    properties: PropertyNames,
}

impl TaskSynthesizer {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        tasks_db: impl Into<String>,
        properties: PropertyNames,
    ) -> Self {
        Self {
            store,
            tasks_db: tasks_db.into(),
            properties,
        }
    }

    /// Create `task` unless a task with its idempotency key exists.
    /// Returns `true` when a record was created.
    ///
    /// The existence check and the create are separate calls, so two
    /// concurrent writers can still both create.
    pub async fn create_unique(&self, task: &TaskRecord) -> Result<bool> {
        if let Some(key) = &task.idempotency_key {
            let query = RecordQuery::filtered(self.properties.idempotency_filter(key));
            let existing = self.store.list_due(&self.tasks_db, &query).await?;
            if !existing.is_empty() {
                debug!(title = %task.title, key = %key, "Task already exists, skipping");
                return Ok(false);
            }
        }

        let id = self
            .store
            .create(&self.tasks_db, self.properties.task_properties(task))
            .await?;
        debug!(record_id = %id, title = %task.title, "Created task");
        Ok(true)
    }

    /// Create a task for every work item of a document.
    pub async fn synthesize(
        &self,
        document_id: &str,
        items: &[WorkItem],
        project: Option<&str>,
        today: NaiveDate,
    ) -> Result<SynthesisReport> {
        let mut report = SynthesisReport::default();
        for item in items {
            let task = task_from_work_item(item, document_id, project, today);
            if self.create_unique(&task).await? {
                report.created += 1;
            } else {
                report.existing += 1;
            }
        }

        if !items.is_empty() {
            info!(
                document_id,
                created = report.created,
                existing = report.existing,
                "Synthesized tasks"
            );
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gleaner_core::Priority;

    fn item(text: &str, checked: bool) -> WorkItem {
        WorkItem {
            text: text.to_string(),
            checked,
            source_node_id: "n1".to_string(),
        }
    }

    fn saturday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 17).unwrap()
    }

    #[test]
    fn test_checked_item_is_done() {
        let task = task_from_work_item(&item("Email Karen", true), "doc", Some("ClickUp"), saturday());
        assert_eq!(task.status, TaskStatus::Done);
        assert_eq!(task.title, "Email Karen");
        assert_eq!(task.project.as_deref(), Some("ClickUp"));
        assert_eq!(task.source_document_id.as_deref(), Some("doc"));
        assert_eq!(task.due, None);
        assert_eq!(task.priority, Priority::Medium);
    }

    #[test]
    fn test_open_item_is_backlog_with_due_and_priority() {
        let task = task_from_work_item(
            &item("  Draft proposal due Friday ASAP ", false),
            "doc",
            None,
            saturday(),
        );
        assert_eq!(task.status, TaskStatus::Backlog);
        assert_eq!(task.title, "Draft proposal due Friday ASAP");
        assert_eq!(task.due, NaiveDate::from_ymd_opt(2026, 10, 23));
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.project, None);
    }

    #[test]
    fn test_key_ignores_case_and_spacing() {
        let a = task_from_work_item(&item("Email Karen", true), "doc", None, saturday());
        let b = task_from_work_item(&item("email  KAREN", false), "doc", None, saturday());
        assert_eq!(a.idempotency_key, b.idempotency_key);
        let c = task_from_work_item(&item("Email Karen", true), "other-doc", None, saturday());
        assert_ne!(a.idempotency_key, c.idempotency_key);
    }
}
