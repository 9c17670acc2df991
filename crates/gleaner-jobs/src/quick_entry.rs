//! Quick-entry pass: lightweight records in the task collection with two
//! optional input channels.
//!
//! The task channel is the quick-add text property, parsed into tasks.
//! The info channel is the record's own "Project Info" section, classified
//! and routed to a knowledge page. What happens to the record afterwards
//! depends on which channels were present and which succeeded.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, error, info, instrument, warn};

use gleaner_core::defaults::{
    PROJECT_INFO_HEADING, QUICK_ENTRY_MIN_TITLE_CHARS, QUICK_ENTRY_PLACEHOLDER,
};
use gleaner_core::scanner::section_text;
use gleaner_core::{
    find_section, idempotency_key, ClassificationBackend, ContentNode, DateValue, DocumentStore,
    Error, FetchDepth, ParsedTask, Priority, PropertyMap, PropertyValue, QuickEntryRecord,
    RecordQuery, Result, TaskRecord, TaskStatus,
};

use crate::config::EngineConfig;
use crate::cooldown::FailureTracker;
use crate::handler::{CycleContext, Pass, PassReport};
use crate::routing::{categorize_or_degrade, Router};
use crate::tasks::TaskSynthesizer;

/// Title that a human has not filled in yet.
pub fn is_placeholder_title(title: &str) -> bool {
    let title = title.trim();
    title.chars().count() < QUICK_ENTRY_MIN_TITLE_CHARS
        || title.to_lowercase().contains(QUICK_ENTRY_PLACEHOLDER)
}

/// A record is a quick entry while its title is a placeholder, project or
/// priority is unset, and its status is unset or still Backlog.
pub fn is_quick_entry(record: &QuickEntryRecord) -> bool {
    is_placeholder_title(&record.title)
        && (record.project.is_none() || record.priority.is_none())
        && matches!(record.status, None | Some(TaskStatus::Backlog))
}

/// Which channels were present and which succeeded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelState {
    pub task_present: bool,
    pub info_present: bool,
    pub task_success: bool,
    pub info_success: bool,
}

impl ChannelState {
    pub fn any_present(&self) -> bool {
        self.task_present || self.info_present
    }

    /// Every present channel succeeded.
    pub fn all_succeeded(&self) -> bool {
        (!self.task_present || self.task_success) && (!self.info_present || self.info_success)
    }
}

/// Terminal side effect on a quick-entry record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cleanup {
    /// Leave the record as it is.
    None,
    /// Remove the info section, keep the record as a task.
    DeleteInfoSection,
    /// Soft-delete the whole record.
    Archive,
}

/// Cleanup for a processed record.
///
/// An info-only record was an inbox drop and is archived. A record whose
/// task channel ran in an earlier cycle counts as having a task channel,
/// so it is never archived. When the info
/// channel succeeded next to a task channel, its section is removed so it
/// is never routed twice, even if the task channel needs another try. A
/// successful task-only record has its (empty) info section tidied.
pub fn cleanup_action(state: ChannelState) -> Cleanup {
    match state {
        ChannelState {
            info_present: true,
            info_success: true,
            task_present: false,
            ..
        } => Cleanup::Archive,
        ChannelState {
            info_success: true,
            ..
        } => Cleanup::DeleteInfoSection,
        ChannelState {
            task_success: true,
            info_present: false,
            ..
        } => Cleanup::DeleteInfoSection,
        _ => Cleanup::None,
    }
}

/// Delete every node of the section under `target`. Nodes that cannot be
/// deleted are logged and skipped. Returns how many were deleted.
pub async fn delete_section(
    store: &dyn DocumentStore,
    nodes: &[ContentNode],
    target: &str,
) -> usize {
    let Some(section) = find_section(nodes, target) else {
        return 0;
    };

    let mut deleted = 0;
    for node in &nodes[section.range()] {
        match store.delete_node(&node.id).await {
            Ok(()) => deleted += 1,
            Err(e) => warn!(node_id = %node.id, error = %e, "Could not delete node, skipping"),
        }
    }
    debug!(heading = target, deleted, "Deleted section");
    deleted
}

/// Outcome of one quick entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryOutcome {
    pub state: ChannelState,
    pub cleanup: Cleanup,
    pub tasks_created: usize,
    pub routed: usize,
}

pub struct QuickEntryPass {
    store: Arc<dyn DocumentStore>,
    classifier: Arc<dyn ClassificationBackend>,
    config: EngineConfig,
    synthesizer: TaskSynthesizer,
    router: Router,
    tracker: FailureTracker,
}

impl QuickEntryPass {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        classifier: Arc<dyn ClassificationBackend>,
        config: EngineConfig,
    ) -> Self {
        let synthesizer =
            TaskSynthesizer::new(store.clone(), &config.tasks_db, config.properties.clone());
        let router = Router::new(store.clone(), &config.knowledge_db, config.properties.clone())
            .with_append_backoff(config.append_retries, config.append_backoff_step);
        let tracker =
            FailureTracker::new(config.quick_entry_max_attempts, config.quick_entry_cooldown);
        Self {
            store,
            classifier,
            config,
            synthesizer,
            router,
            tracker,
        }
    }

    pub fn tracker(&self) -> &FailureTracker {
        &self.tracker
    }

    /// Drive both channels of one record and apply its cleanup.
    #[instrument(skip(self, entry), fields(record_id = %entry.id))]
    pub async fn process_entry(&self, entry: &QuickEntryRecord) -> Result<EntryOutcome> {
        let nodes = self
            .store
            .get_children(&entry.id, FetchDepth::Recursive)
            .await?;
        let info_lines = section_text(&nodes, PROJECT_INFO_HEADING);

        let mut state = ChannelState {
            task_present: entry.task_text.is_some() || entry.info_pending,
            info_present: !info_lines.is_empty(),
            ..Default::default()
        };
        let mut outcome = EntryOutcome {
            state,
            cleanup: Cleanup::None,
            tasks_created: 0,
            routed: 0,
        };
        if !state.any_present() {
            return Ok(outcome);
        }

        match &entry.task_text {
            Some(text) => match self.run_task_channel(entry, text, state.info_present).await {
                Ok(created) => {
                    state.task_success = true;
                    outcome.tasks_created = created;
                }
                Err(e) => error!(error = %e, "Task channel failed"),
            },
            None => state.task_success = entry.info_pending,
        }

        if state.info_present {
            match self.run_info_channel(&info_lines).await {
                Ok(routed) if routed > 0 => {
                    state.info_success = true;
                    outcome.routed = routed;
                }
                Ok(_) => warn!("Info channel routed nothing"),
                Err(e) => error!(error = %e, "Info channel failed"),
            }
        }

        outcome.state = state;
        outcome.cleanup = cleanup_action(state);
        match outcome.cleanup {
            Cleanup::Archive => self.store.archive(&entry.id).await?,
            Cleanup::DeleteInfoSection => {
                delete_section(self.store.as_ref(), &nodes, PROJECT_INFO_HEADING).await;
            }
            Cleanup::None => {}
        }

        let marked = entry.info_pending
            || (entry.task_text.is_some() && state.task_success && state.info_present);
        if marked && (!state.info_present || state.info_success) {
            let clear = self.config.properties.info_pending_properties(false);
            if let Err(e) = self.store.update(&entry.id, clear).await {
                warn!(error = %e, "Could not clear pending info marker");
            }
        } else if marked {
            debug!("Info section stays pending");
        }

        info!(
            task_success = state.task_success,
            info_success = state.info_success,
            cleanup = ?outcome.cleanup,
            "Quick entry processed"
        );
        Ok(outcome)
    }

    /// Parse the quick-add text. The first task fills the record's unset
    /// fields, the rest become new tasks. Returns the number created.
    ///
    /// With an info section present the same update marks the info as
    /// pending, so it is retried once the record stops looking like a
    /// quick entry.
    async fn run_task_channel(
        &self,
        entry: &QuickEntryRecord,
        text: &str,
        info_present: bool,
    ) -> Result<usize> {
        let tasks = self.classifier.parse_tasks(text).await?;
        let Some((first, rest)) = tasks.split_first() else {
            return Err(Error::Classification("Task parser returned no tasks".into()));
        };

        let mut update = self.fill_unset(entry, first);
        update.extend(self.config.properties.clear_quick_add());
        if info_present && !entry.info_pending {
            update.extend(self.config.properties.info_pending_properties(true));
        }
        self.store.update(&entry.id, update).await?;

        let mut created = 0;
        for parsed in rest {
            let task = self.sibling_task(entry, parsed);
            if self.synthesizer.create_unique(&task).await? {
                created += 1;
            }
        }
        Ok(created)
    }

    /// Classify the info lines and route them to the detected project.
    /// Returns the number of lines appended.
    async fn run_info_channel(&self, lines: &[String]) -> Result<usize> {
        let bundle = categorize_or_degrade(self.classifier.as_ref(), lines).await;
        let (project, matched) = self.config.catalog.detect_from_lines(bundle.lines());
        debug!(project = %project, matched, "Detected project from info lines");
        let report = self.router.route(&project, &bundle).await?;
        Ok(report.succeeded)
    }

    fn canonical_project(&self, parsed: &ParsedTask) -> Option<String> {
        parsed
            .project
            .as_deref()
            .and_then(|p| {
                self.config
                    .catalog
                    .canonical(p)
                    .or_else(|| self.config.catalog.resolve_override_token(p))
            })
            .map(str::to_string)
    }

    /// Properties from `parsed` for every field of the record still unset.
    fn fill_unset(&self, entry: &QuickEntryRecord, parsed: &ParsedTask) -> PropertyMap {
        let props = &self.config.properties;
        let mut update = PropertyMap::new();

        if is_placeholder_title(&entry.title) && !parsed.title.trim().is_empty() {
            update.insert(
                props.title.clone(),
                PropertyValue::Title(parsed.title.trim().to_string()),
            );
        }
        if entry.project.is_none() {
            if let Some(project) = self.canonical_project(parsed) {
                update.insert(props.project.clone(), PropertyValue::Select(Some(project)));
            }
        }
        if entry.priority.is_none() {
            if let Some(priority) = parsed.priority {
                update.insert(
                    props.priority.clone(),
                    PropertyValue::Select(Some(priority.as_str().to_string())),
                );
            }
        }
        if entry.due.is_none() {
            if let Some(due) = parsed.due {
                update.insert(props.due.clone(), PropertyValue::Date(Some(DateValue::Day(due))));
            }
        }
        if entry.status.is_none() {
            update.insert(
                props.status.clone(),
                PropertyValue::Select(Some(TaskStatus::Backlog.as_str().to_string())),
            );
        }
        update
    }

    fn sibling_task(&self, entry: &QuickEntryRecord, parsed: &ParsedTask) -> TaskRecord {
        let title = parsed.title.trim().to_string();
        TaskRecord {
            idempotency_key: Some(idempotency_key(&entry.id, &title)),
            title,
            status: TaskStatus::Backlog,
            priority: parsed.priority.unwrap_or(Priority::Medium),
            due: parsed.due,
            project: self.canonical_project(parsed),
            source_document_id: None,
        }
    }
}

#[async_trait]
impl Pass for QuickEntryPass {
    fn name(&self) -> &'static str {
        "quick_entry"
    }

    #[instrument(skip(self, ctx), fields(cycle = ctx.cycle))]
    async fn run(&self, ctx: &CycleContext) -> Result<PassReport> {
        let props = &self.config.properties;
        let records = self
            .store
            .list_due(
                &self.config.tasks_db,
                &RecordQuery::filtered(props.quick_entry_filter()),
            )
            .await?;

        let mut report = PassReport {
            examined: records.len(),
            ..Default::default()
        };

        for record in &records {
            let entry = props.quick_entry(record);
            if !is_quick_entry(&entry) && !entry.info_pending {
                report.skipped += 1;
                continue;
            }
            let now = Utc::now();
            if self.tracker.is_cooling_down(&entry.id, now) {
                debug!(record_id = %entry.id, "Quick entry cooling down");
                report.skipped += 1;
                continue;
            }

            match self.process_entry(&entry).await {
                Ok(outcome) if !outcome.state.any_present() => report.skipped += 1,
                Ok(outcome) => {
                    report.tasks_created += outcome.tasks_created;
                    report.knowledge_routed += outcome.routed;
                    if outcome.cleanup == Cleanup::Archive {
                        report.archived += 1;
                    }
                    if outcome.state.all_succeeded() {
                        self.tracker.record_success(&entry.id);
                        report.processed += 1;
                    } else {
                        self.tracker.record_failure(&entry.id, now);
                        report.failed += 1;
                    }
                }
                Err(e) => {
                    error!(record_id = %entry.id, error = %e, "Quick entry failed");
                    self.tracker.record_failure(&entry.id, now);
                    report.failed += 1;
                }
            }
        }

        let seen: HashSet<&str> = records.iter().map(|r| r.id.as_str()).collect();
        let evicted = self.tracker.retain_seen(&seen);
        if evicted > 0 {
            debug!(evicted, "Forgot failures of records no longer listed");
        }

        info!(
            cycle = ctx.cycle,
            examined = report.examined,
            processed = report.processed,
            archived = report.archived,
            failed = report.failed,
            "Quick entry pass complete"
        );
        Ok(report)
    }
}
