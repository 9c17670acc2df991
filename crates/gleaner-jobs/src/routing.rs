//! Categorization routing: appends classified knowledge under the
//! matching section headings of a project's knowledge page.
//!
//! Lines are inserted directly after the section heading, so later
//! batches stack above earlier ones (newest first).

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, instrument, warn};

use gleaner_core::retry::retry_transient;
use gleaner_core::{
    find_section, CategorizedBundle, Category, ClassificationBackend, DocumentStore, Error,
    FetchDepth, KnowledgeRecord, PropertyNames, RecordQuery, Result,
};

/// Heading phrase of the catch-all decisions log.
pub const DECISIONS_LOG: &str = "decision";

/// Heading phrase a category is appended under.
pub fn target_phrase(category: Category) -> &'static str {
    match category {
        Category::Credentials => "credentials",
        Category::Contacts => "contacts",
        Category::Links => "important links",
        Category::Decisions | Category::Other => DECISIONS_LOG,
    }
}

/// Classify bullets, degrading to "everything is other" when the
/// classifier fails so no input is dropped.
pub async fn categorize_or_degrade(
    classifier: &dyn ClassificationBackend,
    bullets: &[String],
) -> CategorizedBundle {
    match classifier.categorize(bullets).await {
        Ok(bundle) => bundle,
        Err(e) => {
            warn!(
                classifier = classifier.name(),
                error = %e,
                item_count = bullets.len(),
                "Classification failed, filing all lines under other"
            );
            CategorizedBundle::uncategorized(bullets)
        }
    }
}

/// Lines appended and lines that could not be placed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouteReport {
    pub succeeded: usize,
    pub failed: usize,
}

impl RouteReport {
    /// At least one line landed somewhere.
    pub fn is_success(&self) -> bool {
        self.succeeded > 0
    }
}

/// Routes bundles to knowledge pages in one collection.
pub struct Router {
    store: Arc<dyn DocumentStore>,
    knowledge_db: String,
    properties: PropertyNames,
    append_retries: u32,
    append_step: Duration,
}

impl Router {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        knowledge_db: impl Into<String>,
        properties: PropertyNames,
    ) -> Self {
        Self {
            store,
            knowledge_db: knowledge_db.into(),
            properties,
            append_retries: gleaner_core::defaults::APPEND_RETRIES,
            append_step: gleaner_core::defaults::APPEND_BACKOFF_STEP,
        }
    }

    pub fn with_append_backoff(mut self, retries: u32, step: Duration) -> Self {
        self.append_retries = retries;
        self.append_step = step;
        self
    }

    /// Knowledge page whose title equals `project` exactly.
    pub async fn find_knowledge_record(&self, project: &str) -> Result<KnowledgeRecord> {
        let query = RecordQuery::filtered(self.properties.title_filter(project));
        let records = self.store.list_due(&self.knowledge_db, &query).await?;
        records
            .into_iter()
            .find(|r| r.text(&self.properties.title) == Some(project))
            .map(|r| KnowledgeRecord {
                id: r.id,
                title: project.to_string(),
            })
            .ok_or_else(|| Error::NotFound(format!("knowledge page for project {}", project)))
    }

    /// Append every non-empty category of `bundle` to the knowledge page of
    /// `project`.
    ///
    /// Credentials, contacts and links go under their own headings, falling
    /// back once to the decisions log when the heading is missing. Decisions
    /// and other always go to the decisions log as one batch. Fails with
    /// `NotFound` only when the knowledge page itself is missing.
    #[instrument(skip(self, bundle), fields(lines = bundle.len()))]
    pub async fn route(&self, project: &str, bundle: &CategorizedBundle) -> Result<RouteReport> {
        let record = self.find_knowledge_record(project).await?;
        let mut report = RouteReport::default();

        for category in [Category::Credentials, Category::Contacts, Category::Links] {
            let lines = bundle.get(category);
            if lines.is_empty() {
                continue;
            }
            self.append_batch(&record, category, lines, &mut report).await;
        }

        let log_lines = bundle.log_lines();
        if !log_lines.is_empty() {
            self.append_batch(&record, Category::Decisions, &log_lines, &mut report)
                .await;
        }

        info!(
            succeeded = report.succeeded,
            failed = report.failed,
            "Routed knowledge"
        );
        Ok(report)
    }

    async fn append_batch(
        &self,
        record: &KnowledgeRecord,
        category: Category,
        lines: &[String],
        report: &mut RouteReport,
    ) {
        match self.append_category(record, category, lines).await {
            Ok(()) => report.succeeded += lines.len(),
            Err(e) => {
                error!(
                    category = %category,
                    record_id = %record.id,
                    error = %e,
                    "Failed to append knowledge"
                );
                report.failed += lines.len();
            }
        }
    }

    async fn append_category(
        &self,
        record: &KnowledgeRecord,
        category: Category,
        lines: &[String],
    ) -> Result<()> {
        let nodes = self
            .store
            .get_children(&record.id, FetchDepth::TopLevel)
            .await?;

        let phrase = target_phrase(category);
        let section = match find_section(&nodes, phrase) {
            Some(section) => section,
            None if phrase != DECISIONS_LOG => {
                warn!(
                    category = %category,
                    heading = phrase,
                    "Section not found, falling back to decisions log"
                );
                find_section(&nodes, DECISIONS_LOG)
                    .ok_or_else(|| Error::SectionNotFound(DECISIONS_LOG.to_string()))?
            }
            None => return Err(Error::SectionNotFound(phrase.to_string())),
        };

        let heading_id = &nodes[section.start].id;
        debug!(category = %category, heading_id = %heading_id, lines = lines.len(), "Appending");
        retry_transient("append_after", self.append_retries, self.append_step, || {
            self.store.append_after(&record.id, heading_id, lines)
        })
        .await
    }
}
