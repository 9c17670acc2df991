//! Meeting-notes pass: mines edited source documents for tasks and
//! project knowledge.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, error, info, instrument, warn, Span};

use gleaner_core::defaults::PROJECT_INFO_HEADING;
use gleaner_core::logging::{CONFIDENCE, PROJECT};
use gleaner_core::scanner::section_text;
use gleaner_core::{
    collect_work_items, needs_review, should_process, ClassificationBackend, DocumentStore, Error,
    FetchDepth, RecordQuery, Result, SourceDocument,
};

use crate::config::EngineConfig;
use crate::handler::{CycleContext, Pass, PassReport};
use crate::routing::{categorize_or_degrade, Router};
use crate::tasks::{SynthesisReport, TaskSynthesizer};

/// What happened to one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentOutcome {
    pub project: String,
    pub tasks: SynthesisReport,
    /// Knowledge lines appended.
    pub routed: usize,
}

pub struct MeetingNotesPass {
    store: Arc<dyn DocumentStore>,
    classifier: Arc<dyn ClassificationBackend>,
    config: EngineConfig,
    synthesizer: TaskSynthesizer,
    router: Router,
}

impl MeetingNotesPass {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        classifier: Arc<dyn ClassificationBackend>,
        config: EngineConfig,
    ) -> Self {
        let synthesizer =
            TaskSynthesizer::new(store.clone(), &config.tasks_db, config.properties.clone());
        let router = Router::new(store.clone(), &config.knowledge_db, config.properties.clone())
            .with_append_backoff(config.append_retries, config.append_backoff_step);
        Self {
            store,
            classifier,
            config,
            synthesizer,
            router,
        }
    }

    /// Process one document that is due.
    ///
    /// The document is marked processed only after its tasks were
    /// synthesized. A missing knowledge page does not hold it back, but
    /// any other routing error leaves it due for the next cycle.
    #[instrument(
        skip(self, doc, ctx),
        fields(document_id = %doc.id, project = tracing::field::Empty, confidence = tracing::field::Empty)
    )]
    pub async fn process_document(
        &self,
        doc: &SourceDocument,
        ctx: &CycleContext,
    ) -> Result<DocumentOutcome> {
        let props = &self.config.properties;
        let nodes = self
            .store
            .get_children(&doc.id, FetchDepth::Recursive)
            .await?;
        debug!(nodes = nodes.len(), "Fetched document tree");

        let project = match &doc.project {
            Some(project) => project.clone(),
            None => {
                let inference = self.config.catalog.infer(&doc.title, &nodes);
                let review = needs_review(inference.confidence, self.config.review_threshold);
                Span::current().record(CONFIDENCE, inference.confidence);
                self.store
                    .update(&doc.id, props.inference_properties(&inference.project, review))
                    .await?;
                info!(
                    project = %inference.project,
                    source = ?inference.source,
                    needs_review = review,
                    "Inferred project"
                );
                inference.project
            }
        };
        Span::current().record(PROJECT, project.as_str());

        let items = collect_work_items(&nodes);
        let tasks = self
            .synthesizer
            .synthesize(&doc.id, &items, Some(&project), ctx.today)
            .await?;

        let mut routed = 0;
        let info_lines = section_text(&nodes, PROJECT_INFO_HEADING);
        if !info_lines.is_empty() {
            let bundle = categorize_or_degrade(self.classifier.as_ref(), &info_lines).await;
            match self.router.route(&project, &bundle).await {
                Ok(report) => routed = report.succeeded,
                Err(Error::NotFound(msg)) => {
                    warn!(error = %msg, "No knowledge page for project, skipping routing")
                }
                Err(e) => return Err(e),
            }
        }

        self.store
            .update(&doc.id, props.processed_properties(Utc::now()))
            .await?;

        Ok(DocumentOutcome {
            project,
            tasks,
            routed,
        })
    }
}

#[async_trait]
impl Pass for MeetingNotesPass {
    fn name(&self) -> &'static str {
        "meeting_notes"
    }

    #[instrument(skip(self, ctx), fields(cycle = ctx.cycle))]
    async fn run(&self, ctx: &CycleContext) -> Result<PassReport> {
        let records = self
            .store
            .list_due(&self.config.notes_db, &RecordQuery::all())
            .await?;

        let mut report = PassReport {
            examined: records.len(),
            ..Default::default()
        };

        for record in &records {
            let doc = self.config.properties.source_document(record);
            if !should_process(&doc) {
                report.skipped += 1;
                continue;
            }

            match self.process_document(&doc, ctx).await {
                Ok(outcome) => {
                    report.processed += 1;
                    report.tasks_created += outcome.tasks.created;
                    report.tasks_existing += outcome.tasks.existing;
                    report.knowledge_routed += outcome.routed;
                }
                Err(e) => {
                    error!(document_id = %doc.id, title = %doc.title, error = %e, "Document failed");
                    report.failed += 1;
                }
            }
        }

        info!(
            examined = report.examined,
            processed = report.processed,
            skipped = report.skipped,
            failed = report.failed,
            "Meeting notes pass complete"
        );
        Ok(report)
    }
}
