//! gleaner worker: polls the document store and runs the extraction passes.

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gleaner_core::{ClassificationBackend, DocumentStore, RetryPolicy};
use gleaner_inference::{
    HeuristicClassifier, LlmClassifier, OpenAIBackend, OpenAIConfig, ResilientClassifier,
};
use gleaner_jobs::{
    EngineConfig, MeetingNotesPass, QuickEntryPass, WorkerBuilder, WorkerConfig, WorkerEvent,
};
use gleaner_store::NotionStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Environment variables:
    //   LOG_FORMAT  - "json" or "text" (default: "text")
    //   LOG_FILE    - path to log file (optional, enables file logging)
    //   LOG_ANSI    - "true"/"false" override ANSI colors (auto-detected by default)
    //   RUST_LOG    - standard env filter (default: info for the gleaner crates)
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();
    let log_ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "gleaner_worker=info,gleaner_jobs=info,gleaner_store=info,gleaner_inference=info,gleaner_core=info"
            .into()
    });

    let registry = tracing_subscriber::registry().with(env_filter);

    let _file_guard = if let Some(ref path) = log_file {
        let file_dir = std::path::Path::new(path)
            .parent()
            .unwrap_or(std::path::Path::new("."));
        let file_name = std::path::Path::new(path)
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("gleaner-worker.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking),
                )
                .init();
        } else {
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(log_ansi.unwrap_or(false));
            registry.with(layer).init();
        }
        Some(guard)
    } else {
        if log_format == "json" {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer();
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            }
            registry.with(layer).init();
        }
        None
    };

    info!(
        log_format = %log_format,
        log_file = log_file.as_deref().unwrap_or("(stdout)"),
        "Logging initialized"
    );

    let engine = EngineConfig::from_env()?;
    let worker_config = WorkerConfig::from_env();
    let policy = RetryPolicy::from_env();

    let store: Arc<dyn DocumentStore> =
        Arc::new(NotionStore::from_env()?.with_retry_policy(policy));

    let openai = OpenAIConfig::from_env();
    let classifier: Arc<dyn ClassificationBackend> = if openai.api_key.is_some() {
        let projects = engine
            .catalog
            .projects()
            .iter()
            .map(|p| p.name.clone())
            .collect();
        let llm = LlmClassifier::new(OpenAIBackend::new(openai)?).with_projects(projects);
        Arc::new(ResilientClassifier::new(llm, policy))
    } else {
        warn!("OPENAI_API_KEY not set, using heuristic classifier");
        Arc::new(HeuristicClassifier::new(engine.catalog.clone()))
    };
    info!(classifier = classifier.name(), "Classifier ready");

    let worker = WorkerBuilder::new()
        .with_config(worker_config.clone())
        .with_pass(MeetingNotesPass::new(
            store.clone(),
            classifier.clone(),
            engine.clone(),
        ))
        .with_pass(QuickEntryPass::new(store, classifier, engine))
        .build();

    if worker_config.run_once {
        info!("Running a single cycle");
        if !worker.run_cycle(1).await {
            anyhow::bail!("One or more passes failed");
        }
        return Ok(());
    }

    if !worker_config.enabled {
        info!("Poll worker is disabled, exiting");
        return Ok(());
    }

    let handle = worker.start();
    let mut events = handle.events();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(WorkerEvent::PassCompleted { cycle, name, report }) => info!(
                    cycle,
                    pass = name,
                    processed = report.processed,
                    failed = report.failed,
                    tasks_created = report.tasks_created,
                    "Pass report"
                ),
                Ok(_) | Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => break,
            }
        }
    });

    tokio::signal::ctrl_c().await?;
    info!("Shutdown requested, finishing current cycle");
    if let Err(e) = handle.shutdown().await {
        warn!(error = %e, "Worker already stopped");
    }
    handle.join().await?;

    info!("Worker exited");
    Ok(())
}
