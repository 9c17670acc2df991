//! Poll worker: runs the registered passes once per cycle.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::sync::{broadcast, mpsc};
use tokio::time::sleep;
use tracing::{error, info, instrument};

use gleaner_core::defaults::{EVENT_BUS_CAPACITY, POLL_INTERVAL_SECS};
use gleaner_core::{Error, Result};

use crate::handler::{CycleContext, Pass, PassReport};

/// Configuration for the poll worker.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Pause between the end of one cycle and the start of the next.
    pub poll_interval_secs: u64,
    /// Whether to run cycles at all.
    pub enabled: bool,
    /// Run a single cycle and stop.
    pub run_once: bool,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: POLL_INTERVAL_SECS,
            enabled: true,
            run_once: false,
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `GLEANER_WORKER_ENABLED` | `true` | Enable/disable polling |
    /// | `GLEANER_POLL_INTERVAL_SECS` | `300` | Pause between cycles |
    /// | `GLEANER_RUN_ONCE` | `false` | Run one cycle and exit |
    pub fn from_env() -> Self {
        let enabled = std::env::var("GLEANER_WORKER_ENABLED")
            .map(|v| v != "false" && v != "0")
            .unwrap_or(true);

        let poll_interval_secs = std::env::var("GLEANER_POLL_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(POLL_INTERVAL_SECS);

        let run_once = std::env::var("GLEANER_RUN_ONCE")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        Self {
            poll_interval_secs,
            enabled,
            run_once,
        }
    }

    pub fn with_poll_interval(mut self, secs: u64) -> Self {
        self.poll_interval_secs = secs;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_run_once(mut self, run_once: bool) -> Self {
        self.run_once = run_once;
        self
    }
}

/// Event emitted by the poll worker.
#[derive(Debug, Clone)]
pub enum WorkerEvent {
    CycleStarted { cycle: u64 },
    PassCompleted {
        cycle: u64,
        name: &'static str,
        report: PassReport,
    },
    PassFailed {
        cycle: u64,
        name: &'static str,
        error: String,
    },
    CycleCompleted { cycle: u64, duration_ms: u64 },
    WorkerStarted,
    WorkerStopped,
}

/// Handle for controlling a running worker.
pub struct WorkerHandle {
    shutdown_tx: mpsc::Sender<()>,
    event_rx: broadcast::Receiver<WorkerEvent>,
    task: tokio::task::JoinHandle<()>,
}

impl WorkerHandle {
    /// Ask the worker to stop after the current cycle.
    pub async fn shutdown(&self) -> Result<()> {
        self.shutdown_tx
            .send(())
            .await
            .map_err(|_| Error::Internal("Failed to send shutdown signal".into()))?;
        Ok(())
    }

    /// Get a receiver for worker events.
    pub fn events(&self) -> broadcast::Receiver<WorkerEvent> {
        self.event_rx.resubscribe()
    }

    /// Wait for the worker loop to finish.
    pub async fn join(self) -> Result<()> {
        self.task
            .await
            .map_err(|e| Error::Internal(format!("Worker task failed: {}", e)))
    }
}

/// Runs passes sequentially, one cycle at a time.
pub struct PollWorker {
    config: WorkerConfig,
    passes: Vec<Arc<dyn Pass>>,
    event_tx: broadcast::Sender<WorkerEvent>,
}

impl PollWorker {
    pub fn new(config: WorkerConfig) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_BUS_CAPACITY);
        Self {
            config,
            passes: Vec::new(),
            event_tx,
        }
    }

    /// Register a pass; passes run in registration order.
    pub fn register_pass<P: Pass + 'static>(&mut self, pass: P) {
        self.passes.push(Arc::new(pass));
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Get a receiver for worker events.
    pub fn events(&self) -> broadcast::Receiver<WorkerEvent> {
        self.event_tx.subscribe()
    }

    /// Start the worker loop and return a handle for control.
    pub fn start(self) -> WorkerHandle {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);
        let event_rx = self.event_tx.subscribe();

        let task = tokio::spawn(async move {
            self.run(&mut shutdown_rx).await;
        });

        WorkerHandle {
            shutdown_tx,
            event_rx,
            task,
        }
    }

    /// Cycle loop. Cycles never overlap; shutdown is honoured between
    /// cycles and during the pause.
    #[instrument(skip(self, shutdown_rx))]
    async fn run(&self, shutdown_rx: &mut mpsc::Receiver<()>) {
        if !self.config.enabled {
            info!("Poll worker is disabled, not starting");
            return;
        }

        info!(
            poll_interval_secs = self.config.poll_interval_secs,
            passes = self.passes.len(),
            run_once = self.config.run_once,
            "Poll worker started"
        );
        let _ = self.event_tx.send(WorkerEvent::WorkerStarted);

        let poll_interval = Duration::from_secs(self.config.poll_interval_secs);
        let mut cycle = 0;

        loop {
            if shutdown_rx.try_recv().is_ok() {
                info!("Poll worker received shutdown signal");
                break;
            }

            cycle += 1;
            self.run_cycle(cycle).await;

            if self.config.run_once {
                break;
            }

            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!("Poll worker received shutdown signal");
                    break;
                }
                _ = sleep(poll_interval) => {}
            }
        }

        let _ = self.event_tx.send(WorkerEvent::WorkerStopped);
        info!(cycles = cycle, "Poll worker stopped");
    }

    /// Run every pass once. A failing pass does not stop the ones after
    /// it. Returns `true` when all passes ran.
    pub async fn run_cycle(&self, cycle: u64) -> bool {
        let start = Instant::now();
        let ctx = CycleContext::new(cycle, Utc::now());
        let _ = self.event_tx.send(WorkerEvent::CycleStarted { cycle });

        let mut all_ok = true;
        for pass in &self.passes {
            let name = pass.name();
            match pass.run(&ctx).await {
                Ok(report) => {
                    let _ = self.event_tx.send(WorkerEvent::PassCompleted {
                        cycle,
                        name,
                        report,
                    });
                }
                Err(e) => {
                    all_ok = false;
                    error!(cycle, pass = name, error = %e, "Pass failed");
                    let _ = self.event_tx.send(WorkerEvent::PassFailed {
                        cycle,
                        name,
                        error: e.to_string(),
                    });
                }
            }
        }

        let duration_ms = start.elapsed().as_millis() as u64;
        info!(cycle, duration_ms, "Cycle complete");
        let _ = self
            .event_tx
            .send(WorkerEvent::CycleCompleted { cycle, duration_ms });
        all_ok
    }
}

/// Builder for creating a poll worker with passes.
#[derive(Default)]
pub struct WorkerBuilder {
    config: WorkerConfig,
    passes: Vec<Arc<dyn Pass>>,
}

impl WorkerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: WorkerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_pass<P: Pass + 'static>(mut self, pass: P) -> Self {
        self.passes.push(Arc::new(pass));
        self
    }

    pub fn build(self) -> PollWorker {
        let mut worker = PollWorker::new(self.config);
        worker.passes = self.passes;
        worker
    }
}
