//! Pass handlers run once per poll cycle.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use gleaner_core::Result;

/// Context provided to passes for one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleContext {
    /// 1-based cycle counter.
    pub cycle: u64,
    pub started_at: DateTime<Utc>,
    /// Reference date for relative due dates.
    pub today: NaiveDate,
}

impl CycleContext {
    pub fn new(cycle: u64, started_at: DateTime<Utc>) -> Self {
        Self {
            cycle,
            started_at,
            today: started_at.date_naive(),
        }
    }

    /// Pin the reference date.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }
}

/// Counters reported by a pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PassReport {
    /// Records listed from the store.
    pub examined: usize,
    /// Records fully handled this cycle.
    pub processed: usize,
    /// Records left alone (up to date, filled in, cooling down, empty).
    pub skipped: usize,
    /// Records whose processing failed; retried next cycle.
    pub failed: usize,
    pub tasks_created: usize,
    /// Tasks whose idempotency key already existed.
    pub tasks_existing: usize,
    /// Knowledge lines appended to project pages.
    pub knowledge_routed: usize,
    pub archived: usize,
}

/// One unit of work in a poll cycle.
#[async_trait]
pub trait Pass: Send + Sync {
    /// Short name for logs and events.
    fn name(&self) -> &'static str;

    /// Run the pass. Per-record failures are counted in the report; an
    /// error means the pass could not run at all.
    async fn run(&self, ctx: &CycleContext) -> Result<PassReport>;
}

/// Pass that does nothing, for wiring tests.
pub struct NoOpPass {
    name: &'static str,
}

impl NoOpPass {
    pub fn new(name: &'static str) -> Self {
        Self { name }
    }
}

#[async_trait]
impl Pass for NoOpPass {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn run(&self, _ctx: &CycleContext) -> Result<PassReport> {
        Ok(PassReport::default())
    }
}
