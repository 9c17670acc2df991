//! Failure counting with cooldown for records that keep failing.
//!
//! State is in-process only; a restart clears it.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tracing::warn;

#[derive(Debug, Default, Clone, Copy)]
struct Entry {
    failures: u32,
    cooling_until: Option<DateTime<Utc>>,
}

/// Counts consecutive failures per record id. After `max_attempts`
/// failures the record is skipped until the cooldown has elapsed.
pub struct FailureTracker {
    max_attempts: u32,
    cooldown: TimeDelta,
    entries: Mutex<HashMap<String, Entry>>,
}

impl FailureTracker {
    pub fn new(max_attempts: u32, cooldown: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            cooldown: TimeDelta::from_std(cooldown).unwrap_or(TimeDelta::MAX),
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// True while the record is cooling down. An elapsed cooldown clears
    /// the entry.
    pub fn is_cooling_down(&self, id: &str, now: DateTime<Utc>) -> bool {
        let mut entries = self.entries();
        match entries.get(id).and_then(|e| e.cooling_until) {
            Some(until) if now < until => true,
            Some(_) => {
                entries.remove(id);
                false
            }
            None => false,
        }
    }

    /// Count a failure; returns the consecutive failure count.
    pub fn record_failure(&self, id: &str, now: DateTime<Utc>) -> u32 {
        let mut entries = self.entries();
        let entry = entries.entry(id.to_string()).or_default();
        entry.failures += 1;
        if entry.failures >= self.max_attempts && entry.cooling_until.is_none() {
            let until = now.checked_add_signed(self.cooldown).unwrap_or(DateTime::<Utc>::MAX_UTC);
            entry.cooling_until = Some(until);
            warn!(
                record_id = id,
                failures = entry.failures,
                until = %until,
                "Record keeps failing, cooling down"
            );
        }
        entry.failures
    }

    pub fn record_success(&self, id: &str) {
        self.entries().remove(id);
    }

    pub fn failures(&self, id: &str) -> u32 {
        self.entries().get(id).map_or(0, |e| e.failures)
    }

    /// Drop entries of records outside `seen`. Returns how many were evicted.
    pub fn retain_seen(&self, seen: &HashSet<&str>) -> usize {
        let mut entries = self.entries();
        let before = entries.len();
        entries.retain(|id, _| seen.contains(id.as_str()));
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}
