//! Engine configuration.

use std::time::Duration;

use gleaner_core::defaults::{
    APPEND_BACKOFF_STEP, APPEND_RETRIES, QUICK_ENTRY_COOLDOWN, QUICK_ENTRY_MAX_ATTEMPTS,
    REVIEW_THRESHOLD,
};
use gleaner_core::{Error, ProjectCatalog, PropertyNames, Result};

/// Collections, thresholds and tables the passes run against.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Collection of meeting notes mined for tasks and knowledge.
    pub notes_db: String,
    /// Task collection; quick entries live here too.
    pub tasks_db: String,
    /// Collection of project knowledge pages.
    pub knowledge_db: String,
    /// Inferred projects below this confidence are flagged for review.
    pub review_threshold: f32,
    /// Extra attempts for an append that failed transiently.
    pub append_retries: u32,
    /// Linear backoff step between append attempts.
    pub append_backoff_step: Duration,
    /// Failed quick-entry attempts before the record cools down.
    pub quick_entry_max_attempts: u32,
    pub quick_entry_cooldown: Duration,
    pub properties: PropertyNames,
    pub catalog: ProjectCatalog,
}

impl EngineConfig {
    pub fn new(
        notes_db: impl Into<String>,
        tasks_db: impl Into<String>,
        knowledge_db: impl Into<String>,
    ) -> Self {
        Self {
            notes_db: notes_db.into(),
            tasks_db: tasks_db.into(),
            knowledge_db: knowledge_db.into(),
            review_threshold: REVIEW_THRESHOLD,
            append_retries: APPEND_RETRIES,
            append_backoff_step: APPEND_BACKOFF_STEP,
            quick_entry_max_attempts: QUICK_ENTRY_MAX_ATTEMPTS,
            quick_entry_cooldown: QUICK_ENTRY_COOLDOWN,
            properties: PropertyNames::default(),
            catalog: ProjectCatalog::default(),
        }
    }

    /// Create config from environment variables.
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `GLEANER_NOTES_DB` | required | Meeting notes collection id |
    /// | `GLEANER_TASKS_DB` | required | Task collection id |
    /// | `GLEANER_KNOWLEDGE_DB` | required | Project knowledge collection id |
    /// | `GLEANER_REVIEW_THRESHOLD` | `0.6` | Review flag threshold |
    /// | `GLEANER_QUICK_MAX_ATTEMPTS` | `3` | Quick-entry failures before cooldown |
    /// | `GLEANER_QUICK_COOLDOWN_SECS` | `1800` | Quick-entry cooldown |
    /// | `GLEANER_PROJECTS_FILE` | unset | JSON project catalog |
    /// | `GLEANER_PROP_*` | see [`PropertyNames`] | Column names |
    pub fn from_env() -> Result<Self> {
        let mut config = Self::new(
            required("GLEANER_NOTES_DB")?,
            required("GLEANER_TASKS_DB")?,
            required("GLEANER_KNOWLEDGE_DB")?,
        );

        if let Some(threshold) = parsed::<f32>("GLEANER_REVIEW_THRESHOLD") {
            config.review_threshold = threshold.clamp(0.0, 1.0);
        }
        if let Some(attempts) = parsed::<u32>("GLEANER_QUICK_MAX_ATTEMPTS") {
            config.quick_entry_max_attempts = attempts.max(1);
        }
        if let Some(secs) = parsed::<u64>("GLEANER_QUICK_COOLDOWN_SECS") {
            config.quick_entry_cooldown = Duration::from_secs(secs);
        }

        config.properties = PropertyNames::from_env();
        config.catalog = ProjectCatalog::from_env()?;
        Ok(config)
    }

    pub fn with_review_threshold(mut self, threshold: f32) -> Self {
        self.review_threshold = threshold;
        self
    }

    pub fn with_append_backoff(mut self, retries: u32, step: Duration) -> Self {
        self.append_retries = retries;
        self.append_backoff_step = step;
        self
    }

    pub fn with_quick_entry_cooldown(mut self, max_attempts: u32, cooldown: Duration) -> Self {
        self.quick_entry_max_attempts = max_attempts.max(1);
        self.quick_entry_cooldown = cooldown;
        self
    }

    pub fn with_properties(mut self, properties: PropertyNames) -> Self {
        self.properties = properties;
        self
    }

    pub fn with_catalog(mut self, catalog: ProjectCatalog) -> Self {
        self.catalog = catalog;
        self
    }
}

fn required(var: &str) -> Result<String> {
    std::env::var(var)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| Error::Config(format!("{} must be set", var)))
}

fn parsed<T: std::str::FromStr>(var: &str) -> Option<T> {
    std::env::var(var).ok().and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_uses_defaults() {
        let config = EngineConfig::new("notes", "tasks", "knowledge");
        assert_eq!(config.notes_db, "notes");
        assert_eq!(config.review_threshold, 0.6);
        assert_eq!(config.append_retries, 2);
        assert_eq!(config.append_backoff_step, Duration::from_secs(3));
        assert_eq!(config.quick_entry_max_attempts, 3);
        assert_eq!(config.quick_entry_cooldown, Duration::from_secs(1800));
        assert_eq!(config.catalog.fallback(), "General");
    }

    #[test]
    fn test_builders() {
        let config = EngineConfig::new("n", "t", "k")
            .with_review_threshold(0.9)
            .with_append_backoff(0, Duration::ZERO)
            .with_quick_entry_cooldown(0, Duration::from_secs(5));
        assert_eq!(config.review_threshold, 0.9);
        assert_eq!(config.append_retries, 0);
        assert_eq!(config.quick_entry_max_attempts, 1);
        assert_eq!(config.quick_entry_cooldown, Duration::from_secs(5));
    }

    #[test]
    fn test_required_rejects_missing() {
        let err = required("GLEANER_TEST_DEFINITELY_UNSET_VAR").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
