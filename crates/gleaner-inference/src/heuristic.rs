//! Deterministic, offline classification.
//!
//! Used when no chat model is configured and throughout the test suites.
//! Every rule is a keyword or pattern test over a single line.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use gleaner_core::classify::{contains_any, priority_from_text, resolve_due, strip_bullet};
use gleaner_core::keywords::{CREDENTIAL_TERMS, DECISION_TERMS};
use gleaner_core::{
    CategorizedBundle, Category, ClassificationBackend, ParsedTask, ProjectCatalog, Result,
};

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b[a-z0-9._%+\-]+@[a-z0-9.\-]+\.[a-z]{2,}\b").expect("valid email pattern")
});

// Ten or more digits, so ISO dates do not read as phone numbers.
static PHONE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:\+\d{1,3}[\s.\-]?)?\(?\b\d{3}\)?[\s.\-]?\d{3}[\s.\-]?\d{4}\b")
        .expect("valid phone pattern")
});

const LINK_MARKERS: &[&str] = &["http://", "https://", "www."];

/// Category for one line, by precedence credentials, contacts, links,
/// decisions, other.
pub fn categorize_line(line: &str) -> Category {
    if contains_any(line, CREDENTIAL_TERMS) {
        Category::Credentials
    } else if EMAIL.is_match(line)
        || PHONE.is_match(line)
        || line.trim_start().to_lowercase().starts_with("contact")
    {
        Category::Contacts
    } else if contains_any(line, LINK_MARKERS) {
        Category::Links
    } else if contains_any(line, DECISION_TERMS) {
        Category::Decisions
    } else {
        Category::Other
    }
}

/// Keyword-rule [`ClassificationBackend`].
#[derive(Debug, Clone, Default)]
pub struct HeuristicClassifier {
    catalog: ProjectCatalog,
    today: Option<NaiveDate>,
}

impl HeuristicClassifier {
    pub fn new(catalog: ProjectCatalog) -> Self {
        Self {
            catalog,
            today: None,
        }
    }

    /// Pin the reference date for relative due dates.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Utc::now().date_naive())
    }

    fn task_from_line(&self, line: &str, today: NaiveDate) -> ParsedTask {
        ParsedTask {
            title: line.to_string(),
            project: self.catalog.match_keywords(line).map(str::to_string),
            priority: Some(priority_from_text(line)),
            due: resolve_due(line, today),
            context: String::new(),
        }
    }
}

#[async_trait]
impl ClassificationBackend for HeuristicClassifier {
    async fn categorize(&self, bullets: &[String]) -> Result<CategorizedBundle> {
        let mut bundle = CategorizedBundle::default();
        for bullet in bullets {
            let line = strip_bullet(bullet);
            if line.is_empty() {
                continue;
            }
            bundle.get_mut(categorize_line(line)).push(line.to_string());
        }
        Ok(bundle)
    }

    async fn parse_tasks(&self, text: &str) -> Result<Vec<ParsedTask>> {
        let today = self.today();
        Ok(text
            .lines()
            .map(strip_bullet)
            .filter(|l| !l.is_empty())
            .map(|l| self.task_from_line(l, today))
            .collect())
    }

    fn name(&self) -> &str {
        "heuristic"
    }
}
