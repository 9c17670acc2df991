//! Classification backed by a chat model.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use gleaner_core::{
    CategorizedBundle, Category, ClassificationBackend, Error, GenerationBackend, ParsedTask,
    Result,
};

use crate::json::parse_json_lenient;
use crate::prompts::{categorize_prompt, parse_tasks_prompt, CATEGORIZE_SYSTEM, PARSE_TASKS_SYSTEM};

/// Model output for categorization. Values that are not strings are
/// stringified so a sloppy response still lands somewhere.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawBundle {
    credentials: Vec<Value>,
    contacts: Vec<Value>,
    links: Vec<Value>,
    decisions: Vec<Value>,
    other: Vec<Value>,
}

impl RawBundle {
    fn into_bundle(self) -> CategorizedBundle {
        CategorizedBundle {
            credentials: stringify(self.credentials),
            contacts: stringify(self.contacts),
            links: stringify(self.links),
            decisions: stringify(self.decisions),
            other: stringify(self.other),
        }
    }
}

fn stringify(values: Vec<Value>) -> Vec<String> {
    values
        .into_iter()
        .filter_map(|v| match v {
            Value::String(s) => Some(s),
            Value::Null => None,
            other => Some(other.to_string()),
        })
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Model output for one task; every field optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawTask {
    title: Option<String>,
    project: Option<String>,
    priority: Option<String>,
    due: Option<String>,
    context: Option<String>,
}

impl RawTask {
    fn into_task(self) -> Option<ParsedTask> {
        let title = self.title.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())?;
        Some(ParsedTask {
            title,
            project: self.project.map(|p| p.trim().to_string()).filter(|p| !p.is_empty()),
            priority: self.priority.and_then(|p| p.parse().ok()),
            due: self
                .due
                .and_then(|d| NaiveDate::parse_from_str(d.trim(), "%Y-%m-%d").ok()),
            context: self.context.unwrap_or_default(),
        })
    }
}

/// Lowercase alphanumerics only, so reformatted lines still match.
fn fingerprint(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Put any input bullet the model dropped into "other".
fn reconcile(mut bundle: CategorizedBundle, bullets: &[String]) -> CategorizedBundle {
    let seen: Vec<String> = bundle.lines().map(fingerprint).collect();
    let missing: Vec<String> = bullets
        .iter()
        .filter(|b| {
            let key = fingerprint(b);
            !key.is_empty() && !seen.iter().any(|line| line.contains(&key))
        })
        .cloned()
        .collect();
    if !missing.is_empty() {
        debug!(missing = missing.len(), "Model dropped bullets, filing under other");
        bundle.get_mut(Category::Other).extend(missing);
    }
    bundle
}

/// First non-empty line of `text`, used when task parsing degrades.
fn first_line(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or_default()
        .to_string()
}

/// [`ClassificationBackend`] driven by a [`GenerationBackend`].
pub struct LlmClassifier<B> {
    backend: B,
    name: String,
    projects: Vec<String>,
    today: Option<NaiveDate>,
}

impl<B: GenerationBackend> LlmClassifier<B> {
    pub fn new(backend: B) -> Self {
        let name = format!("llm:{}", backend.model_name());
        Self {
            backend,
            name,
            projects: Vec::new(),
            today: None,
        }
    }

    /// Known project names offered to the model as hints.
    pub fn with_projects(mut self, projects: Vec<String>) -> Self {
        self.projects = projects;
        self
    }

    /// Pin the reference date for relative due dates.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Utc::now().date_naive())
    }
}

#[async_trait]
impl<B: GenerationBackend> ClassificationBackend for LlmClassifier<B> {
    async fn categorize(&self, bullets: &[String]) -> Result<CategorizedBundle> {
        if bullets.is_empty() {
            return Ok(CategorizedBundle::default());
        }

        let raw = self
            .backend
            .generate_with_system(CATEGORIZE_SYSTEM, &categorize_prompt(bullets))
            .await?;

        let parsed: RawBundle = parse_json_lenient(&raw).map_err(|e| {
            Error::Classification(format!("Malformed categorize output: {}", e))
        })?;
        let bundle = reconcile(parsed.into_bundle(), bullets);

        debug!(
            subsystem = "inference",
            item_count = bundle.len(),
            "Categorized bullets"
        );
        Ok(bundle)
    }

    async fn parse_tasks(&self, text: &str) -> Result<Vec<ParsedTask>> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let prompt = parse_tasks_prompt(text, self.today(), &self.projects);
        let raw = self
            .backend
            .generate_with_system(PARSE_TASKS_SYSTEM, &prompt)
            .await?;

        let tasks: Vec<ParsedTask> = match parse_json_lenient::<Vec<RawTask>>(&raw) {
            Ok(raw_tasks) => raw_tasks.into_iter().filter_map(RawTask::into_task).collect(),
            Err(e) => {
                warn!(error = %e, "Malformed task output, using first line as title");
                Vec::new()
            }
        };

        if tasks.is_empty() {
            return Ok(vec![ParsedTask::from_title(first_line(text))]);
        }
        debug!(item_count = tasks.len(), "Parsed tasks");
        Ok(tasks)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
