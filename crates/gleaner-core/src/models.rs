//! Core data models for gleaner.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// CONTENT TREE
// =============================================================================

/// Kind of a content node, tagged by its discriminator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeKind {
    Heading { level: u8, text: String },
    Paragraph { text: String },
    BulletItem { text: String },
    NumberedItem { text: String },
    CheckItem { text: String, checked: bool },
    /// Embedded page owned by another part of the workspace.
    ChildPage { title: String },
    /// Embedded collection (inline database).
    ChildDatabase { title: String },
    Divider,
    /// Any block type the engine does not interpret.
    Other { raw_type: String },
}

impl NodeKind {
    /// Plain text carried by the node, if it is text-bearing.
    pub fn text(&self) -> Option<&str> {
        match self {
            NodeKind::Heading { text, .. }
            | NodeKind::Paragraph { text }
            | NodeKind::BulletItem { text }
            | NodeKind::NumberedItem { text }
            | NodeKind::CheckItem { text, .. } => Some(text),
            _ => None,
        }
    }

    pub fn is_heading(&self) -> bool {
        matches!(self, NodeKind::Heading { .. })
    }

    /// Child pages and databases are never descended into.
    pub fn is_embedded_collection(&self) -> bool {
        matches!(self, NodeKind::ChildPage { .. } | NodeKind::ChildDatabase { .. })
    }
}

/// One unit of rich content in a depth-first ordered node sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentNode {
    pub id: String,
    #[serde(flatten)]
    pub kind: NodeKind,
    #[serde(default)]
    pub has_children: bool,
}

impl ContentNode {
    pub fn new(id: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: id.into(),
            kind,
            has_children: false,
        }
    }

    pub fn heading(id: impl Into<String>, level: u8, text: impl Into<String>) -> Self {
        Self::new(
            id,
            NodeKind::Heading {
                level,
                text: text.into(),
            },
        )
    }

    pub fn paragraph(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(id, NodeKind::Paragraph { text: text.into() })
    }

    pub fn bullet(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(id, NodeKind::BulletItem { text: text.into() })
    }

    pub fn numbered(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(id, NodeKind::NumberedItem { text: text.into() })
    }

    pub fn check(id: impl Into<String>, text: impl Into<String>, checked: bool) -> Self {
        Self::new(
            id,
            NodeKind::CheckItem {
                text: text.into(),
                checked,
            },
        )
    }

    /// Mark the node as having children in the store.
    pub fn with_children(mut self) -> Self {
        self.has_children = true;
        self
    }
}

/// How deep a children fetch goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchDepth {
    /// Only the direct children of the node.
    TopLevel,
    /// Full depth-first traversal, stopping at embedded pages/databases.
    Recursive,
}

/// Half-open index range `[start, end)` over a node sequence.
///
/// `start` is the matched heading; `end` is the next heading or the
/// sequence length. `start < end` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Section {
    pub start: usize,
    pub end: usize,
}

impl Section {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn range(&self) -> std::ops::Range<usize> {
        self.start..self.end
    }

    /// Indices of the content after the heading.
    pub fn body(&self) -> std::ops::Range<usize> {
        self.start + 1..self.end
    }
}

// =============================================================================
// TASKS
// =============================================================================

/// A candidate actionable item harvested from a check item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub text: String,
    pub checked: bool,
    pub source_node_id: String,
}

/// Task workflow state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    #[default]
    Backlog,
    Next,
    Doing,
    Done,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Backlog => "Backlog",
            TaskStatus::Next => "Next",
            TaskStatus::Doing => "Doing",
            TaskStatus::Done => "Done",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "backlog" => Ok(Self::Backlog),
            "next" => Ok(Self::Next),
            "doing" | "in progress" => Ok(Self::Doing),
            "done" | "complete" | "completed" => Ok(Self::Done),
            _ => Err(format!("Invalid task status: {}", s)),
        }
    }
}

/// Task priority.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Priority {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "high" | "urgent" => Ok(Self::High),
            "medium" | "normal" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            _ => Err(format!("Invalid priority: {}", s)),
        }
    }
}

/// A task to persist in the task collection.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskRecord {
    pub title: String,
    pub status: TaskStatus,
    pub priority: Priority,
    pub due: Option<NaiveDate>,
    pub project: Option<String>,
    /// Back-reference to the document the task was harvested from.
    pub source_document_id: Option<String>,
    pub idempotency_key: Option<String>,
}

/// One task returned by the classification service's task parser.
///
/// Every field is defaulted so partial model output still yields a
/// schema-valid value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParsedTask {
    pub title: String,
    pub project: Option<String>,
    pub priority: Option<Priority>,
    pub due: Option<NaiveDate>,
    pub context: String,
}

impl ParsedTask {
    /// A task carrying only a title, used when parsing degrades.
    pub fn from_title(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }
}

// =============================================================================
// SOURCE DOCUMENTS & QUICK ENTRIES
// =============================================================================

/// A meeting/note record whose body is mined for tasks and knowledge.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceDocument {
    pub id: String,
    pub title: String,
    pub processed: bool,
    pub last_processed_at: Option<DateTime<Utc>>,
    /// Maintained by the store on every edit.
    pub last_edited_at: DateTime<Utc>,
    pub project: Option<String>,
    pub needs_review: bool,
}

/// A lightweight record with two optional free-text input channels.
#[derive(Debug, Clone, PartialEq)]
pub struct QuickEntryRecord {
    pub id: String,
    pub title: String,
    /// Task channel: free text to be parsed into tasks.
    pub task_text: Option<String>,
    pub project: Option<String>,
    pub priority: Option<Priority>,
    pub status: Option<TaskStatus>,
    pub due: Option<NaiveDate>,
    /// The task channel already ran but the info section still waits to be
    /// routed.
    pub info_pending: bool,
}

// =============================================================================
// KNOWLEDGE
// =============================================================================

/// Knowledge category produced by the classification service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Credentials,
    Contacts,
    Links,
    Decisions,
    Other,
}

impl Category {
    /// All categories in routing order.
    pub const ALL: [Category; 5] = [
        Category::Credentials,
        Category::Contacts,
        Category::Links,
        Category::Decisions,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Credentials => "credentials",
            Category::Contacts => "contacts",
            Category::Links => "links",
            Category::Decisions => "decisions",
            Category::Other => "other",
        }
    }

    /// Decisions and other share the decisions-log target.
    pub fn is_log(&self) -> bool {
        matches!(self, Category::Decisions | Category::Other)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classified bullets, one ordered list of formatted strings per category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategorizedBundle {
    pub credentials: Vec<String>,
    pub contacts: Vec<String>,
    pub links: Vec<String>,
    pub decisions: Vec<String>,
    pub other: Vec<String>,
}

impl CategorizedBundle {
    /// Everything filed under "other", used when classification fails.
    pub fn uncategorized(bullets: &[String]) -> Self {
        Self {
            other: bullets.to_vec(),
            ..Default::default()
        }
    }

    pub fn get(&self, category: Category) -> &[String] {
        match category {
            Category::Credentials => &self.credentials,
            Category::Contacts => &self.contacts,
            Category::Links => &self.links,
            Category::Decisions => &self.decisions,
            Category::Other => &self.other,
        }
    }

    pub fn get_mut(&mut self, category: Category) -> &mut Vec<String> {
        match category {
            Category::Credentials => &mut self.credentials,
            Category::Contacts => &mut self.contacts,
            Category::Links => &mut self.links,
            Category::Decisions => &mut self.decisions,
            Category::Other => &mut self.other,
        }
    }

    pub fn is_empty(&self) -> bool {
        Category::ALL.iter().all(|c| self.get(*c).is_empty())
    }

    /// Total number of entries across categories.
    pub fn len(&self) -> usize {
        Category::ALL.iter().map(|c| self.get(*c).len()).sum()
    }

    /// All entries in category order.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        Category::ALL
            .into_iter()
            .flat_map(move |c| self.get(c).iter().map(String::as_str))
    }

    /// Decisions followed by other, as one decisions-log batch.
    pub fn log_lines(&self) -> Vec<String> {
        self.decisions
            .iter()
            .chain(self.other.iter())
            .cloned()
            .collect()
    }
}

/// A pre-existing project page used as the routing target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnowledgeRecord {
    pub id: String,
    pub title: String,
}

/// How a project was resolved for a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InferenceSource {
    /// `#proj:<token>` tag in the body.
    Override,
    /// Title keyword table.
    Keyword,
    /// Nothing matched.
    Fallback,
}

/// Result of project inference.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectInference {
    pub project: String,
    pub confidence: f32,
    pub source: InferenceSource,
}

// =============================================================================
// STORE BOUNDARY
// =============================================================================

/// A date property value: calendar day or instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateValue {
    Day(NaiveDate),
    Instant(DateTime<Utc>),
}

impl DateValue {
    pub fn day(&self) -> NaiveDate {
        match self {
            DateValue::Day(d) => *d,
            DateValue::Instant(t) => t.date_naive(),
        }
    }

    /// Days are taken as midnight UTC.
    pub fn instant(&self) -> DateTime<Utc> {
        match self {
            DateValue::Day(d) => d.and_time(NaiveTime::MIN).and_utc(),
            DateValue::Instant(t) => *t,
        }
    }
}

/// A typed record property.
///
/// `Select(None)` and `Date(None)` encode "unset", which the store keeps
/// distinct from an empty string.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Title(String),
    Text(String),
    Select(Option<String>),
    Checkbox(bool),
    Date(Option<DateValue>),
    Relation(Vec<String>),
    Unsupported,
}

/// Record properties keyed by column name.
pub type PropertyMap = BTreeMap<String, PropertyValue>;

/// A record as listed from a collection.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreRecord {
    pub id: String,
    pub last_edited_at: DateTime<Utc>,
    pub archived: bool,
    pub properties: PropertyMap,
}

impl StoreRecord {
    /// Title or text property as a string slice.
    pub fn text(&self, name: &str) -> Option<&str> {
        match self.properties.get(name) {
            Some(PropertyValue::Title(s)) | Some(PropertyValue::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn select(&self, name: &str) -> Option<&str> {
        match self.properties.get(name) {
            Some(PropertyValue::Select(Some(s))) if !s.is_empty() => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn checkbox(&self, name: &str) -> bool {
        matches!(self.properties.get(name), Some(PropertyValue::Checkbox(true)))
    }

    pub fn date(&self, name: &str) -> Option<DateValue> {
        match self.properties.get(name) {
            Some(PropertyValue::Date(d)) => *d,
            _ => None,
        }
    }
}

/// Server-side record filter.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordFilter {
    TitleEquals { property: String, value: String },
    TextEquals { property: String, value: String },
    CheckboxEquals { property: String, value: bool },
    SelectEquals { property: String, value: String },
    SelectIsEmpty { property: String },
    And(Vec<RecordFilter>),
    Or(Vec<RecordFilter>),
}

impl RecordFilter {
    /// Evaluate the filter against a record (used by local stores).
    pub fn matches(&self, record: &StoreRecord) -> bool {
        match self {
            RecordFilter::TitleEquals { property, value }
            | RecordFilter::TextEquals { property, value } => {
                record.text(property) == Some(value.as_str())
            }
            RecordFilter::CheckboxEquals { property, value } => {
                record.checkbox(property) == *value
            }
            RecordFilter::SelectEquals { property, value } => {
                record.select(property) == Some(value.as_str())
            }
            RecordFilter::SelectIsEmpty { property } => record.select(property).is_none(),
            RecordFilter::And(filters) => filters.iter().all(|f| f.matches(record)),
            RecordFilter::Or(filters) => filters.iter().any(|f| f.matches(record)),
        }
    }
}

/// Sort order for listed records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RecordSort {
    #[default]
    LastEditedDescending,
    LastEditedAscending,
}

/// Query for listing records of a collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordQuery {
    pub filter: Option<RecordFilter>,
    pub sort: RecordSort,
}

impl RecordQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn filtered(filter: RecordFilter) -> Self {
        Self {
            filter: Some(filter),
            sort: RecordSort::default(),
        }
    }

    pub fn with_sort(mut self, sort: RecordSort) -> Self {
        self.sort = sort;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(props: Vec<(&str, PropertyValue)>) -> StoreRecord {
        StoreRecord {
            id: "r1".to_string(),
            last_edited_at: Utc::now(),
            archived: false,
            properties: props
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        }
    }

    #[test]
    fn test_task_status_round_trip_names() {
        for status in [
            TaskStatus::Backlog,
            TaskStatus::Next,
            TaskStatus::Doing,
            TaskStatus::Done,
        ] {
            assert_eq!(status.as_str().parse::<TaskStatus>().unwrap(), status);
        }
        assert!("archived".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn test_priority_parse_is_case_insensitive() {
        assert_eq!("HIGH".parse::<Priority>().unwrap(), Priority::High);
        assert_eq!(" low ".parse::<Priority>().unwrap(), Priority::Low);
        assert!("p1".parse::<Priority>().is_err());
    }

    #[test]
    fn test_defaults() {
        assert_eq!(TaskStatus::default(), TaskStatus::Backlog);
        assert_eq!(Priority::default(), Priority::Medium);
    }

    #[test]
    fn test_node_kind_text() {
        assert_eq!(
            ContentNode::check("a", "Email Karen", false).kind.text(),
            Some("Email Karen")
        );
        assert_eq!(NodeKind::Divider.text(), None);
        assert!(ContentNode::heading("h", 2, "Notes").kind.is_heading());
    }

    #[test]
    fn test_embedded_collections() {
        assert!(NodeKind::ChildPage {
            title: "Sub".into()
        }
        .is_embedded_collection());
        assert!(NodeKind::ChildDatabase {
            title: "Db".into()
        }
        .is_embedded_collection());
        assert!(!NodeKind::Divider.is_embedded_collection());
    }

    #[test]
    fn test_section_ranges() {
        let section = Section { start: 2, end: 5 };
        assert_eq!(section.len(), 3);
        assert_eq!(section.range(), 2..5);
        assert_eq!(section.body(), 3..5);
    }

    #[test]
    fn test_bundle_uncategorized() {
        let bullets = vec!["a".to_string(), "b".to_string()];
        let bundle = CategorizedBundle::uncategorized(&bullets);
        assert_eq!(bundle.other, bullets);
        assert!(bundle.credentials.is_empty());
        assert_eq!(bundle.len(), 2);
    }

    #[test]
    fn test_bundle_log_lines_orders_decisions_first() {
        let bundle = CategorizedBundle {
            decisions: vec!["ship friday".into()],
            other: vec!["misc".into()],
            ..Default::default()
        };
        assert_eq!(bundle.log_lines(), vec!["ship friday", "misc"]);
    }

    #[test]
    fn test_bundle_deserializes_with_missing_keys() {
        let bundle: CategorizedBundle =
            serde_json::from_str(r#"{"links": ["https://x.io"]}"#).unwrap();
        assert_eq!(bundle.links, vec!["https://x.io"]);
        assert!(bundle.decisions.is_empty());
    }

    #[test]
    fn test_bundle_lines_in_category_order() {
        let bundle = CategorizedBundle {
            credentials: vec!["pw".into()],
            other: vec!["x".into()],
            links: vec!["l".into()],
            ..Default::default()
        };
        let lines: Vec<&str> = bundle.lines().collect();
        assert_eq!(lines, vec!["pw", "l", "x"]);
    }

    #[test]
    fn test_date_value_day_is_midnight_utc() {
        let day = NaiveDate::from_ymd_opt(2026, 10, 23).unwrap();
        let instant = DateValue::Day(day).instant();
        assert_eq!(instant.to_rfc3339(), "2026-10-23T00:00:00+00:00");
        assert_eq!(DateValue::Instant(instant).day(), day);
    }

    #[test]
    fn test_store_record_accessors() {
        let r = record(vec![
            ("Name", PropertyValue::Title("Weekly sync".into())),
            ("Processed", PropertyValue::Checkbox(true)),
            ("Project", PropertyValue::Select(None)),
            ("Status", PropertyValue::Select(Some("Backlog".into()))),
        ]);
        assert_eq!(r.text("Name"), Some("Weekly sync"));
        assert!(r.checkbox("Processed"));
        assert!(!r.checkbox("Missing"));
        assert_eq!(r.select("Project"), None);
        assert_eq!(r.select("Status"), Some("Backlog"));
        assert_eq!(r.date("Due"), None);
    }

    #[test]
    fn test_record_filter_matches() {
        let r = record(vec![
            ("Name", PropertyValue::Title("HubSpot".into())),
            ("Processed", PropertyValue::Checkbox(false)),
            ("Status", PropertyValue::Select(None)),
        ]);
        let title = RecordFilter::TitleEquals {
            property: "Name".into(),
            value: "HubSpot".into(),
        };
        let wrong_case = RecordFilter::TitleEquals {
            property: "Name".into(),
            value: "hubspot".into(),
        };
        assert!(title.matches(&r));
        assert!(!wrong_case.matches(&r));
        assert!(RecordFilter::SelectIsEmpty {
            property: "Status".into()
        }
        .matches(&r));
        assert!(RecordFilter::Or(vec![wrong_case.clone(), title.clone()]).matches(&r));
        assert!(!RecordFilter::And(vec![wrong_case, title]).matches(&r));
    }
}
