//! Notion API request and response types.
//!
//! Every payload is decoded into a tagged variant keyed by the API's
//! `type` discriminator and converted into the strict model types before
//! leaving this module.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use gleaner_core::{
    ContentNode, DateValue, Error, NodeKind, PropertyMap, PropertyValue, RecordFilter,
    RecordQuery, RecordSort, Result, StoreRecord,
};

/// Maximum characters of a single rich text object.
pub const RICH_TEXT_LIMIT: usize = 2000;

// =============================================================================
// LIST ENVELOPE
// =============================================================================

/// Paginated list response.
#[derive(Debug, Deserialize)]
pub struct ListResponse<T> {
    pub results: Vec<T>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

// =============================================================================
// RICH TEXT
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct RichText {
    #[serde(default)]
    pub plain_text: String,
}

pub fn plain_text(parts: &[RichText]) -> String {
    parts.iter().map(|p| p.plain_text.as_str()).collect()
}

/// Rich text array for a write, split at the per-object limit.
pub fn rich_text_json(content: &str) -> Value {
    let chars: Vec<char> = content.chars().collect();
    let parts: Vec<Value> = chars
        .chunks(RICH_TEXT_LIMIT)
        .map(|chunk| {
            let text: String = chunk.iter().collect();
            json!({ "type": "text", "text": { "content": text } })
        })
        .collect();
    Value::Array(parts)
}

// =============================================================================
// BLOCKS
// =============================================================================

/// Fields shared by every block.
#[derive(Debug, Deserialize)]
pub struct BlockHeader {
    pub id: String,
    #[serde(default)]
    pub has_children: bool,
    #[serde(rename = "type")]
    pub block_type: String,
}

#[derive(Debug, Deserialize)]
pub struct TextBody {
    #[serde(default)]
    pub rich_text: Vec<RichText>,
}

#[derive(Debug, Deserialize)]
pub struct ToDoBody {
    #[serde(default)]
    pub rich_text: Vec<RichText>,
    #[serde(default)]
    pub checked: bool,
}

#[derive(Debug, Deserialize)]
pub struct TitleBody {
    #[serde(default)]
    pub title: String,
}

/// Block payload keyed by its `type`.
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum BlockBody {
    #[serde(rename = "heading_1")]
    Heading1 { heading_1: TextBody },
    #[serde(rename = "heading_2")]
    Heading2 { heading_2: TextBody },
    #[serde(rename = "heading_3")]
    Heading3 { heading_3: TextBody },
    #[serde(rename = "paragraph")]
    Paragraph { paragraph: TextBody },
    #[serde(rename = "bulleted_list_item")]
    BulletedListItem { bulleted_list_item: TextBody },
    #[serde(rename = "numbered_list_item")]
    NumberedListItem { numbered_list_item: TextBody },
    #[serde(rename = "to_do")]
    ToDo { to_do: ToDoBody },
    #[serde(rename = "child_page")]
    ChildPage { child_page: TitleBody },
    #[serde(rename = "child_database")]
    ChildDatabase { child_database: TitleBody },
    #[serde(rename = "divider")]
    Divider,
    #[serde(other)]
    Unsupported,
}

/// Convert one raw block into a [`ContentNode`].
pub fn block_to_node(raw: Value) -> Result<ContentNode> {
    let header: BlockHeader = serde_json::from_value(raw.clone())?;
    let body: BlockBody = serde_json::from_value(raw)?;

    let kind = match body {
        BlockBody::Heading1 { heading_1: b } => heading(1, b),
        BlockBody::Heading2 { heading_2: b } => heading(2, b),
        BlockBody::Heading3 { heading_3: b } => heading(3, b),
        BlockBody::Paragraph { paragraph: b } => NodeKind::Paragraph {
            text: plain_text(&b.rich_text),
        },
        BlockBody::BulletedListItem {
            bulleted_list_item: b,
        } => NodeKind::BulletItem {
            text: plain_text(&b.rich_text),
        },
        BlockBody::NumberedListItem {
            numbered_list_item: b,
        } => NodeKind::NumberedItem {
            text: plain_text(&b.rich_text),
        },
        BlockBody::ToDo { to_do } => NodeKind::CheckItem {
            text: plain_text(&to_do.rich_text),
            checked: to_do.checked,
        },
        BlockBody::ChildPage { child_page } => NodeKind::ChildPage {
            title: child_page.title,
        },
        BlockBody::ChildDatabase { child_database } => NodeKind::ChildDatabase {
            title: child_database.title,
        },
        BlockBody::Divider => NodeKind::Divider,
        BlockBody::Unsupported => NodeKind::Other {
            raw_type: header.block_type,
        },
    };

    Ok(ContentNode {
        id: header.id,
        kind,
        has_children: header.has_children,
    })
}

fn heading(level: u8, body: TextBody) -> NodeKind {
    NodeKind::Heading {
        level,
        text: plain_text(&body.rich_text),
    }
}

/// A bulleted list item block for an append request.
pub fn bullet_block_json(line: &str) -> Value {
    json!({
        "object": "block",
        "type": "bulleted_list_item",
        "bulleted_list_item": { "rich_text": rich_text_json(line) }
    })
}

/// Block returned from an append; only the id is needed.
#[derive(Debug, Deserialize)]
pub struct CreatedBlock {
    pub id: String,
}

// =============================================================================
// PAGES AND PROPERTIES
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct SelectOption {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireDate {
    pub start: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RelationRef {
    pub id: String,
}

/// Page property keyed by its `type`.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WireProperty {
    Title {
        #[serde(default)]
        title: Vec<RichText>,
    },
    RichText {
        #[serde(default)]
        rich_text: Vec<RichText>,
    },
    Select {
        select: Option<SelectOption>,
    },
    Status {
        status: Option<SelectOption>,
    },
    Checkbox {
        #[serde(default)]
        checkbox: bool,
    },
    Date {
        date: Option<WireDate>,
    },
    Relation {
        #[serde(default)]
        relation: Vec<RelationRef>,
    },
    #[serde(other)]
    Unsupported,
}

impl WireProperty {
    /// Status properties read the same as selects.
    pub fn into_value(self) -> Result<PropertyValue> {
        Ok(match self {
            WireProperty::Title { title } => PropertyValue::Title(plain_text(&title)),
            WireProperty::RichText { rich_text } => PropertyValue::Text(plain_text(&rich_text)),
            WireProperty::Select { select: opt } | WireProperty::Status { status: opt } => {
                PropertyValue::Select(opt.map(|o| o.name))
            }
            WireProperty::Checkbox { checkbox } => PropertyValue::Checkbox(checkbox),
            WireProperty::Date { date } => {
                PropertyValue::Date(date.map(|d| parse_date(&d.start)).transpose()?)
            }
            WireProperty::Relation { relation } => {
                PropertyValue::Relation(relation.into_iter().map(|r| r.id).collect())
            }
            WireProperty::Unsupported => PropertyValue::Unsupported,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct WirePage {
    pub id: String,
    pub last_edited_time: String,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl WirePage {
    pub fn into_record(self) -> Result<StoreRecord> {
        let mut properties = PropertyMap::new();
        for (name, raw) in self.properties {
            let wire: WireProperty = serde_json::from_value(raw)?;
            properties.insert(name, wire.into_value()?);
        }
        Ok(StoreRecord {
            id: self.id,
            last_edited_at: parse_timestamp(&self.last_edited_time)?,
            archived: self.archived,
            properties,
        })
    }
}

/// Created page; only the id is needed.
#[derive(Debug, Deserialize)]
pub struct CreatedPage {
    pub id: String,
}

pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| Error::Serialization(format!("Invalid timestamp '{}': {}", raw, e)))
}

/// A date property start: a bare day or a full timestamp.
pub fn parse_date(raw: &str) -> Result<DateValue> {
    if raw.len() == 10 {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map(DateValue::Day)
            .map_err(|e| Error::Serialization(format!("Invalid date '{}': {}", raw, e)))
    } else {
        parse_timestamp(raw).map(DateValue::Instant)
    }
}

/// Property value as written in a create or update request. `None` for
/// read-only values.
pub fn property_json(value: &PropertyValue) -> Option<Value> {
    let json = match value {
        PropertyValue::Title(s) => json!({ "title": rich_text_json(s) }),
        PropertyValue::Text(s) => json!({ "rich_text": rich_text_json(s) }),
        PropertyValue::Select(Some(name)) => json!({ "select": { "name": name } }),
        PropertyValue::Select(None) => json!({ "select": null }),
        PropertyValue::Checkbox(b) => json!({ "checkbox": b }),
        PropertyValue::Date(Some(DateValue::Day(d))) => {
            json!({ "date": { "start": d.format("%Y-%m-%d").to_string() } })
        }
        PropertyValue::Date(Some(DateValue::Instant(t))) => {
            json!({ "date": { "start": t.to_rfc3339() } })
        }
        PropertyValue::Date(None) => json!({ "date": null }),
        PropertyValue::Relation(ids) => {
            let refs: Vec<Value> = ids.iter().map(|id| json!({ "id": id })).collect();
            json!({ "relation": refs })
        }
        PropertyValue::Unsupported => return None,
    };
    Some(json)
}

pub fn properties_json(properties: &PropertyMap) -> Value {
    let map: Map<String, Value> = properties
        .iter()
        .filter_map(|(name, value)| property_json(value).map(|v| (name.clone(), v)))
        .collect();
    Value::Object(map)
}

// =============================================================================
// QUERIES
// =============================================================================

pub fn filter_json(filter: &RecordFilter) -> Value {
    match filter {
        RecordFilter::TitleEquals { property, value } => {
            json!({ "property": property, "title": { "equals": value } })
        }
        RecordFilter::TextEquals { property, value } => {
            json!({ "property": property, "rich_text": { "equals": value } })
        }
        RecordFilter::CheckboxEquals { property, value } => {
            json!({ "property": property, "checkbox": { "equals": value } })
        }
        RecordFilter::SelectEquals { property, value } => {
            json!({ "property": property, "select": { "equals": value } })
        }
        RecordFilter::SelectIsEmpty { property } => {
            json!({ "property": property, "select": { "is_empty": true } })
        }
        RecordFilter::And(filters) => {
            json!({ "and": filters.iter().map(filter_json).collect::<Vec<_>>() })
        }
        RecordFilter::Or(filters) => {
            json!({ "or": filters.iter().map(filter_json).collect::<Vec<_>>() })
        }
    }
}

/// Body of a database query request.
#[derive(Debug, Serialize)]
pub struct QueryRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<Value>,
    pub sorts: Vec<Value>,
    pub page_size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_cursor: Option<String>,
}

impl QueryRequest {
    pub fn new(query: &RecordQuery, page_size: u32, start_cursor: Option<String>) -> Self {
        let direction = match query.sort {
            RecordSort::LastEditedDescending => "descending",
            RecordSort::LastEditedAscending => "ascending",
        };
        Self {
            filter: query.filter.as_ref().map(filter_json),
            sorts: vec![json!({ "timestamp": "last_edited_time", "direction": direction })],
            page_size,
            start_cursor,
        }
    }
}

// =============================================================================
// ERRORS
// =============================================================================

/// Error body returned by the API.
#[derive(Debug, Default, Deserialize)]
pub struct NotionErrorBody {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}
