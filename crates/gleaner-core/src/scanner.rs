//! Heading-bounded section scanning over a flat node sequence.
//!
//! The node sequence is the depth-first flattening of a document's block
//! tree. A section starts at the first heading matching a target phrase
//! and ends at the next heading of any kind, or at the end of the
//! sequence.

use tracing::trace;

use crate::classify::{heading_matches, starts_with_bullet, strip_bullet};
use crate::defaults::MIN_PARAGRAPH_CHARS;
use crate::models::{ContentNode, NodeKind, Section, WorkItem};

/// Find the section under the first heading whose text satisfies
/// `predicate`. Later headings that also match are ignored.
pub fn find_section_by<P>(nodes: &[ContentNode], predicate: P) -> Option<Section>
where
    P: Fn(&str) -> bool,
{
    let start = nodes.iter().position(|node| match &node.kind {
        NodeKind::Heading { text, .. } => predicate(text),
        _ => false,
    })?;

    let end = nodes[start + 1..]
        .iter()
        .position(|node| node.kind.is_heading())
        .map(|offset| start + 1 + offset)
        .unwrap_or(nodes.len());

    trace!(start, end, "Section located");
    Some(Section { start, end })
}

/// Find the section under the first heading containing `target`
/// (case-folded, trimmed).
pub fn find_section(nodes: &[ContentNode], target: &str) -> Option<Section> {
    find_section_by(nodes, |heading| heading_matches(heading, target))
}

/// Collect the text content of `nodes[start..end]`.
///
/// Bullet and numbered items are always taken. Paragraphs are taken only
/// when they start with a bullet glyph or are longer than
/// [`MIN_PARAGRAPH_CHARS`]. Leading glyphs are stripped and empty lines
/// dropped.
pub fn extract_leaf_text(nodes: &[ContentNode], start: usize, end: usize) -> Vec<String> {
    let end = end.min(nodes.len());
    if start >= end {
        return Vec::new();
    }

    nodes[start..end]
        .iter()
        .filter_map(|node| match &node.kind {
            NodeKind::BulletItem { text } | NodeKind::NumberedItem { text } => Some(text),
            NodeKind::Paragraph { text } => {
                let trimmed = text.trim();
                (starts_with_bullet(trimmed) || trimmed.chars().count() > MIN_PARAGRAPH_CHARS)
                    .then_some(text)
            }
            _ => None,
        })
        .map(|text| strip_bullet(text).to_string())
        .filter(|text| !text.is_empty())
        .collect()
}

/// Leaf text of the section under `target`, empty when there is none.
pub fn section_text(nodes: &[ContentNode], target: &str) -> Vec<String> {
    find_section(nodes, target)
        .map(|section| extract_leaf_text(nodes, section.start, section.end))
        .unwrap_or_default()
}

/// Every non-empty check item in the sequence, in document order.
pub fn collect_work_items(nodes: &[ContentNode]) -> Vec<WorkItem> {
    nodes
        .iter()
        .filter_map(|node| match &node.kind {
            NodeKind::CheckItem { text, checked } => {
                let text = text.trim();
                (!text.is_empty()).then(|| WorkItem {
                    text: text.to_string(),
                    checked: *checked,
                    source_node_id: node.id.clone(),
                })
            }
            _ => None,
        })
        .collect()
}
