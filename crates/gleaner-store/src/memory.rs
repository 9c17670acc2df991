//! In-memory document store.
//!
//! Behaves like the remote store closely enough to drive the engine in
//! tests and dry runs: records live in named collections, content nodes
//! form per-parent ordered child lists, edit timestamps are truncated to
//! the minute, and faults can be injected per operation.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, DurationRound, TimeDelta, Utc};
use tracing::debug;
use uuid::Uuid;

use gleaner_core::{
    ContentNode, DocumentStore, Error, PropertyMap, RecordQuery, RecordSort, Result, StoreRecord,
};

/// Store operations, for fault injection and call accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    ListDue,
    ListChildren,
    Create,
    Update,
    AppendAfter,
    DeleteNode,
    Archive,
}

/// Kind of injected failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    RateLimited,
    Timeout,
    NotFound,
    Permanent,
}

impl FaultKind {
    fn to_error(self, op: StoreOp) -> Error {
        let message = format!("injected fault on {:?}", op);
        match self {
            FaultKind::RateLimited => Error::RateLimited(message),
            FaultKind::Timeout => Error::Timeout(message),
            FaultKind::NotFound => Error::NotFound(message),
            FaultKind::Permanent => Error::Remote {
                status: 400,
                message,
            },
        }
    }
}

/// One recorded append call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppendCall {
    pub parent_id: String,
    pub after_id: String,
    pub lines: Vec<String>,
}

#[derive(Debug, Clone)]
struct StoredRecord {
    collection: String,
    record: StoreRecord,
}

#[derive(Default)]
struct State {
    records: BTreeMap<String, StoredRecord>,
    children: HashMap<String, Vec<ContentNode>>,
    /// Faults consumed by the next calls of an operation.
    faults: HashMap<StoreOp, Vec<FaultKind>>,
    /// Faults that always fire for a given target id.
    target_faults: HashMap<(StoreOp, String), FaultKind>,
    calls: HashMap<StoreOp, usize>,
    appends: Vec<AppendCall>,
}

impl State {
    fn enter(&mut self, op: StoreOp, target: &str) -> Result<()> {
        *self.calls.entry(op).or_default() += 1;
        if let Some(kind) = self.target_faults.get(&(op, target.to_string())) {
            return Err(kind.to_error(op));
        }
        if let Some(queue) = self.faults.get_mut(&op) {
            if !queue.is_empty() {
                return Err(queue.remove(0).to_error(op));
            }
        }
        Ok(())
    }

    fn node_exists(&self, id: &str) -> bool {
        self.children
            .values()
            .any(|nodes| nodes.iter().any(|n| n.id == id))
    }

    fn with_child_flags(&self, nodes: &[ContentNode]) -> Vec<ContentNode> {
        nodes
            .iter()
            .map(|n| {
                let mut node = n.clone();
                node.has_children = node.has_children
                    || self.children.get(&n.id).is_some_and(|c| !c.is_empty());
                node
            })
            .collect()
    }

    fn remove_subtree(&mut self, id: &str) {
        if let Some(children) = self.children.remove(id) {
            for child in children {
                self.remove_subtree(&child.id);
            }
        }
    }

    fn touch(&mut self, id: &str) {
        if let Some(stored) = self.records.get_mut(id) {
            stored.record.last_edited_at = edit_timestamp(Utc::now());
        }
    }
}

/// Edit timestamps carry minute precision.
fn edit_timestamp(at: DateTime<Utc>) -> DateTime<Utc> {
    at.duration_trunc(TimeDelta::minutes(1)).unwrap_or(at)
}

fn new_id() -> String {
    Uuid::now_v7().to_string()
}

/// Thread-safe in-memory [`DocumentStore`].
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ---- seeding ------------------------------------------------------------

    /// Insert a record directly, bypassing faults. Returns its id.
    pub fn insert_record(&self, collection: &str, properties: PropertyMap) -> String {
        let id = new_id();
        let record = StoreRecord {
            id: id.clone(),
            last_edited_at: edit_timestamp(Utc::now()),
            archived: false,
            properties,
        };
        self.state().records.insert(
            id.clone(),
            StoredRecord {
                collection: collection.to_string(),
                record,
            },
        );
        id
    }

    /// Replace the children of a record or node.
    pub fn set_children(&self, parent_id: &str, nodes: Vec<ContentNode>) {
        self.state().children.insert(parent_id.to_string(), nodes);
    }

    /// Set a record's edit timestamp, as an external edit would.
    pub fn touch(&self, id: &str, at: DateTime<Utc>) {
        if let Some(stored) = self.state().records.get_mut(id) {
            stored.record.last_edited_at = edit_timestamp(at);
        }
    }

    // ---- faults -------------------------------------------------------------

    /// Fail the next `times` calls of `op`.
    pub fn inject_fault(&self, op: StoreOp, kind: FaultKind, times: usize) {
        self.state()
            .faults
            .entry(op)
            .or_default()
            .extend(std::iter::repeat(kind).take(times));
    }

    /// Fail every call of `op` that targets `id`.
    pub fn fail_target(&self, op: StoreOp, id: &str, kind: FaultKind) {
        self.state()
            .target_faults
            .insert((op, id.to_string()), kind);
    }

    pub fn clear_faults(&self) {
        let mut state = self.state();
        state.faults.clear();
        state.target_faults.clear();
    }

    // ---- inspection ---------------------------------------------------------

    pub fn record(&self, id: &str) -> Option<StoreRecord> {
        self.state().records.get(id).map(|s| s.record.clone())
    }

    /// All records of a collection, archived ones included.
    pub fn records(&self, collection: &str) -> Vec<StoreRecord> {
        self.state()
            .records
            .values()
            .filter(|s| s.collection == collection)
            .map(|s| s.record.clone())
            .collect()
    }

    pub fn children(&self, parent_id: &str) -> Vec<ContentNode> {
        self.state()
            .children
            .get(parent_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn call_count(&self, op: StoreOp) -> usize {
        self.state().calls.get(&op).copied().unwrap_or(0)
    }

    pub fn appends(&self) -> Vec<AppendCall> {
        self.state().appends.clone()
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn list_due(&self, collection_id: &str, query: &RecordQuery) -> Result<Vec<StoreRecord>> {
        let mut state = self.state();
        state.enter(StoreOp::ListDue, collection_id)?;

        let mut records: Vec<StoreRecord> = state
            .records
            .values()
            .filter(|s| s.collection == collection_id && !s.record.archived)
            .filter(|s| query.filter.as_ref().map_or(true, |f| f.matches(&s.record)))
            .map(|s| s.record.clone())
            .collect();

        match query.sort {
            RecordSort::LastEditedDescending => {
                records.sort_by(|a, b| b.last_edited_at.cmp(&a.last_edited_at))
            }
            RecordSort::LastEditedAscending => {
                records.sort_by(|a, b| a.last_edited_at.cmp(&b.last_edited_at))
            }
        }
        Ok(records)
    }

    async fn list_children(&self, node_id: &str) -> Result<Vec<ContentNode>> {
        let mut state = self.state();
        state.enter(StoreOp::ListChildren, node_id)?;

        match state.children.get(node_id) {
            Some(nodes) => Ok(state.with_child_flags(nodes)),
            None if state.records.contains_key(node_id) || state.node_exists(node_id) => {
                Ok(Vec::new())
            }
            None => Err(Error::NotFound(format!("block {}", node_id))),
        }
    }

    async fn create(&self, collection_id: &str, properties: PropertyMap) -> Result<String> {
        self.state().enter(StoreOp::Create, collection_id)?;
        let id = self.insert_record(collection_id, properties);
        debug!(record_id = %id, collection = collection_id, "Created in-memory record");
        Ok(id)
    }

    async fn update(&self, id: &str, properties: PropertyMap) -> Result<()> {
        let mut state = self.state();
        state.enter(StoreOp::Update, id)?;
        let stored = state
            .records
            .get_mut(id)
            .ok_or_else(|| Error::NotFound(format!("page {}", id)))?;
        stored.record.properties.extend(properties);
        state.touch(id);
        Ok(())
    }

    async fn append_after(&self, parent_id: &str, after_id: &str, lines: &[String]) -> Result<()> {
        let mut state = self.state();
        state.enter(StoreOp::AppendAfter, parent_id)?;

        let siblings = state
            .children
            .get_mut(parent_id)
            .ok_or_else(|| Error::NotFound(format!("block {}", parent_id)))?;
        let position = siblings
            .iter()
            .position(|n| n.id == after_id)
            .ok_or_else(|| Error::NotFound(format!("block {} under {}", after_id, parent_id)))?;

        let new_nodes = lines.iter().map(|line| ContentNode::bullet(new_id(), line.clone()));
        siblings.splice(position + 1..position + 1, new_nodes);

        state.appends.push(AppendCall {
            parent_id: parent_id.to_string(),
            after_id: after_id.to_string(),
            lines: lines.to_vec(),
        });
        state.touch(parent_id);
        Ok(())
    }

    async fn delete_node(&self, id: &str) -> Result<()> {
        let mut state = self.state();
        state.enter(StoreOp::DeleteNode, id)?;

        let parent = state
            .children
            .iter()
            .find(|(_, nodes)| nodes.iter().any(|n| n.id == id))
            .map(|(parent, _)| parent.clone())
            .ok_or_else(|| Error::NotFound(format!("block {}", id)))?;

        if let Some(nodes) = state.children.get_mut(&parent) {
            nodes.retain(|n| n.id != id);
        }
        state.remove_subtree(id);
        state.touch(&parent);
        Ok(())
    }

    async fn archive(&self, id: &str) -> Result<()> {
        let mut state = self.state();
        state.enter(StoreOp::Archive, id)?;
        let stored = state
            .records
            .get_mut(id)
            .ok_or_else(|| Error::NotFound(format!("page {}", id)))?;
        stored.record.archived = true;
        Ok(())
    }
}
