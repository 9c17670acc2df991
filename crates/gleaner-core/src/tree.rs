//! Depth-first flattening of a store's block tree.

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::keywords::FOREIGN_OWNED_KINDS;
use crate::models::{ContentNode, NodeKind};
use crate::traits::DocumentStore;

/// What to do when the children of a node cannot be fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildPolicy {
    /// Keep the node, drop its subtree, continue the traversal.
    Skip,
    /// Abort the traversal with the error.
    Propagate,
}

/// Policy for a failed children fetch.
///
/// Only embedded, foreign-owned node kinds are skipped, and only for
/// non-transient errors. Anything else propagates so the document is
/// retried on the next cycle instead of being processed with holes.
pub fn on_inaccessible_child(kind: &NodeKind, err: &Error) -> ChildPolicy {
    match kind {
        NodeKind::Other { raw_type }
            if FOREIGN_OWNED_KINDS.contains(&raw_type.as_str()) && !err.is_transient() =>
        {
            ChildPolicy::Skip
        }
        _ => ChildPolicy::Propagate,
    }
}

/// Pre-order traversal from `root_id`, returning every descendant in
/// document order. Child pages and child databases are returned as nodes
/// but never descended into.
pub async fn walk<S>(store: &S, root_id: &str) -> Result<Vec<ContentNode>>
where
    S: DocumentStore + ?Sized,
{
    let mut out = Vec::new();
    let mut stack: Vec<ContentNode> = store.list_children(root_id).await?;
    stack.reverse();

    while let Some(node) = stack.pop() {
        let descend = node.has_children && !node.kind.is_embedded_collection();
        let id = node.id.clone();
        let kind = node.kind.clone();
        out.push(node);

        if !descend {
            continue;
        }

        match store.list_children(&id).await {
            Ok(mut children) => {
                children.reverse();
                stack.extend(children);
            }
            Err(err) => match on_inaccessible_child(&kind, &err) {
                ChildPolicy::Skip => {
                    warn!(node_id = %id, error = %err, "Skipping inaccessible child subtree");
                }
                ChildPolicy::Propagate => return Err(err),
            },
        }
    }

    debug!(root_id, node_count = out.len(), "Block tree flattened");
    Ok(out)
}
