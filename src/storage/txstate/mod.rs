//! Transaction-local change set.
//!
//! [`TxState`] records what the active transaction has done to nodes before
//! commit: creations, deletions, label additions and removals, and property
//! replacements. It is owned by one transaction and dropped at commit or
//! rollback. Index queries read it through a shared borrow for the length of
//! one call and never mutate it.

mod diff;

use std::collections::BTreeMap;

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::storage::types::PropValueOwned;
use crate::types::{LabelId, NodeId, PropId};

pub use diff::{IndexDiff, IndexMembership};

/// Net effect of the transaction on one label of one node.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LabelChange {
    /// Label added by the transaction.
    Added,
    /// Label removed by the transaction.
    Removed,
    /// Committed membership applies.
    Unchanged,
}

/// Transaction-local state of one property of one node.
#[derive(Clone, Debug, PartialEq)]
pub enum PropChange {
    /// Property set to a new value.
    Set(PropValueOwned),
    /// Property removed.
    Removed,
}

#[derive(Clone, Debug, Default)]
struct NodeChanges {
    labels_added: SmallVec<[LabelId; 4]>,
    labels_removed: SmallVec<[LabelId; 4]>,
    props: BTreeMap<PropId, PropChange>,
}

/// Pending node changes of one transaction.
#[derive(Clone, Debug, Default)]
pub struct TxState {
    created: FxHashSet<NodeId>,
    deleted: FxHashSet<NodeId>,
    nodes: FxHashMap<NodeId, NodeChanges>,
    by_label: FxHashMap<LabelId, FxHashSet<NodeId>>,
    by_prop: FxHashMap<PropId, FxHashSet<NodeId>>,
}

impl TxState {
    /// Creates an empty change set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a node created by this transaction.
    pub fn node_do_create(&mut self, node: NodeId) {
        self.created.insert(node);
        self.deleted.remove(&node);
        self.nodes.entry(node).or_default();
    }

    /// Records a node deletion.
    pub fn node_do_delete(&mut self, node: NodeId) {
        self.deleted.insert(node);
    }

    /// Records a label addition; cancels a pending removal of the same label.
    ///
    /// Callers only add labels the node does not currently carry.
    pub fn node_do_add_label(&mut self, node: NodeId, label: LabelId) {
        let changes = self.nodes.entry(node).or_default();
        if let Some(pos) = changes.labels_removed.iter().position(|l| *l == label) {
            changes.labels_removed.swap_remove(pos);
        } else if !changes.labels_added.contains(&label) {
            changes.labels_added.push(label);
        }
        self.by_label.entry(label).or_default().insert(node);
    }

    /// Records a label removal; cancels a pending addition of the same label.
    ///
    /// Callers only remove labels the node currently carries.
    pub fn node_do_remove_label(&mut self, node: NodeId, label: LabelId) {
        let changes = self.nodes.entry(node).or_default();
        if let Some(pos) = changes.labels_added.iter().position(|l| *l == label) {
            changes.labels_added.swap_remove(pos);
        } else if !changes.labels_removed.contains(&label) {
            changes.labels_removed.push(label);
        }
        self.by_label.entry(label).or_default().insert(node);
    }

    /// Records a property replacement.
    ///
    /// `before` is the value the caller observed, `None` when the property was
    /// absent; only the new value is retained.
    pub fn node_do_replace_property(
        &mut self,
        node: NodeId,
        prop: PropId,
        before: Option<&PropValueOwned>,
        after: PropValueOwned,
    ) {
        if before == Some(&after) {
            return;
        }
        self.set_prop(node, prop, PropChange::Set(after));
    }

    /// Records a property removal.
    pub fn node_do_remove_property(&mut self, node: NodeId, prop: PropId) {
        self.set_prop(node, prop, PropChange::Removed);
    }

    fn set_prop(&mut self, node: NodeId, prop: PropId, change: PropChange) {
        self.nodes
            .entry(node)
            .or_default()
            .props
            .insert(prop, change);
        self.by_prop.entry(prop).or_default().insert(node);
    }

    /// Returns `true` once the transaction has recorded anything.
    pub fn has_changes(&self) -> bool {
        !self.deleted.is_empty() || !self.nodes.is_empty()
    }

    /// Returns `true` if the transaction deleted `node`.
    pub fn is_node_deleted(&self, node: NodeId) -> bool {
        self.deleted.contains(&node)
    }

    /// Returns `true` if the transaction created `node`.
    pub fn is_node_created(&self, node: NodeId) -> bool {
        self.created.contains(&node)
    }

    /// Nodes deleted by the transaction.
    pub fn deleted_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.deleted.iter().copied()
    }

    /// Net transaction effect on `label` for `node`.
    pub fn label_state(&self, node: NodeId, label: LabelId) -> LabelChange {
        let Some(changes) = self.nodes.get(&node) else {
            return LabelChange::Unchanged;
        };
        if changes.labels_added.contains(&label) {
            LabelChange::Added
        } else if changes.labels_removed.contains(&label) {
            LabelChange::Removed
        } else {
            LabelChange::Unchanged
        }
    }

    /// Transaction-local state of `prop` on `node`, if the transaction touched it.
    pub fn property_change(&self, node: NodeId, prop: PropId) -> Option<&PropChange> {
        self.nodes.get(&node)?.props.get(&prop)
    }

    /// Nodes whose membership of `label` the transaction touched.
    pub fn nodes_with_label_changes(&self, label: LabelId) -> impl Iterator<Item = NodeId> + '_ {
        self.by_label
            .get(&label)
            .into_iter()
            .flat_map(|nodes| nodes.iter().copied())
    }

    /// Nodes whose `prop` the transaction set or removed.
    pub fn nodes_with_property_changes(&self, prop: PropId) -> impl Iterator<Item = NodeId> + '_ {
        self.by_prop
            .get(&prop)
            .into_iter()
            .flat_map(|nodes| nodes.iter().copied())
    }
}
