use std::collections::BTreeSet;

use crate::storage::index::{IndexDef, IndexQuery};
use crate::storage::store::StoreReadLayer;
use crate::storage::types::NodeData;
use crate::types::{NodeId, Result};

use super::{LabelChange, PropChange, TxState};

/// How the transaction alters one node's membership in an index query.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum IndexMembership {
    /// The node matches under transaction state and must be added.
    Included,
    /// The node does not match under transaction state and must be excluded.
    Excluded,
    /// The transaction did not touch anything the index reads; committed
    /// results apply.
    Unchanged,
}

/// Per-query reconciliation of transaction state against committed results.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct IndexDiff {
    /// Nodes that match only because of transaction changes.
    pub added: BTreeSet<NodeId>,
    /// Nodes that must be hidden from committed results.
    pub removed: BTreeSet<NodeId>,
}

impl IndexDiff {
    /// Returns `true` when the diff leaves committed results untouched.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }

    /// Applies the diff to committed query results.
    ///
    /// The output is sorted and holds each node once.
    pub fn apply(&self, committed: impl IntoIterator<Item = NodeId>) -> Vec<NodeId> {
        let mut merged: BTreeSet<NodeId> = committed
            .into_iter()
            .filter(|node| !self.removed.contains(node))
            .collect();
        merged.extend(self.added.iter().copied());
        merged.into_iter().collect()
    }
}

/// Committed record of one node, fetched at most once and only when needed.
struct CommittedNode<'a, S: ?Sized> {
    store: &'a S,
    node: NodeId,
    created: bool,
    data: Option<Option<NodeData>>,
}

impl<'a, S: StoreReadLayer + ?Sized> CommittedNode<'a, S> {
    fn new(store: &'a S, node: NodeId, created: bool) -> Self {
        Self {
            store,
            node,
            created,
            data: None,
        }
    }

    fn get(&mut self) -> Result<Option<&NodeData>> {
        if self.data.is_none() {
            // nodes created in this transaction have no committed record
            let fetched = if self.created {
                None
            } else {
                self.store.node(self.node)?
            };
            self.data = Some(fetched);
        }
        Ok(self.data.as_ref().and_then(|data| data.as_ref()))
    }
}

impl TxState {
    /// Decides how the transaction alters `node`'s membership in `query` over `def`.
    ///
    /// Transaction-local label and property changes override the committed
    /// record; the store is consulted only for the facts the transaction left
    /// untouched.
    pub fn node_membership<S>(
        &self,
        def: &IndexDef,
        query: &IndexQuery,
        node: NodeId,
        store: &S,
    ) -> Result<IndexMembership>
    where
        S: StoreReadLayer + ?Sized,
    {
        if self.is_node_deleted(node) {
            return Ok(IndexMembership::Excluded);
        }
        let label_state = self.label_state(node, def.label);
        let prop_change = self.property_change(node, def.prop);
        if label_state == LabelChange::Unchanged && prop_change.is_none() {
            return Ok(IndexMembership::Unchanged);
        }

        let mut committed = CommittedNode::new(store, node, self.is_node_created(node));
        let has_label = match label_state {
            LabelChange::Added => true,
            LabelChange::Removed => false,
            LabelChange::Unchanged => committed
                .get()?
                .map_or(false, |data| data.has_label(def.label)),
        };
        if !has_label {
            return Ok(IndexMembership::Excluded);
        }

        let matches = match prop_change {
            Some(PropChange::Set(value)) => query.matches(value),
            Some(PropChange::Removed) => false,
            None => committed
                .get()?
                .and_then(|data| data.property(def.prop))
                .map_or(false, |value| query.matches(value)),
        };
        Ok(if matches {
            IndexMembership::Included
        } else {
            IndexMembership::Excluded
        })
    }

    /// Computes the adjustments that make committed results for `query`
    /// reflect this transaction.
    ///
    /// Only nodes whose `def.label` membership or `def.prop` value the
    /// transaction touched are re-evaluated. Deleted nodes are always removed.
    pub fn index_diff<S>(&self, def: &IndexDef, query: &IndexQuery, store: &S) -> Result<IndexDiff>
    where
        S: StoreReadLayer + ?Sized,
    {
        let mut diff = IndexDiff::default();
        diff.removed.extend(self.deleted_nodes());

        let touched: BTreeSet<NodeId> = self
            .nodes_with_label_changes(def.label)
            .chain(self.nodes_with_property_changes(def.prop))
            .filter(|node| !self.is_node_deleted(*node))
            .collect();
        for node in touched {
            match self.node_membership(def, query, node, store)? {
                IndexMembership::Included => {
                    diff.added.insert(node);
                }
                IndexMembership::Excluded => {
                    diff.removed.insert(node);
                }
                IndexMembership::Unchanged => {}
            }
        }
        Ok(diff)
    }
}
