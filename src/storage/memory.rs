//! In-memory store and index.
//!
//! [`MemoryStore`] and [`MemoryIndex`] are complete, if unoptimised,
//! implementations of the read and write collaborators the overlay and the
//! populator run against. Index queries scan every entry.

use std::collections::BTreeMap;

use parking_lot::RwLock;

use crate::storage::index::{IndexDef, IndexKind, IndexQuery, IndexReader, IndexWriter};
use crate::storage::index::{PostingStream, VecPostingStream};
use crate::storage::store::StoreReadLayer;
use crate::storage::types::{NodeData, PropValueOwned};
use crate::types::{LabelId, NodeId, PropId, Result, SombraError};

/// Committed nodes held in a sorted map.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    nodes: BTreeMap<NodeId, NodeData>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the committed record of `node`.
    pub fn insert(&mut self, node: NodeId, data: NodeData) {
        self.nodes.insert(node, data);
    }

    /// Convenience wrapper around [`MemoryStore::insert`].
    pub fn insert_node(
        &mut self,
        node: NodeId,
        labels: &[LabelId],
        props: Vec<(PropId, PropValueOwned)>,
    ) {
        self.insert(
            node,
            NodeData {
                labels: labels.to_vec(),
                props,
            },
        );
    }

    /// Removes the committed record of `node`.
    pub fn remove(&mut self, node: NodeId) -> Option<NodeData> {
        self.nodes.remove(&node)
    }

    /// Iterates committed nodes in id order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &NodeData)> + '_ {
        self.nodes.iter().map(|(node, data)| (*node, data))
    }
}

impl StoreReadLayer for MemoryStore {
    fn node(&self, node: NodeId) -> Result<Option<NodeData>> {
        Ok(self.nodes.get(&node).cloned())
    }
}

/// Property index over one `(label, prop)` pair.
///
/// Writes go through `&MemoryIndex`, so a populator can fill the index while
/// readers hold shared references to it.
#[derive(Debug)]
pub struct MemoryIndex {
    def: IndexDef,
    entries: RwLock<BTreeMap<NodeId, PropValueOwned>>,
}

impl MemoryIndex {
    /// Creates an empty index for `def`.
    pub fn new(def: IndexDef) -> Self {
        Self {
            def,
            entries: RwLock::new(BTreeMap::new()),
        }
    }

    /// Builds an index from every committed node carrying `def.label` and `def.prop`.
    pub fn build(def: IndexDef, store: &MemoryStore) -> Result<Self> {
        let index = Self::new(def);
        let mut writer = &index;
        for (node, data) in store.iter() {
            if !data.has_label(def.label) {
                continue;
            }
            if let Some(value) = data.property(def.prop) {
                writer.upsert(node, value)?;
            }
        }
        Ok(index)
    }

    /// Index definition.
    pub fn def(&self) -> &IndexDef {
        &self.def
    }

    /// Number of indexed nodes.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns `true` when nothing is indexed.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Indexed value of `node`.
    pub fn get(&self, node: NodeId) -> Option<PropValueOwned> {
        self.entries.read().get(&node).cloned()
    }
}

impl IndexReader for MemoryIndex {
    fn query<'a>(&'a self, query: &IndexQuery) -> Result<Box<dyn PostingStream + 'a>> {
        let entries = self.entries.read();
        let nodes = entries
            .iter()
            .filter(|(_, value)| query.matches(value))
            .map(|(node, _)| *node)
            .collect();
        Ok(Box::new(VecPostingStream::new(nodes)))
    }
}

impl IndexWriter for &MemoryIndex {
    fn upsert(&mut self, node: NodeId, value: &PropValueOwned) -> Result<()> {
        let mut entries = self.entries.write();
        if self.def.kind == IndexKind::Unique {
            let query = IndexQuery::Exact(value.clone());
            let existing = entries
                .iter()
                .find(|(other, held)| **other != node && query.matches(held))
                .map(|(other, _)| *other);
            if let Some(existing) = existing {
                return Err(SombraError::IndexEntryConflict {
                    value: value.to_string(),
                    existing,
                    added: node,
                });
            }
        }
        entries.insert(node, value.clone());
        Ok(())
    }

    fn delete(&mut self, node: NodeId) -> Result<()> {
        self.entries.write().remove(&node);
        Ok(())
    }
}
