use crate::types::{NodeId, Result};

use super::types::NodeData;

/// Read access to committed node state.
///
/// The overlay consults this layer when the transaction state does not carry
/// everything needed to re-evaluate a node, for example when only a label
/// changed and the indexed property must be read from the committed record.
pub trait StoreReadLayer {
    /// Returns the committed labels and properties of `node`, or `None` when
    /// the node has no committed record.
    fn node(&self, node: NodeId) -> Result<Option<NodeData>>;
}

impl<T: StoreReadLayer + ?Sized> StoreReadLayer for &T {
    fn node(&self, node: NodeId) -> Result<Option<NodeData>> {
        (**self).node(node)
    }
}
