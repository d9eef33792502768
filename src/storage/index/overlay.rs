use std::sync::Arc;

use tracing::{debug, error};

use crate::storage::metrics::{default_metrics, IndexMetrics};
use crate::storage::store::StoreReadLayer;
use crate::storage::txstate::TxState;
use crate::storage::types::PropValueOwned;
use crate::types::{NodeId, Result, SombraError, NO_SUCH_NODE};

use super::reader::IndexReader;
use super::types::{IndexDef, IndexQuery};

/// Index reads as seen from inside a transaction.
///
/// Combines committed index results with the transaction's pending changes.
/// The overlay only borrows its inputs and keeps no state between calls, so it
/// is cheap to build per statement.
pub struct TxIndexOverlay<'a, R: ?Sized, S: ?Sized> {
    reader: &'a R,
    store: &'a S,
    tx: &'a TxState,
    metrics: Arc<dyn IndexMetrics>,
}

impl<'a, R, S> TxIndexOverlay<'a, R, S>
where
    R: IndexReader + ?Sized,
    S: StoreReadLayer + ?Sized,
{
    /// Creates an overlay over `reader`, resolving untouched facts through `store`.
    pub fn new(reader: &'a R, store: &'a S, tx: &'a TxState) -> Self {
        Self {
            reader,
            store,
            tx,
            metrics: default_metrics(),
        }
    }

    /// Replaces the metrics sink.
    pub fn with_metrics(mut self, metrics: Arc<dyn IndexMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Nodes matching `query` on the index over `def`, with the transaction applied.
    ///
    /// The result is sorted and holds each node once.
    pub fn index_query(&self, def: &IndexDef, query: &IndexQuery) -> Result<Vec<NodeId>> {
        let mut committed = self.reader.query_all(query)?;
        committed.sort_unstable();
        committed.dedup();
        if !self.tx.has_changes() {
            self.metrics.overlay_query(0, 0);
            return Ok(committed);
        }
        let diff = self.tx.index_diff(def, query, self.store)?;
        let committed_len = committed.len();
        let hidden = committed
            .iter()
            .filter(|node| diff.removed.contains(node))
            .count();
        let nodes = diff.apply(committed);
        // added and removed are disjoint, so the rest of the growth is new nodes
        let surfaced = nodes.len() + hidden - committed_len;
        debug!(
            label = def.label.0,
            prop = def.prop.0,
            committed = committed_len,
            added = surfaced,
            removed = hidden,
            results = nodes.len(),
            "index.overlay.query"
        );
        self.metrics.overlay_query(surfaced, hidden);
        Ok(nodes)
    }

    /// The single node holding `value` on the index over `def`, or
    /// [`NO_SUCH_NODE`] when none does after the transaction is applied.
    ///
    /// More than one surviving candidate breaks the uniqueness guarantee and is
    /// reported as [`SombraError::InvariantViolation`].
    pub fn unique_index_seek(&self, def: &IndexDef, value: &PropValueOwned) -> Result<NodeId> {
        let query = IndexQuery::Exact(value.clone());
        let candidates = self.index_query(def, &query)?;
        match candidates.as_slice() {
            [] => {
                self.metrics.unique_seek(false);
                Ok(NO_SUCH_NODE)
            }
            [node] => {
                self.metrics.unique_seek(true);
                Ok(*node)
            }
            many => {
                error!(
                    label = def.label.0,
                    prop = def.prop.0,
                    candidates = many.len(),
                    first = many[0].0,
                    "index.overlay.unique_conflict"
                );
                Err(SombraError::InvariantViolation(format!(
                    "unique seek on label {} prop {} for {value} resolved to {} nodes: {:?}",
                    def.label,
                    def.prop,
                    many.len(),
                    many
                )))
            }
        }
    }
}
