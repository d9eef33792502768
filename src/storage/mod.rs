//! Index storage: transaction-aware reads and index population.
//!
//! Reads go through [`TxIndexOverlay`], which reconciles a committed
//! [`IndexReader`] with the pending changes recorded in a [`TxState`]. Index
//! builds go through [`NonUniquePopulator`], which buffers and samples
//! property updates before writing them out.

/// Index definitions, queries, the overlay and population.
///
/// Everything that reads from or writes to a single property index.
pub mod index;

/// In-memory store and index implementations.
pub mod memory;

/// Transaction-local change set and its per-query index diff.
pub mod txstate;

mod metrics;
mod options;
mod store;
mod types;

pub use index::{
    IndexDef, IndexKind, IndexPopulator, IndexQuery, IndexReader, IndexSample, IndexUpdater,
    IndexWriter, NodePropertyUpdate, NonUniquePopulator, PostingStream, TxIndexOverlay,
    UpdateMode,
};

/// Metrics sinks.
pub use metrics::{default_metrics, CounterMetrics, IndexMetrics, NoopMetrics};

/// Populator configuration.
pub use options::{PopulatorOptions, DEFAULT_QUEUE_THRESHOLD, DEFAULT_SAMPLE_BUFFER_SIZE};

pub use store::StoreReadLayer;
pub use txstate::{IndexDiff, IndexMembership, LabelChange, PropChange, TxState};

/// Property values, node snapshots and the value encoding.
pub use types::{compare_values, encode_value, NodeData, PropValueOwned, TypeTag};
