use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Sink for index query and population statistics.
///
/// Implementations must be cheap; the overlay and populator call these hooks
/// on every query and every buffered update.
pub trait IndexMetrics: Send + Sync {
    /// Records one overlaid index query and how many nodes the transaction
    /// state added to and removed from the committed result.
    fn overlay_query(&self, added: usize, removed: usize);

    /// Records a unique seek and whether it resolved to a node.
    fn unique_seek(&self, found: bool);

    /// Records one update processed by a populating updater.
    fn populator_update(&self);

    /// Records a buffer flush and the number of entries written.
    fn populator_flush(&self, entries: usize);
}

/// A no-op implementation of [`IndexMetrics`].
#[derive(Default)]
pub struct NoopMetrics;

impl IndexMetrics for NoopMetrics {
    fn overlay_query(&self, _added: usize, _removed: usize) {}
    fn unique_seek(&self, _found: bool) {}
    fn populator_update(&self) {}
    fn populator_flush(&self, _entries: usize) {}
}

/// A thread-safe counter-based implementation of [`IndexMetrics`].
#[derive(Default)]
pub struct CounterMetrics {
    /// Number of overlaid index queries.
    pub overlay_queries: AtomicU64,
    /// Nodes the transaction state added to committed results.
    pub overlay_added: AtomicU64,
    /// Nodes the transaction state removed from committed results.
    pub overlay_removed: AtomicU64,
    /// Unique seeks that resolved to a node.
    pub unique_hits: AtomicU64,
    /// Unique seeks that resolved to no node.
    pub unique_misses: AtomicU64,
    /// Updates processed by populating updaters.
    pub populator_updates: AtomicU64,
    /// Successful buffer flushes.
    pub populator_flushes: AtomicU64,
    /// Entries written by successful flushes.
    pub populator_flushed_entries: AtomicU64,
}

impl IndexMetrics for CounterMetrics {
    fn overlay_query(&self, added: usize, removed: usize) {
        self.overlay_queries.fetch_add(1, Ordering::Relaxed);
        self.overlay_added.fetch_add(added as u64, Ordering::Relaxed);
        self.overlay_removed
            .fetch_add(removed as u64, Ordering::Relaxed);
    }

    fn unique_seek(&self, found: bool) {
        if found {
            self.unique_hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.unique_misses.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn populator_update(&self) {
        self.populator_updates.fetch_add(1, Ordering::Relaxed);
    }

    fn populator_flush(&self, entries: usize) {
        self.populator_flushes.fetch_add(1, Ordering::Relaxed);
        self.populator_flushed_entries
            .fetch_add(entries as u64, Ordering::Relaxed);
    }
}

/// Returns the metrics sink used when none is configured.
pub fn default_metrics() -> Arc<dyn IndexMetrics> {
    Arc::new(NoopMetrics)
}
