use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::storage::metrics::{default_metrics, IndexMetrics};
use crate::storage::options::PopulatorOptions;
use crate::storage::store::StoreReadLayer;
use crate::storage::types::{encode_value, PropValueOwned};
use crate::types::{NodeId, PropId, Result, SombraError};

use super::sampler::{IndexSample, NonUniqueSampler};
use super::types::IndexDef;
use super::update::{NodePropertyUpdate, PropertyChange};

/// Write access to an index under construction.
///
/// Both operations are keyed by node and must be idempotent: replaying an
/// upsert or delete leaves the index in the same state.
pub trait IndexWriter {
    /// Replaces the entry for `node`, or inserts one, holding `value`.
    fn upsert(&mut self, node: NodeId, value: &PropValueOwned) -> Result<()>;

    /// Removes the entry for `node`, if any.
    fn delete(&mut self, node: NodeId) -> Result<()>;

    /// Makes previously applied writes durable.
    fn commit(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<W: IndexWriter + ?Sized> IndexWriter for &mut W {
    fn upsert(&mut self, node: NodeId, value: &PropValueOwned) -> Result<()> {
        (**self).upsert(node, value)
    }

    fn delete(&mut self, node: NodeId) -> Result<()> {
        (**self).delete(node)
    }

    fn commit(&mut self) -> Result<()> {
        (**self).commit()
    }
}

/// Reads current property values while verifying constraints.
pub trait PropertyAccessor {
    /// Returns the committed value of `prop` on `node`.
    fn property_value(&self, node: NodeId, prop: PropId) -> Result<Option<PropValueOwned>>;
}

impl<S: StoreReadLayer + ?Sized> PropertyAccessor for S {
    fn property_value(&self, node: NodeId, prop: PropId) -> Result<Option<PropValueOwned>> {
        Ok(self
            .node(node)?
            .and_then(|data| data.property(prop).cloned()))
    }
}

/// Receives property updates for an index that is being populated.
pub trait IndexUpdater {
    /// Records one update.
    fn process(&mut self, update: NodePropertyUpdate) -> Result<()>;

    /// Ends the current batch of updates.
    fn close(&mut self) -> Result<()>;

    /// Direct removal of nodes; populating indexes only accept buffered updates.
    fn remove(&mut self, nodes: &[NodeId]) -> Result<()>;
}

/// Lifecycle of one index build.
pub trait IndexPopulator {
    /// Writes entries discovered by the initial store scan straight to the index.
    fn add(&mut self, updates: &[NodePropertyUpdate]) -> Result<()>;

    /// Checks constraints that could only be verified once population ended.
    fn verify_deferred_constraints(&mut self, accessor: &dyn PropertyAccessor) -> Result<()>;

    /// Returns an updater for changes that arrive while population runs.
    fn new_populating_updater(&mut self) -> Box<dyn IndexUpdater + '_>;

    /// Folds a value into the sample without buffering a write.
    fn include_sample(&mut self, update: &NodePropertyUpdate) -> Result<()>;

    /// Returns the sample gathered so far.
    fn sample_result(&self) -> IndexSample;

    /// Ends population; pending writes are applied only if it succeeded.
    fn close(&mut self, populated: bool) -> Result<()>;
}

/// Populator for indexes without a uniqueness constraint.
///
/// Updates are sampled as they arrive and buffered in arrival order. The
/// buffer is written out once it grows past the configured threshold at a
/// batch boundary, and once more when population closes.
pub struct NonUniquePopulator<W: IndexWriter> {
    def: IndexDef,
    writer: W,
    queue_threshold: usize,
    sampler: NonUniqueSampler,
    updates: Vec<NodePropertyUpdate>,
    metrics: Arc<dyn IndexMetrics>,
}

impl<W: IndexWriter> NonUniquePopulator<W> {
    /// Creates a populator writing through `writer`.
    pub fn new(def: IndexDef, writer: W, options: &PopulatorOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            def,
            writer,
            queue_threshold: options.queue_threshold,
            sampler: NonUniqueSampler::new(options.sample_buffer_size),
            updates: Vec::new(),
            metrics: default_metrics(),
        })
    }

    /// Replaces the metrics sink.
    pub fn with_metrics(mut self, metrics: Arc<dyn IndexMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Index being populated.
    pub fn def(&self) -> &IndexDef {
        &self.def
    }

    /// Updates waiting for the next flush, in arrival order.
    pub fn pending_updates(&self) -> &[NodePropertyUpdate] {
        &self.updates
    }

    /// Underlying writer.
    pub fn writer(&self) -> &W {
        &self.writer
    }

    /// Consumes the populator and returns its writer.
    pub fn into_writer(self) -> W {
        self.writer
    }

    /// Samples and buffers one update.
    pub fn process_update(&mut self, update: NodePropertyUpdate) -> Result<()> {
        if update.prop != self.def.prop {
            return Err(SombraError::Invalid(
                "update property does not match populating index",
            ));
        }
        match &update.change {
            PropertyChange::Added(after) => {
                self.sampler.include(&encode_value(after)?);
            }
            PropertyChange::Changed { before, after } => {
                // the writer only looks at the after value, but the sample
                // must forget the before value
                let before = encode_value(before)?;
                let after = encode_value(after)?;
                self.sampler.exclude(&before);
                self.sampler.include(&after);
            }
            PropertyChange::Removed(before) => {
                self.sampler.exclude(&encode_value(before)?);
            }
        }
        self.updates.push(update);
        self.metrics.populator_update();
        Ok(())
    }

    /// Flushes the buffer when it holds more than the threshold.
    pub fn on_batch_boundary(&mut self) -> Result<()> {
        if self.updates.len() > self.queue_threshold {
            self.flush()?;
        }
        Ok(())
    }

    /// Applies buffered updates to the writer in arrival order.
    ///
    /// The buffer is cleared only after every update applied; on failure it is
    /// left intact so the whole flush can be retried.
    pub fn flush(&mut self) -> Result<()> {
        if self.updates.is_empty() {
            return Ok(());
        }
        for update in &self.updates {
            if let Err(err) = apply_update(&mut self.writer, update) {
                warn!(
                    node = update.node.0,
                    mode = %update.mode(),
                    pending = self.updates.len(),
                    error = %err,
                    "index.populator.flush_failed"
                );
                return Err(err);
            }
        }
        let flushed = self.updates.len();
        self.updates.clear();
        self.metrics.populator_flush(flushed);
        debug!(
            label = self.def.label.0,
            prop = self.def.prop.0,
            flushed,
            "index.populator.flush"
        );
        Ok(())
    }
}

fn apply_update<W: IndexWriter + ?Sized>(writer: &mut W, update: &NodePropertyUpdate) -> Result<()> {
    match &update.change {
        // adding and changing are both an idempotent replace keyed by node
        PropertyChange::Added(after) | PropertyChange::Changed { after, .. } => {
            writer.upsert(update.node, after)
        }
        PropertyChange::Removed(_) => writer.delete(update.node),
    }
}

impl<W: IndexWriter> IndexPopulator for NonUniquePopulator<W> {
    fn add(&mut self, updates: &[NodePropertyUpdate]) -> Result<()> {
        for update in updates {
            apply_update(&mut self.writer, update)?;
        }
        Ok(())
    }

    fn verify_deferred_constraints(&mut self, _accessor: &dyn PropertyAccessor) -> Result<()> {
        Ok(())
    }

    fn new_populating_updater(&mut self) -> Box<dyn IndexUpdater + '_> {
        Box::new(PopulatingUpdater { populator: self })
    }

    fn include_sample(&mut self, update: &NodePropertyUpdate) -> Result<()> {
        let Some(after) = update.value_after() else {
            return Err(SombraError::Invalid("sampled update carries no value"));
        };
        self.sampler.include(&encode_value(after)?);
        Ok(())
    }

    fn sample_result(&self) -> IndexSample {
        self.sampler.result()
    }

    fn close(&mut self, populated: bool) -> Result<()> {
        if !populated {
            let dropped = self.updates.len();
            self.updates.clear();
            info!(
                label = self.def.label.0,
                prop = self.def.prop.0,
                dropped,
                "index.populator.aborted"
            );
            return Ok(());
        }
        self.flush()?;
        self.writer.commit()?;
        let sample = self.sampler.result();
        info!(
            label = self.def.label.0,
            prop = self.def.prop.0,
            unique_values = sample.unique_values,
            updates = sample.updates,
            "index.populator.completed"
        );
        Ok(())
    }
}

/// Updater handed out by [`NonUniquePopulator::new_populating_updater`].
struct PopulatingUpdater<'p, W: IndexWriter> {
    populator: &'p mut NonUniquePopulator<W>,
}

impl<W: IndexWriter> IndexUpdater for PopulatingUpdater<'_, W> {
    fn process(&mut self, update: NodePropertyUpdate) -> Result<()> {
        self.populator.process_update(update)
    }

    fn close(&mut self) -> Result<()> {
        self.populator.on_batch_boundary()
    }

    fn remove(&mut self, _nodes: &[NodeId]) -> Result<()> {
        Err(SombraError::Unsupported(
            "remove() is not allowed on a populating index",
        ))
    }
}
