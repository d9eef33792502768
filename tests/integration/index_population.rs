#![allow(missing_docs)]

use std::cell::Cell;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use sombra_txindex::{
    storage::{
        memory::{MemoryIndex, MemoryStore},
        CounterMetrics, IndexDef, IndexPopulator, IndexQuery, IndexReader, IndexWriter,
        NodePropertyUpdate, NonUniquePopulator, PopulatorOptions, PropValueOwned,
        TxIndexOverlay, TxState,
    },
    types::{LabelId, NodeId, PropId, Result, SombraError},
};

const LABEL: LabelId = LabelId(2);
const PROP: PropId = PropId(3);

fn def() -> IndexDef {
    IndexDef::general(LABEL, PROP)
}

fn options(threshold: usize) -> PopulatorOptions {
    PopulatorOptions::new().queue_threshold(threshold)
}

/// Writer that fails every call while `failing` is set.
struct FlakyWriter<'a> {
    inner: &'a MemoryIndex,
    failing: &'a Cell<bool>,
    attempts: usize,
}

impl IndexWriter for FlakyWriter<'_> {
    fn upsert(&mut self, node: NodeId, value: &PropValueOwned) -> Result<()> {
        self.attempts += 1;
        if self.failing.get() {
            return Err(std::io::Error::other("disk full").into());
        }
        let mut inner = self.inner;
        inner.upsert(node, value)
    }

    fn delete(&mut self, node: NodeId) -> Result<()> {
        self.attempts += 1;
        if self.failing.get() {
            return Err(std::io::Error::other("disk full").into());
        }
        let mut inner = self.inner;
        inner.delete(node)
    }
}

#[test]
fn added_then_removed_leaves_no_entry() -> Result<()> {
    let index = MemoryIndex::new(def());
    let mut populator = NonUniquePopulator::new(def(), &index, &options(100))?;
    {
        let mut updater = populator.new_populating_updater();
        updater.process(NodePropertyUpdate::added(NodeId(1), PROP, "v".into()))?;
        updater.process(NodePropertyUpdate::removed(NodeId(1), PROP, "v".into()))?;
        updater.close()?;
    }
    populator.close(true)?;
    assert!(index.is_empty());
    assert_eq!(index.get(NodeId(1)), None);
    Ok(())
}

#[test]
fn buffer_flushes_past_threshold() -> Result<()> {
    let index = MemoryIndex::new(def());
    let metrics = Arc::new(CounterMetrics::default());
    let mut populator =
        NonUniquePopulator::new(def(), &index, &options(3))?.with_metrics(metrics.clone());
    {
        let mut updater = populator.new_populating_updater();
        for n in 1..=3 {
            updater.process(NodePropertyUpdate::added(NodeId(n), PROP, PropValueOwned::Int(7)))?;
        }
        updater.close()?;
    }
    assert_eq!(populator.pending_updates().len(), 3);
    assert!(index.is_empty());

    {
        let mut updater = populator.new_populating_updater();
        updater.process(NodePropertyUpdate::added(NodeId(4), PROP, PropValueOwned::Int(8)))?;
        updater.close()?;
    }
    assert!(populator.pending_updates().is_empty());
    assert_eq!(index.len(), 4);
    assert_eq!(metrics.populator_updates.load(Ordering::Relaxed), 4);
    assert_eq!(metrics.populator_flushes.load(Ordering::Relaxed), 1);
    assert_eq!(metrics.populator_flushed_entries.load(Ordering::Relaxed), 4);
    Ok(())
}

#[test]
fn failed_flush_keeps_buffer_for_retry() -> Result<()> {
    let index = MemoryIndex::new(def());
    let failing = Cell::new(true);
    let writer = FlakyWriter {
        inner: &index,
        failing: &failing,
        attempts: 0,
    };
    let mut populator = NonUniquePopulator::new(def(), writer, &options(100))?;
    populator.process_update(NodePropertyUpdate::added(NodeId(1), PROP, "a".into()))?;
    populator.process_update(NodePropertyUpdate::changed(
        NodeId(1),
        PROP,
        "a".into(),
        "b".into(),
    ))?;

    let err = populator.flush().unwrap_err();
    assert!(matches!(err, SombraError::Io(_)));
    assert_eq!(populator.pending_updates().len(), 2);
    assert!(index.is_empty());

    failing.set(false);
    let attempts = populator.writer().attempts;
    populator.flush()?;
    assert!(populator.pending_updates().is_empty());
    assert_eq!(populator.writer().attempts, attempts + 2);
    assert_eq!(index.get(NodeId(1)), Some(PropValueOwned::from("b")));
    Ok(())
}

#[test]
fn sample_returns_to_prior_level() -> Result<()> {
    let index = MemoryIndex::new(def());
    let mut populator = NonUniquePopulator::new(def(), &index, &options(100))?;
    populator.process_update(NodePropertyUpdate::added(NodeId(1), PROP, "base".into()))?;
    let before = populator.sample_result();

    populator.process_update(NodePropertyUpdate::added(NodeId(2), PROP, "v".into()))?;
    assert_eq!(populator.sample_result().unique_values, before.unique_values + 1);
    populator.process_update(NodePropertyUpdate::removed(NodeId(3), PROP, "v".into()))?;
    let after = populator.sample_result();
    assert_eq!(after.unique_values, before.unique_values);
    assert_eq!(after.updates, before.updates);
    Ok(())
}

#[test]
fn deferred_constraints_and_remove_on_populating_index() -> Result<()> {
    let mut store = MemoryStore::new();
    store.insert_node(NodeId(1), &[LABEL], vec![(PROP, "dup".into())]);
    store.insert_node(NodeId(2), &[LABEL], vec![(PROP, "dup".into())]);
    let index = MemoryIndex::new(def());
    let mut populator = NonUniquePopulator::new(def(), &index, &options(100))?;
    populator.add(&[
        NodePropertyUpdate::added(NodeId(1), PROP, "dup".into()),
        NodePropertyUpdate::added(NodeId(2), PROP, "dup".into()),
    ])?;
    populator.verify_deferred_constraints(&store)?;

    let mut updater = populator.new_populating_updater();
    let err = updater.remove(&[NodeId(1)]).unwrap_err();
    assert!(matches!(err, SombraError::Unsupported(_)));
    drop(updater);

    populator.close(true)?;
    assert_eq!(index.len(), 2);
    Ok(())
}

#[test]
fn populated_index_serves_overlay_queries() -> Result<()> {
    let mut store = MemoryStore::new();
    store.insert_node(NodeId(1), &[LABEL], vec![(PROP, "x".into())]);
    store.insert_node(NodeId(2), &[LABEL], vec![(PROP, "y".into())]);
    let index = MemoryIndex::new(def());
    let mut populator = NonUniquePopulator::new(def(), &index, &options(100))?;
    populator.add(&[
        NodePropertyUpdate::added(NodeId(1), PROP, "x".into()),
        NodePropertyUpdate::added(NodeId(2), PROP, "y".into()),
    ])?;
    populator.close(true)?;

    let mut tx = TxState::new();
    let y = PropValueOwned::from("y");
    tx.node_do_replace_property(NodeId(2), PROP, Some(&y), "x".into());
    let overlay = TxIndexOverlay::new(&index, &store, &tx);
    let query = IndexQuery::exact("x");
    assert_eq!(index.query_all(&query)?, vec![NodeId(1)]);
    assert_eq!(overlay.index_query(&def(), &query)?, vec![NodeId(1), NodeId(2)]);
    Ok(())
}

#[test]
fn options_load_from_toml() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("populator.toml");
    std::fs::write(&path, "queue_threshold = 2\n")?;
    let opts = PopulatorOptions::load(&path)?;
    assert_eq!(opts.queue_threshold, 2);

    let index = MemoryIndex::new(def());
    let mut populator = NonUniquePopulator::new(def(), &index, &opts)?;
    {
        let mut updater = populator.new_populating_updater();
        for n in 1..=3 {
            updater.process(NodePropertyUpdate::added(NodeId(n), PROP, PropValueOwned::Int(n as i64)))?;
        }
        updater.close()?;
    }
    assert_eq!(index.len(), 3);
    Ok(())
}
