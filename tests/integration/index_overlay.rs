#![allow(missing_docs)]

use std::ops::Bound;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use sombra_txindex::{
    storage::{
        memory::{MemoryIndex, MemoryStore},
        CounterMetrics, IndexDef, IndexQuery, IndexReader, PropValueOwned, TxIndexOverlay,
        TxState,
    },
    types::{LabelId, NodeId, PropId, Result, SombraError, NO_SUCH_NODE},
};

const PERSON: LabelId = LabelId(2);
const CITY: LabelId = LabelId(5);
const NAME: PropId = PropId(3);
const AGE: PropId = PropId(4);

fn committed_people() -> MemoryStore {
    let mut store = MemoryStore::new();
    store.insert_node(
        NodeId(1),
        &[PERSON],
        vec![(NAME, "ada".into()), (AGE, PropValueOwned::Int(36))],
    );
    store.insert_node(
        NodeId(2),
        &[PERSON],
        vec![(NAME, "bob".into()), (AGE, PropValueOwned::Int(41))],
    );
    store.insert_node(
        NodeId(3),
        &[PERSON],
        vec![(NAME, "bea".into()), (AGE, PropValueOwned::Int(29))],
    );
    store.insert_node(NodeId(4), &[CITY], vec![(NAME, "bern".into())]);
    store.insert_node(NodeId(5), &[], vec![(NAME, "ada".into())]);
    store
}

fn ids(nodes: &[u64]) -> Vec<NodeId> {
    nodes.iter().copied().map(NodeId).collect()
}

#[test]
fn deleted_node_is_hidden_from_scan() -> Result<()> {
    let store = committed_people();
    let def = IndexDef::general(PERSON, NAME);
    let index = MemoryIndex::build(def, &store)?;
    let prefix = IndexQuery::StringPrefix("b".into());
    assert_eq!(index.query_all(&prefix)?, ids(&[2, 3]));

    let mut tx = TxState::new();
    tx.node_do_delete(NodeId(2));
    let overlay = TxIndexOverlay::new(&index, &store, &tx);
    assert_eq!(overlay.index_query(&def, &prefix)?, ids(&[3]));
    Ok(())
}

#[test]
fn relabelling_moves_nodes_between_indexes() -> Result<()> {
    let store = committed_people();
    let people = IndexDef::general(PERSON, NAME);
    let people_index = MemoryIndex::build(people, &store)?;
    let cities = IndexDef::general(CITY, NAME);
    let city_index = MemoryIndex::build(cities, &store)?;

    let mut tx = TxState::new();
    tx.node_do_remove_label(NodeId(3), PERSON);
    tx.node_do_add_label(NodeId(3), CITY);
    tx.node_do_add_label(NodeId(5), PERSON);

    let prefix_b = IndexQuery::StringPrefix("b".into());
    let people_view = TxIndexOverlay::new(&people_index, &store, &tx);
    assert_eq!(people_view.index_query(&people, &prefix_b)?, ids(&[2]));
    assert_eq!(
        people_view.index_query(&people, &IndexQuery::exact("ada"))?,
        ids(&[1, 5])
    );

    let city_view = TxIndexOverlay::new(&city_index, &store, &tx);
    assert_eq!(city_view.index_query(&cities, &prefix_b)?, ids(&[3, 4]));
    Ok(())
}

#[test]
fn range_query_sees_local_value_changes() -> Result<()> {
    let store = committed_people();
    let def = IndexDef::general(PERSON, AGE);
    let index = MemoryIndex::build(def, &store)?;
    let thirties = IndexQuery::Range {
        start: Bound::Included(PropValueOwned::Int(30)),
        end: Bound::Excluded(PropValueOwned::Int(40)),
    };
    assert_eq!(index.query_all(&thirties)?, ids(&[1]));

    let mut tx = TxState::new();
    let ada_age = PropValueOwned::Int(36);
    tx.node_do_replace_property(NodeId(1), AGE, Some(&ada_age), PropValueOwned::Int(40));
    tx.node_do_replace_property(NodeId(3), AGE, None, PropValueOwned::Int(30));
    let overlay = TxIndexOverlay::new(&index, &store, &tx);
    assert_eq!(overlay.index_query(&def, &thirties)?, ids(&[3]));
    assert_eq!(overlay.index_query(&def, &IndexQuery::Exists)?, ids(&[1, 2, 3]));
    Ok(())
}

#[test]
fn removed_property_excludes_from_both_query_forms() -> Result<()> {
    let store = committed_people();
    let def = IndexDef::unique(PERSON, NAME);
    let index = MemoryIndex::build(def, &store)?;
    let mut tx = TxState::new();
    tx.node_do_remove_property(NodeId(2), NAME);
    let overlay = TxIndexOverlay::new(&index, &store, &tx);
    assert!(overlay.index_query(&def, &IndexQuery::exact("bob"))?.is_empty());
    assert_eq!(overlay.unique_index_seek(&def, &"bob".into())?, NO_SUCH_NODE);
    Ok(())
}

#[test]
fn unique_seek_follows_value_swap() -> Result<()> {
    let store = committed_people();
    let def = IndexDef::unique(PERSON, NAME);
    let index = MemoryIndex::build(def, &store)?;

    let ada = PropValueOwned::from("ada");
    let bob = PropValueOwned::from("bob");
    let mut tx = TxState::new();
    tx.node_do_replace_property(NodeId(1), NAME, Some(&ada), bob.clone());
    tx.node_do_replace_property(NodeId(2), NAME, Some(&bob), ada.clone());

    let overlay = TxIndexOverlay::new(&index, &store, &tx);
    assert_eq!(overlay.unique_index_seek(&def, &ada)?, NodeId(2));
    assert_eq!(overlay.unique_index_seek(&def, &bob)?, NodeId(1));
    Ok(())
}

#[test]
fn unique_seek_on_created_node() -> Result<()> {
    let store = committed_people();
    let def = IndexDef::unique(PERSON, NAME);
    let index = MemoryIndex::build(def, &store)?;
    let mut tx = TxState::new();
    tx.node_do_create(NodeId(10));
    tx.node_do_add_label(NodeId(10), PERSON);
    tx.node_do_replace_property(NodeId(10), NAME, None, "cy".into());

    let overlay = TxIndexOverlay::new(&index, &store, &tx);
    assert_eq!(overlay.unique_index_seek(&def, &"cy".into())?, NodeId(10));
    assert_eq!(overlay.unique_index_seek(&def, &"dee".into())?, NO_SUCH_NODE);
    Ok(())
}

#[test]
fn created_then_deleted_node_stays_hidden() -> Result<()> {
    let store = committed_people();
    let def = IndexDef::general(PERSON, NAME);
    let index = MemoryIndex::build(def, &store)?;
    let mut tx = TxState::new();
    tx.node_do_create(NodeId(11));
    tx.node_do_add_label(NodeId(11), PERSON);
    tx.node_do_replace_property(NodeId(11), NAME, None, "ada".into());
    tx.node_do_delete(NodeId(11));

    let overlay = TxIndexOverlay::new(&index, &store, &tx);
    assert_eq!(overlay.index_query(&def, &IndexQuery::exact("ada"))?, ids(&[1]));
    Ok(())
}

#[test]
fn duplicate_unique_claim_is_reported() -> Result<()> {
    let store = committed_people();
    let def = IndexDef::unique(PERSON, NAME);
    let index = MemoryIndex::build(def, &store)?;
    let mut tx = TxState::new();
    tx.node_do_add_label(NodeId(5), PERSON);

    let overlay = TxIndexOverlay::new(&index, &store, &tx);
    match overlay.unique_index_seek(&def, &"ada".into()) {
        Err(SombraError::InvariantViolation(msg)) => assert!(msg.contains("2 nodes")),
        other => panic!("expected invariant violation, got {other:?}"),
    }
    Ok(())
}

#[test]
fn overlay_reports_metrics() -> Result<()> {
    let store = committed_people();
    let def = IndexDef::general(PERSON, NAME);
    let index = MemoryIndex::build(def, &store)?;
    let mut tx = TxState::new();
    tx.node_do_delete(NodeId(1));
    tx.node_do_add_label(NodeId(5), PERSON);

    let metrics = Arc::new(CounterMetrics::default());
    let overlay = TxIndexOverlay::new(&index, &store, &tx).with_metrics(metrics.clone());
    assert_eq!(overlay.index_query(&def, &IndexQuery::exact("ada"))?, ids(&[5]));
    assert_eq!(metrics.overlay_queries.load(Ordering::Relaxed), 1);
    assert_eq!(metrics.overlay_added.load(Ordering::Relaxed), 1);
    assert_eq!(metrics.overlay_removed.load(Ordering::Relaxed), 1);
    Ok(())
}
