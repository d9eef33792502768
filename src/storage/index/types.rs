use std::cmp::Ordering;
use std::ops::Bound;

use crate::storage::types::{compare_values, PropValueOwned};
use crate::types::{LabelId, NodeId, PropId, Result, SombraError};

/// Constraint semantics attached to a property index.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum IndexKind {
    /// Any number of nodes may share a value.
    General,
    /// At most one node may hold a given value.
    Unique,
}

/// Schema key a property index is defined over.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct IndexDef {
    /// Label whose nodes are indexed.
    pub label: LabelId,
    /// Indexed property key.
    pub prop: PropId,
    /// Uniqueness semantics.
    pub kind: IndexKind,
}

impl IndexDef {
    /// Index over `(label, prop)` without a uniqueness constraint.
    pub fn general(label: LabelId, prop: PropId) -> Self {
        Self {
            label,
            prop,
            kind: IndexKind::General,
        }
    }

    /// Index over `(label, prop)` backing a uniqueness constraint.
    pub fn unique(label: LabelId, prop: PropId) -> Self {
        Self {
            label,
            prop,
            kind: IndexKind::Unique,
        }
    }
}

/// Predicate over the indexed property value.
#[derive(Clone, Debug, PartialEq)]
pub enum IndexQuery {
    /// Value equals the given value.
    Exact(PropValueOwned),
    /// Property is present with any value.
    Exists,
    /// Value falls between the bounds; both bounds must share the value's type.
    Range {
        /// Lower bound.
        start: Bound<PropValueOwned>,
        /// Upper bound.
        end: Bound<PropValueOwned>,
    },
    /// String value starts with the prefix.
    StringPrefix(String),
}

impl IndexQuery {
    /// Equality predicate.
    pub fn exact(value: impl Into<PropValueOwned>) -> Self {
        IndexQuery::Exact(value.into())
    }

    /// Evaluates the predicate against a present property value.
    pub fn matches(&self, value: &PropValueOwned) -> bool {
        match self {
            IndexQuery::Exact(expected) => {
                compare_values(expected, value) == Some(Ordering::Equal)
            }
            IndexQuery::Exists => true,
            IndexQuery::Range { start, end } => {
                above_start(start, value) && below_end(end, value)
            }
            IndexQuery::StringPrefix(prefix) => match value {
                PropValueOwned::Str(s) => s.starts_with(prefix.as_str()),
                _ => false,
            },
        }
    }
}

fn above_start(bound: &Bound<PropValueOwned>, value: &PropValueOwned) -> bool {
    match bound {
        Bound::Unbounded => true,
        Bound::Included(start) => matches!(
            compare_values(value, start),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        Bound::Excluded(start) => compare_values(value, start) == Some(Ordering::Greater),
    }
}

fn below_end(bound: &Bound<PropValueOwned>, value: &PropValueOwned) -> bool {
    match bound {
        Bound::Unbounded => true,
        Bound::Included(end) => matches!(
            compare_values(value, end),
            Some(Ordering::Less | Ordering::Equal)
        ),
        Bound::Excluded(end) => compare_values(value, end) == Some(Ordering::Less),
    }
}

/// Streaming interface over sorted, unique `NodeId`s.
///
/// A boxed stream owns whatever reader resources back it; dropping the box
/// releases them.
pub trait PostingStream {
    /// Pushes up to `max` identifiers into `out`, returning `true` when additional
    /// data remains and `false` once the stream is exhausted.
    fn next_batch(&mut self, out: &mut Vec<NodeId>, max: usize) -> Result<bool>;
}

/// A `PostingStream` that yields no results.
#[derive(Clone, Copy, Debug, Default)]
pub struct EmptyPostingStream;

impl PostingStream for EmptyPostingStream {
    fn next_batch(&mut self, _out: &mut Vec<NodeId>, _max: usize) -> Result<bool> {
        Ok(false)
    }
}

/// Posting stream over an owned list of node identifiers.
#[derive(Clone, Debug, Default)]
pub struct VecPostingStream {
    nodes: Vec<NodeId>,
    pos: usize,
}

impl VecPostingStream {
    /// Sorts and deduplicates `nodes` before streaming them.
    pub fn new(mut nodes: Vec<NodeId>) -> Self {
        nodes.sort_unstable();
        nodes.dedup();
        Self { nodes, pos: 0 }
    }
}

impl PostingStream for VecPostingStream {
    fn next_batch(&mut self, out: &mut Vec<NodeId>, max: usize) -> Result<bool> {
        if max == 0 {
            return Ok(self.pos < self.nodes.len());
        }
        let remaining = self.nodes.len().saturating_sub(self.pos);
        if remaining == 0 {
            return Ok(false);
        }
        let take = remaining.min(max);
        out.extend_from_slice(&self.nodes[self.pos..self.pos + take]);
        self.pos += take;
        Ok(self.pos < self.nodes.len())
    }
}

/// Drains an entire posting stream into `out`.
pub fn collect_all(stream: &mut dyn PostingStream, out: &mut Vec<NodeId>) -> Result<()> {
    const DEFAULT_BATCH: usize = 256;
    let mut batch = Vec::with_capacity(DEFAULT_BATCH);
    loop {
        batch.clear();
        let has_more = stream.next_batch(&mut batch, DEFAULT_BATCH)?;
        if batch.is_empty() {
            if !has_more {
                break;
            }
            return Err(SombraError::Corruption(
                "posting stream yielded empty batch while reporting more data",
            ));
        }
        out.extend_from_slice(&batch);
        if !has_more {
            break;
        }
    }
    Ok(())
}
