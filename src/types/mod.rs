//! Identifier newtypes and the crate-wide error type.

use std::fmt;

/// Identifier of a graph node.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct NodeId(pub u64);
/// Identifier of a node label.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct LabelId(pub u32);
/// Identifier of a property key.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct PropId(pub u32);

/// Sentinel returned by unique seeks that resolve to no node.
pub const NO_SUCH_NODE: NodeId = NodeId(u64::MAX);

impl NodeId {
    /// Returns `true` unless this is [`NO_SUCH_NODE`].
    pub fn is_some(self) -> bool {
        self != NO_SUCH_NODE
    }

    /// Maps the sentinel to `None`.
    pub fn into_option(self) -> Option<NodeId> {
        self.is_some().then_some(self)
    }
}

/// Errors surfaced by index queries and index population.
#[derive(thiserror::Error, Debug)]
pub enum SombraError {
    /// Underlying I/O failure, typically from an index writer.
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),
    /// Persisted or collaborator state is internally inconsistent.
    #[error("corruption: {0}")]
    Corruption(&'static str),
    /// Caller supplied an argument the operation cannot accept.
    #[error("invalid argument: {0}")]
    Invalid(&'static str),
    /// Requested object does not exist.
    #[error("not found")]
    NotFound,
    /// Operation is not supported in the current state.
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),
    /// A programming invariant was broken; the operation was aborted.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
    /// Two nodes claim the same value in a unique index.
    #[error("index entry conflict: value {value} held by node {existing}, rejected for node {added}")]
    IndexEntryConflict {
        /// Rendered conflicting value.
        value: String,
        /// Node already holding the value.
        existing: NodeId,
        /// Node whose write was rejected.
        added: NodeId,
    },
    /// Configuration could not be read or parsed.
    #[error("config: {0}")]
    Config(String),
}

/// Convenience result alias.
pub type Result<T> = std::result::Result<T, SombraError>;

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == NO_SUCH_NODE {
            return write!(f, "none");
        }
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for LabelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for PropId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for NodeId {
    fn from(value: u64) -> Self {
        NodeId(value)
    }
}

impl From<u32> for LabelId {
    fn from(value: u32) -> Self {
        LabelId(value)
    }
}

impl From<LabelId> for u32 {
    fn from(value: LabelId) -> Self {
        value.0
    }
}

impl From<u32> for PropId {
    fn from(value: u32) -> Self {
        PropId(value)
    }
}

impl From<PropId> for u32 {
    fn from(value: PropId) -> Self {
        value.0
    }
}
