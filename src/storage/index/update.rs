use std::fmt;

use crate::storage::types::PropValueOwned;
use crate::types::{NodeId, PropId, Result, SombraError};

/// Kind of change an update event describes.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum UpdateMode {
    /// Property newly set on the node.
    Added,
    /// Property value replaced.
    Changed,
    /// Property removed from the node.
    Removed,
}

impl fmt::Display for UpdateMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UpdateMode::Added => "added",
            UpdateMode::Changed => "changed",
            UpdateMode::Removed => "removed",
        };
        f.write_str(name)
    }
}

/// Values carried by an update; each mode holds exactly the values it allows.
#[derive(Clone, Debug, PartialEq)]
pub enum PropertyChange {
    /// New value, no previous value.
    Added(PropValueOwned),
    /// Previous and new value.
    Changed {
        /// Value before the change.
        before: PropValueOwned,
        /// Value after the change.
        after: PropValueOwned,
    },
    /// Previous value, no new value.
    Removed(PropValueOwned),
}

/// A property update routed to an index while it is being populated.
#[derive(Clone, Debug, PartialEq)]
pub struct NodePropertyUpdate {
    /// Node whose property changed.
    pub node: NodeId,
    /// Property key that changed.
    pub prop: PropId,
    /// The change itself.
    pub change: PropertyChange,
}

impl NodePropertyUpdate {
    /// Property set on a node that did not carry it.
    pub fn added(node: NodeId, prop: PropId, after: PropValueOwned) -> Self {
        Self {
            node,
            prop,
            change: PropertyChange::Added(after),
        }
    }

    /// Property value replaced.
    pub fn changed(
        node: NodeId,
        prop: PropId,
        before: PropValueOwned,
        after: PropValueOwned,
    ) -> Self {
        Self {
            node,
            prop,
            change: PropertyChange::Changed { before, after },
        }
    }

    /// Property removed.
    pub fn removed(node: NodeId, prop: PropId, before: PropValueOwned) -> Self {
        Self {
            node,
            prop,
            change: PropertyChange::Removed(before),
        }
    }

    /// Builds an update from a mode tag and optional values, as received from
    /// an external change feed.
    ///
    /// `Added` must carry only an after value, `Removed` only a before value,
    /// `Changed` both. Anything else is an invariant violation.
    pub fn from_parts(
        node: NodeId,
        prop: PropId,
        mode: UpdateMode,
        before: Option<PropValueOwned>,
        after: Option<PropValueOwned>,
    ) -> Result<Self> {
        let change = match (mode, before, after) {
            (UpdateMode::Added, None, Some(after)) => PropertyChange::Added(after),
            (UpdateMode::Changed, Some(before), Some(after)) => {
                PropertyChange::Changed { before, after }
            }
            (UpdateMode::Removed, Some(before), None) => PropertyChange::Removed(before),
            (mode, before, after) => {
                return Err(SombraError::InvariantViolation(format!(
                    "malformed {mode} update for node {node} prop {prop}: before present={}, after present={}",
                    before.is_some(),
                    after.is_some()
                )));
            }
        };
        Ok(Self { node, prop, change })
    }

    /// Returns the update mode.
    pub fn mode(&self) -> UpdateMode {
        match self.change {
            PropertyChange::Added(_) => UpdateMode::Added,
            PropertyChange::Changed { .. } => UpdateMode::Changed,
            PropertyChange::Removed(_) => UpdateMode::Removed,
        }
    }

    /// Value before the update, absent for `Added`.
    pub fn value_before(&self) -> Option<&PropValueOwned> {
        match &self.change {
            PropertyChange::Added(_) => None,
            PropertyChange::Changed { before, .. } | PropertyChange::Removed(before) => Some(before),
        }
    }

    /// Value after the update, absent for `Removed`.
    pub fn value_after(&self) -> Option<&PropValueOwned> {
        match &self.change {
            PropertyChange::Added(after) | PropertyChange::Changed { after, .. } => Some(after),
            PropertyChange::Removed(_) => None,
        }
    }
}
