use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Stable identity of a tree node across render passes.
///
/// Derived from the node's pre-order rank at build time, never from its
/// payload: two line events with identical content still get distinct ids.
/// Copy, Ord, lossless for any rank. Ordering by id is ordering by
/// pre-order rank.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// The id of the node with the given pre-order rank.
    pub const fn from_order(order: usize) -> Self {
        NodeId(order)
    }

    /// The pre-order rank this id was derived from.
    pub const fn order(self) -> usize {
        self.0
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl Serialize for NodeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for NodeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(NodeId(usize::deserialize(deserializer)?))
    }
}
