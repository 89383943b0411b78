//! Node and edge identity types.
//!
//! A network is described entirely in terms of dense integer node ids and
//! directed edges between them. Both types are plain values: cheap to copy,
//! ordered, and usable as map keys throughout the engine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Dense integer node identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for NodeId {
    fn from(id: u32) -> Self {
        NodeId(id)
    }
}

/// A directed edge `source -> target`.
///
/// Edges are ordered pairs with `source != target` in any valid network;
/// the engine rejects self-loops during topological layering rather than at
/// construction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Edge {
    pub source: NodeId,
    pub target: NodeId,
}

impl Edge {
    /// Create an edge from `source` to `target`.
    pub fn new(source: NodeId, target: NodeId) -> Self {
        Edge { source, target }
    }

    /// Whether this edge starts and ends on the same node.
    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.source, self.target)
    }
}

impl From<(u32, u32)> for Edge {
    fn from((source, target): (u32, u32)) -> Self {
        Edge::new(NodeId(source), NodeId(target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id_display() {
        assert_eq!(NodeId(42).to_string(), "42");
    }

    #[test]
    fn test_node_id_ordering() {
        assert!(NodeId(1) < NodeId(2));
        assert_eq!(NodeId(7), NodeId::from(7));
    }

    #[test]
    fn test_edge_display() {
        let edge = Edge::from((3, 9));
        assert_eq!(edge.to_string(), "3->9");
    }

    #[test]
    fn test_edge_ordering_is_lexicographic() {
        assert!(Edge::from((1, 5)) < Edge::from((2, 1)));
        assert!(Edge::from((1, 5)) < Edge::from((1, 6)));
    }

    #[test]
    fn test_self_loop_detection() {
        assert!(Edge::from((4, 4)).is_self_loop());
        assert!(!Edge::from((4, 5)).is_self_loop());
    }
}
