//! Error types for the dagprop engine.
//!
//! The engine surfaces exactly one tagged error value per failed call. There
//! is no retry, no partial-result salvage, and no logging at the error path;
//! invalid inputs are rejected up front by the validator and the solver never
//! fails on validated input.

use crate::id::{Edge, NodeId};
use std::fmt;
use thiserror::Error;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Where a prior was expected, or found out of range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PriorLocation {
    Node(NodeId),
    Edge(Edge),
}

impl fmt::Display for PriorLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PriorLocation::Node(node) => write!(f, "node {}", node),
            PriorLocation::Edge(edge) => write!(f, "edge {}", edge),
        }
    }
}

/// Which side of the adjacency store disagreed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdjacencyDirection {
    Outgoing,
    Incoming,
}

impl fmt::Display for AdjacencyDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdjacencyDirection::Outgoing => write!(f, "outgoing"),
            AdjacencyDirection::Incoming => write!(f, "incoming"),
        }
    }
}

/// Unified error type for the engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// A cycle was detected during topological layering.
    #[error("cycle detected during topological layering")]
    CyclicGraph,

    /// A prior is absent for a referenced node or edge.
    #[error("missing prior for {0}")]
    MissingPrior(PriorLocation),

    /// A prior is outside the closed unit interval.
    #[error("probability {value} out of range at {location}")]
    ProbabilityOutOfRange { location: PriorLocation, value: f64 },

    /// The outgoing and incoming adjacency indices disagree.
    #[error("adjacency indices disagree on edge {edge} ({direction} side)")]
    InconsistentAdjacency {
        edge: Edge,
        direction: AdjacencyDirection,
    },

    /// A declared source has incoming edges, or a non-source has none.
    #[error("source contract violated for node {0}: sources have no incoming edges, non-sources at least one")]
    DisconnectedSource(NodeId),

    /// A node appears in multiple iteration layers, or in none.
    #[error("node {0} is missing from or duplicated across iteration layers")]
    DuplicateLayering(NodeId),
}

impl Error {
    /// Stable error code, grouped by failure site.
    ///
    /// - 10: structural (cycles)
    /// - 20-21: prior assignment
    /// - 30-32: index consistency
    pub fn code(&self) -> u32 {
        match self {
            Error::CyclicGraph => 10,
            Error::MissingPrior(_) => 20,
            Error::ProbabilityOutOfRange { .. } => 21,
            Error::InconsistentAdjacency { .. } => 30,
            Error::DisconnectedSource(_) => 31,
            Error::DuplicateLayering(_) => 32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::MissingPrior(PriorLocation::Edge(Edge::from((1, 2))));
        assert_eq!(err.to_string(), "missing prior for edge 1->2");

        let err = Error::ProbabilityOutOfRange {
            location: PriorLocation::Node(NodeId(7)),
            value: 1.5,
        };
        assert_eq!(err.to_string(), "probability 1.5 out of range at node 7");
    }

    #[test]
    fn test_error_codes_are_stable() {
        assert_eq!(Error::CyclicGraph.code(), 10);
        assert_eq!(
            Error::MissingPrior(PriorLocation::Node(NodeId(1))).code(),
            20
        );
        assert_eq!(Error::DuplicateLayering(NodeId(1)).code(), 32);
    }

    #[test]
    fn test_adjacency_direction_display() {
        assert_eq!(AdjacencyDirection::Outgoing.to_string(), "outgoing");
        assert_eq!(AdjacencyDirection::Incoming.to_string(), "incoming");
    }
}
