//! Immutable DAG adjacency store.
//!
//! A [`DagGraph`] holds the outgoing and incoming adjacency indices, the edge
//! set, and the derived source set. Once built it is treated as immutable for
//! the duration of a solve. Ordered collections are used throughout so that
//! iteration order, and with it every floating-point accumulation downstream,
//! is reproducible bit for bit.

use dagprop_common::{Edge, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

static EMPTY_SET: BTreeSet<NodeId> = BTreeSet::new();

/// Immutable adjacency store for a directed graph.
///
/// Construction deduplicates parallel edges and keeps the two adjacency
/// indices mutually consistent. Acyclicity is not checked here; it is
/// established by topological layering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DagGraph {
    outgoing: BTreeMap<NodeId, BTreeSet<NodeId>>,
    incoming: BTreeMap<NodeId, BTreeSet<NodeId>>,
    nodes: BTreeSet<NodeId>,
    edges: BTreeSet<Edge>,
    sources: BTreeSet<NodeId>,
}

impl DagGraph {
    /// Build a graph from a node set and an edge list.
    ///
    /// Nodes referenced only by edges are added implicitly; isolated nodes
    /// must be listed explicitly. Parallel edges collapse to one.
    pub fn from_edges(
        nodes: impl IntoIterator<Item = NodeId>,
        edges: impl IntoIterator<Item = Edge>,
    ) -> Self {
        let mut graph = DagGraph {
            nodes: nodes.into_iter().collect(),
            ..DagGraph::default()
        };

        for edge in edges {
            graph.nodes.insert(edge.source);
            graph.nodes.insert(edge.target);
            graph.edges.insert(edge);
            graph
                .outgoing
                .entry(edge.source)
                .or_default()
                .insert(edge.target);
            graph
                .incoming
                .entry(edge.target)
                .or_default()
                .insert(edge.source);
        }

        graph.sources = graph
            .nodes
            .iter()
            .filter(|n| graph.incoming.get(n).map_or(true, |p| p.is_empty()))
            .copied()
            .collect();

        graph
    }

    /// All nodes, in ascending id order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().copied()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn contains_node(&self, node: NodeId) -> bool {
        self.nodes.contains(&node)
    }

    /// All edges, in ascending `(source, target)` order.
    pub fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        self.edges.iter().copied()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn has_edge(&self, source: NodeId, target: NodeId) -> bool {
        self.edges.contains(&Edge::new(source, target))
    }

    /// Nodes with no incoming edges.
    pub fn sources(&self) -> &BTreeSet<NodeId> {
        &self.sources
    }

    pub fn is_source(&self, node: NodeId) -> bool {
        self.sources.contains(&node)
    }

    /// Direct predecessors of `node`, in ascending order.
    pub fn parents(&self, node: NodeId) -> &BTreeSet<NodeId> {
        self.incoming.get(&node).unwrap_or(&EMPTY_SET)
    }

    /// Direct successors of `node`, in ascending order.
    pub fn children(&self, node: NodeId) -> &BTreeSet<NodeId> {
        self.outgoing.get(&node).unwrap_or(&EMPTY_SET)
    }

    pub fn in_degree(&self, node: NodeId) -> usize {
        self.parents(node).len()
    }

    pub fn out_degree(&self, node: NodeId) -> usize {
        self.children(node).len()
    }

    /// The outgoing adjacency index.
    pub fn outgoing_index(&self) -> &BTreeMap<NodeId, BTreeSet<NodeId>> {
        &self.outgoing
    }

    /// The incoming adjacency index.
    pub fn incoming_index(&self) -> &BTreeMap<NodeId, BTreeSet<NodeId>> {
        &self.incoming
    }
}
