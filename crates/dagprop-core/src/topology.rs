//! Topological layering, transitive closures, and fork/join detection.
//!
//! Layering is standard Kahn leveling: each layer is the set of nodes whose
//! remaining in-degree reaches zero together, so every edge goes strictly
//! from an earlier to a later layer and nodes within a layer are mutually
//! independent. Ancestor closures are folded in during the same pass and the
//! descendant closure is derived by inversion afterwards.
//!
//! Closures cost O(V^2) memory in the worst case. That trade is deliberate:
//! diamond identification and sub-DAG scoping issue ancestry queries in tight
//! loops and need O(1) lookups.

use crate::graph::DagGraph;
use dagprop_common::{Error, NodeId, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

static EMPTY_SET: BTreeSet<NodeId> = BTreeSet::new();

/// Derived structure of a DAG: layers, closures, forks, and joins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkTopology {
    layers: Vec<Vec<NodeId>>,
    layer_of: BTreeMap<NodeId, usize>,
    ancestors: BTreeMap<NodeId, BTreeSet<NodeId>>,
    descendants: BTreeMap<NodeId, BTreeSet<NodeId>>,
    forks: BTreeSet<NodeId>,
    joins: BTreeSet<NodeId>,
}

/// Analyze a graph: iteration layers, closures, fork and join sets.
///
/// Fails with [`Error::CyclicGraph`] if any node survives the Kahn queue.
pub fn analyze(graph: &DagGraph) -> Result<NetworkTopology> {
    let mut indegree: BTreeMap<NodeId, usize> = graph
        .nodes()
        .map(|n| (n, graph.in_degree(n)))
        .collect();
    let mut ancestors: BTreeMap<NodeId, BTreeSet<NodeId>> =
        graph.nodes().map(|n| (n, BTreeSet::new())).collect();

    let mut layers: Vec<Vec<NodeId>> = Vec::new();
    let mut layer_of: BTreeMap<NodeId, usize> = BTreeMap::new();
    let mut frontier: Vec<NodeId> = graph.sources().iter().copied().collect();
    let mut emitted = 0usize;

    while !frontier.is_empty() {
        let layer_index = layers.len();
        let mut next: BTreeSet<NodeId> = BTreeSet::new();

        for &u in &frontier {
            layer_of.insert(u, layer_index);
            emitted += 1;

            // Fold u and u's ancestry into every successor before the
            // successor can be emitted.
            let inherited = ancestors.get(&u).cloned().unwrap_or_default();
            for &v in graph.children(u) {
                let entry = ancestors.entry(v).or_default();
                entry.extend(inherited.iter().copied());
                entry.insert(u);

                let remaining = indegree
                    .get_mut(&v)
                    .expect("adjacency references a node absent from the node set");
                *remaining -= 1;
                if *remaining == 0 {
                    next.insert(v);
                }
            }
        }

        layers.push(frontier);
        frontier = next.into_iter().collect();
    }

    if emitted < graph.node_count() {
        return Err(Error::CyclicGraph);
    }

    let mut descendants: BTreeMap<NodeId, BTreeSet<NodeId>> =
        graph.nodes().map(|n| (n, BTreeSet::new())).collect();
    for (&node, ancs) in &ancestors {
        for a in ancs {
            descendants
                .get_mut(a)
                .expect("ancestor references a node absent from the node set")
                .insert(node);
        }
    }

    let forks = graph.nodes().filter(|&n| graph.out_degree(n) >= 2).collect();
    let joins = graph.nodes().filter(|&n| graph.in_degree(n) >= 2).collect();

    Ok(NetworkTopology {
        layers,
        layer_of,
        ancestors,
        descendants,
        forks,
        joins,
    })
}

impl NetworkTopology {
    /// Iteration layers in evaluation order; nodes within a layer are sorted
    /// by id but mutually independent.
    pub fn layers(&self) -> &[Vec<NodeId>] {
        &self.layers
    }

    /// The layer index of `node`, if the node was layered.
    pub fn layer_of(&self, node: NodeId) -> Option<usize> {
        self.layer_of.get(&node).copied()
    }

    /// Transitive predecessors of `node`, excluding the node itself.
    pub fn ancestors_of(&self, node: NodeId) -> &BTreeSet<NodeId> {
        self.ancestors.get(&node).unwrap_or(&EMPTY_SET)
    }

    /// Transitive successors of `node`, excluding the node itself.
    pub fn descendants_of(&self, node: NodeId) -> &BTreeSet<NodeId> {
        self.descendants.get(&node).unwrap_or(&EMPTY_SET)
    }

    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.ancestors_of(node).contains(&ancestor)
    }

    /// Nodes with out-degree >= 2.
    pub fn forks(&self) -> &BTreeSet<NodeId> {
        &self.forks
    }

    /// Nodes with in-degree >= 2.
    pub fn joins(&self) -> &BTreeSet<NodeId> {
        &self.joins
    }

    pub fn is_fork(&self, node: NodeId) -> bool {
        self.forks.contains(&node)
    }

    pub fn is_join(&self, node: NodeId) -> bool {
        self.joins.contains(&node)
    }
}
