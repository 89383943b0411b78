//! Shared helpers for integration tests.

use dagprop_core::{DagGraph, Edge, EdgePriors, NodeId, NodePriors};
use std::collections::{BTreeMap, BTreeSet};

/// Build a graph plus uniform priors from an edge list.
pub fn network(edges: &[(u32, u32)], prior: f64) -> (DagGraph, NodePriors, EdgePriors) {
    let graph = DagGraph::from_edges([], edges.iter().copied().map(Edge::from));
    let node_priors = NodePriors::uniform(graph.nodes(), prior);
    let edge_priors = EdgePriors::uniform(graph.edges(), prior);
    (graph, node_priors, edge_priors)
}

/// Ground-truth reachability by exhaustive enumeration of every joint
/// activation state of all nodes and edges.
///
/// Exponential in `|V| + |E|`; intended for graphs of a dozen-odd elements.
pub fn enumerate_reachability(
    graph: &DagGraph,
    node_priors: &NodePriors,
    edge_priors: &EdgePriors,
) -> BTreeMap<NodeId, f64> {
    let nodes: Vec<NodeId> = graph.nodes().collect();
    let edges: Vec<Edge> = graph.edges().collect();
    let bits = nodes.len() + edges.len();
    assert!(bits <= 22, "enumeration oracle is for tiny graphs only");

    let edge_bit: BTreeMap<Edge, usize> = edges
        .iter()
        .enumerate()
        .map(|(i, &e)| (e, nodes.len() + i))
        .collect();

    let mut totals: BTreeMap<NodeId, f64> = nodes.iter().map(|&n| (n, 0.0)).collect();

    for state in 0u64..(1 << bits) {
        let active = |bit: usize| state & (1 << bit) != 0;

        let mut probability = 1.0;
        for (i, &n) in nodes.iter().enumerate() {
            let p = node_priors.get(n).unwrap();
            probability *= if active(i) { p } else { 1.0 - p };
        }
        for (i, &e) in edges.iter().enumerate() {
            let p = edge_priors.get(e).unwrap();
            probability *= if active(nodes.len() + i) { p } else { 1.0 - p };
        }
        if probability == 0.0 {
            continue;
        }

        // A node is reached when it is active and is a source or has a
        // reached parent over an active edge.
        let mut reached: BTreeSet<NodeId> = BTreeSet::new();
        loop {
            let mut changed = false;
            for (i, &n) in nodes.iter().enumerate() {
                if reached.contains(&n) || !active(i) {
                    continue;
                }
                let fed = graph.is_source(n)
                    || graph.parents(n).iter().any(|&p| {
                        reached.contains(&p) && active(edge_bit[&Edge::new(p, n)])
                    });
                if fed {
                    reached.insert(n);
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }

        for n in reached {
            *totals.get_mut(&n).unwrap() += probability;
        }
    }

    totals
}
