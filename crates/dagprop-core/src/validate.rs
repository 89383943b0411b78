//! Structural and probability sanity checks, run once before a solve.
//!
//! Sub-problems skip validation: their construction guarantees consistency.

use crate::graph::DagGraph;
use crate::priors::{EdgePriors, NodePriors};
use crate::topology::NetworkTopology;
use dagprop_common::{AdjacencyDirection, Edge, Error, NodeId, PriorLocation, Result};
use std::collections::BTreeSet;

/// Validate a full set of solve inputs.
///
/// Checks, in order: layering covers every node exactly once; the source
/// contract; mutual consistency of the adjacency indices; presence and range
/// of every node and edge prior. The first failure is returned; no partial
/// solve is attempted.
pub fn validate_inputs(
    graph: &DagGraph,
    topology: &NetworkTopology,
    node_priors: &NodePriors,
    edge_priors: &EdgePriors,
) -> Result<()> {
    check_layering(graph, topology)?;
    check_source_contract(graph)?;
    check_adjacency_consistency(graph)?;
    check_priors(graph, node_priors, edge_priors)?;
    Ok(())
}

fn check_layering(graph: &DagGraph, topology: &NetworkTopology) -> Result<()> {
    let mut seen: BTreeSet<NodeId> = BTreeSet::new();

    for layer in topology.layers() {
        for &node in layer {
            if !graph.contains_node(node) || !seen.insert(node) {
                return Err(Error::DuplicateLayering(node));
            }
        }
    }
    for node in graph.nodes() {
        if !seen.contains(&node) {
            return Err(Error::DuplicateLayering(node));
        }
    }

    Ok(())
}

fn check_source_contract(graph: &DagGraph) -> Result<()> {
    for node in graph.nodes() {
        let has_parents = !graph.parents(node).is_empty();
        if graph.is_source(node) == has_parents {
            return Err(Error::DisconnectedSource(node));
        }
    }
    Ok(())
}

fn check_adjacency_consistency(graph: &DagGraph) -> Result<()> {
    for (&source, children) in graph.outgoing_index() {
        for &target in children {
            let mirrored = graph
                .incoming_index()
                .get(&target)
                .map_or(false, |parents| parents.contains(&source));
            if !mirrored {
                return Err(Error::InconsistentAdjacency {
                    edge: Edge::new(source, target),
                    direction: AdjacencyDirection::Incoming,
                });
            }
        }
    }
    for (&target, parents) in graph.incoming_index() {
        for &source in parents {
            let mirrored = graph
                .outgoing_index()
                .get(&source)
                .map_or(false, |children| children.contains(&target));
            if !mirrored {
                return Err(Error::InconsistentAdjacency {
                    edge: Edge::new(source, target),
                    direction: AdjacencyDirection::Outgoing,
                });
            }
        }
    }
    Ok(())
}

fn check_priors(
    graph: &DagGraph,
    node_priors: &NodePriors,
    edge_priors: &EdgePriors,
) -> Result<()> {
    for node in graph.nodes() {
        match node_priors.get(node) {
            None => return Err(Error::MissingPrior(PriorLocation::Node(node))),
            Some(p) if !(0.0..=1.0).contains(&p) => {
                return Err(Error::ProbabilityOutOfRange {
                    location: PriorLocation::Node(node),
                    value: p,
                })
            }
            Some(_) => {}
        }
    }

    for edge in graph.edges() {
        match edge_priors.get(edge) {
            None => return Err(Error::MissingPrior(PriorLocation::Edge(edge))),
            Some(p) if !(0.0..=1.0).contains(&p) => {
                return Err(Error::ProbabilityOutOfRange {
                    location: PriorLocation::Edge(edge),
                    value: p,
                })
            }
            Some(_) => {}
        }
    }

    Ok(())
}
