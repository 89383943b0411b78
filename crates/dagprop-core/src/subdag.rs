//! Conditioned sub-DAG construction for diamond sub-solves.
//!
//! For one ancestor group feeding a join, the solver needs a self-contained
//! sub-problem in which the only stochastic link to the outer graph runs
//! through the group's conditioning forks. This module extracts that
//! sub-problem:
//!
//! - the induced subgraph over every node on a path from a group ancestor to
//!   an influenced parent, plus the parents and the join itself;
//! - edges into the conditioning forks removed, since their state is pinned
//!   per branch;
//! - nodes that can no longer reach the join once those edges are cut
//!   dropped entirely: their influence flows only through the pinned forks
//!   and is already absorbed by the conditioning;
//! - remaining sub-nodes with no induced in-edges frozen at their already
//!   computed outer belief;
//! - stochastic inputs arriving from outside the induced set frozen as
//!   boundary sources carrying their outer belief, without pulling in any of
//!   their own upstream structure;
//! - the join's own prior pinned open, so the sub-solve yields the pure
//!   upstream-delivery probability and the outer pass applies the join prior
//!   exactly once.
//!
//! The sub-problem's topology and diamond structure are re-identified from
//! scratch by the solver, which is what makes nested diamonds condition
//! recursively.

use crate::diamond::AncestorGroup;
use crate::graph::DagGraph;
use crate::priors::{EdgePriors, NodePriors};
use crate::solver::BeliefMap;
use crate::topology::NetworkTopology;
use dagprop_common::{Edge, NodeId};
use std::collections::{BTreeMap, BTreeSet};

/// A conditioned sub-problem extracted from one ancestor group.
#[derive(Debug, Clone)]
pub struct SubProblem {
    /// Induced subgraph plus frozen boundary sources.
    pub graph: DagGraph,
    /// Priors for every sub-node; conditioning forks hold a placeholder that
    /// the solver overwrites per branch.
    pub node_priors: NodePriors,
    /// Outer edge priors restricted to the sub-edges.
    pub edge_priors: EdgePriors,
    /// The join whose delivery probability the sub-solve reads off.
    pub join: NodeId,
    /// Conditioning forks, ascending; one branch per joint state.
    pub conditioning: Vec<NodeId>,
    /// Outer beliefs of the conditioning forks, aligned with `conditioning`.
    pub weights: Vec<f64>,
}

/// Build the conditioned sub-problem for `group` feeding `join`.
///
/// `beliefs` must already cover every ancestor of `join`; the solver
/// guarantees this by traversing in layer order.
pub fn build_sub_problem(
    graph: &DagGraph,
    topology: &NetworkTopology,
    join: NodeId,
    group: &AncestorGroup,
    beliefs: &BeliefMap,
    node_priors: &NodePriors,
    edge_priors: &EdgePriors,
) -> SubProblem {
    let relevant = relevant_nodes(topology, join, group);

    // Induced edges among relevant nodes. Edges landing on a conditioning
    // fork are forbidden: the fork carries no incoming stochasticity in the
    // sub-problem.
    let mut induced_incoming: BTreeMap<NodeId, BTreeSet<NodeId>> = BTreeMap::new();
    for &u in &relevant {
        for &v in graph.children(u) {
            if relevant.contains(&v) && !group.top_nodes.contains(&v) {
                induced_incoming.entry(v).or_default().insert(u);
            }
        }
    }

    // Keep only nodes that still reach the join after the conditioning cut;
    // everything else influences the join solely through the pinned forks.
    let kept = backward_closure(join, &induced_incoming);

    let conditioning: Vec<NodeId> = group.top_nodes.iter().copied().collect();
    let mut sub_nodes: BTreeSet<NodeId> = kept.clone();
    let mut sub_edges: BTreeSet<Edge> = BTreeSet::new();
    let mut sub_priors = NodePriors::new();

    for &v in &kept {
        if let Some(parents) = induced_incoming.get(&v) {
            for &u in parents {
                sub_edges.insert(Edge::new(u, v));
            }
        }
    }

    for &v in &kept {
        if group.top_nodes.contains(&v) {
            // Placeholder; the solver pins the fork per branch.
            sub_priors.set(v, 0.0);
            continue;
        }
        if v == join {
            sub_priors.set(v, 1.0);
            continue;
        }

        let has_internal_parent = induced_incoming
            .get(&v)
            .map_or(false, |parents| !parents.is_empty());
        if !has_internal_parent {
            // Cut off from the induced edges entirely: the node behaves as a
            // known constant at its outer belief.
            sub_priors.set(v, outer_belief(beliefs, v));
            continue;
        }

        sub_priors.set(
            v,
            node_priors
                .get(v)
                .expect("validated input carries a prior for every node"),
        );

        // Stochastic inputs from outside the induced set are frozen as
        // boundary sources; their upstream structure stays behind.
        for &external in graph.parents(v) {
            if !relevant.contains(&external) {
                sub_nodes.insert(external);
                sub_edges.insert(Edge::new(external, v));
                sub_priors.set(external, outer_belief(beliefs, external));
            }
        }
    }

    let weights = conditioning
        .iter()
        .map(|&fork| outer_belief(beliefs, fork))
        .collect();

    let sub_edge_priors = sub_edges
        .iter()
        .map(|&edge| {
            (
                edge,
                edge_priors
                    .get(edge)
                    .expect("validated input carries a prior for every edge"),
            )
        })
        .collect();

    SubProblem {
        graph: DagGraph::from_edges(sub_nodes, sub_edges),
        node_priors: sub_priors,
        edge_priors: sub_edge_priors,
        join,
        conditioning,
        weights,
    }
}

/// Every node on a path from a group ancestor to an influenced parent, plus
/// the parents and the join.
fn relevant_nodes(
    topology: &NetworkTopology,
    join: NodeId,
    group: &AncestorGroup,
) -> BTreeSet<NodeId> {
    let mut relevant: BTreeSet<NodeId> = group.influenced_parents.clone();
    relevant.insert(join);

    // Cones of all group ancestors, not only the top forks: lower shared
    // forks whose influence bypasses the pinned ones must be present so the
    // recursive pass can condition on them.
    for &ancestor in &group.ancestors {
        relevant.insert(ancestor);
        let cone = topology.descendants_of(ancestor);
        for &parent in &group.influenced_parents {
            for &mid in topology.ancestors_of(parent) {
                if cone.contains(&mid) {
                    relevant.insert(mid);
                }
            }
        }
    }

    relevant
}

/// Nodes with a path to `target` over the given incoming index, including
/// `target` itself.
fn backward_closure(
    target: NodeId,
    incoming: &BTreeMap<NodeId, BTreeSet<NodeId>>,
) -> BTreeSet<NodeId> {
    let mut kept = BTreeSet::new();
    let mut stack = vec![target];
    while let Some(v) = stack.pop() {
        if !kept.insert(v) {
            continue;
        }
        if let Some(parents) = incoming.get(&v) {
            stack.extend(parents.iter().copied());
        }
    }
    kept
}

fn outer_belief(beliefs: &BeliefMap, node: NodeId) -> f64 {
    beliefs
        .get(node)
        .expect("layer order guarantees ancestor beliefs are computed")
}
