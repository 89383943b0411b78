//! Layered reachability solver with recursive diamond conditioning.
//!
//! The solver walks the iteration layers in order and assigns each node a
//! belief: the probability that the node is reached from at least one
//! activated source. Nodes in the same layer depend only on strictly earlier
//! layers, so their beliefs are independent of each other; the traversal is
//! sequential here but the per-layer work is safe to parallelize.
//!
//! # Per-node update
//!
//! - Sources take their own prior.
//! - A join with diamond structure combines one conditioned contribution per
//!   ancestor group with the plain contributions of its residual parents,
//!   through the explicit inclusion-exclusion expansion, then applies the
//!   node prior.
//! - Every other node combines its per-parent contributions
//!   `belief(p) * edge_prior(p, v)` and applies the node prior.
//!
//! # Diamond conditioning
//!
//! For one ancestor group the solver extracts the conditioned sub-problem
//! (see [`crate::subdag`]), enumerates the joint success/failure states of
//! the group's top forks, re-solves the sub-problem once per state with the
//! forks pinned to 1 or 0, and mixes the resulting delivery probabilities by
//! total probability:
//!
//! ```text
//! group_belief = sum over states s of P(forks = s) * B_sub[join | s]
//! ```
//!
//! The sub-problem's topology and diamond structure are re-identified from
//! scratch, so nested diamonds condition recursively. Forks pinned by an
//! enclosing pass are excluded from re-identification; every recursion level
//! pins at least one previously unpinned fork, which bounds the depth.
//!
//! The solve is a pure function of its inputs: identical inputs produce a
//! bit-for-bit identical belief map.

use crate::diamond::{self, AncestorGroup, DiamondIndex, GroupedDiamond};
use crate::graph::DagGraph;
use crate::priors::{EdgePriors, NodePriors};
use crate::subdag;
use crate::topology::{self, NetworkTopology};
use crate::validate;
use dagprop_common::{Edge, NodeId, Result};
use dagprop_math::{clamp_unit, complement_product, union_probability};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, trace};

/// Computed reachability probability per node.
///
/// Write-once per node during a solve; serialized as a plain id-to-number
/// map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BeliefMap(BTreeMap<NodeId, f64>);

impl BeliefMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, node: NodeId) -> Option<f64> {
        self.0.get(&node).copied()
    }

    pub fn set(&mut self, node: NodeId, belief: f64) {
        self.0.insert(node, belief);
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, f64)> + '_ {
        self.0.iter().map(|(n, b)| (*n, *b))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> BTreeMap<NodeId, f64> {
        self.0
    }
}

impl FromIterator<(NodeId, f64)> for BeliefMap {
    fn from_iter<T: IntoIterator<Item = (NodeId, f64)>>(iter: T) -> Self {
        BeliefMap(iter.into_iter().collect())
    }
}

/// Solve reachability over precomputed topology and diamond structures.
///
/// Validates the inputs first; the solve itself never fails on validated
/// input.
pub fn solve(
    graph: &DagGraph,
    topology: &NetworkTopology,
    diamonds: &DiamondIndex,
    node_priors: &NodePriors,
    edge_priors: &EdgePriors,
) -> Result<BeliefMap> {
    validate::validate_inputs(graph, topology, node_priors, edge_priors)?;

    debug!(
        nodes = graph.node_count(),
        layers = topology.layers().len(),
        diamond_joins = diamonds.len(),
        "starting reachability solve"
    );

    let no_pins = BTreeSet::new();
    let pass = LayeredSolve {
        graph,
        topology,
        diamonds,
        node_priors,
        edge_priors,
        pinned: &no_pins,
    };
    Ok(pass.run())
}

/// Analyze, identify diamonds, validate, and solve in one call.
pub fn solve_network(
    graph: &DagGraph,
    node_priors: &NodePriors,
    edge_priors: &EdgePriors,
) -> Result<BeliefMap> {
    let topology = topology::analyze(graph)?;
    let diamonds = diamond::identify_diamonds(graph, &topology);
    solve(graph, &topology, &diamonds, node_priors, edge_priors)
}

/// One layered belief-update pass over a (sub-)problem.
struct LayeredSolve<'a> {
    graph: &'a DagGraph,
    topology: &'a NetworkTopology,
    diamonds: &'a DiamondIndex,
    node_priors: &'a NodePriors,
    edge_priors: &'a EdgePriors,
    /// Forks pinned by enclosing conditioning passes.
    pinned: &'a BTreeSet<NodeId>,
}

impl LayeredSolve<'_> {
    fn run(&self) -> BeliefMap {
        let mut beliefs = BeliefMap::new();

        for layer in self.topology.layers() {
            for &node in layer {
                let belief = if self.graph.is_source(node) {
                    self.node_prior(node)
                } else if let Some(diamond) = self.diamonds.get(&node) {
                    self.diamond_join_belief(node, diamond, &beliefs)
                } else {
                    self.regular_belief(node, &beliefs)
                };

                trace!(node = %node, belief, "belief assigned");
                beliefs.set(node, belief);
            }
        }

        beliefs
    }

    /// Noisy-OR combination over independent parent contributions.
    fn regular_belief(&self, node: NodeId, beliefs: &BeliefMap) -> f64 {
        let contributions: Vec<f64> = self
            .graph
            .parents(node)
            .iter()
            .map(|&parent| self.parent_contribution(parent, node, beliefs))
            .collect();

        // Plain parent terms are independent, so the factored form of the
        // inclusion-exclusion expansion applies.
        let upstream = clamp_unit(complement_product(&contributions));
        clamp_unit(self.node_prior(node) * upstream)
    }

    /// Combination at a join with shared-ancestry structure: conditioned
    /// group contributions plus residual parent contributions.
    fn diamond_join_belief(
        &self,
        join: NodeId,
        diamond: &GroupedDiamond,
        beliefs: &BeliefMap,
    ) -> f64 {
        let mut contributions =
            Vec::with_capacity(diamond.groups.len() + diamond.non_diamond_parents.len());

        for group in &diamond.groups {
            contributions.push(self.conditioned_group_belief(join, group, beliefs));
        }
        for &parent in &diamond.non_diamond_parents {
            contributions.push(self.parent_contribution(parent, join, beliefs));
        }

        // Group contributions are exact joint probabilities obtained by
        // conditioning; they must go through the explicit expansion.
        let upstream = clamp_unit(union_probability(&contributions));
        clamp_unit(self.node_prior(join) * upstream)
    }

    /// Delivery probability of one ancestor group, by total probability over
    /// the joint states of its top forks.
    fn conditioned_group_belief(
        &self,
        join: NodeId,
        group: &AncestorGroup,
        beliefs: &BeliefMap,
    ) -> f64 {
        let sub = subdag::build_sub_problem(
            self.graph,
            self.topology,
            join,
            group,
            beliefs,
            self.node_priors,
            self.edge_priors,
        );

        debug!(
            join = %join,
            forks = sub.conditioning.len(),
            sub_nodes = sub.graph.node_count(),
            "conditioning diamond group"
        );

        let sub_topology = topology::analyze(&sub.graph)
            .expect("conditioned subgraph of a DAG is acyclic");

        let mut sub_pinned = self.pinned.clone();
        sub_pinned.extend(sub.conditioning.iter().copied());
        let sub_diamonds =
            diamond::identify_with_exclusions(&sub.graph, &sub_topology, &sub_pinned);

        let states = 1u32 << sub.conditioning.len();
        let mut group_belief = 0.0;

        for state in 0..states {
            let mut weight = 1.0;
            let mut branch_priors = sub.node_priors.clone();
            for (bit, &fork) in sub.conditioning.iter().enumerate() {
                let reached = state & (1 << bit) != 0;
                branch_priors.set(fork, if reached { 1.0 } else { 0.0 });
                weight *= if reached {
                    sub.weights[bit]
                } else {
                    1.0 - sub.weights[bit]
                };
            }
            if weight == 0.0 {
                continue;
            }

            let branch = LayeredSolve {
                graph: &sub.graph,
                topology: &sub_topology,
                diamonds: &sub_diamonds,
                node_priors: &branch_priors,
                edge_priors: &sub.edge_priors,
                pinned: &sub_pinned,
            };
            let branch_beliefs = branch.run();
            let delivered = branch_beliefs
                .get(sub.join)
                .expect("sub-solve covers the join");

            group_belief += weight * delivered;
        }

        clamp_unit(group_belief)
    }

    fn parent_contribution(&self, parent: NodeId, node: NodeId, beliefs: &BeliefMap) -> f64 {
        let parent_belief = beliefs
            .get(parent)
            .expect("layer order guarantees parent beliefs are computed");
        parent_belief * self.edge_prior(parent, node)
    }

    fn node_prior(&self, node: NodeId) -> f64 {
        self.node_priors
            .get(node)
            .expect("validated input carries a prior for every node")
    }

    fn edge_prior(&self, source: NodeId, target: NodeId) -> f64 {
        self.edge_priors
            .get(Edge::new(source, target))
            .expect("validated input carries a prior for every edge")
    }
}
