//! Diamond identification: grouping join parents by shared fork ancestry.
//!
//! A join whose parents share a fork ancestor cannot be combined by the
//! noisy-OR shortcut: the parents' reachabilities are correlated through the
//! shared fork. This module discovers those forks for every join and
//! partitions them into ancestor groups, each of which the solver later
//! resolves by conditioning on the group's top fork(s).
//!
//! # Grouping
//!
//! For a join `j`, a fork `a` influences a parent `p` of `j` when `a` is an
//! ancestor of `p`, or when `a` is itself a parent of `j` (its direct edge
//! into `j` is then one of the correlated channels). Forks that influence at
//! least two parents are shared; shared forks with identical influenced sets
//! form one [`AncestorGroup`]. Two forks with overlapping but unequal
//! influenced sets land in different groups on purpose: the partition stays
//! well-defined and each group is driven by its own conditioning forks.
//!
//! Forks already pinned by an enclosing conditioning pass are excluded from
//! candidacy. Their state is deterministic inside the sub-problem, so paths
//! through them are independent and need no further conditioning; the
//! exclusion is also what makes the recursive decomposition terminate.

use crate::graph::DagGraph;
use crate::topology::NetworkTopology;
use dagprop_common::NodeId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A maximal set of forks with identical influence over a join's parents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AncestorGroup {
    /// The shared forks driving this group.
    pub ancestors: BTreeSet<NodeId>,
    /// The parents of the join that every group member influences.
    pub influenced_parents: BTreeSet<NodeId>,
    /// Group members in the latest iteration layer; the conditioning
    /// variables for the sub-solve.
    pub top_nodes: BTreeSet<NodeId>,
}

/// The diamond structure of one join: its ancestor groups plus the parents
/// not covered by any group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupedDiamond {
    /// Ancestor groups in deterministic order (by influenced parent set).
    pub groups: Vec<AncestorGroup>,
    /// Parents that contribute independently of every group.
    pub non_diamond_parents: BTreeSet<NodeId>,
}

/// Diamond structures per join. Joins without shared ancestry are absent.
pub type DiamondIndex = BTreeMap<NodeId, GroupedDiamond>;

/// Identify the diamond structure of every join in the graph.
pub fn identify_diamonds(graph: &DagGraph, topology: &NetworkTopology) -> DiamondIndex {
    identify_with_exclusions(graph, topology, &BTreeSet::new())
}

/// Identify diamonds, ignoring forks whose state is already pinned by an
/// enclosing conditioning pass.
pub(crate) fn identify_with_exclusions(
    graph: &DagGraph,
    topology: &NetworkTopology,
    pinned: &BTreeSet<NodeId>,
) -> DiamondIndex {
    let mut index = DiamondIndex::new();

    for &join in topology.joins() {
        if let Some(diamond) = group_join_parents(graph, topology, join, pinned) {
            index.insert(join, diamond);
        }
    }

    index
}

/// Group the parents of one join by shared fork ancestry.
///
/// Returns `None` when no fork influences two or more parents, in which case
/// the join uses regular combination only.
fn group_join_parents(
    graph: &DagGraph,
    topology: &NetworkTopology,
    join: NodeId,
    pinned: &BTreeSet<NodeId>,
) -> Option<GroupedDiamond> {
    let parents = graph.parents(join);

    // Invert fork ancestry: which parents does each candidate fork reach?
    let mut influenced: BTreeMap<NodeId, BTreeSet<NodeId>> = BTreeMap::new();
    for &parent in parents {
        for &fork in topology.ancestors_of(parent) {
            if topology.is_fork(fork) && !pinned.contains(&fork) {
                influenced.entry(fork).or_default().insert(parent);
            }
        }
        // A fork that is itself a parent correlates its direct edge with its
        // indirect paths, so it counts among its own influenced parents.
        if topology.is_fork(parent) && !pinned.contains(&parent) {
            influenced.entry(parent).or_default().insert(parent);
        }
    }

    // Shared forks only.
    influenced.retain(|_, parents| parents.len() >= 2);
    if influenced.is_empty() {
        return None;
    }

    // Forks with identical influenced sets form one group.
    let mut by_parent_set: BTreeMap<BTreeSet<NodeId>, BTreeSet<NodeId>> = BTreeMap::new();
    for (fork, parent_set) in influenced {
        by_parent_set.entry(parent_set).or_default().insert(fork);
    }

    let mut covered: BTreeSet<NodeId> = BTreeSet::new();
    let mut groups = Vec::with_capacity(by_parent_set.len());
    for (influenced_parents, ancestors) in by_parent_set {
        covered.extend(influenced_parents.iter().copied());
        let top_nodes = top_layer_members(topology, &ancestors);
        groups.push(AncestorGroup {
            ancestors,
            influenced_parents,
            top_nodes,
        });
    }

    let non_diamond_parents = parents
        .iter()
        .copied()
        .filter(|p| !covered.contains(p))
        .collect();

    Some(GroupedDiamond {
        groups,
        non_diamond_parents,
    })
}

/// The members of `ancestors` lying in the latest iteration layer.
fn top_layer_members(topology: &NetworkTopology, ancestors: &BTreeSet<NodeId>) -> BTreeSet<NodeId> {
    let top_layer = ancestors
        .iter()
        .filter_map(|&a| topology.layer_of(a))
        .max()
        .unwrap_or(0);

    ancestors
        .iter()
        .copied()
        .filter(|&a| topology.layer_of(a) == Some(top_layer))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::analyze;
    use dagprop_common::Edge;

    fn node(id: u32) -> NodeId {
        NodeId(id)
    }

    fn nodes(ids: &[u32]) -> BTreeSet<NodeId> {
        ids.iter().map(|&id| NodeId(id)).collect()
    }

    fn identify(edges: &[(u32, u32)]) -> (DagGraph, DiamondIndex) {
        let graph = DagGraph::from_edges([], edges.iter().copied().map(Edge::from));
        let topology = analyze(&graph).unwrap();
        let index = identify_diamonds(&graph, &topology);
        (graph, index)
    }

    #[test]
    fn test_classic_diamond_forms_one_group() {
        let (_, index) = identify(&[(1, 2), (1, 3), (2, 4), (3, 4)]);

        let diamond = index.get(&node(4)).expect("join 4 has a diamond");
        assert_eq!(diamond.groups.len(), 1);
        assert!(diamond.non_diamond_parents.is_empty());

        let group = &diamond.groups[0];
        assert_eq!(group.ancestors, nodes(&[1]));
        assert_eq!(group.influenced_parents, nodes(&[2, 3]));
        assert_eq!(group.top_nodes, nodes(&[1]));
    }

    #[test]
    fn test_independent_sources_have_no_diamond() {
        // Two sources joining: correlation-free.
        let (_, index) = identify(&[(1, 3), (2, 3)]);
        assert!(index.is_empty());
    }

    #[test]
    fn test_chain_has_no_diamond() {
        let (_, index) = identify(&[(1, 2), (2, 3)]);
        assert!(index.is_empty());
    }

    #[test]
    fn test_mixed_join_keeps_residual_parent() {
        // Diamond through fork 1 plus an unrelated source parent 5.
        let (_, index) = identify(&[(1, 2), (1, 3), (2, 4), (3, 4), (5, 4)]);

        let diamond = index.get(&node(4)).unwrap();
        assert_eq!(diamond.groups.len(), 1);
        assert_eq!(diamond.groups[0].influenced_parents, nodes(&[2, 3]));
        assert_eq!(diamond.non_diamond_parents, nodes(&[5]));
    }

    #[test]
    fn test_dual_fork_same_influence_merges_into_one_group() {
        // Forks 1 and 2 both feed parents 3 and 4 of join 5.
        let (_, index) = identify(&[(1, 3), (1, 4), (2, 3), (2, 4), (3, 5), (4, 5)]);

        let diamond = index.get(&node(5)).unwrap();
        assert_eq!(diamond.groups.len(), 1);

        let group = &diamond.groups[0];
        assert_eq!(group.ancestors, nodes(&[1, 2]));
        assert_eq!(group.influenced_parents, nodes(&[3, 4]));
        // Both forks sit in layer 0, so both are top nodes.
        assert_eq!(group.top_nodes, nodes(&[1, 2]));
    }

    #[test]
    fn test_disjoint_diamonds_form_two_groups() {
        // Two separate diamonds feed join 9.
        let (_, index) = identify(&[
            (1, 3),
            (1, 4),
            (2, 5),
            (2, 6),
            (3, 9),
            (4, 9),
            (5, 9),
            (6, 9),
        ]);

        let diamond = index.get(&node(9)).unwrap();
        assert_eq!(diamond.groups.len(), 2);
        assert_eq!(diamond.groups[0].influenced_parents, nodes(&[3, 4]));
        assert_eq!(diamond.groups[0].ancestors, nodes(&[1]));
        assert_eq!(diamond.groups[1].influenced_parents, nodes(&[5, 6]));
        assert_eq!(diamond.groups[1].ancestors, nodes(&[2]));
        assert!(diamond.non_diamond_parents.is_empty());
    }

    #[test]
    fn test_overlapping_influence_stays_in_separate_groups() {
        // Fork 1 reaches parents {3,4}; fork 2 reaches parents {4,5}.
        let (_, index) = identify(&[
            (1, 3),
            (1, 4),
            (2, 4),
            (2, 5),
            (3, 6),
            (4, 6),
            (5, 6),
        ]);

        let diamond = index.get(&node(6)).unwrap();
        assert_eq!(diamond.groups.len(), 2);
        assert_eq!(diamond.groups[0].influenced_parents, nodes(&[3, 4]));
        assert_eq!(diamond.groups[1].influenced_parents, nodes(&[4, 5]));
    }

    #[test]
    fn test_fork_that_is_also_a_parent_joins_its_own_group() {
        // 1 -> 3 directly and 1 -> 2 -> 3: the direct edge correlates with
        // the indirect path.
        let (_, index) = identify(&[(1, 2), (1, 3), (2, 3)]);

        let diamond = index.get(&node(3)).unwrap();
        assert_eq!(diamond.groups.len(), 1);
        assert_eq!(diamond.groups[0].ancestors, nodes(&[1]));
        assert_eq!(diamond.groups[0].influenced_parents, nodes(&[1, 2]));
        assert!(diamond.non_diamond_parents.is_empty());
    }

    #[test]
    fn test_top_nodes_pick_latest_layer() {
        // Fork 1 (layer 0) feeds fork 2 (layer 1); both influence {3, 4}.
        let (_, index) = identify(&[(1, 2), (1, 3), (2, 3), (2, 4), (3, 5), (4, 5)]);

        let diamond = index.get(&node(5)).unwrap();
        // 1 influences 3 (direct) and 4 (via 2); 2 influences 3 and 4.
        assert_eq!(diamond.groups.len(), 1);
        let group = &diamond.groups[0];
        assert_eq!(group.ancestors, nodes(&[1, 2]));
        assert_eq!(group.top_nodes, nodes(&[2]));
    }

    #[test]
    fn test_pinned_forks_are_ignored() {
        let graph = DagGraph::from_edges(
            [],
            [(1, 2), (1, 3), (2, 4), (3, 4)].map(Edge::from),
        );
        let topology = analyze(&graph).unwrap();
        let pinned = nodes(&[1]);
        let index = identify_with_exclusions(&graph, &topology, &pinned);
        assert!(index.is_empty());
    }

    #[test]
    fn test_fork_influencing_single_parent_is_not_shared() {
        // Fork 1 splits but only one branch reaches the join.
        let (_, index) = identify(&[(1, 2), (1, 3), (2, 4), (5, 4)]);
        assert!(index.is_empty());
    }
}
