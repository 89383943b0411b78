//! Dagprop core: exact reachability probabilities on probabilistic DAGs.
//!
//! Every node and edge of a directed acyclic graph carries an independent
//! activation probability; the engine computes, for every node, the exact
//! probability that it is reached from at least one activated source. Unlike
//! a naive noisy-OR propagation, joins whose parents share stochastic
//! ancestry (diamonds) are solved by conditioning on the shared fork(s) and
//! recursively re-solving the conditioned subgraph.
//!
//! Pipeline, in dependency order:
//! - [`graph`]: immutable adjacency store
//! - [`topology`]: iteration layers, ancestor/descendant closures, fork/join sets
//! - [`diamond`]: grouping of join parents by shared fork ancestry
//! - [`validate`]: structural and probability sanity checks
//! - [`solver`]: layered belief update with recursive diamond conditioning
//!
//! The engine is a pure library: no I/O, no environment, no global state.

pub mod diamond;
pub mod graph;
pub mod priors;
pub mod solver;
pub mod subdag;
pub mod topology;
pub mod validate;

pub use diamond::{identify_diamonds, AncestorGroup, DiamondIndex, GroupedDiamond};
pub use graph::DagGraph;
pub use priors::{EdgePriors, NodePriors};
pub use solver::{solve, solve_network, BeliefMap};
pub use topology::{analyze, NetworkTopology};
pub use validate::validate_inputs;

pub use dagprop_common::{Edge, Error, NodeId, Result};
