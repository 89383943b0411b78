//! Activation priors for nodes and edges.
//!
//! Every node and every directed edge carries an independent activation
//! probability in `[0, 1]`. The validator checks completeness and range
//! before a solve; the maps themselves accept any finite value so that
//! out-of-range inputs surface as a tagged validation error rather than a
//! construction panic.

use dagprop_common::{Edge, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-node activation priors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodePriors(BTreeMap<NodeId, f64>);

impl NodePriors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign the same prior to every listed node.
    pub fn uniform(nodes: impl IntoIterator<Item = NodeId>, prior: f64) -> Self {
        NodePriors(nodes.into_iter().map(|n| (n, prior)).collect())
    }

    pub fn set(&mut self, node: NodeId, prior: f64) {
        self.0.insert(node, prior);
    }

    pub fn get(&self, node: NodeId) -> Option<f64> {
        self.0.get(&node).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, f64)> + '_ {
        self.0.iter().map(|(n, p)| (*n, *p))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(NodeId, f64)> for NodePriors {
    fn from_iter<T: IntoIterator<Item = (NodeId, f64)>>(iter: T) -> Self {
        NodePriors(iter.into_iter().collect())
    }
}

/// One edge prior entry, used as the serialized form of [`EdgePriors`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EdgePriorEntry {
    pub edge: Edge,
    pub prior: f64,
}

/// Per-edge activation priors.
///
/// Serialized as a list of `{edge, prior}` entries because struct-keyed maps
/// do not survive JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(into = "Vec<EdgePriorEntry>", from = "Vec<EdgePriorEntry>")]
pub struct EdgePriors(BTreeMap<Edge, f64>);

impl EdgePriors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign the same prior to every listed edge.
    pub fn uniform(edges: impl IntoIterator<Item = Edge>, prior: f64) -> Self {
        EdgePriors(edges.into_iter().map(|e| (e, prior)).collect())
    }

    pub fn set(&mut self, edge: Edge, prior: f64) {
        self.0.insert(edge, prior);
    }

    pub fn get(&self, edge: Edge) -> Option<f64> {
        self.0.get(&edge).copied()
    }

    pub fn contains(&self, edge: Edge) -> bool {
        self.0.contains_key(&edge)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Edge, f64)> + '_ {
        self.0.iter().map(|(e, p)| (*e, *p))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(Edge, f64)> for EdgePriors {
    fn from_iter<T: IntoIterator<Item = (Edge, f64)>>(iter: T) -> Self {
        EdgePriors(iter.into_iter().collect())
    }
}

impl From<EdgePriors> for Vec<EdgePriorEntry> {
    fn from(priors: EdgePriors) -> Self {
        priors
            .0
            .into_iter()
            .map(|(edge, prior)| EdgePriorEntry { edge, prior })
            .collect()
    }
}

impl From<Vec<EdgePriorEntry>> for EdgePriors {
    fn from(entries: Vec<EdgePriorEntry>) -> Self {
        EdgePriors(entries.into_iter().map(|e| (e.edge, e.prior)).collect())
    }
}
