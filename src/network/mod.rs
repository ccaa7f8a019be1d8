//! Semantic network: the typed graph the solver reasons over.
//!
//! Nodes are features, logical gates, and hypotheses; edges carry one of three
//! evidence relations. The network is an arena ([`SemanticNetwork`]) and every
//! node is addressed by a [`NodeHandle`], so run state keys on identity rather
//! than on node contents, and cycles in the graph are harmless.

pub mod index;
#[cfg(test)]
pub(crate) mod testing;

use std::fmt;
use std::num::NonZeroU64;
use std::str::FromStr;

use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};

pub use index::{NetworkResult, SemanticNetwork};

/// External identity of a node within its knowledge base.
///
/// Uses `NonZeroU64` so that `Option<NodeId>` is the same size as `NodeId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct NodeId(NonZeroU64);

impl NodeId {
    /// Create a `NodeId` from a raw `u64`.
    ///
    /// Returns `None` if `raw` is zero.
    pub fn new(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(NodeId)
    }

    /// Get the underlying `u64` value.
    pub fn get(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Arena handle for a node in one [`SemanticNetwork`].
///
/// Only meaningful for the network that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeHandle(NodeIndex);

impl NodeHandle {
    pub(crate) fn index(self) -> NodeIndex {
        self.0
    }
}

/// What role a node plays in the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// An observable variable, activated by matching its condition.
    Feature,
    /// Opens when every incoming source is satisfied.
    #[serde(alias = "and")]
    AndGate,
    /// Opens when any incoming source is satisfied.
    #[serde(alias = "or")]
    OrGate,
    /// A candidate explanation.
    Hypothesis,
}

impl NodeKind {
    /// Whether this is an AND or OR gate.
    pub fn is_gate(self) -> bool {
        matches!(self, NodeKind::AndGate | NodeKind::OrGate)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Feature => write!(f, "feature"),
            NodeKind::AndGate => write!(f, "and"),
            NodeKind::OrGate => write!(f, "or"),
            NodeKind::Hypothesis => write!(f, "hypothesis"),
        }
    }
}

/// The observable attribute behind a feature node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    /// Attribute name, e.g. "temperature".
    pub name: String,
    /// Human-readable description of the value domain.
    pub value_area: String,
    /// Activation condition, see [`crate::condition`].
    pub condition: String,
}

/// A vertex of the semantic network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// External identity.
    pub id: NodeId,
    /// Node role.
    pub kind: NodeKind,
    /// Human-readable name.
    pub name: String,
    /// Present on feature nodes only.
    pub attribute: Option<Attribute>,
}

impl Node {
    /// A feature node observed through `attribute`.
    pub fn feature(id: NodeId, name: impl Into<String>, attribute: Attribute) -> Self {
        Self {
            id,
            kind: NodeKind::Feature,
            name: name.into(),
            attribute: Some(attribute),
        }
    }

    /// A gate or hypothesis node.
    pub fn new(id: NodeId, kind: NodeKind, name: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            name: name.into(),
            attribute: None,
        }
    }
}

/// Evidence relation carried by an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// Weak, candidate evidence ("RS").
    #[serde(alias = "RS")]
    Supports,
    /// Necessary, definitive evidence ("TRA").
    #[serde(alias = "TRA")]
    Requires,
    /// Contradicting evidence ("S").
    #[serde(alias = "S")]
    Excludes,
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeKind::Supports => write!(f, "supports"),
            EdgeKind::Requires => write!(f, "requires"),
            EdgeKind::Excludes => write!(f, "excludes"),
        }
    }
}

impl FromStr for EdgeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "supports" | "RS" => Ok(EdgeKind::Supports),
            "requires" | "TRA" => Ok(EdgeKind::Requires),
            "excludes" | "S" => Ok(EdgeKind::Excludes),
            other => Err(format!("unknown edge kind: {other}")),
        }
    }
}

/// Composite key of a connection: both endpoint identities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionKey {
    pub source: NodeId,
    pub target: NodeId,
}

/// A connection as listed by [`SemanticNetwork::connections`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Connection {
    pub source: NodeId,
    pub target: NodeId,
    pub kind: EdgeKind,
}

impl Connection {
    pub fn key(&self) -> ConnectionKey {
        ConnectionKey {
            source: self.source,
            target: self.target,
        }
    }
}
