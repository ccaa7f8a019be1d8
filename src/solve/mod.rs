//! Diagnostic solver: activation propagation and explanation refinement.
//!
//! [`Solver`] is stateless; every call allocates a fresh [`RunState`] that
//! owns the activation sets and per-node arguments for that run only.
//!
//! Pipeline for one request:
//!
//! 1. seed features from observations ([`Solver::seed`]),
//! 2. propagation rounds until the activated feature and hypothesis counts
//!    stop changing, consulting the [`Clarifier`] after each round,
//! 3. [`reduce`]: drop contradicted hypotheses and those missing required
//!    evidence,
//! 4. [`refine`]: optional differentiation and minimization.

pub mod clarify;
pub mod context;
pub mod engine;
pub mod reduce;
pub mod refine;

use serde::{Deserialize, Serialize};

use crate::network::{NodeHandle, NodeId};

pub use clarify::{Clarifier, NoClarification, Question};
pub use context::RunState;
pub use engine::Solver;

/// Identity of a knowledge base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KbId(pub u64);

impl std::fmt::Display for KbId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a user issuing requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One observed feature value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    /// Feature the value belongs to.
    pub feature_id: NodeId,
    /// The observed value, matched against the feature's condition.
    pub value: String,
}

impl Observation {
    pub fn new(feature_id: NodeId, value: impl Into<String>) -> Self {
        Self {
            feature_id,
            value: value.into(),
        }
    }
}

/// A diagnostic query against one knowledge base.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    /// Who is asking. Only the access check looks at this.
    pub user_id: UserId,
    /// Which knowledge base to query.
    pub kb_id: KbId,
    /// Observed feature values, in request order.
    #[serde(default)]
    pub observations: Vec<Observation>,
    /// Keep only the most specific hypotheses.
    #[serde(default)]
    pub differentiate: bool,
    /// Drop hypotheses whose evidence the others already cover.
    #[serde(default)]
    pub minimize: bool,
}

impl Request {
    /// A request with no observations and both refinements off.
    pub fn new(user_id: UserId, kb_id: KbId) -> Self {
        Self {
            user_id,
            kb_id,
            observations: Vec::new(),
            differentiate: false,
            minimize: false,
        }
    }

    /// Add an observation.
    pub fn observe(mut self, feature_id: NodeId, value: impl Into<String>) -> Self {
        self.observations.push(Observation::new(feature_id, value));
        self
    }

    /// Enable differentiation.
    pub fn with_differentiation(mut self) -> Self {
        self.differentiate = true;
        self
    }

    /// Enable minimization.
    pub fn with_minimization(mut self) -> Self {
        self.minimize = true;
        self
    }
}

/// Outcome of one solve.
#[derive(Debug, Clone)]
pub struct Solution {
    /// Surviving hypotheses, sorted by node id.
    pub hypotheses: Vec<NodeHandle>,
    /// The run state the hypotheses were derived from.
    pub state: RunState,
}

impl Solution {
    /// Whether `hypothesis` was reached through a `Requires` edge.
    pub fn is_confirmed(&self, hypothesis: NodeHandle) -> bool {
        self.state.solutions().contains(&hypothesis)
    }
}
