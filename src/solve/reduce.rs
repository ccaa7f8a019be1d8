//! Hypothesis reduction after convergence.
//!
//! Two independent filters, evaluated against the same converged set before
//! anything is removed:
//!
//! - **rejected**: an activated feature points at the hypothesis with an
//!   `Excludes` edge;
//! - **missing**: the hypothesis `Requires` a feature that was observed and
//!   did not match.

use std::collections::BTreeSet;

use crate::network::{EdgeKind, NodeHandle, SemanticNetwork};

use super::context::RunState;

/// Hypotheses removed by [`reduce`], by reason. A hypothesis can appear in
/// both sets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reduction {
    pub rejected: BTreeSet<NodeHandle>,
    pub missing: BTreeSet<NodeHandle>,
}

impl Reduction {
    /// Every hypothesis removed, for either reason.
    pub fn removed(&self) -> BTreeSet<NodeHandle> {
        self.rejected.union(&self.missing).copied().collect()
    }
}

/// Remove contradicted and unsupported hypotheses from `state`.
pub fn reduce(network: &SemanticNetwork, state: &mut RunState) -> Reduction {
    let reduction = Reduction {
        rejected: state
            .activated_hypotheses()
            .iter()
            .copied()
            .filter(|&h| is_contradicted(network, state, h))
            .collect(),
        missing: state
            .activated_hypotheses()
            .iter()
            .copied()
            .filter(|&h| lacks_required(network, state, h))
            .collect(),
    };

    if !reduction.rejected.is_empty() || !reduction.missing.is_empty() {
        tracing::debug!(
            rejected = reduction.rejected.len(),
            missing = reduction.missing.len(),
            "reduced hypothesis set"
        );
    }
    state.remove_hypotheses(&reduction.removed());
    reduction
}

/// Whether an activated feature excludes `hypothesis`.
pub fn is_contradicted(network: &SemanticNetwork, state: &RunState, hypothesis: NodeHandle) -> bool {
    network
        .incoming(hypothesis)
        .any(|(source, edge)| edge == EdgeKind::Excludes && state.activated_features().contains(&source))
}

/// Whether `hypothesis` requires a feature that was observed inactive.
pub fn lacks_required(network: &SemanticNetwork, state: &RunState, hypothesis: NodeHandle) -> bool {
    network
        .outgoing(hypothesis)
        .any(|(target, edge)| edge == EdgeKind::Requires && state.inactive_features().contains(&target))
}
