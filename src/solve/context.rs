//! Per-run shadow state.
//!
//! Everything the solver learns during one request lives here, keyed by
//! [`NodeHandle`]. The network itself is never written to.

use std::collections::{BTreeSet, HashMap};

use crate::network::NodeHandle;

/// Mutable state for a single solve.
#[derive(Debug, Clone, Default)]
pub struct RunState {
    activated_features: BTreeSet<NodeHandle>,
    inactive_features: BTreeSet<NodeHandle>,
    activated_hypotheses: BTreeSet<NodeHandle>,
    solutions: BTreeSet<NodeHandle>,
    possible_arguments: BTreeSet<NodeHandle>,
    open_gates: BTreeSet<NodeHandle>,
    asked: BTreeSet<NodeHandle>,
    arguments: HashMap<NodeHandle, BTreeSet<NodeHandle>>,
    rounds: usize,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Features whose condition matched an observation.
    pub fn activated_features(&self) -> &BTreeSet<NodeHandle> {
        &self.activated_features
    }

    /// Observed features whose condition did not match.
    pub fn inactive_features(&self) -> &BTreeSet<NodeHandle> {
        &self.inactive_features
    }

    /// Hypotheses currently consistent with the evidence.
    pub fn activated_hypotheses(&self) -> &BTreeSet<NodeHandle> {
        &self.activated_hypotheses
    }

    /// Hypotheses reached through a `Requires` edge.
    pub fn solutions(&self) -> &BTreeSet<NodeHandle> {
        &self.solutions
    }

    /// Unobserved features the solver would like confirmed.
    pub fn possible_arguments(&self) -> &BTreeSet<NodeHandle> {
        &self.possible_arguments
    }

    /// Gates whose condition held during this run.
    pub fn open_gates(&self) -> &BTreeSet<NodeHandle> {
        &self.open_gates
    }

    /// Features that contributed to a node's activation.
    pub fn arguments(&self, node: NodeHandle) -> &BTreeSet<NodeHandle> {
        static EMPTY: BTreeSet<NodeHandle> = BTreeSet::new();
        self.arguments.get(&node).unwrap_or(&EMPTY)
    }

    /// Number of propagation rounds run so far.
    pub fn rounds(&self) -> usize {
        self.rounds
    }

    /// Whether a node is active in this run: an activated feature, an
    /// activated hypothesis, or an open gate.
    pub fn is_activated(&self, node: NodeHandle) -> bool {
        self.activated_features.contains(&node)
            || self.activated_hypotheses.contains(&node)
            || self.open_gates.contains(&node)
    }

    pub(crate) fn activate_feature(&mut self, feature: NodeHandle) {
        self.inactive_features.remove(&feature);
        self.activated_features.insert(feature);
    }

    /// Record a non-matching observation. A feature that some other
    /// observation already activated stays active.
    pub(crate) fn deactivate_feature(&mut self, feature: NodeHandle) {
        if !self.activated_features.contains(&feature) {
            self.inactive_features.insert(feature);
        }
    }

    pub(crate) fn activate_hypothesis(&mut self, hypothesis: NodeHandle) {
        self.activated_hypotheses.insert(hypothesis);
    }

    pub(crate) fn confirm_hypothesis(&mut self, hypothesis: NodeHandle) {
        self.solutions.insert(hypothesis);
        self.activated_hypotheses.insert(hypothesis);
    }

    /// Mark a gate open. Returns true the first time.
    pub(crate) fn open_gate(&mut self, gate: NodeHandle) -> bool {
        self.open_gates.insert(gate)
    }

    /// Merge `contribution` into a node's arguments. Returns true if the set
    /// grew.
    pub(crate) fn add_arguments<'a>(
        &mut self,
        node: NodeHandle,
        contribution: impl IntoIterator<Item = &'a NodeHandle>,
    ) -> bool {
        let args = self.arguments.entry(node).or_default();
        let before = args.len();
        args.extend(contribution.into_iter().copied());
        args.len() > before
    }

    /// Record that the clarifier was asked about `feature`. Returns true the
    /// first time.
    pub(crate) fn mark_asked(&mut self, feature: NodeHandle) -> bool {
        self.asked.insert(feature)
    }

    pub(crate) fn set_possible_arguments(&mut self, features: BTreeSet<NodeHandle>) {
        self.possible_arguments = features;
    }

    /// Drop hypotheses from both the activated set and the confirmed set.
    pub(crate) fn remove_hypotheses(&mut self, removed: &BTreeSet<NodeHandle>) {
        self.activated_hypotheses.retain(|h| !removed.contains(h));
        self.solutions.retain(|h| !removed.contains(h));
    }

    pub(crate) fn begin_round(&mut self) -> usize {
        self.rounds += 1;
        self.rounds
    }

    /// Sizes compared by the convergence check.
    pub(crate) fn sizes(&self) -> (usize, usize) {
        (self.activated_features.len(), self.activated_hypotheses.len())
    }
}
