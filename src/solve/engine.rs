//! Activation propagation: seeding and the fixed-point round loop.

use std::collections::{BTreeSet, HashSet, VecDeque};

use crate::condition;
use crate::network::{EdgeKind, NodeHandle, NodeId, NodeKind, SemanticNetwork};

use super::clarify::{Clarifier, NoClarification, Question};
use super::context::RunState;
use super::{Observation, Request, Solution, reduce, refine};

/// Stateless diagnostic solver. Per-request state lives in [`RunState`].
///
/// One instance can serve any number of concurrent requests, provided each
/// network it is given is not mutated while a solve is running.
#[derive(Debug, Clone, Copy, Default)]
pub struct Solver;

impl Solver {
    pub fn new() -> Self {
        Self
    }

    /// Solve a request without a clarifier.
    pub fn solve(&self, network: &SemanticNetwork, request: &Request) -> Solution {
        self.solve_with(network, request, &mut NoClarification)
    }

    /// Solve a request, asking `clarifier` about unobserved supporting
    /// features after every propagation round.
    pub fn solve_with(
        &self,
        network: &SemanticNetwork,
        request: &Request,
        clarifier: &mut dyn Clarifier,
    ) -> Solution {
        let mut state = RunState::new();

        self.seed(network, &request.observations, &mut state);
        self.converge(network, &mut state, clarifier);

        reduce::reduce(network, &mut state);

        if request.differentiate {
            refine::differentiate(&mut state);
        }
        if request.minimize {
            refine::minimize(network, &mut state);
        }

        let mut hypotheses: Vec<NodeHandle> =
            state.activated_hypotheses().iter().copied().collect();
        hypotheses.sort_by_key(|&h| network.node(h).id);

        tracing::debug!(
            kb = %request.kb_id,
            observations = request.observations.len(),
            rounds = state.rounds(),
            hypotheses = hypotheses.len(),
            "solve finished"
        );

        Solution { hypotheses, state }
    }

    /// Sort observed features into activated and inactive.
    ///
    /// Observations of unknown ids or of non-feature nodes are ignored.
    pub fn seed(&self, network: &SemanticNetwork, observations: &[Observation], state: &mut RunState) {
        for obs in observations {
            let Some(handle) = network.handle_of(obs.feature_id) else {
                tracing::debug!(feature = %obs.feature_id, "ignoring observation of unknown node");
                continue;
            };
            let node = network.node(handle);
            let Some(attribute) = node.attribute.as_ref().filter(|_| node.kind == NodeKind::Feature)
            else {
                tracing::debug!(node = %obs.feature_id, kind = %node.kind, "ignoring observation of non-feature node");
                continue;
            };

            if condition::evaluate(&attribute.condition, &obs.value) {
                state.activate_feature(handle);
            } else {
                state.deactivate_feature(handle);
            }
        }
    }

    /// Run propagation rounds until the activated feature and hypothesis
    /// counts stop changing. At least one round always runs.
    fn converge(&self, network: &SemanticNetwork, state: &mut RunState, clarifier: &mut dyn Clarifier) {
        loop {
            let before = state.sizes();
            let round = state.begin_round();

            self.generate_hypotheses(network, state);
            self.expand_arguments(network, state);
            self.test_arguments(network, state, clarifier);

            let after = state.sizes();
            tracing::debug!(
                round,
                features = after.0,
                hypotheses = after.1,
                candidates = state.possible_arguments().len(),
                "propagation round"
            );
            if after == before {
                break;
            }
        }
    }

    /// Forward-chain from every activated feature through gates to
    /// hypotheses.
    ///
    /// Worklist over handles: a gate is queued when it opens and again only
    /// when its argument set grows, so cycles through gates terminate.
    fn generate_hypotheses(&self, network: &SemanticNetwork, state: &mut RunState) {
        let mut queue: VecDeque<NodeHandle> = state.activated_features().iter().copied().collect();

        while let Some(source) = queue.pop_front() {
            let contribution: Vec<NodeHandle> = match network.kind(source) {
                NodeKind::Feature => vec![source],
                _ => state.arguments(source).iter().copied().collect(),
            };

            for (target, edge) in network.outgoing(source) {
                if edge == EdgeKind::Excludes {
                    continue;
                }
                match network.kind(target) {
                    NodeKind::Feature => {}
                    NodeKind::Hypothesis => {
                        state.add_arguments(target, &contribution);
                        if edge == EdgeKind::Requires {
                            state.confirm_hypothesis(target);
                        } else {
                            state.activate_hypothesis(target);
                        }
                    }
                    NodeKind::AndGate | NodeKind::OrGate => {
                        let grew = state.add_arguments(target, &contribution);
                        let opened = !state.open_gates().contains(&target)
                            && self.gate_satisfied(network, state, target)
                            && state.open_gate(target);
                        if opened || (grew && state.open_gates().contains(&target)) {
                            queue.push_back(target);
                        }
                    }
                }
            }
        }
    }

    /// Whether a gate's condition holds.
    ///
    /// A source is satisfied if it is an activated feature or an open gate.
    /// AND needs every incoming non-`Excludes` source satisfied (and at least
    /// one source), OR needs any.
    fn gate_satisfied(&self, network: &SemanticNetwork, state: &RunState, gate: NodeHandle) -> bool {
        let satisfied = |source: NodeHandle| {
            state.activated_features().contains(&source) || state.open_gates().contains(&source)
        };
        let mut sources = network
            .incoming(gate)
            .filter(|&(_, edge)| edge != EdgeKind::Excludes)
            .map(|(source, _)| source)
            .peekable();

        match network.kind(gate) {
            NodeKind::AndGate => sources.peek().is_some() && sources.all(satisfied),
            NodeKind::OrGate => sources.any(satisfied),
            NodeKind::Feature | NodeKind::Hypothesis => false,
        }
    }

    /// Collect unobserved features that support an activated hypothesis.
    fn expand_arguments(&self, network: &SemanticNetwork, state: &mut RunState) {
        let candidates: BTreeSet<NodeHandle> = state
            .activated_hypotheses()
            .iter()
            .flat_map(|&h| network.outgoing(h))
            .filter(|&(target, edge)| {
                edge == EdgeKind::Supports
                    && network.kind(target) == NodeKind::Feature
                    && !state.activated_features().contains(&target)
            })
            .map(|(target, _)| target)
            .collect();
        state.set_possible_arguments(candidates);
    }

    /// Ask the clarifier about candidates that were never observed nor asked
    /// before, and seed whatever it answers.
    fn test_arguments(&self, network: &SemanticNetwork, state: &mut RunState, clarifier: &mut dyn Clarifier) {
        let pending: Vec<NodeHandle> = state
            .possible_arguments()
            .iter()
            .copied()
            .filter(|h| !state.inactive_features().contains(h))
            .collect();
        let questions: Vec<Question> = pending
            .into_iter()
            .filter(|&h| state.mark_asked(h))
            .map(|h| Question::for_feature(network, h))
            .collect();
        if questions.is_empty() {
            return;
        }

        let asked: HashSet<NodeId> = questions.iter().map(|q| q.feature_id).collect();
        let (answers, ignored): (Vec<Observation>, Vec<Observation>) = clarifier
            .clarify(&questions)
            .into_iter()
            .partition(|obs| asked.contains(&obs.feature_id));
        if !ignored.is_empty() {
            tracing::debug!(count = ignored.len(), "ignoring answers to questions that were not asked");
        }

        self.seed(network, &answers, state);
    }
}
