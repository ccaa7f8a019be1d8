//! Answer types handed to the transport layer.
//!
//! These provide a serializable, label-resolved view of a [`Solution`]:
//! every surviving hypothesis with the features that argue for it.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::network::{EdgeKind, NodeHandle, NodeKind, SemanticNetwork};
use crate::solve::{KbId, Question, RunState, Solution};

/// One node of an explanation tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Explanation {
    /// Node id.
    pub id: u64,
    /// Node name.
    pub name: String,
    /// Node kind.
    pub kind: NodeKind,
    /// Reached through a `Requires` edge.
    pub confirmed: bool,
    /// Nodes that contributed to this one.
    pub arguments: Vec<Explanation>,
}

/// Full answer to a request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    /// Knowledge base that was queried.
    pub kb_id: KbId,
    /// Surviving hypotheses, sorted by id.
    pub hypotheses: Vec<Explanation>,
    /// Unobserved features supporting a surviving hypothesis.
    pub questions: Vec<Question>,
    /// Propagation rounds run.
    pub rounds: usize,
}

impl Answer {
    /// Resolve a solution against the network it was computed on.
    pub fn from_solution(kb_id: KbId, network: &SemanticNetwork, solution: &Solution) -> Self {
        let hypotheses = solution
            .hypotheses
            .iter()
            .map(|&h| explain(network, &solution.state, h, &mut HashSet::new()))
            .collect();
        let wanted: HashSet<NodeHandle> = solution
            .hypotheses
            .iter()
            .flat_map(|&h| network.outgoing(h))
            .filter(|&(_, edge)| edge == EdgeKind::Supports)
            .map(|(target, _)| target)
            .collect();
        let questions = solution
            .state
            .possible_arguments()
            .iter()
            .copied()
            .filter(|f| wanted.contains(f) && !solution.state.inactive_features().contains(f))
            .map(|f| Question::for_feature(network, f))
            .collect();
        Self {
            kb_id,
            hypotheses,
            questions,
            rounds: solution.state.rounds(),
        }
    }

    /// Names of the surviving hypotheses.
    pub fn hypothesis_names(&self) -> Vec<&str> {
        self.hypotheses.iter().map(|h| h.name.as_str()).collect()
    }
}

fn explain(
    network: &SemanticNetwork,
    state: &RunState,
    node: NodeHandle,
    path: &mut HashSet<NodeHandle>,
) -> Explanation {
    let meta = network.node(node);
    path.insert(node);
    let mut arguments: Vec<(u64, NodeHandle)> = state
        .arguments(node)
        .iter()
        .filter(|&&arg| !path.contains(&arg))
        .map(|&arg| (network.node(arg).id.get(), arg))
        .collect();
    arguments.sort_unstable();
    let arguments = arguments
        .into_iter()
        .map(|(_, arg)| explain(network, state, arg, path))
        .collect();
    path.remove(&node);

    Explanation {
        id: meta.id.get(),
        name: meta.name.clone(),
        kind: meta.kind,
        confirmed: state.solutions().contains(&node),
        arguments,
    }
}
