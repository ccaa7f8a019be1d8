//! Explanation refinement over hypothesis arguments.
//!
//! Both passes compare the argument sets (contributing features) of the
//! surviving hypotheses and only ever remove hypotheses.

use std::collections::BTreeSet;

use crate::network::{NodeHandle, SemanticNetwork};

use super::context::RunState;

/// Keep only the most specific hypotheses.
///
/// A hypothesis is dropped when another survivor's arguments strictly
/// contain its own. Equal argument sets keep both. All comparisons are made
/// against the set as it was when the pass started. No-op below two
/// survivors. Returns the removed hypotheses.
pub fn differentiate(state: &mut RunState) -> BTreeSet<NodeHandle> {
    let survivors: Vec<NodeHandle> = state.activated_hypotheses().iter().copied().collect();
    if survivors.len() < 2 {
        return BTreeSet::new();
    }

    let dominated: BTreeSet<NodeHandle> = survivors
        .iter()
        .copied()
        .filter(|&h| {
            let args = state.arguments(h);
            survivors.iter().any(|&other| {
                let wider = state.arguments(other);
                other != h && args.len() < wider.len() && args.is_subset(wider)
            })
        })
        .collect();

    if !dominated.is_empty() {
        tracing::debug!(removed = dominated.len(), "differentiated hypothesis set");
    }
    state.remove_hypotheses(&dominated);
    dominated
}

/// Drop hypotheses whose evidence the rest already covers.
///
/// While more than two hypotheses survive, find those whose arguments are
/// contained in the union of every other survivor's arguments and remove
/// one of them: the one with the fewest arguments, ties broken by lowest
/// node id. Then look again.
///
/// This is greedy redundancy elimination. It does not guarantee a minimum
/// covering set; that would need a set-cover formulation.
pub fn minimize(network: &SemanticNetwork, state: &mut RunState) -> Vec<NodeHandle> {
    let mut removed = Vec::new();
    while state.activated_hypotheses().len() > 2 {
        let Some(redundant) = least_needed(network, state) else {
            break;
        };
        state.remove_hypotheses(&BTreeSet::from([redundant]));
        removed.push(redundant);
    }

    if !removed.is_empty() {
        tracing::debug!(removed = removed.len(), "minimized hypothesis set");
    }
    removed
}

/// The redundant survivor to remove next, if any.
fn least_needed(network: &SemanticNetwork, state: &RunState) -> Option<NodeHandle> {
    let survivors = state.activated_hypotheses();
    survivors
        .iter()
        .copied()
        .filter(|&h| {
            let covered: BTreeSet<NodeHandle> = survivors
                .iter()
                .filter(|&&other| other != h)
                .flat_map(|&other| state.arguments(other).iter().copied())
                .collect();
            state.arguments(h).is_subset(&covered)
        })
        .min_by_key(|&h| (state.arguments(h).len(), network.node(h).id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::testing::TestNet;

    /// Hypotheses 10, 11, ... with the given argument sets over features 1..=4.
    fn setup(arguments: &[&[usize]]) -> (TestNet, RunState, Vec<NodeHandle>) {
        let mut t = TestNet::new();
        let features: Vec<NodeHandle> = (1..=4).map(|raw| t.feature(raw, "yes")).collect();
        let mut state = RunState::new();
        let mut hypotheses = Vec::new();
        for (i, args) in arguments.iter().enumerate() {
            let h = t.hypothesis(10 + i as u64);
            state.activate_hypothesis(h);
            state.add_arguments(h, args.iter().map(|&f| &features[f - 1]));
            hypotheses.push(h);
        }
        (t, state, hypotheses)
    }

    #[test]
    fn differentiation_drops_strict_subsets() {
        let (_t, mut state, h) = setup(&[&[1, 2], &[1, 2, 3]]);
        let removed = differentiate(&mut state);
        assert_eq!(removed, BTreeSet::from([h[0]]));
        assert_eq!(state.activated_hypotheses(), &BTreeSet::from([h[1]]));
    }

    #[test]
    fn differentiation_keeps_equal_sets() {
        let (_t, mut state, h) = setup(&[&[1, 2], &[1, 2]]);
        assert!(differentiate(&mut state).is_empty());
        assert_eq!(state.activated_hypotheses().len(), 2);
        assert!(state.activated_hypotheses().contains(&h[0]));
    }

    #[test]
    fn differentiation_keeps_incomparable_sets() {
        let (_t, mut state, _h) = setup(&[&[1, 2], &[2, 3], &[1, 2, 3, 4]]);
        differentiate(&mut state);
        assert_eq!(state.activated_hypotheses().len(), 1);

        let (_t, mut state, _h) = setup(&[&[1, 2], &[2, 3]]);
        assert!(differentiate(&mut state).is_empty());
    }

    #[test]
    fn differentiation_is_noop_for_single_survivor() {
        let (_t, mut state, h) = setup(&[&[1]]);
        assert!(differentiate(&mut state).is_empty());
        assert!(state.activated_hypotheses().contains(&h[0]));
    }

    #[test]
    fn minimization_removes_collectively_covered_hypothesis() {
        let (t, mut state, h) = setup(&[&[1], &[1, 2], &[2]]);
        let removed = minimize(&t.net, &mut state);
        assert_eq!(removed, vec![h[0]]);
        assert_eq!(state.activated_hypotheses(), &BTreeSet::from([h[1], h[2]]));
    }

    #[test]
    fn minimization_keeps_hypotheses_with_unique_evidence() {
        let (t, mut state, _h) = setup(&[&[1], &[2], &[3]]);
        assert!(minimize(&t.net, &mut state).is_empty());
        assert_eq!(state.activated_hypotheses().len(), 3);
    }

    #[test]
    fn minimization_stops_at_two() {
        let (t, mut state, _h) = setup(&[&[1], &[1], &[1], &[1]]);
        let removed = minimize(&t.net, &mut state);
        assert_eq!(removed.len(), 2);
        assert_eq!(state.activated_hypotheses().len(), 2);
    }

    #[test]
    fn minimization_repeats_until_nothing_is_redundant() {
        // {1} and {2} are covered by {1,2,3}; {3,4} holds feature 4 alone.
        let (t, mut state, h) = setup(&[&[1], &[2], &[1, 2, 3], &[3, 4]]);
        let removed = minimize(&t.net, &mut state);
        assert_eq!(removed, vec![h[0], h[1]]);
        assert_eq!(state.activated_hypotheses(), &BTreeSet::from([h[2], h[3]]));
    }
}
