//! Clarification hook.
//!
//! After each propagation round the solver knows which unobserved features
//! would support its current hypotheses. A [`Clarifier`] is asked about them
//! and may answer with observed values, which are seeded before the next
//! round. Without one, nothing new is learnt and the loop converges after
//! the first round.

use serde::{Deserialize, Serialize};

use crate::network::{NodeHandle, NodeId, SemanticNetwork};

use super::Observation;

/// A feature the solver would like a value for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Feature to observe.
    pub feature_id: NodeId,
    /// Feature name.
    pub name: String,
    /// Attribute behind the feature.
    pub attribute: String,
    /// Description of acceptable values.
    pub value_area: String,
}

impl Question {
    /// Build the question for a feature node.
    pub fn for_feature(network: &SemanticNetwork, feature: NodeHandle) -> Self {
        let node = network.node(feature);
        let (attribute, value_area) = node
            .attribute
            .as_ref()
            .map(|a| (a.name.clone(), a.value_area.clone()))
            .unwrap_or_default();
        Self {
            feature_id: node.id,
            name: node.name.clone(),
            attribute,
            value_area,
        }
    }
}

/// Supplies values for features the solver asks about.
pub trait Clarifier {
    /// Answer some, all or none of `questions`.
    ///
    /// Observations for features that were not asked about are ignored.
    fn clarify(&mut self, questions: &[Question]) -> Vec<Observation>;
}

/// Never answers.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoClarification;

impl Clarifier for NoClarification {
    fn clarify(&mut self, _questions: &[Question]) -> Vec<Observation> {
        Vec::new()
    }
}

impl<F> Clarifier for F
where
    F: FnMut(&[Question]) -> Vec<Observation>,
{
    fn clarify(&mut self, questions: &[Question]) -> Vec<Observation> {
        self(questions)
    }
}
