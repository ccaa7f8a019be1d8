//! Small builder for hand-written test networks.

use super::{Attribute, EdgeKind, Node, NodeHandle, NodeId, NodeKind, SemanticNetwork};

pub(crate) fn id(raw: u64) -> NodeId {
    NodeId::new(raw).unwrap()
}

#[derive(Default)]
pub(crate) struct TestNet {
    pub net: SemanticNetwork,
}

impl TestNet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feature(&mut self, raw: u64, condition: &str) -> NodeHandle {
        self.net
            .add_node(Node::feature(
                id(raw),
                format!("F{raw}"),
                Attribute {
                    name: format!("attr{raw}"),
                    value_area: "any".into(),
                    condition: condition.into(),
                },
            ))
            .unwrap()
    }

    pub fn and_gate(&mut self, raw: u64) -> NodeHandle {
        self.node(raw, NodeKind::AndGate)
    }

    pub fn or_gate(&mut self, raw: u64) -> NodeHandle {
        self.node(raw, NodeKind::OrGate)
    }

    pub fn hypothesis(&mut self, raw: u64) -> NodeHandle {
        self.node(raw, NodeKind::Hypothesis)
    }

    fn node(&mut self, raw: u64, kind: NodeKind) -> NodeHandle {
        self.net
            .add_node(Node::new(id(raw), kind, format!("N{raw}")))
            .unwrap()
    }

    pub fn supports(&mut self, source: u64, target: u64) -> &mut Self {
        self.edge(source, target, EdgeKind::Supports)
    }

    pub fn requires(&mut self, source: u64, target: u64) -> &mut Self {
        self.edge(source, target, EdgeKind::Requires)
    }

    pub fn excludes(&mut self, source: u64, target: u64) -> &mut Self {
        self.edge(source, target, EdgeKind::Excludes)
    }

    fn edge(&mut self, source: u64, target: u64, kind: EdgeKind) -> &mut Self {
        self.net.connect(id(source), id(target), kind).unwrap();
        self
    }
}
