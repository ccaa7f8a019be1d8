//! Arena-backed semantic network.
//!
//! Uses `petgraph` for the graph structure, with a `NodeId` index for O(1)
//! lookups of external ids and a connection index that enforces one edge per
//! ordered pair of nodes.

use std::collections::{HashMap, HashSet};

use petgraph::Direction;
use petgraph::graph::DiGraph;
use petgraph::visit::EdgeRef;

use crate::error::NetworkError;

use super::{Connection, ConnectionKey, EdgeKind, Node, NodeHandle, NodeId, NodeKind};

/// Result type for network operations.
pub type NetworkResult<T> = std::result::Result<T, NetworkError>;

/// Semantic network backed by petgraph.
///
/// Built once by graph assembly, then read-only: the solver keeps all
/// per-run data outside the network, so one instance can be shared between
/// concurrent solves.
#[derive(Default)]
pub struct SemanticNetwork {
    /// Directed graph: nodes carry [`Node`], edges carry [`EdgeKind`].
    graph: DiGraph<Node, EdgeKind>,
    /// NodeId → handle.
    by_id: HashMap<NodeId, NodeHandle>,
    /// Connection keys already present.
    connections: HashSet<ConnectionKey>,
}

impl SemanticNetwork {
    /// Create a new empty network.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node, returning its handle.
    ///
    /// Feature nodes must carry an attribute and other kinds must not.
    pub fn add_node(&mut self, node: Node) -> NetworkResult<NodeHandle> {
        if self.by_id.contains_key(&node.id) {
            return Err(NetworkError::DuplicateNode {
                node_id: node.id.get(),
            });
        }
        match (node.kind, node.attribute.is_some()) {
            (NodeKind::Feature, false) => {
                return Err(NetworkError::MissingAttribute {
                    node_id: node.id.get(),
                });
            }
            (kind, true) if kind != NodeKind::Feature => {
                return Err(NetworkError::UnexpectedAttribute {
                    node_id: node.id.get(),
                    kind: kind.to_string(),
                });
            }
            _ => {}
        }

        let id = node.id;
        let handle = NodeHandle(self.graph.add_node(node));
        self.by_id.insert(id, handle);
        Ok(handle)
    }

    /// Connect two nodes by id.
    ///
    /// Both endpoints must already exist; a second edge between the same
    /// ordered pair is rejected whatever its kind.
    pub fn connect(&mut self, source: NodeId, target: NodeId, kind: EdgeKind) -> NetworkResult<()> {
        let src = self.require(source)?;
        let dst = self.require(target)?;
        if !self.connections.insert(ConnectionKey { source, target }) {
            return Err(NetworkError::DuplicateConnection {
                source_id: source.get(),
                target_id: target.get(),
            });
        }
        self.graph.add_edge(src.index(), dst.index(), kind);
        Ok(())
    }

    fn require(&self, id: NodeId) -> NetworkResult<NodeHandle> {
        self.handle_of(id)
            .ok_or(NetworkError::NodeNotFound { node_id: id.get() })
    }

    /// Look up the handle of an external id.
    pub fn handle_of(&self, id: NodeId) -> Option<NodeHandle> {
        self.by_id.get(&id).copied()
    }

    /// The node behind a handle.
    ///
    /// # Panics
    ///
    /// If `handle` was issued by a different network.
    pub fn node(&self, handle: NodeHandle) -> &Node {
        &self.graph[handle.index()]
    }

    /// Kind of the node behind a handle.
    pub fn kind(&self, handle: NodeHandle) -> NodeKind {
        self.node(handle).kind
    }

    /// Outgoing edges of a node as `(target, kind)`.
    pub fn outgoing(&self, handle: NodeHandle) -> impl Iterator<Item = (NodeHandle, EdgeKind)> + '_ {
        self.graph
            .edges_directed(handle.index(), Direction::Outgoing)
            .map(|e| (NodeHandle(e.target()), *e.weight()))
    }

    /// Incoming edges of a node as `(source, kind)`.
    pub fn incoming(&self, handle: NodeHandle) -> impl Iterator<Item = (NodeHandle, EdgeKind)> + '_ {
        self.graph
            .edges_directed(handle.index(), Direction::Incoming)
            .map(|e| (NodeHandle(e.source()), *e.weight()))
    }

    /// All node handles, in insertion order.
    pub fn handles(&self) -> impl Iterator<Item = NodeHandle> + '_ {
        self.graph.node_indices().map(NodeHandle)
    }

    /// Handles of all nodes of the given kind.
    pub fn handles_of_kind(&self, kind: NodeKind) -> impl Iterator<Item = NodeHandle> + '_ {
        self.handles().filter(move |&h| self.kind(h) == kind)
    }

    /// All connections, in insertion order.
    pub fn connections(&self) -> Vec<Connection> {
        self.graph
            .edge_references()
            .map(|e| Connection {
                source: self.graph[e.source()].id,
                target: self.graph[e.target()].id,
                kind: *e.weight(),
            })
            .collect()
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of connections.
    pub fn connection_count(&self) -> usize {
        self.graph.edge_count()
    }
}

impl std::fmt::Debug for SemanticNetwork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SemanticNetwork")
            .field("nodes", &self.node_count())
            .field("connections", &self.connection_count())
            .finish()
    }
}
