//! Knowledge-base files: TOML format and graph assembly.
//!
//! A knowledge base declares attributes, sections of nodes, the connections
//! between nodes, and which users may query it. [`KnowledgeBase::assemble`]
//! turns it into the [`SemanticNetwork`] the solver reads.
//!
//! ```toml
//! [knowledge_base]
//! id = 1
//! name = "Respiratory"
//!
//! [[attributes]]
//! id = 1
//! name = "temperature"
//! value_area = "34:43"
//!
//! [[sections]]
//! id = 1
//! name = "symptoms"
//!
//! [[sections.nodes]]
//! id = 10
//! name = "Fever"
//! kind = "feature"
//! attribute = 1
//! condition = "38:43"
//!
//! [[connections]]
//! source = 10
//! target = 20
//! kind = "supports"
//!
//! [[grants]]
//! user_id = 7
//! level = "read"
//! ```

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::KbError;
use crate::network::{Attribute, EdgeKind, Node, NodeId, NodeKind, SemanticNetwork};
use crate::solve::{KbId, UserId};

pub type KbResult<T> = std::result::Result<T, KbError>;

// ── Data model ──────────────────────────────────────────────────────────

/// A knowledge base as declared in its file.
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    pub id: KbId,
    pub name: String,
    pub description: Option<String>,
    pub attributes: Vec<AttributeDef>,
    pub sections: Vec<SectionDef>,
    pub connections: Vec<ConnectionDef>,
    pub grants: Vec<Grant>,
    /// Where the definition came from.
    pub source: KbSource,
}

/// Where a knowledge base came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KbSource {
    /// Built in memory (tests, embedding applications).
    Inline,
    /// Loaded from a file.
    File(PathBuf),
}

/// An observable attribute shared by feature nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeDef {
    pub id: u64,
    pub name: String,
    /// Description of the value domain.
    #[serde(default)]
    pub value_area: String,
}

/// A named group of nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionDef {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub nodes: Vec<NodeDef>,
}

/// A node declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeDef {
    pub id: NodeId,
    pub name: String,
    pub kind: NodeKind,
    /// Attribute id, features only.
    #[serde(default)]
    pub attribute: Option<u64>,
    /// Activation condition, features only.
    #[serde(default)]
    pub condition: Option<String>,
}

/// A directed, typed connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionDef {
    pub source: NodeId,
    pub target: NodeId,
    pub kind: EdgeKind,
}

/// Access level granted to a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    Read,
    Write,
    Owner,
}

/// A user's right to query a knowledge base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
    pub user_id: UserId,
    pub level: AccessLevel,
}

// ── TOML deserialization helpers ─────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct KbToml {
    knowledge_base: KbMeta,
    #[serde(default)]
    attributes: Vec<AttributeDef>,
    #[serde(default)]
    sections: Vec<SectionDef>,
    #[serde(default)]
    connections: Vec<ConnectionDef>,
    #[serde(default)]
    grants: Vec<Grant>,
}

#[derive(Debug, Deserialize)]
struct KbMeta {
    id: KbId,
    name: String,
    #[serde(default)]
    description: Option<String>,
}

impl KnowledgeBase {
    /// Parse a knowledge base from TOML text.
    pub fn from_toml_str(toml_str: &str, source: KbSource) -> KbResult<Self> {
        let parsed: KbToml = toml::from_str(toml_str).map_err(|e| KbError::Parse {
            path: source.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self {
            id: parsed.knowledge_base.id,
            name: parsed.knowledge_base.name,
            description: parsed.knowledge_base.description,
            attributes: parsed.attributes,
            sections: parsed.sections,
            connections: parsed.connections,
            grants: parsed.grants,
            source,
        })
    }

    /// Load a knowledge base from a TOML file.
    pub fn load(path: &Path) -> KbResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| KbError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_toml_str(&content, KbSource::File(path.to_path_buf()))
    }

    /// Load every `*.toml` file in `dir`, in file-name order.
    ///
    /// Files that fail to parse are skipped with a warning.
    pub fn discover(dir: &Path) -> Vec<Self> {
        let mut paths: Vec<PathBuf> = match std::fs::read_dir(dir) {
            Ok(entries) => entries
                .flatten()
                .map(|entry| entry.path())
                .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "toml"))
                .collect(),
            Err(e) => {
                tracing::warn!(dir = %dir.display(), "Failed to read knowledge-base directory: {e}");
                return Vec::new();
            }
        };
        paths.sort();

        paths
            .iter()
            .filter_map(|path| match Self::load(path) {
                Ok(kb) => Some(kb),
                Err(e) => {
                    tracing::warn!(path = %path.display(), "Failed to load knowledge base: {e}");
                    None
                }
            })
            .collect()
    }

    /// Build the semantic network: nodes from every section, then
    /// connections.
    pub fn assemble(&self) -> KbResult<SemanticNetwork> {
        let mut section_names = HashSet::new();
        for section in &self.sections {
            if !section_names.insert(section.name.as_str()) {
                return Err(KbError::DuplicateSection {
                    kb_id: self.id.0,
                    name: section.name.clone(),
                });
            }
        }

        let mut attributes: HashMap<u64, &AttributeDef> = HashMap::new();
        for attribute in &self.attributes {
            if attributes.insert(attribute.id, attribute).is_some() {
                return Err(KbError::DuplicateAttribute {
                    kb_id: self.id.0,
                    attribute_id: attribute.id,
                });
            }
        }

        let mut network = SemanticNetwork::new();
        for node in self.sections.iter().flat_map(|s| &s.nodes) {
            let attribute = match node.attribute {
                Some(attribute_id) => {
                    let def = attributes.get(&attribute_id).ok_or(KbError::UnknownAttribute {
                        node_id: node.id.get(),
                        attribute_id,
                    })?;
                    let condition = node.condition.clone().ok_or(KbError::MissingCondition {
                        node_id: node.id.get(),
                    })?;
                    Some(Attribute {
                        name: def.name.clone(),
                        value_area: def.value_area.clone(),
                        condition,
                    })
                }
                None => None,
            };
            network.add_node(Node {
                id: node.id,
                kind: node.kind,
                name: node.name.clone(),
                attribute,
            })?;
        }

        for connection in &self.connections {
            network.connect(connection.source, connection.target, connection.kind)?;
        }

        tracing::debug!(
            kb = %self.id,
            nodes = network.node_count(),
            connections = network.connection_count(),
            "assembled semantic network"
        );
        Ok(network)
    }

    /// The level granted to `user`, if any.
    pub fn access_level(&self, user: UserId) -> Option<AccessLevel> {
        self.grants
            .iter()
            .filter(|g| g.user_id == user)
            .map(|g| g.level)
            .max()
    }
}

impl std::fmt::Display for KbSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KbSource::Inline => write!(f, "(inline)"),
            KbSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}
