//! Engine facade: top-level API for diagnet.
//!
//! The `Engine` owns the catalog of loaded knowledge bases and the solver,
//! checks access, and turns solver output into [`Answer`]s.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::answer::Answer;
use crate::error::{AccessError, DiagResult, EngineError};
use crate::kb::{KbSource, KnowledgeBase};
use crate::network::{EdgeKind, NodeKind, SemanticNetwork};
use crate::solve::{Clarifier, KbId, NoClarification, Request, Solver, UserId};

/// Configuration for the diagnet engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Directory scanned for `*.toml` knowledge bases at startup.
    #[serde(default)]
    pub kb_dir: Option<PathBuf>,
    /// Refuse requests from users without a grant on the knowledge base.
    #[serde(default = "default_enforce_access")]
    pub enforce_access: bool,
}

fn default_enforce_access() -> bool {
    true
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            kb_dir: None,
            enforce_access: default_enforce_access(),
        }
    }
}

impl EngineConfig {
    /// Load from a TOML file.
    pub fn load(path: &Path) -> DiagResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| EngineError::ConfigRead {
            path: path.display().to_string(),
            source: e,
        })?;
        let config = toml::from_str(&content).map_err(|e| EngineError::ConfigParse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Ok(config)
    }

    /// Save to a TOML file.
    pub fn save(&self, path: &Path) -> DiagResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| EngineError::ConfigParse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| EngineError::ConfigWrite {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
        std::fs::write(path, content).map_err(|e| EngineError::ConfigWrite {
            path: path.display().to_string(),
            source: e,
        })?;
        Ok(())
    }
}

/// A knowledge base together with its assembled network.
#[derive(Debug)]
pub struct LoadedKb {
    pub definition: KnowledgeBase,
    pub network: SemanticNetwork,
}

/// Summary of one loaded knowledge base.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KbInfo {
    pub id: KbId,
    pub name: String,
    pub description: Option<String>,
    pub source: String,
    pub sections: usize,
    pub features: usize,
    pub gates: usize,
    pub hypotheses: usize,
    pub connections: usize,
    pub supports: usize,
    pub requires: usize,
    pub excludes: usize,
    pub grants: usize,
}

impl std::fmt::Display for KbInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Knowledge base {}: {}", self.id, self.name)?;
        if let Some(description) = &self.description {
            writeln!(f, "  {description}")?;
        }
        writeln!(f, "  source:      {}", self.source)?;
        writeln!(f, "  sections:    {}", self.sections)?;
        writeln!(f, "  features:    {}", self.features)?;
        writeln!(f, "  gates:       {}", self.gates)?;
        writeln!(f, "  hypotheses:  {}", self.hypotheses)?;
        writeln!(
            f,
            "  connections: {} ({} supports, {} requires, {} excludes)",
            self.connections, self.supports, self.requires, self.excludes
        )?;
        write!(f, "  grants:      {}", self.grants)
    }
}

/// The diagnet engine.
///
/// Knowledge bases are immutable once registered, so requests against the
/// same or different knowledge bases can run concurrently.
pub struct Engine {
    config: EngineConfig,
    catalog: DashMap<KbId, Arc<LoadedKb>>,
    solver: Solver,
}

impl Engine {
    /// Create an engine and load every knowledge base in `config.kb_dir`.
    ///
    /// Files that fail to load are skipped with a warning.
    pub fn new(config: EngineConfig) -> DiagResult<Self> {
        if let Some(dir) = &config.kb_dir {
            if !dir.is_dir() {
                return Err(EngineError::InvalidConfig {
                    message: format!("kb_dir {} is not a directory", dir.display()),
                }
                .into());
            }
        }

        let engine = Self {
            config,
            catalog: DashMap::new(),
            solver: Solver::new(),
        };

        if let Some(dir) = engine.config.kb_dir.clone() {
            for kb in KnowledgeBase::discover(&dir) {
                let source = kb.source.to_string();
                if let Err(e) = engine.register(kb) {
                    tracing::warn!(source = %source, "Skipping knowledge base: {e}");
                }
            }
        }

        tracing::info!(
            knowledge_bases = engine.catalog.len(),
            enforce_access = engine.config.enforce_access,
            "initialized diagnet engine"
        );
        Ok(engine)
    }

    /// Engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Assemble and add a knowledge base to the catalog.
    ///
    /// Fails with `DuplicateKb` if the id is taken, including when another
    /// thread registers the same id concurrently.
    pub fn register(&self, kb: KnowledgeBase) -> DiagResult<KbId> {
        let id = kb.id;
        let network = kb.assemble()?;
        match self.catalog.entry(id) {
            Entry::Occupied(_) => Err(EngineError::DuplicateKb { kb_id: id.0 }.into()),
            Entry::Vacant(slot) => {
                tracing::info!(
                    kb = %id,
                    name = %kb.name,
                    nodes = network.node_count(),
                    "registered knowledge base"
                );
                slot.insert(Arc::new(LoadedKb {
                    definition: kb,
                    network,
                }));
                Ok(id)
            }
        }
    }

    /// Load a knowledge-base file and register it.
    pub fn load_file(&self, path: &Path) -> DiagResult<KbId> {
        let kb = KnowledgeBase::load(path)?;
        self.register(kb)
    }

    /// Like [`Engine::load_file`], but a file that directory discovery
    /// already registered resolves to its id instead of failing.
    pub fn open_file(&self, path: &Path) -> DiagResult<KbId> {
        let kb = KnowledgeBase::load(path)?;
        if let Some(existing) = self.catalog.get(&kb.id) {
            if same_file(&existing.definition.source, &kb.source) {
                tracing::debug!(kb = %kb.id, path = %path.display(), "knowledge base already loaded");
                return Ok(kb.id);
            }
        }
        self.register(kb)
    }

    /// Ids of every loaded knowledge base, ascending.
    pub fn knowledge_bases(&self) -> Vec<KbId> {
        let mut ids: Vec<KbId> = self.catalog.iter().map(|entry| *entry.key()).collect();
        ids.sort();
        ids
    }

    /// A loaded knowledge base.
    pub fn get(&self, kb_id: KbId) -> DiagResult<Arc<LoadedKb>> {
        self.catalog
            .get(&kb_id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| EngineError::KbNotFound { kb_id: kb_id.0 }.into())
    }

    /// Fail unless `user` may query `kb`.
    pub fn check_access(&self, user: UserId, kb: &KnowledgeBase) -> DiagResult<()> {
        if !self.config.enforce_access || kb.access_level(user).is_some() {
            return Ok(());
        }
        tracing::warn!(user = %user, kb = %kb.id, "access denied");
        Err(AccessError::Forbidden {
            user_id: user.0,
            kb_id: kb.id.0,
        }
        .into())
    }

    /// Answer a request without clarification.
    pub fn solve(&self, request: &Request) -> DiagResult<Answer> {
        self.solve_with(request, &mut NoClarification)
    }

    /// Answer a request, consulting `clarifier` between propagation rounds.
    pub fn solve_with(&self, request: &Request, clarifier: &mut dyn Clarifier) -> DiagResult<Answer> {
        let loaded = self.get(request.kb_id)?;
        self.check_access(request.user_id, &loaded.definition)?;
        let solution = self.solver.solve_with(&loaded.network, request, clarifier);
        Ok(Answer::from_solution(request.kb_id, &loaded.network, &solution))
    }

    /// Answer independent requests in parallel. Results keep request order.
    pub fn solve_batch(&self, requests: &[Request]) -> Vec<DiagResult<Answer>> {
        requests.par_iter().map(|request| self.solve(request)).collect()
    }

    /// Summary of a loaded knowledge base.
    pub fn info(&self, kb_id: KbId) -> DiagResult<KbInfo> {
        let loaded = self.get(kb_id)?;
        let kb = &loaded.definition;
        let net = &loaded.network;
        let count = |kind: NodeKind| net.handles_of_kind(kind).count();
        let connections = net.connections();
        let edges = |kind: EdgeKind| connections.iter().filter(|c| c.kind == kind).count();
        Ok(KbInfo {
            id: kb.id,
            name: kb.name.clone(),
            description: kb.description.clone(),
            source: kb.source.to_string(),
            sections: kb.sections.len(),
            features: count(NodeKind::Feature),
            gates: net.handles().filter(|&h| net.kind(h).is_gate()).count(),
            hypotheses: count(NodeKind::Hypothesis),
            connections: net.connection_count(),
            supports: edges(EdgeKind::Supports),
            requires: edges(EdgeKind::Requires),
            excludes: edges(EdgeKind::Excludes),
            grants: kb.grants.len(),
        })
    }
}

fn same_file(a: &KbSource, b: &KbSource) -> bool {
    match (a, b) {
        (KbSource::File(a), KbSource::File(b)) => match (a.canonicalize(), b.canonicalize()) {
            (Ok(a), Ok(b)) => a == b,
            _ => a == b,
        },
        _ => false,
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("knowledge_bases", &self.catalog.len())
            .finish()
    }
}
