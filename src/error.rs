//! Rich diagnostic error types for diagnet.
//!
//! The solver itself never fails: malformed conditions and unknown features
//! degrade to "no match". Errors come from the collaborators around it
//! (network assembly, knowledge-base files, access checks, configuration),
//! and each defines its own enum with miette `#[diagnostic]` derives so users
//! get an error code and help text.

// Variant fields such as `node_id` are read only by the derived `Display`
// and `Diagnostic` impls; newer compilers flag them as unused assignments.
#![allow(unused_assignments)]

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for diagnet.
///
/// Each variant wraps a subsystem-specific error, preserving the full
/// diagnostic chain through to the user.
#[derive(Debug, Error, Diagnostic)]
pub enum DiagError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Network(#[from] NetworkError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Kb(#[from] KbError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Access(#[from] AccessError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Engine(#[from] EngineError),
}

// ---------------------------------------------------------------------------
// Network errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum NetworkError {
    #[error("duplicate node id {node_id}")]
    #[diagnostic(
        code(diagnet::network::duplicate_node),
        help(
            "Node ids must be unique across all sections of a knowledge base. \
             Renumber one of the nodes."
        )
    )]
    DuplicateNode { node_id: u64 },

    #[error("node not found: {node_id}")]
    #[diagnostic(
        code(diagnet::network::node_not_found),
        help(
            "A connection refers to a node id that is not declared in any section. \
             Declare the node first or fix the connection endpoint."
        )
    )]
    NodeNotFound { node_id: u64 },

    #[error("duplicate connection {source_id} -> {target_id}")]
    #[diagnostic(
        code(diagnet::network::duplicate_connection),
        help("Only one connection is allowed per ordered pair of nodes. Remove the extra one.")
    )]
    DuplicateConnection { source_id: u64, target_id: u64 },

    #[error("feature node {node_id} has no attribute")]
    #[diagnostic(
        code(diagnet::network::missing_attribute),
        help("Feature nodes need an attribute and an activation condition to be observable.")
    )]
    MissingAttribute { node_id: u64 },

    #[error("{kind} node {node_id} cannot carry an attribute")]
    #[diagnostic(
        code(diagnet::network::unexpected_attribute),
        help("Only feature nodes are observed. Drop the attribute or change the node kind.")
    )]
    UnexpectedAttribute { node_id: u64, kind: String },
}

// ---------------------------------------------------------------------------
// Knowledge-base file errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum KbError {
    #[error("failed to read knowledge base: {path}")]
    #[diagnostic(code(diagnet::kb::io), help("Ensure the file exists and is readable."))]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse knowledge base {path}: {message}")]
    #[diagnostic(
        code(diagnet::kb::parse),
        help(
            "Check the TOML syntax. A knowledge base needs a [knowledge_base] table, \
             and may declare [[attributes]], [[sections]], [[connections]] and [[grants]]."
        )
    )]
    Parse { path: String, message: String },

    #[error("duplicate section \"{name}\" in knowledge base {kb_id}")]
    #[diagnostic(
        code(diagnet::kb::duplicate_section),
        help("Section names must be unique within one knowledge base.")
    )]
    DuplicateSection { kb_id: u64, name: String },

    #[error("duplicate attribute id {attribute_id} in knowledge base {kb_id}")]
    #[diagnostic(
        code(diagnet::kb::duplicate_attribute),
        help("Attribute ids must be unique within one knowledge base.")
    )]
    DuplicateAttribute { kb_id: u64, attribute_id: u64 },

    #[error("node {node_id} references unknown attribute {attribute_id}")]
    #[diagnostic(
        code(diagnet::kb::unknown_attribute),
        help("Declare the attribute in an [[attributes]] entry or fix the reference.")
    )]
    UnknownAttribute { node_id: u64, attribute_id: u64 },

    #[error("feature node {node_id} declares an attribute without a condition")]
    #[diagnostic(
        code(diagnet::kb::missing_condition),
        help(
            "Give the node a `condition`: a range like \"10:20\", a set like \"[a,b]\", \
             or an exact value."
        )
    )]
    MissingCondition { node_id: u64 },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Network(#[from] NetworkError),
}

// ---------------------------------------------------------------------------
// Access errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum AccessError {
    #[error("user {user_id} has no access to knowledge base {kb_id}")]
    #[diagnostic(
        code(diagnet::access::forbidden),
        help(
            "Add a [[grants]] entry for this user to the knowledge base, \
             or disable `enforce_access` in the engine configuration."
        )
    )]
    Forbidden { user_id: u64, kb_id: u64 },
}

// ---------------------------------------------------------------------------
// Engine errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum EngineError {
    #[error("knowledge base not found: {kb_id}")]
    #[diagnostic(
        code(diagnet::engine::kb_not_found),
        help("Load the knowledge base first, or check `diagnet list` for loaded ids.")
    )]
    KbNotFound { kb_id: u64 },

    #[error("knowledge base {kb_id} is already loaded")]
    #[diagnostic(
        code(diagnet::engine::duplicate_kb),
        help("Two files declare the same knowledge-base id. Give one of them a new id.")
    )]
    DuplicateKb { kb_id: u64 },

    #[error("invalid configuration: {message}")]
    #[diagnostic(code(diagnet::engine::invalid_config), help("Check the EngineConfig fields."))]
    InvalidConfig { message: String },

    #[error("failed to read config: {path}")]
    #[diagnostic(
        code(diagnet::engine::config_read),
        help("Ensure the config file exists and is readable.")
    )]
    ConfigRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {message}")]
    #[diagnostic(
        code(diagnet::engine::config_parse),
        help("The config is TOML with optional `kb_dir` and `enforce_access` keys.")
    )]
    ConfigParse { path: String, message: String },

    #[error("failed to write config: {path}")]
    #[diagnostic(
        code(diagnet::engine::config_write),
        help("Check that the parent directory exists and you have write permissions.")
    )]
    ConfigWrite {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience alias for functions returning diagnet results.
pub type DiagResult<T> = std::result::Result<T, DiagError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_error_converts_to_diag_error() {
        let err = NetworkError::DuplicateNode { node_id: 4 };
        let diag: DiagError = err.into();
        assert!(matches!(
            diag,
            DiagError::Network(NetworkError::DuplicateNode { node_id: 4 })
        ));
    }

    #[test]
    fn kb_error_wraps_network_error() {
        let err = NetworkError::NodeNotFound { node_id: 9 };
        let kb: KbError = err.into();
        assert!(matches!(kb, KbError::Network(NetworkError::NodeNotFound { .. })));
    }

    #[test]
    fn forbidden_names_user_and_kb() {
        let err = AccessError::Forbidden {
            user_id: 7,
            kb_id: 3,
        };
        let msg = format!("{err}");
        assert!(msg.contains("user 7"));
        assert!(msg.contains("knowledge base 3"));
    }

    #[test]
    fn duplicate_connection_message_names_both_endpoints() {
        let err = NetworkError::DuplicateConnection {
            source_id: 1,
            target_id: 2,
        };
        assert_eq!(format!("{err}"), "duplicate connection 1 -> 2");
    }
}
