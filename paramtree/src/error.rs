//! Error types for configuration tree operations.
//!
//! Each failure class of the editor has its own type so callers can decide
//! how far it propagates:
//!
//! - [`RejectedValue`] - a kind refused one parameter value
//! - [`ConstructionError`] - a default instance or child could not be built
//! - [`CodecError`] - text could not be parsed or produced
//! - [`DiscoveryError`] - the capability probe itself is unavailable
//! - [`EditError`] - a session edit was refused

use crate::node::NodePath;

/// A kind refused a parameter value.
///
/// Always names the node and the key so the failure can be shown next to
/// the offending field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot set `{key}` = `{value}` in `{node}`: {reason}")]
pub struct RejectedValue {
    /// Module name, set name or full node path.
    pub node: String,
    /// Parameter name.
    pub key: String,
    /// The value that was refused.
    pub value: String,
    /// Why the kind refused it.
    pub reason: String,
}

impl RejectedValue {
    /// Replace the node label, e.g. with a full path once it is known.
    pub fn at(mut self, node: impl Into<String>) -> Self {
        self.node = node.into();
        self
    }
}

/// A node of some kind could not be constructed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConstructionError {
    /// No schema is registered under this kind name.
    #[error("unknown kind: `{0}`")]
    UnknownKind(String),

    /// The kind has no default instance (e.g. generic modules).
    #[error("kind `{0}` has no default instance")]
    NoDefault(String),

    /// The parent kind does not declare this child set.
    #[error("kind `{kind}` cannot create children of type `{set_type}`")]
    Unsupported { kind: String, set_type: String },

    /// The constructed child is not filed under the requested set type.
    #[error("expected a `{expected}` set, got `{actual}`")]
    Incompatible { expected: String, actual: String },

    /// Kind declarations reference each other in a cycle.
    #[error("construction of `{0}` nests too deep (cyclic kind declarations?)")]
    TooDeep(String),
}

/// Text codec failure.
///
/// The tree passed to the failing call is never modified.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// The text could not be parsed.
    #[error("failed to parse {format}: {message}")]
    Parse {
        format: &'static str,
        message: String,
    },

    /// The tree could not be written.
    #[error("failed to serialize {format}: {message}")]
    Serialize {
        format: &'static str,
        message: String,
    },

    /// The text parsed, but the tree it describes is malformed.
    #[error("malformed tree: {0}")]
    Structure(String),

    /// No codec handles this file extension.
    #[error("unsupported config file extension: {0:?}")]
    UnsupportedFormat(String),
}

/// Systemic failure of the capability probe.
///
/// Distinct from an empty result, which means "no child sets supported".
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DiscoveryError {
    /// The node's kind is not registered, so nothing can be probed.
    #[error("cannot probe child sets of `{node}`: kind `{kind}` is not registered")]
    UnknownKind { node: String, kind: String },
}

/// A session edit was refused. The working tree is left unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    #[error(transparent)]
    Rejected(#[from] RejectedValue),

    #[error(transparent)]
    Construction(#[from] ConstructionError),

    #[error("no node at `{0}`")]
    NodeNotFound(NodePath),

    #[error("invalid node path `{path}`: {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("module `{0}` does not exist")]
    ModuleNotFound(String),

    #[error("a module with the name `{0}` already exists")]
    ModuleExists(String),

    #[error("module `{0}` is not known to the catalogue")]
    UnknownModule(String),

    #[error("parameter `{key}` already exists in `{node}`")]
    ParamExists { node: String, key: String },

    #[error("parameters of `{0}` are fixed by its kind")]
    ParamsNotEditable(String),

    #[error("identifier must not be empty")]
    EmptyIdentifier,

    #[error("`{node}` already has a `{set_type}` set identified `{identifier}`")]
    IdentifierExists {
        node: String,
        set_type: String,
        identifier: String,
    },
}

/// Result type for session edits.
pub type EditResult<T> = std::result::Result<T, EditError>;
