//! # paramtree
//!
//! Structural model of hierarchical simulation configuration files.
//!
//! A configuration is a tree of named modules. Each module holds flat
//! string parameters plus nested, polymorphic parameter sets (per activity
//! type, per transport mode, ...), each of which may nest further sets.
//!
//! ## Features
//!
//! - Open kind registry: built-in kinds plus extension kinds loaded at runtime
//! - Kind-aware identifiers for matching sibling sets by meaning
//! - Discovery of the child sets a node can create
//! - Recursive diffing against default instances and a reduced view
//! - Lossless TOML/JSON round trips, comments included
//! - Editing sessions with atomic batch edits, commit and rollback
//!
//! ## Quick Start
//!
//! ```rust
//! use paramtree::{Catalogue, Differ, NodePath, ParamEdit, Session, TomlCodec};
//!
//! let catalogue = Catalogue::builtin();
//! let tree = catalogue.default_tree();
//!
//! let mut session = Session::open(&catalogue, TomlCodec, tree).unwrap();
//! session
//!     .apply_edits(&[ParamEdit::new(NodePath::module("controller"), "lastIteration", "10")])
//!     .unwrap();
//! let tree = session.commit();
//!
//! let differ = Differ::new(&catalogue);
//! assert!(differ.has_changes(tree.module("controller").unwrap()));
//! assert!(!differ.has_changes(tree.module("global").unwrap()));
//! ```
//!
//! ## Modules
//!
//! - [`node`] - Config nodes, trees and node paths
//! - [`catalogue`] - Kind registry
//! - [`builtin`] - Built-in kinds
//! - [`extension`] - Extension kinds from descriptor files
//! - [`identity`] - Identifiers of parameter sets
//! - [`discover`] - Creatable child sets
//! - [`diff`] - Baseline comparison and reduced view
//! - [`codec`] - Persisted text form
//! - [`session`] - Editing sessions
//! - [`error`] - Error types

#[macro_use]
extern crate log;

pub mod builtin;

/// Kind registry and data-driven kind schemas.
pub mod catalogue;

/// Persisted text form (TOML, JSON).
pub mod codec;

/// Comparison against default instances.
pub mod diff;

/// Discovery of creatable child sets.
pub mod discover;

/// Error types for tree operations.
pub mod error;

pub mod extension;

pub mod identity;

/// Config nodes, trees and node paths.
pub mod node;

/// Editing sessions with commit and rollback.
pub mod session;

pub use catalogue::{Catalogue, KindDecl, KindSchema, Origin};
pub use codec::{Format, JsonCodec, TomlCodec, TreeCodec};
pub use diff::{Differ, ModuleView};
pub use discover::{creatable_kinds, sorted_creatable_kinds};
pub use error::{CodecError, ConstructionError, DiscoveryError, EditError, RejectedValue};
pub use identity::{assign_identifier, identifier_of};
pub use node::{GENERIC_KIND, Node, NodePath, Tree};
pub use session::{AddedSet, ParamEdit, Session, deep_clone};
