//! # ptedit
//!
//! Command-line editor for hierarchical simulation configuration files.
//!
//! `ptedit` loads a `.toml` or `.json` config, shows what differs from the
//! defaults and applies edits through a [`paramtree::Session`], so a failed
//! edit never reaches the file.
//!
//! ## Modules
//!
//! - [`ctx`] - Application context: paths, settings, kind catalogue
//! - [`edit`] - Command handlers
//! - [`render`] - Terminal output
//! - [`settings`] - Editor settings file
//!
//! ## Example
//!
//! ```text
//! ptedit -c config.toml set controller lastIteration=10
//! ptedit -c config.toml add-set replanning strategySettings TimeAllocationMutator
//! ptedit -c config.toml show --reduced
//! ```

/// Application context and state management.
pub mod ctx;

/// Command handlers.
///
/// Every mutating command runs inside an editing session and is saved only
/// if it succeeds as a whole.
pub mod edit;

pub mod render;

/// Editor settings (`.ptedit.toml`).
pub mod settings;

#[macro_use]
extern crate log;
#[macro_use]
extern crate anyhow;
