//! Extension kinds described in descriptor files.
//!
//! A descriptor lists [`KindDecl`]s in TOML or JSON:
//!
//! ```toml
//! [[kinds]]
//! kind = "emissions"
//! module = true
//!
//! [[kinds.params]]
//! key = "averageColdEmissionFactorsFile"
//! default = ""
//! comment = "Path to the cold emission factor table."
//!
//! [[kinds.children]]
//! set_type = "vehicleClass"
//! ```

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{
    catalogue::{Catalogue, KindDecl, Origin},
    codec::Format,
    error::CodecError,
};

/// Contents of one descriptor file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtensionFile {
    #[serde(default)]
    pub kinds: Vec<KindDecl>,
}

impl ExtensionFile {
    /// Parse descriptor text in the given format.
    pub fn parse(text: &str, format: Format) -> Result<Self, CodecError> {
        match format {
            Format::Toml => toml::from_str(text).map_err(|e| CodecError::Parse {
                format: "toml",
                message: e.to_string(),
            }),
            Format::Json => serde_json::from_str(text).map_err(|e| CodecError::Parse {
                format: "json",
                message: e.to_string(),
            }),
        }
    }

    /// Read and parse a descriptor file, picking the format by extension.
    pub fn load(path: &Path) -> Result<Self, CodecError> {
        let format = Format::from_path(path)?;
        let text = fs::read_to_string(path).map_err(|e| CodecError::Parse {
            format: format.extension(),
            message: format!("{}: {e}", path.display()),
        })?;
        Self::parse(&text, format)
    }
}

impl Catalogue {
    /// Register every kind of `file` as an extension kind.
    ///
    /// Kinds whose name is already taken are skipped. Returns the number of
    /// kinds registered.
    pub fn register_extensions(&mut self, file: ExtensionFile) -> usize {
        let mut registered = 0;
        for decl in file.kinds {
            if self.register(decl, Origin::Extension) {
                registered += 1;
            }
        }
        info!("registered {registered} extension kinds");
        registered
    }
}
