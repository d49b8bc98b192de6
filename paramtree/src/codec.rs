//! Persisted text form of a [`Tree`].
//!
//! The text form is the only persistence format. It must be lossless for
//! parameters, comments and child structure: session backups are made by
//! writing and re-reading a tree, so any field a codec drops silently
//! vanishes from the backup as well.
//!
//! Two codecs are provided, TOML and JSON, selected by file extension.
//!
//! ```toml
//! [global]
//! kind = "global"
//! name = "global"
//!
//! [global.params]
//! randomSeed = "4711"
//!
//! [[replanning.children.strategySettings]]
//! kind = "strategySettings"
//! name = "strategySettings"
//! ```

use std::path::Path;

use crate::{error::CodecError, node::Tree};

/// Serializer/deserializer pair for trees.
pub trait TreeCodec {
    /// Write `tree` as text.
    fn serialize(&self, tree: &Tree) -> Result<String, CodecError>;

    /// Parse text into a new tree.
    fn deserialize(&self, text: &str) -> Result<Tree, CodecError>;

    /// Name of the format, e.g. `"toml"`.
    fn format_name(&self) -> &'static str;
}

/// TOML codec.
#[derive(Debug, Default, Clone, Copy)]
pub struct TomlCodec;

impl TreeCodec for TomlCodec {
    fn serialize(&self, tree: &Tree) -> Result<String, CodecError> {
        toml::to_string_pretty(tree).map_err(|e| CodecError::Serialize {
            format: "toml",
            message: e.to_string(),
        })
    }

    fn deserialize(&self, text: &str) -> Result<Tree, CodecError> {
        let mut tree: Tree = toml::from_str(text).map_err(|e| CodecError::Parse {
            format: "toml",
            message: e.to_string(),
        })?;
        tree.normalize()?;
        Ok(tree)
    }

    fn format_name(&self) -> &'static str {
        "toml"
    }
}

/// JSON codec.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonCodec;

impl TreeCodec for JsonCodec {
    fn serialize(&self, tree: &Tree) -> Result<String, CodecError> {
        serde_json::to_string_pretty(tree).map_err(|e| CodecError::Serialize {
            format: "json",
            message: e.to_string(),
        })
    }

    fn deserialize(&self, text: &str) -> Result<Tree, CodecError> {
        let mut tree: Tree = serde_json::from_str(text).map_err(|e| CodecError::Parse {
            format: "json",
            message: e.to_string(),
        })?;
        tree.normalize()?;
        Ok(tree)
    }

    fn format_name(&self) -> &'static str {
        "json"
    }
}

/// Codec chosen at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Toml,
    Json,
}

impl Format {
    /// Pick the format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self, CodecError> {
        let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("");
        match ext {
            "toml" | "tml" => Ok(Format::Toml),
            "json" => Ok(Format::Json),
            _ => Err(CodecError::UnsupportedFormat(ext.to_string())),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Format::Toml => "toml",
            Format::Json => "json",
        }
    }
}

impl TreeCodec for Format {
    fn serialize(&self, tree: &Tree) -> Result<String, CodecError> {
        match self {
            Format::Toml => TomlCodec.serialize(tree),
            Format::Json => JsonCodec.serialize(tree),
        }
    }

    fn deserialize(&self, text: &str) -> Result<Tree, CodecError> {
        match self {
            Format::Toml => TomlCodec.deserialize(text),
            Format::Json => JsonCodec.deserialize(text),
        }
    }

    fn format_name(&self) -> &'static str {
        self.extension()
    }
}

impl<C: TreeCodec + ?Sized> TreeCodec for &C {
    fn serialize(&self, tree: &Tree) -> Result<String, CodecError> {
        (**self).serialize(tree)
    }

    fn deserialize(&self, text: &str) -> Result<Tree, CodecError> {
        (**self).deserialize(text)
    }

    fn format_name(&self) -> &'static str {
        (**self).format_name()
    }
}
