//! Application context and state management.
//!
//! [`AppContext`] holds what every command needs: where the config and
//! settings files live, the loaded settings and the kind catalogue built
//! from the built-in kinds plus the configured extensions.

use std::{
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};

use anyhow::Context;
use paramtree::{Catalogue, Format, Tree, TreeCodec, extension::ExtensionFile};
use tokio::fs;

use crate::settings::EditorSettings;

/// Path configuration grouping all path-related fields.
#[derive(Debug, Default, Clone)]
pub struct PathConfig {
    /// Config file being edited.
    pub config: PathBuf,
    /// Editor settings file.
    pub settings: PathBuf,
}

impl PathConfig {
    /// Where the existing config is copied before it is overwritten at
    /// `secs` (Unix time): `<stem>.bk-<secs>.<ext>`.
    pub fn backup_path(&self, secs: u64) -> PathBuf {
        backup_path(&self.config, secs)
    }
}

fn backup_path(path: &Path, secs: u64) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let ext = path
        .extension()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    path.with_file_name(format!("{stem}.bk-{secs}.{ext}"))
}

/// The main application context holding all state.
#[derive(Debug)]
pub struct AppContext {
    pub paths: PathConfig,
    pub settings: EditorSettings,
    pub catalogue: Catalogue,
}

impl AppContext {
    /// Load settings and build the catalogue.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings file or an extension descriptor
    /// cannot be read.
    pub async fn new(config: PathBuf, settings_path: PathBuf) -> anyhow::Result<Self> {
        let settings = EditorSettings::load(&settings_path).await?;
        let mut catalogue = Catalogue::builtin();
        for path in &settings.extensions {
            let file = ExtensionFile::load(path)
                .with_context(|| format!("failed to load extension {}", path.display()))?;
            let n = catalogue.register_extensions(file);
            debug!("{}: {n} kinds", path.display());
        }

        Ok(Self {
            paths: PathConfig {
                config,
                settings: settings_path,
            },
            settings,
            catalogue,
        })
    }

    /// Codec of the config file, chosen by its extension.
    pub fn format(&self) -> anyhow::Result<Format> {
        Format::from_path(&self.paths.config)
            .with_context(|| format!("cannot edit {}", self.paths.config.display()))
    }

    /// Read the config file. A missing file yields the default tree.
    pub async fn load_tree(&self) -> anyhow::Result<Tree> {
        let format = self.format()?;
        let path = &self.paths.config;
        if !path.exists() {
            info!("{} does not exist, starting from defaults", path.display());
            return Ok(self.catalogue.default_tree());
        }
        let text = fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        let tree = format
            .deserialize(&text)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(tree)
    }

    /// Write `tree` to the config file, copying the previous file aside
    /// first when backups are enabled.
    pub async fn save_tree(&self, tree: &Tree) -> anyhow::Result<()> {
        let format = self.format()?;
        let text = format.serialize(tree)?;
        let path = &self.paths.config;

        if self.settings.backup && path.exists() {
            let secs = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
            let backup = self.paths.backup_path(secs);
            fs::copy(path, &backup)
                .await
                .with_context(|| format!("failed to back up to {}", backup.display()))?;
            info!("backup written to {}", backup.display());
        }

        fs::write(path, text)
            .await
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backup_path() {
        assert_eq!(
            backup_path(Path::new("/work/config.toml"), 1700000000),
            PathBuf::from("/work/config.bk-1700000000.toml")
        );
        assert_eq!(
            backup_path(Path::new("run.json"), 5),
            PathBuf::from("run.bk-5.json")
        );
    }

    #[tokio::test]
    async fn test_load_missing_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = AppContext::new(dir.path().join("config.toml"), dir.path().join(".ptedit.toml"))
            .await
            .unwrap();
        let tree = ctx.load_tree().await.unwrap();
        assert_eq!(tree.module_names().len(), 5);
    }

    #[tokio::test]
    async fn test_save_writes_backup() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("config.json");
        let ctx = AppContext::new(config.clone(), dir.path().join(".ptedit.toml"))
            .await
            .unwrap();

        let tree = ctx.load_tree().await.unwrap();
        ctx.save_tree(&tree).await.unwrap();
        ctx.save_tree(&tree).await.unwrap();

        let backups = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with("config.bk-"))
            .count();
        assert_eq!(backups, 1);
        assert_eq!(ctx.load_tree().await.unwrap().module_names().len(), 5);
    }

    #[tokio::test]
    async fn test_extensions_are_registered() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("noise.toml"),
            "[[kinds]]\nkind = \"noise\"\nmodule = true\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join(".ptedit.toml"),
            "extensions = [\"noise.toml\"]\n",
        )
        .unwrap();

        let ctx = AppContext::new(dir.path().join("config.toml"), dir.path().join(".ptedit.toml"))
            .await
            .unwrap();
        assert!(ctx.catalogue.contains("noise"));
    }

    #[tokio::test]
    async fn test_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = AppContext::new(dir.path().join("config.xml"), dir.path().join(".ptedit.toml"))
            .await
            .unwrap();
        assert!(ctx.load_tree().await.is_err());
    }
}
