//! Command handlers.
//!
//! Read-only commands load the tree and print. Mutating commands open a
//! [`Session`] on the loaded tree, apply their change, then commit and save;
//! on any error the session is rolled back and the file is left alone.

use anyhow::{Context, Result};
use colored::Colorize;
use paramtree::{
    Format, NodePath, ParamEdit, Session, Tree, TreeCodec, discover::sorted_creatable_kinds,
};
use tokio::fs;

use crate::{
    ctx::AppContext,
    render::{ShowOptions, render_status, render_tree},
};

/// Parse `key=value` assignments.
pub fn parse_assignments(path: &NodePath, assignments: &[String]) -> Result<Vec<ParamEdit>> {
    assignments
        .iter()
        .map(|a| {
            let (key, value) = a
                .split_once('=')
                .ok_or_else(|| anyhow!("expected `key=value`, got `{a}`"))?;
            let key = key.trim();
            if key.is_empty() {
                bail!("empty parameter name in `{a}`");
            }
            Ok(ParamEdit::new(path.clone(), key, value))
        })
        .collect()
}

/// Handler for all editor commands.
pub struct EditHandler;

impl EditHandler {
    /// Run `f` inside a session over the config file and save the result.
    ///
    /// Returns the message produced by `f`.
    async fn edit<F>(ctx: &AppContext, f: F) -> Result<String>
    where
        F: FnOnce(&mut Session<'_, Format>) -> Result<String>,
    {
        let tree = ctx.load_tree().await?;
        let mut session = Session::open(&ctx.catalogue, ctx.format()?, tree)?;
        match f(&mut session) {
            Ok(msg) => {
                let tree = session.commit();
                ctx.save_tree(&tree).await?;
                info!("saved {}", ctx.paths.config.display());
                Ok(msg)
            }
            Err(e) => {
                session.rollback();
                debug!("rolled back: {e}");
                Err(e)
            }
        }
    }

    async fn load(ctx: &AppContext) -> Result<Tree> {
        ctx.load_tree().await
    }

    pub async fn show(ctx: &AppContext, opts: ShowOptions) -> Result<String> {
        let tree = Self::load(ctx).await?;
        Ok(render_tree(&ctx.catalogue, &tree, opts))
    }

    pub async fn status(ctx: &AppContext) -> Result<String> {
        let tree = Self::load(ctx).await?;
        Ok(render_status(&ctx.catalogue, &tree))
    }

    /// Set types that can be added below `path`.
    pub async fn kinds(ctx: &AppContext, path: &NodePath) -> Result<String> {
        let tree = Self::load(ctx).await?;
        let node = tree
            .resolve(&ctx.catalogue, path)
            .ok_or_else(|| anyhow!("no node at `{path}`"))?;
        let kinds = sorted_creatable_kinds(&ctx.catalogue, node)?;
        if kinds.is_empty() {
            return Ok(format!("`{path}` cannot create parameter sets\n"));
        }
        Ok(kinds.iter().map(|k| format!("{k}\n")).collect())
    }

    /// Catalogue modules not yet in the config.
    pub async fn modules(ctx: &AppContext) -> Result<String> {
        let tree = Self::load(ctx).await?;
        let available = ctx.catalogue.available_modules(&tree);
        if available.is_empty() {
            return Ok("all known modules are present\n".to_string());
        }
        let mut out = String::new();
        for (title, names) in [("core", &available.core), ("extension", &available.extension)] {
            if names.is_empty() {
                continue;
            }
            out += &format!("{}\n", title.bold());
            for name in names {
                out += &format!("  {name}\n");
            }
        }
        Ok(out)
    }

    pub async fn set(ctx: &AppContext, path: &NodePath, assignments: &[String]) -> Result<String> {
        let edits = parse_assignments(path, assignments)?;
        Self::edit(ctx, |session| {
            let changed = session.apply_edits(&edits)?;
            Ok(format!("{changed} value(s) changed in `{path}`"))
        })
        .await
    }

    pub async fn unset(ctx: &AppContext, path: &NodePath, key: &str) -> Result<String> {
        Self::edit(ctx, |session| {
            if !session.remove_param(path, key)? {
                bail!("`{path}` has no parameter `{key}`");
            }
            Ok(format!("removed `{key}` from `{path}`"))
        })
        .await
    }

    pub async fn add_set(
        ctx: &AppContext,
        path: &NodePath,
        set_type: &str,
        identifier: &str,
    ) -> Result<String> {
        Self::edit(ctx, |session| {
            let added = session.add_child(path, set_type, identifier)?;
            let mut msg = format!("added `{}`", added.path);
            if !added.identifier_assigned {
                msg += &format!(" ({})", "identifier could not be stored".yellow());
            }
            Ok(msg)
        })
        .await
    }

    pub async fn remove_set(
        ctx: &AppContext,
        path: &NodePath,
        set_type: &str,
        identifier: &str,
    ) -> Result<String> {
        Self::edit(ctx, |session| {
            if !session.remove_child(path, set_type, identifier)? {
                bail!("`{path}` has no `{set_type}` set identified `{identifier}`");
            }
            Ok(format!("removed `{path}/{set_type}[{identifier}]`"))
        })
        .await
    }

    /// Add a catalogue module by name, or an empty generic module if the
    /// catalogue does not know the name.
    pub async fn add_module(ctx: &AppContext, name: &str) -> Result<String> {
        Self::edit(ctx, |session| {
            let known = session
                .catalogue()
                .known_modules()
                .iter()
                .any(|m| m.name == name);
            if known {
                session.add_known_module(name)?;
                Ok(format!("added module `{name}` with defaults"))
            } else {
                session.add_module(name)?;
                Ok(format!("added empty module `{name}`"))
            }
        })
        .await
    }

    pub async fn remove_module(ctx: &AppContext, name: &str) -> Result<String> {
        Self::edit(ctx, |session| {
            if !session.remove_module(name) {
                bail!("module `{name}` does not exist");
            }
            Ok(format!("removed module `{name}`"))
        })
        .await
    }

    /// Restore the catalogue comments of every known module.
    pub async fn reconcile_comments(ctx: &AppContext) -> Result<String> {
        let defaults = ctx.catalogue.comment_catalogue();
        Self::edit(ctx, |session| {
            session.reconcile_comments(&defaults);
            Ok("comments reloaded from the catalogue".to_string())
        })
        .await
    }

    /// Replace the config with the modules read from `file`.
    ///
    /// `file` must be in the config file's format.
    pub async fn merge(ctx: &AppContext, file: &std::path::Path) -> Result<String> {
        let format = ctx.format()?;
        if Format::from_path(file).ok() != Some(format) {
            bail!(
                "{} is not a {} file",
                file.display(),
                format.format_name()
            );
        }
        let text = fs::read_to_string(file)
            .await
            .with_context(|| format!("failed to read {}", file.display()))?;
        Self::edit(ctx, |session| {
            session.merge_from_text(&text)?;
            Ok(format!(
                "merged {} module(s) from {}",
                session.working().modules.len(),
                file.display()
            ))
        })
        .await
    }
}
