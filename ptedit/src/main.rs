use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use log::LevelFilter;
use paramtree::NodePath;
use ptedit::{
    ctx::AppContext,
    edit::EditHandler,
    render::ShowOptions,
    settings::{EditorSettings, SETTINGS_FILE},
};

#[derive(Parser, Debug)]
#[command(name = "ptedit", version, about)]
struct Cli {
    /// Config file to edit (`.toml` or `.json`).
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Editor settings file.
    #[arg(long, default_value = SETTINGS_FILE)]
    settings: PathBuf,

    /// Debug logging.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the config.
    Show {
        /// Hide what equals the defaults.
        #[arg(long)]
        reduced: bool,
        /// Show everything, overriding a reduced default.
        #[arg(long, conflicts_with = "reduced")]
        full: bool,
        #[arg(long)]
        no_comments: bool,
    },
    /// Show which modules differ from their defaults.
    Status,
    /// List the parameter sets that can be added below a node.
    Kinds { path: NodePath },
    /// List catalogue modules that are not in the config yet.
    Modules,
    /// Set parameters, all or nothing.
    Set {
        path: NodePath,
        #[arg(required = true, value_name = "KEY=VALUE")]
        assignments: Vec<String>,
    },
    /// Remove a parameter.
    Unset { path: NodePath, key: String },
    /// Add a parameter set.
    AddSet {
        path: NodePath,
        set_type: String,
        identifier: String,
    },
    /// Remove a parameter set.
    RemoveSet {
        path: NodePath,
        set_type: String,
        identifier: String,
    },
    /// Add a module; unknown names give an empty module.
    AddModule { name: String },
    /// Remove a module.
    RemoveModule { name: String },
    /// Restore parameter comments from the catalogue.
    ReconcileComments,
    /// Replace the config with the modules of another file.
    Merge { file: PathBuf },
    /// Print the JSON Schema of the settings file.
    Schema,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    let ctx = AppContext::new(cli.config, cli.settings).await?;

    let out = match cli.command {
        Commands::Show {
            reduced,
            full,
            no_comments,
        } => {
            let opts = ShowOptions {
                reduced: reduced || (ctx.settings.reduced && !full),
                comments: ctx.settings.show_comments && !no_comments,
            };
            EditHandler::show(&ctx, opts).await?
        }
        Commands::Status => EditHandler::status(&ctx).await?,
        Commands::Kinds { path } => EditHandler::kinds(&ctx, &path).await?,
        Commands::Modules => EditHandler::modules(&ctx).await?,
        Commands::Set { path, assignments } => EditHandler::set(&ctx, &path, &assignments).await?,
        Commands::Unset { path, key } => EditHandler::unset(&ctx, &path, &key).await?,
        Commands::AddSet {
            path,
            set_type,
            identifier,
        } => EditHandler::add_set(&ctx, &path, &set_type, &identifier).await?,
        Commands::RemoveSet {
            path,
            set_type,
            identifier,
        } => EditHandler::remove_set(&ctx, &path, &set_type, &identifier).await?,
        Commands::AddModule { name } => EditHandler::add_module(&ctx, &name).await?,
        Commands::RemoveModule { name } => EditHandler::remove_module(&ctx, &name).await?,
        Commands::ReconcileComments => EditHandler::reconcile_comments(&ctx).await?,
        Commands::Merge { file } => EditHandler::merge(&ctx, &file).await?,
        Commands::Schema => EditorSettings::schema_json()?,
    };

    print!("{out}");
    if !out.ends_with('\n') {
        println!();
    }
    Ok(())
}
