//! Command handlers behind the `mybb-bridge` binary. Every handler returns
//! the message shown to the user; errors are logged here before they reach
//! `main`.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use futures::future;
use path_absolutize::Absolutize;

use crate::core::grouping::GroupCache;
use crate::core::style::list_themes;
use crate::core::template_set::list_template_sets;
use crate::services::config::{create_config, read_config, BridgeConfig, DEFAULT_LOG_FILE};
use crate::services::refresh::CacheRefreshClient;
use crate::services::search::select_name;
use crate::services::sync::SyncController;
use crate::utils::db_utils::Database;
use crate::utils::file_utils::read_file;
use crate::utils::logger::{initialize_logger, log_error, log_info};

#[derive(Debug, Parser)]
#[command(name = "mybb-bridge", version, about = "Sync MyBB templates and stylesheets with a local workspace")]
pub struct Cli {
    /// Workspace root holding `template_sets/`, `styles/` and `.vscode/mbbb.json`.
    #[arg(short, long, global = true)]
    pub workspace: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Write a template set into template_sets/{set}/{group}/.
    LoadTemplateSet { name: Option<String> },
    /// Write a theme's stylesheets into styles/{theme}/.
    LoadStyle { name: Option<String> },
    /// Create .vscode/mbbb.json with default settings.
    CreateConfig,
    /// Upload saved files; meant to be called from the editor's on-save hook.
    Push {
        /// Upload even when `autoUpload` is off.
        #[arg(long)]
        force: bool,
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
}

pub async fn run(cli: Cli) -> Result<String> {
    let workspace = resolve_workspace(cli.workspace.as_deref())?;
    dispatch(&workspace, cli.command).await.map_err(report)
}

async fn dispatch(workspace: &Path, command: Command) -> Result<String> {
    match command {
        Command::CreateConfig => {
            initialize_logger(&workspace.join(DEFAULT_LOG_FILE))?;
            let path = create_config(workspace)?;
            let message = format!("Config file {} created successfully.", path.to_string_lossy());
            log_info(&message);
            Ok(message)
        }
        Command::LoadTemplateSet { name } => {
            let config = load_config(workspace)?;
            let controller = connect(workspace, &config).await?;
            load_template_set(&controller, name).await
        }
        Command::LoadStyle { name } => {
            let config = load_config(workspace)?;
            let controller = connect(workspace, &config).await?;
            load_style(&controller, name).await
        }
        Command::Push { force, paths } => {
            let config = load_config(workspace)?;
            if !config.auto_upload && !force {
                return Ok(String::from(
                    "autoUpload is disabled in the config; nothing was uploaded (use --force).",
                ));
            }
            let controller = connect(workspace, &config).await?;
            push(&controller, &paths).await
        }
    }
}

/// Logs a failure that is about to be shown to the user.
fn report(error: anyhow::Error) -> anyhow::Error {
    log_error(&format!("{:#}", error));
    error
}

/// Reads the workspace config and starts logging to its log file.
fn load_config(workspace: &Path) -> Result<BridgeConfig> {
    let config = read_config(workspace)?;
    let log_file = config.log_file(workspace);
    initialize_logger(&log_file)
        .with_context(|| format!("Failed to open log file {}", log_file.to_string_lossy()))?;
    Ok(config)
}

fn resolve_workspace(workspace: Option<&Path>) -> Result<PathBuf> {
    let workspace = match workspace {
        Some(path) => path.to_path_buf(),
        None => std::env::current_dir().context("No workspace opened")?,
    };
    Ok(workspace.absolutize()?.into_owned())
}

async fn connect(workspace: &Path, config: &BridgeConfig) -> Result<SyncController> {
    let db = Database::connect(&config.database, &config.database.retry_policy()).await?;
    let refresher = CacheRefreshClient::from_config(config)?;

    Ok(SyncController::new(
        workspace,
        db,
        GroupCache::new(),
        refresher,
        &config.mybb_version.to_string(),
    ))
}

pub async fn load_template_set(controller: &SyncController, name: Option<String>) -> Result<String> {
    let name = match name {
        Some(name) => name,
        None => {
            let sets = list_template_sets(controller.database()).await?;
            let titles = sets.into_iter().map(|set| set.title).collect();
            match select_name("Template set", titles)? {
                Some(name) => name,
                None => return Ok(String::from("No template set selected.")),
            }
        }
    };

    let summary = controller
        .load_template_set(&name)
        .await
        .with_context(|| format!("Failed to load templates of \"{}\"", name))?;
    Ok(summary.to_string())
}

pub async fn load_style(controller: &SyncController, name: Option<String>) -> Result<String> {
    let name = match name {
        Some(name) => name,
        None => {
            let themes = list_themes(controller.database()).await?;
            let names = themes.into_iter().map(|theme| theme.name).collect();
            match select_name("Style", names)? {
                Some(name) => name,
                None => return Ok(String::from("No style selected.")),
            }
        }
    };

    let summary = controller
        .load_style(&name)
        .await
        .with_context(|| format!("Failed to load stylesheets of \"{}\"", name))?;
    Ok(summary.to_string())
}

/// Uploads every path concurrently; saves of the same artifact still run
/// one at a time. Relative paths are taken from the workspace root.
pub async fn push(controller: &SyncController, paths: &[PathBuf]) -> Result<String> {
    let results = future::join_all(paths.iter().map(|path| async move {
        let path = path.absolutize_from(controller.workspace())?.into_owned();
        let content = read_file(&path)?;
        let outcome = controller.on_artifact_saved(&path, &content).await?;
        log_info(&format!("{}: {}", path.to_string_lossy(), outcome));
        Ok::<_, anyhow::Error>(outcome.to_string())
    }))
    .await;

    let mut lines = Vec::new();
    let mut failed = 0;
    for (path, result) in paths.iter().zip(results) {
        match result {
            Ok(message) => lines.push(message),
            Err(error) => {
                failed += 1;
                lines.push(format!(
                    "Failed to handle save of {}: {:#}",
                    path.to_string_lossy(),
                    error
                ));
            }
        }
    }

    if failed > 0 {
        Err(anyhow!(lines.join("\n")))
    } else {
        Ok(lines.join("\n"))
    }
}
