//! Keeps the workspace projection and the forum database in step.
//!
//! Layout on disk:
//! - `template_sets/{set}/{group}/{title}.html`
//! - `styles/{theme}/{stylesheet}`

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::core::grouping::{sanitize_folder_name, GroupCache};
use crate::core::style::{StyleStore, StylesheetSaveAction};
use crate::core::template_set::{effective_templates, TemplateSaveAction, TemplateSetStore};
use crate::services::forum_log::ForumLogClient;
use crate::services::refresh::CacheRefreshClient;
use crate::utils::db_utils::Database;
use crate::utils::error::{AppError, Result};
use crate::utils::file_utils::{ensure_plain_name, make_path, write_file};
use crate::utils::logger::{log_error, log_info};
use crate::utils::structs::GroupedTemplate;

pub const TEMPLATE_SETS_DIR: &str = "template_sets";
pub const STYLES_DIR: &str = "styles";
pub const TEMPLATE_EXTENSION: &str = "html";
pub const STYLESHEET_EXTENSION: &str = "css";

/// A synced file, identified by what it is in the database.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Artifact {
    Template { set: String, title: String },
    Stylesheet { theme: String, name: String },
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Artifact::Template { set, title } => {
                write!(f, "template \"{}\" in set \"{}\"", title, set)
            }
            Artifact::Stylesheet { theme, name } => {
                write!(f, "stylesheet \"{}\" for theme \"{}\"", name, theme)
            }
        }
    }
}

/// Works out which artifact a workspace file stands for.
///
/// Returns `Ok(None)` for files outside the synced layout and an error for
/// files inside it whose path is incomplete.
pub fn parse_artifact_path(workspace: &Path, path: &Path) -> Result<Option<Artifact>> {
    let relative = path.strip_prefix(workspace).unwrap_or(path);
    let mut segments = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => segments.push(part.to_string_lossy().into_owned()),
            Component::CurDir => {}
            _ => return Ok(None),
        }
    }

    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase());

    match (segments.first().map(String::as_str), extension.as_deref()) {
        (Some(TEMPLATE_SETS_DIR), Some(TEMPLATE_EXTENSION)) => {
            if segments.len() < 3 {
                return Err(AppError::ValidationError(format!(
                    "Template path {} is incomplete. Expected format: {}/{{templateset}}/{{group}}/{{template}}.{}",
                    relative.to_string_lossy(),
                    TEMPLATE_SETS_DIR,
                    TEMPLATE_EXTENSION
                )));
            }
            let title = path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default();
            Ok(Some(Artifact::Template {
                set: segments[1].clone(),
                title,
            }))
        }
        (Some(STYLES_DIR), Some(STYLESHEET_EXTENSION)) => {
            if segments.len() < 3 {
                return Err(AppError::ValidationError(format!(
                    "Style path {} is incomplete. Expected format: {}/{{theme}}/{{stylesheet}}.{}",
                    relative.to_string_lossy(),
                    STYLES_DIR,
                    STYLESHEET_EXTENSION
                )));
            }
            Ok(Some(Artifact::Stylesheet {
                theme: segments[1].clone(),
                name: segments[segments.len() - 1].clone(),
            }))
        }
        _ => Ok(None),
    }
}

impl Artifact {
    /// Names compare case-insensitively in the forum database, so
    /// `default/...` and `Default/...` address the same rows.
    fn lock_key(&self) -> Artifact {
        match self {
            Artifact::Template { set, title } => Artifact::Template {
                set: set.to_lowercase(),
                title: title.to_lowercase(),
            },
            Artifact::Stylesheet { theme, name } => Artifact::Stylesheet {
                theme: theme.to_lowercase(),
                name: name.to_lowercase(),
            },
        }
    }
}

/// One async mutex per artifact, so two saves of the same template or
/// stylesheet run one after the other.
#[derive(Debug, Default)]
pub struct SaveLocks {
    locks: Mutex<HashMap<Artifact, Arc<tokio::sync::Mutex<()>>>>,
}

impl SaveLocks {
    pub fn lock_for(&self, artifact: &Artifact) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = match self.locks.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        // Entries only the map still holds belong to finished saves.
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        locks.entry(artifact.lock_key()).or_default().clone()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SaveAction {
    Template(TemplateSaveAction),
    Stylesheet(StylesheetSaveAction),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved { artifact: Artifact, action: SaveAction },
    /// The file is not part of the synced layout.
    Ignored,
}

impl fmt::Display for SaveOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaveOutcome::Saved { artifact, action } => match (artifact, action) {
                (Artifact::Template { set, title }, SaveAction::Template(action)) => {
                    write!(f, "{} \"{}\" in set \"{}\"", action, title, set)
                }
                (Artifact::Stylesheet { theme, name }, SaveAction::Stylesheet(action)) => {
                    write!(f, "{} \"{}\" for theme \"{}\"", action, name, theme)
                }
                (artifact, _) => write!(f, "Saved {}", artifact),
            },
            SaveOutcome::Ignored => f.write_str("Not a synced template or stylesheet, nothing to do"),
        }
    }
}

/// Result of a bulk load. Failures are kept so the summary never hides
/// files that could not be written.
#[derive(Debug, Default)]
pub struct LoadSummary {
    pub kind: &'static str,
    pub target: PathBuf,
    pub total: usize,
    pub written: usize,
    pub failures: Vec<(String, AppError)>,
}

impl LoadSummary {
    fn new(kind: &'static str, target: PathBuf, total: usize) -> Self {
        LoadSummary {
            kind,
            target,
            total,
            ..LoadSummary::default()
        }
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && self.written == self.total
    }
}

impl fmt::Display for LoadSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_complete() {
            write!(
                f,
                "{} {} were loaded into {}.",
                self.written,
                self.kind,
                self.target.to_string_lossy()
            )
        } else {
            write!(
                f,
                "{} of {} {} were loaded into {} ({} failed).",
                self.written,
                self.total,
                self.kind,
                self.target.to_string_lossy(),
                self.failures.len()
            )?;
            for (name, error) in &self.failures {
                write!(f, "\n  {}: {}", name, error)?;
            }
            Ok(())
        }
    }
}

pub struct SyncController {
    workspace: PathBuf,
    db: Database,
    groups: GroupCache,
    refresher: CacheRefreshClient,
    forum_log: ForumLogClient,
    version: String,
    locks: SaveLocks,
}

impl SyncController {
    pub fn new(
        workspace: &Path,
        db: Database,
        groups: GroupCache,
        refresher: CacheRefreshClient,
        version: &str,
    ) -> Self {
        SyncController {
            workspace: workspace.to_path_buf(),
            db,
            groups,
            forum_log: refresher.forum_log(),
            refresher,
            version: version.to_string(),
            locks: SaveLocks::default(),
        }
    }

    pub fn workspace(&self) -> &Path {
        &self.workspace
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Drops the cached group table; the next load reads it again.
    pub fn reload_groups(&mut self) {
        self.groups.reset();
    }

    /// Handler for a saved workspace file.
    pub async fn on_artifact_saved(&self, path: &Path, content: &str) -> Result<SaveOutcome> {
        let Some(artifact) = parse_artifact_path(&self.workspace, path)? else {
            return Ok(SaveOutcome::Ignored);
        };

        let lock = self.locks.lock_for(&artifact);
        let _guard = lock.lock().await;

        match self.save_artifact(&artifact, content).await {
            Ok(action) => {
                let outcome = SaveOutcome::Saved { artifact, action };
                self.forum_log.send(&outcome.to_string()).await;
                Ok(outcome)
            }
            Err(error) => {
                self.forum_log
                    .send(&format!("Failed to save {}: {}", artifact, error))
                    .await;
                Err(error)
            }
        }
    }

    async fn save_artifact(&self, artifact: &Artifact, content: &str) -> Result<SaveAction> {
        match artifact {
            Artifact::Template { set, title } => {
                let store = TemplateSetStore::new(&self.db, set);
                Ok(SaveAction::Template(
                    store.save_template(title, content, &self.version).await?,
                ))
            }
            Artifact::Stylesheet { theme, name } => {
                let store = StyleStore::new(&self.db, theme);
                Ok(SaveAction::Stylesheet(
                    store
                        .save_stylesheet(name, content, &self.refresher)
                        .await?,
                ))
            }
        }
    }

    /// Writes every template the set sees into one folder per group.
    pub async fn load_template_set(&self, set_name: &str) -> Result<LoadSummary> {
        ensure_plain_name(set_name)?;
        let groups = self.groups.get_or_load(&self.db).await?;
        let store = TemplateSetStore::new(&self.db, set_name);
        let templates = effective_templates(store.fetch_templates(groups).await?);

        let set_path = self.workspace.join(TEMPLATE_SETS_DIR).join(set_name);
        make_path(&set_path)?;

        let mut by_group: BTreeMap<String, Vec<GroupedTemplate>> = BTreeMap::new();
        for grouped in templates {
            by_group
                .entry(sanitize_folder_name(&grouped.group_name))
                .or_default()
                .push(grouped);
        }

        let total = by_group.values().map(Vec::len).sum();
        let mut summary = LoadSummary::new("templates", set_path.clone(), total);
        for (folder, members) in by_group {
            let group_path = set_path.join(&folder);
            if let Err(error) = make_path(&group_path) {
                log_error(&error.to_string());
                for grouped in members {
                    summary
                        .failures
                        .push((grouped.template.title, AppError::FileError(error.to_string())));
                }
                continue;
            }

            for grouped in members {
                let title = grouped.template.title;
                let result = ensure_plain_name(&title).and_then(|_| {
                    write_file(
                        &group_path.join(format!("{}.{}", title, TEMPLATE_EXTENSION)),
                        &grouped.template.template,
                    )
                });
                match result {
                    Ok(()) => summary.written += 1,
                    Err(error) => {
                        log_error(&format!("Failed to write template {}: {}", title, error));
                        summary.failures.push((title, error));
                    }
                }
            }
        }

        log_info(&summary.to_string());
        self.forum_log.send(&summary.to_string()).await;
        Ok(summary)
    }

    /// Writes every stylesheet of the theme under `styles/{theme}`.
    pub async fn load_style(&self, theme_name: &str) -> Result<LoadSummary> {
        ensure_plain_name(theme_name)?;
        let store = StyleStore::new(&self.db, theme_name);
        let stylesheets = store.fetch_stylesheets().await?;

        let style_path = self.workspace.join(STYLES_DIR).join(theme_name);
        make_path(&style_path)?;

        let mut summary = LoadSummary::new("stylesheets", style_path.clone(), stylesheets.len());
        for stylesheet in stylesheets {
            let result = ensure_plain_name(&stylesheet.name).and_then(|_| {
                write_file(&style_path.join(&stylesheet.name), &stylesheet.stylesheet)
            });
            match result {
                Ok(()) => summary.written += 1,
                Err(error) => {
                    log_error(&format!(
                        "Failed to write stylesheet {}: {}",
                        stylesheet.name, error
                    ));
                    summary.failures.push((stylesheet.name, error));
                }
            }
        }

        log_info(&summary.to_string());
        self.forum_log.send(&summary.to_string()).await;
        Ok(summary)
    }
}
