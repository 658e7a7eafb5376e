use std::fmt;

use crate::services::refresh::CacheRefreshClient;
use crate::utils::db_utils::{execute_write, map_db_error, Database};
use crate::utils::error::{AppError, Result};
use crate::utils::file_utils::timestamp;
use crate::utils::logger::log_info;
use crate::utils::structs::{Stylesheet, Theme};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StylesheetSaveAction {
    Created,
    Updated,
}

impl fmt::Display for StylesheetSaveAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StylesheetSaveAction::Created => f.write_str("Created new stylesheet"),
            StylesheetSaveAction::Updated => f.write_str("Updated stylesheet"),
        }
    }
}

/// Stylesheet rows of one named theme.
pub struct StyleStore<'a> {
    db: &'a Database,
    name: String,
}

impl<'a> StyleStore<'a> {
    pub fn new(db: &'a Database, name: &str) -> Self {
        StyleStore {
            db,
            name: name.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn find_theme(&self) -> Result<Theme> {
        let statement = format!(
            "SELECT CAST(tid AS SIGNED) AS tid, name FROM {} WHERE name = ? ORDER BY tid ASC",
            self.db.table("themes")
        );
        sqlx::query_as::<_, Theme>(&statement)
            .bind(self.name.as_str())
            .fetch_optional(self.db.pool())
            .await
            .map_err(|e| map_db_error("SELECT themes", e))?
            .ok_or_else(|| AppError::NotFound(format!("Theme \"{}\"", self.name)))
    }

    pub async fn fetch_stylesheets(&self) -> Result<Vec<Stylesheet>> {
        let theme = self.find_theme().await?;

        let statement = format!(
            "SELECT CAST(tid AS SIGNED) AS tid, name, stylesheet, cachefile,
                    CAST(lastmodified AS SIGNED) AS lastmodified
             FROM {}
             WHERE tid = ?
             ORDER BY name ASC",
            self.db.table("themestylesheets")
        );
        let stylesheets = sqlx::query_as::<_, Stylesheet>(&statement)
            .bind(theme.tid)
            .fetch_all(self.db.pool())
            .await
            .map_err(|e| map_db_error("SELECT themestylesheets", e))?;

        log_info(&format!(
            "{} stylesheets fetched for theme \"{}\"",
            stylesheets.len(),
            self.name
        ));
        Ok(stylesheets)
    }

    /// Inserts or updates the stylesheet, then has the forum re-cache it.
    /// The refresh runs exactly once per successful write and never after a
    /// failed one.
    pub async fn save_stylesheet(
        &self,
        name: &str,
        body: &str,
        refresher: &CacheRefreshClient,
    ) -> Result<StylesheetSaveAction> {
        let theme = self.find_theme().await?;
        let table = self.db.table("themestylesheets");

        let lookup = format!(
            "SELECT COUNT(*) FROM {} WHERE tid = ? AND name = ?",
            table
        );
        let existing = sqlx::query_scalar::<_, i64>(&lookup)
            .bind(theme.tid)
            .bind(name)
            .fetch_one(self.db.pool())
            .await
            .map_err(|e| map_db_error("SELECT themestylesheets", e))?;

        let action = if existing == 0 {
            let statement = format!(
                "INSERT INTO {} (tid, name, attachedto, stylesheet, cachefile, lastmodified)
                 VALUES (?, ?, '', ?, ?, ?)",
                table
            );
            execute_write(
                self.db,
                &format!("INSERT stylesheet \"{}\" for theme \"{}\"", name, self.name),
                sqlx::query(&statement)
                    .bind(theme.tid)
                    .bind(name)
                    .bind(body)
                    .bind(name)
                    .bind(timestamp()),
            )
            .await?;
            StylesheetSaveAction::Created
        } else {
            let statement = format!(
                "UPDATE {} SET stylesheet = ?, lastmodified = ? WHERE tid = ? AND name = ?",
                table
            );
            execute_write(
                self.db,
                &format!("UPDATE stylesheet \"{}\" for theme \"{}\"", name, self.name),
                sqlx::query(&statement)
                    .bind(body)
                    .bind(timestamp())
                    .bind(theme.tid)
                    .bind(name),
            )
            .await?;
            StylesheetSaveAction::Updated
        };

        log_info(&format!("{} \"{}\" for theme \"{}\"", action, name, self.name));
        refresher.refresh(name, &self.name).await?;
        Ok(action)
    }
}

/// Every theme known to the forum, ordered by name.
pub async fn list_themes(db: &Database) -> Result<Vec<Theme>> {
    let statement = format!(
        "SELECT CAST(tid AS SIGNED) AS tid, name FROM {} ORDER BY name ASC",
        db.table("themes")
    );
    sqlx::query_as::<_, Theme>(&statement)
        .fetch_all(db.pool())
        .await
        .map_err(|e| map_db_error("SELECT themes", e))
}
