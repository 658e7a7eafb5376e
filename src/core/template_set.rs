use std::collections::HashMap;
use std::fmt;

use crate::core::grouping::{classify, GroupTable};
use crate::utils::db_utils::{execute_write, map_db_error, Database};
use crate::utils::error::{AppError, Result};
use crate::utils::file_utils::timestamp;
use crate::utils::logger::log_info;
use crate::utils::structs::{GroupedTemplate, Template, TemplateSet, MASTER_SID};

/// What a template save did, one variant per master/custom combination.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TemplateSaveAction {
    /// Master row exists, the set's override was updated.
    UpdatedModified,
    /// Master row exists, a first override was created for the set.
    CreatedCustomVersion,
    /// No master row, the set's own template was updated.
    UpdatedCustom,
    /// No master row and nothing in the set yet.
    CreatedNew,
}

impl TemplateSaveAction {
    fn describe(&self) -> &'static str {
        match self {
            TemplateSaveAction::UpdatedModified => "Updated modified template",
            TemplateSaveAction::CreatedCustomVersion => "Created custom version of template",
            TemplateSaveAction::UpdatedCustom => "Updated custom template",
            TemplateSaveAction::CreatedNew => "Created new template",
        }
    }
}

impl fmt::Display for TemplateSaveAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// Template rows of one named template set.
pub struct TemplateSetStore<'a> {
    db: &'a Database,
    name: String,
}

impl<'a> TemplateSetStore<'a> {
    pub fn new(db: &'a Database, name: &str) -> Self {
        TemplateSetStore {
            db,
            name: name.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Looks the set up by title.
    pub async fn find_set(&self) -> Result<TemplateSet> {
        let statement = format!(
            "SELECT CAST(sid AS SIGNED) AS sid, title FROM {} WHERE title = ? ORDER BY sid ASC",
            self.db.table("templatesets")
        );
        sqlx::query_as::<_, TemplateSet>(&statement)
            .bind(self.name.as_str())
            .fetch_optional(self.db.pool())
            .await
            .map_err(|e| map_db_error("SELECT templatesets", e))?
            .ok_or_else(|| AppError::NotFound(format!("Template set \"{}\"", self.name)))
    }

    /// Master templates plus the set's own templates, ordered by title, each
    /// tagged with its folder group.
    pub async fn fetch_templates(&self, groups: &GroupTable) -> Result<Vec<GroupedTemplate>> {
        let set = self.find_set().await?;

        let statement = format!(
            "SELECT CAST(tid AS SIGNED) AS tid, title, template, CAST(sid AS SIGNED) AS sid,
                    version, CAST(dateline AS SIGNED) AS dateline
             FROM {}
             WHERE sid = ? OR sid = ?
             ORDER BY title ASC, sid ASC",
            self.db.table("templates")
        );
        let templates = sqlx::query_as::<_, Template>(&statement)
            .bind(MASTER_SID)
            .bind(set.sid)
            .fetch_all(self.db.pool())
            .await
            .map_err(|e| map_db_error("SELECT templates", e))?;

        log_info(&format!(
            "Fetched {} templates for set \"{}\"",
            templates.len(),
            self.name
        ));

        Ok(templates
            .into_iter()
            .map(|template| {
                let group_name = classify(&template, groups);
                GroupedTemplate {
                    template,
                    group_name,
                }
            })
            .collect())
    }

    async fn find_template_id(&self, title: &str, sid: i64) -> Result<Option<i64>> {
        let statement = format!(
            "SELECT CAST(tid AS SIGNED) AS tid FROM {} WHERE title = ? AND sid = ? ORDER BY tid ASC",
            self.db.table("templates")
        );
        sqlx::query_scalar::<_, i64>(&statement)
            .bind(title)
            .bind(sid)
            .fetch_optional(self.db.pool())
            .await
            .map_err(|e| map_db_error("SELECT templates", e))
    }

    /// Writes `body` as this set's version of `title`. Master rows are never
    /// modified; the set gets its own row instead.
    pub async fn save_template(
        &self,
        title: &str,
        body: &str,
        version: &str,
    ) -> Result<TemplateSaveAction> {
        let set = self.find_set().await?;
        let master = self.find_template_id(title, MASTER_SID).await?;
        let custom = self.find_template_id(title, set.sid).await?;
        let table = self.db.table("templates");

        let action = match (master.is_some(), custom) {
            (has_master, Some(tid)) => {
                let statement = format!(
                    "UPDATE {} SET template = ?, version = ?, dateline = ? WHERE tid = ?",
                    table
                );
                execute_write(
                    self.db,
                    &format!("UPDATE template \"{}\" in set \"{}\"", title, self.name),
                    sqlx::query(&statement)
                        .bind(body)
                        .bind(version)
                        .bind(timestamp())
                        .bind(tid),
                )
                .await?;
                if has_master {
                    TemplateSaveAction::UpdatedModified
                } else {
                    TemplateSaveAction::UpdatedCustom
                }
            }
            (has_master, None) => {
                let statement = format!(
                    "INSERT INTO {} (title, template, sid, version, status, dateline)
                     VALUES (?, ?, ?, ?, '', ?)",
                    table
                );
                execute_write(
                    self.db,
                    &format!("INSERT template \"{}\" in set \"{}\"", title, self.name),
                    sqlx::query(&statement)
                        .bind(title)
                        .bind(body)
                        .bind(set.sid)
                        .bind(version)
                        .bind(timestamp()),
                )
                .await?;
                if has_master {
                    TemplateSaveAction::CreatedCustomVersion
                } else {
                    TemplateSaveAction::CreatedNew
                }
            }
        };

        log_info(&format!("{} \"{}\" in set \"{}\"", action, title, self.name));
        Ok(action)
    }
}

/// Every template set known to the forum, ordered by title.
pub async fn list_template_sets(db: &Database) -> Result<Vec<TemplateSet>> {
    let statement = format!(
        "SELECT CAST(sid AS SIGNED) AS sid, title FROM {} ORDER BY title ASC",
        db.table("templatesets")
    );
    sqlx::query_as::<_, TemplateSet>(&statement)
        .fetch_all(db.pool())
        .await
        .map_err(|e| map_db_error("SELECT templatesets", e))
}

/// Keeps one template per title, preferring the set's override over the
/// master row.
pub fn effective_templates(templates: Vec<GroupedTemplate>) -> Vec<GroupedTemplate> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut effective: Vec<GroupedTemplate> = Vec::with_capacity(templates.len());
    for grouped in templates {
        match positions.get(&grouped.template.title) {
            Some(&idx) => {
                let kept = &mut effective[idx];
                if kept.template.is_master() && !grouped.template.is_master() {
                    *kept = grouped;
                }
            }
            None => {
                positions.insert(grouped.template.title.clone(), effective.len());
                effective.push(grouped);
            }
        }
    }
    effective
}
