use std::time::Duration;

use sqlx::any::{AnyArguments, AnyConnectOptions, AnyPool, AnyPoolOptions};
use sqlx::mysql::MySqlConnectOptions;
use sqlx::query::Query;
use sqlx::Any;

use crate::services::config::DatabaseConfig;
use crate::utils::error::{AppError, Result};
use crate::utils::logger::{log_error, log_info};

/// Bounded retry used only when the first connection is opened.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 3,
            delay: Duration::from_millis(1000),
        }
    }
}

/// Long-lived database handle plus the table prefix of the forum install.
///
/// The pool holds a single connection that is pinged before every use, so a
/// dropped connection is re-opened on the next query.
#[derive(Clone, Debug)]
pub struct Database {
    pool: AnyPool,
    prefix: String,
}

impl Database {
    /// Wraps an existing pool. Used by tests with in-memory SQLite.
    pub fn from_pool(pool: AnyPool, prefix: &str) -> Result<Self> {
        validate_prefix(prefix)?;
        Ok(Database {
            pool,
            prefix: prefix.to_string(),
        })
    }

    /// Opens the MySQL connection described by the config, retrying per `retry`.
    pub async fn connect(config: &DatabaseConfig, retry: &RetryPolicy) -> Result<Self> {
        let options: AnyConnectOptions = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .database(&config.database)
            .into();
        Self::connect_with(options, &config.prefix, retry).await
    }

    pub async fn connect_with(
        options: AnyConnectOptions,
        prefix: &str,
        retry: &RetryPolicy,
    ) -> Result<Self> {
        validate_prefix(prefix)?;

        let attempts = retry.max_attempts.max(1);
        let mut last_error = String::new();
        for attempt in 1..=attempts {
            let result = AnyPoolOptions::new()
                .max_connections(1)
                .test_before_acquire(true)
                .connect_with(options.clone())
                .await;

            match result {
                Ok(pool) => {
                    log_info(&format!("Connected to database on attempt {}", attempt));
                    return Ok(Database {
                        pool,
                        prefix: prefix.to_string(),
                    });
                }
                Err(error) => {
                    log_error(&format!(
                        "Connection attempt {}/{} failed: {}",
                        attempt, attempts, error
                    ));
                    last_error = error.to_string();
                    if attempt < attempts {
                        tokio::time::sleep(retry.delay).await;
                    }
                }
            }
        }

        Err(AppError::ConnectionError(format!(
            "Failed to establish a database connection after {} attempts: {}",
            attempts, last_error
        )))
    }

    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    /// Returns the prefixed table name, e.g. `mybb_templates`.
    pub fn table(&self, name: &str) -> String {
        format!("{}{}", self.prefix, name)
    }
}

/// The prefix is the only piece of text spliced into SQL, so it is restricted
/// to identifier characters.
fn validate_prefix(prefix: &str) -> Result<()> {
    if prefix
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        Ok(())
    } else {
        Err(AppError::ConfigError(format!(
            "Invalid table prefix \"{}\": only letters, digits and '_' are allowed",
            prefix
        )))
    }
}

/// Translates a driver error, keeping connectivity problems apart.
pub fn map_db_error(context: &str, error: sqlx::Error) -> AppError {
    match error {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => {
            AppError::ConnectionError(format!("{}: {}", context, error))
        }
        other => AppError::DatabaseError(format!("{}: {}", context, other)),
    }
}

/// Runs an INSERT/UPDATE and fails when it touched no rows.
pub async fn execute_write<'q>(
    db: &Database,
    context: &str,
    query: Query<'q, Any, AnyArguments<'q>>,
) -> Result<u64> {
    let result = query.execute(db.pool()).await.map_err(|error| {
        log_error(&format!("FAILED :: {}: {}", context, error));
        map_db_error(context, error)
    })?;

    let affected = result.rows_affected();
    if affected == 0 {
        log_error(&format!("FAILED :: {}: no rows affected", context));
        return Err(AppError::NoRowsAffected(format!(
            "{} - the update may have failed",
            context
        )));
    }

    log_info(&format!("SUCCESSFUL :: {} ({} rows)", context, affected));
    Ok(affected)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn create_test_db() -> Database {
        let pool = AnyPoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to create database connection pool");
        Database::from_pool(pool, "mybb_").unwrap()
    }

    #[test]
    fn test_prefix_validation() {
        assert!(validate_prefix("mybb_").is_ok());
        assert!(validate_prefix("").is_ok());
        assert!(matches!(
            validate_prefix("mybb_; DROP TABLE x"),
            Err(AppError::ConfigError(_))
        ));
    }

    #[tokio::test]
    async fn test_table_uses_prefix() {
        let db = create_test_db().await;
        assert_eq!(db.table("templates"), "mybb_templates");
    }

    #[tokio::test]
    async fn test_execute_write_reports_zero_rows() {
        let db = create_test_db().await;
        sqlx::query("CREATE TABLE mybb_themes (tid INTEGER PRIMARY KEY, name TEXT)")
            .execute(db.pool())
            .await
            .unwrap();

        let inserted = execute_write(
            &db,
            "INSERT theme",
            sqlx::query("INSERT INTO mybb_themes (tid, name) VALUES (?, ?)")
                .bind(1_i64)
                .bind("Default"),
        )
        .await
        .unwrap();
        assert_eq!(inserted, 1);

        let result = execute_write(
            &db,
            "UPDATE theme",
            sqlx::query("UPDATE mybb_themes SET name = ? WHERE tid = ?")
                .bind("Other")
                .bind(42_i64),
        )
        .await;
        assert!(matches!(result, Err(AppError::NoRowsAffected(_))));
    }

    #[tokio::test]
    async fn test_connect_gives_up_after_max_attempts() {
        let options: AnyConnectOptions = "sqlite:///nonexistent-dir/for/sure/db.sqlite"
            .parse()
            .unwrap();
        let retry = RetryPolicy {
            max_attempts: 2,
            delay: Duration::from_millis(1),
        };

        let result = Database::connect_with(options, "mybb_", &retry).await;
        assert!(matches!(result, Err(AppError::ConnectionError(_))));
    }
}
