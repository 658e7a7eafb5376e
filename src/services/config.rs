use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::utils::db_utils::RetryPolicy;
use crate::utils::error::{AppError, Result};
use crate::utils::logger::log_error;

pub const CONFIG_DIR: &str = ".vscode";
pub const CONFIG_FILE: &str = "mbbb.json";
pub const DEFAULT_LOG_FILE: &str = "mybbbridge_extension.log";

const ENV_DB_PASSWORD: &str = "MYBB_DB_PASSWORD";
const ENV_TOKEN: &str = "MYBB_TOKEN";

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_database")]
    pub database: String,
    #[serde(default = "default_prefix")]
    pub prefix: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_connect_attempts")]
    pub connect_attempts: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl DatabaseConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.connect_attempts,
            delay: Duration::from_millis(self.retry_delay_ms),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig {
            host: default_host(),
            port: default_port(),
            database: default_database(),
            prefix: default_prefix(),
            user: String::from("root"),
            password: String::new(),
            connect_attempts: default_connect_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

fn default_host() -> String {
    String::from("localhost")
}

fn default_port() -> u16 {
    3306
}

fn default_database() -> String {
    String::from("mybb")
}

fn default_prefix() -> String {
    String::from("mybb_")
}

fn default_connect_attempts() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    1000
}

/// Version stamped on saved templates. Config files carry it either as a
/// number (`1860`) or as a string.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum VersionTag {
    Number(u64),
    Text(String),
}

impl Default for VersionTag {
    fn default() -> Self {
        VersionTag::Number(1860)
    }
}

impl fmt::Display for VersionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionTag::Number(n) => write!(f, "{}", n),
            VersionTag::Text(s) => write!(f, "{}", s),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BridgeConfig {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub mybb_url: String,
    #[serde(default)]
    pub mybb_version: VersionTag,
    #[serde(default)]
    pub auto_upload: bool,
    #[serde(default)]
    pub log_file_path: String,
    #[serde(default)]
    pub token: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        BridgeConfig {
            database: DatabaseConfig::default(),
            mybb_url: String::from("http://localhost"),
            mybb_version: VersionTag::default(),
            auto_upload: true,
            log_file_path: String::new(),
            token: String::new(),
        }
    }
}

impl BridgeConfig {
    /// Log file to write to; relative paths and the empty default resolve
    /// against the workspace.
    pub fn log_file(&self, workspace: &Path) -> PathBuf {
        if self.log_file_path.is_empty() {
            workspace.join(DEFAULT_LOG_FILE)
        } else {
            workspace.join(&self.log_file_path)
        }
    }

    /// Base URL of the forum, `None` when not configured.
    pub fn forum_url(&self) -> Option<&str> {
        let url = self.mybb_url.trim();
        (!url.is_empty()).then_some(url)
    }

    /// Shared secret sent along with refresh requests, `None` when empty.
    pub fn token(&self) -> Option<&str> {
        (!self.token.is_empty()).then_some(self.token.as_str())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(password) = env::var(ENV_DB_PASSWORD) {
            self.database.password = password;
        }
        if let Ok(token) = env::var(ENV_TOKEN) {
            self.token = token;
        }
    }
}

pub fn config_path(workspace: &Path) -> PathBuf {
    workspace.join(CONFIG_DIR).join(CONFIG_FILE)
}

/// Reads `.vscode/mbbb.json` from the workspace. Values from the workspace
/// `.env` file (or the process environment) override the secrets.
pub fn read_config(workspace: &Path) -> Result<BridgeConfig> {
    let mut config = parse_config_file(&config_path(workspace))?;

    let env_file = workspace.join(".env");
    if env_file.exists() {
        if let Err(e) = dotenv::from_path(&env_file) {
            log_error(&format!(
                "Failed to load {}: {}",
                env_file.to_string_lossy(),
                e
            ));
        }
    }
    config.apply_env_overrides();

    Ok(config)
}

/// Parses a config file without looking at the environment.
pub fn parse_config_file(config_path: &Path) -> Result<BridgeConfig> {
    let json_content = fs::read_to_string(config_path).map_err(|e| {
        AppError::ConfigError(format!(
            "Config file {} not found or unreadable ({}). Try the create-config command.",
            config_path.to_string_lossy(),
            e
        ))
    })?;

    serde_json::from_str(&json_content).map_err(|e| {
        AppError::ConfigError(format!(
            "Failed to parse file {}: {}",
            config_path.to_string_lossy(),
            e
        ))
    })
}

/// Writes the default config skeleton. Refuses to overwrite an existing file.
pub fn create_config(workspace: &Path) -> Result<PathBuf> {
    let config_dir = workspace.join(CONFIG_DIR);
    fs::create_dir_all(&config_dir).map_err(|e| {
        AppError::FileError(format!(
            "Failed to create configuration directory {}: {}",
            config_dir.to_string_lossy(),
            e
        ))
    })?;

    let config_path = config_dir.join(CONFIG_FILE);
    if config_path.exists() {
        return Err(AppError::ConfigError(format!(
            "Config file {} already exists!",
            config_path.to_string_lossy()
        )));
    }

    let default_config = BridgeConfig {
        log_file_path: DEFAULT_LOG_FILE.to_string(),
        ..BridgeConfig::default()
    };
    let json_content = serde_json::to_string_pretty(&default_config)
        .map_err(|e| AppError::ConfigError(e.to_string()))?;

    fs::write(&config_path, json_content).map_err(|e| {
        AppError::FileError(format!(
            "Failed to write config file {}: {}",
            config_path.to_string_lossy(),
            e
        ))
    })?;

    Ok(config_path)
}
