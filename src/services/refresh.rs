//! Client for the forum-side `cachecss.php` endpoint, which rewrites the
//! cached copy of a stylesheet from its database row.

use reqwest::header::ACCEPT;
use reqwest::Client;
use serde::Deserialize;

use crate::services::config::BridgeConfig;
use crate::services::forum_log::ForumLogClient;
use crate::utils::error::{AppError, Result};
use crate::utils::file_utils::url_join;
use crate::utils::logger::{log_error, log_info};

pub const REFRESH_SCRIPT: &str = "cachecss.php";

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    success: bool,
    #[serde(default)]
    message: String,
}

#[derive(Clone)]
pub struct CacheRefreshClient {
    base_url: Option<String>,
    token: Option<String>,
    client: Client,
}

impl std::fmt::Debug for CacheRefreshClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheRefreshClient")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl CacheRefreshClient {
    pub fn new(base_url: Option<&str>, token: Option<&str>) -> Result<Self> {
        let client = Client::builder().build().map_err(|e| {
            AppError::ConfigError(format!("Failed to create HTTP client: {}", e))
        })?;

        Ok(CacheRefreshClient {
            base_url: base_url.map(str::to_string),
            token: token.map(str::to_string),
            client,
        })
    }

    pub fn from_config(config: &BridgeConfig) -> Result<Self> {
        Self::new(config.forum_url(), config.token())
    }

    /// A log sink for the same forum, sharing this client's connection pool
    /// and token.
    pub fn forum_log(&self) -> ForumLogClient {
        ForumLogClient::new(self.base_url.clone(), self.token.clone(), self.client.clone())
    }

    /// Asks the forum to re-cache `stylesheet` of `theme`.
    pub async fn refresh(&self, stylesheet: &str, theme: &str) -> Result<()> {
        let base_url = self
            .base_url
            .as_deref()
            .ok_or_else(|| AppError::RefreshError("MyBB URL not configured".to_string()))?;
        let script_url = url_join(&[base_url, REFRESH_SCRIPT]);

        log_info(&format!(
            "Requesting cache refresh for {} in theme {}",
            stylesheet, theme
        ));

        let mut form = vec![("theme_name", theme), ("stylesheet", stylesheet)];
        if let Some(token) = self.token.as_deref() {
            form.push(("token", token));
        }

        let response = self
            .client
            .post(&script_url)
            .header(ACCEPT, "application/json")
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                log_error(&format!("Cache refresh request to {} failed: {}", script_url, e));
                AppError::RefreshError(format!("HTTP request failed: {}", e))
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::RefreshError(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            log_error(&format!("Cache refresh returned HTTP {}: {}", status.as_u16(), body));
            return Err(AppError::RefreshError(format!(
                "Server error ({}): {}",
                status.as_u16(),
                body
            )));
        }

        let parsed = parse_refresh_response(&body)?;
        if !parsed.success {
            let message = if parsed.message.is_empty() {
                "Unknown cache refresh error".to_string()
            } else {
                parsed.message
            };
            log_error(&format!("Cache refresh rejected: {}", message));
            return Err(AppError::RefreshError(message));
        }

        log_info(&format!("Cache refresh successful: {}", parsed.message));
        Ok(())
    }
}

fn parse_refresh_response(body: &str) -> Result<RefreshResponse> {
    serde_json::from_str(body).map_err(|e| {
        log_error(&format!("Raw cache refresh response: {}", body));
        AppError::InvalidResponse(format!("{} (body: {})", e, body))
    })
}
