//! Mirrors selected log lines to the forum's `log.php`, next to the local
//! log file. Delivery is best effort: a failed post is only logged locally.

use reqwest::Client;

use crate::utils::file_utils::url_join;
use crate::utils::logger::{log_error, log_info};

pub const LOG_SCRIPT: &str = "log.php";

#[derive(Clone)]
pub struct ForumLogClient {
    base_url: Option<String>,
    token: Option<String>,
    client: Client,
}

impl std::fmt::Debug for ForumLogClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForumLogClient")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl ForumLogClient {
    pub fn new(base_url: Option<String>, token: Option<String>, client: Client) -> Self {
        ForumLogClient {
            base_url,
            token,
            client,
        }
    }

    /// Whether a forum URL is configured; without one `send` does nothing.
    pub fn is_enabled(&self) -> bool {
        self.base_url.is_some()
    }

    /// Posts `message` (and the token, when set) to `{mybbUrl}/log.php`.
    pub async fn send(&self, message: &str) {
        let Some(base_url) = self.base_url.as_deref() else {
            return;
        };
        let log_url = url_join(&[base_url, LOG_SCRIPT]);

        let mut form = vec![("message", message)];
        if let Some(token) = self.token.as_deref() {
            form.push(("token", token));
        }

        match self.client.post(&log_url).form(&form).send().await {
            Ok(response) if response.status().is_success() => {
                log_info(&format!("Logged to forum: {}", message));
            }
            Ok(response) => {
                log_error(&format!(
                    "Forum log endpoint {} returned HTTP {}",
                    log_url,
                    response.status().as_u16()
                ));
            }
            Err(e) => {
                log_error(&format!("Failed to log to forum at {}: {}", log_url, e));
            }
        }
    }
}
