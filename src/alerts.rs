use std::time::Duration;

use reqwest::{header, Client};
use tracing::warn;

const ALERTS_ORIGIN: &str = "https://www.oref.org.il";
const CURRENT_PATH: &str = "/WarningMessages/alert/alerts.json";
const HISTORY_PATH: &str = "/WarningMessages/History/AlertsHistory.json";

/// Pass-through client for the Home Front Command alert endpoints. Bodies
/// are relayed verbatim; a failed or empty upstream yields an empty JSON
/// placeholder instead of an error.
pub struct AlertsClient {
    client: Client,
    base_url: String,
}

impl AlertsClient {
    pub fn new() -> Self {
        Self::with_base_url(ALERTS_ORIGIN)
    }

    /// Point the proxy at a different origin (useful for testing)
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Currently active alerts; `{}` when the upstream fails or is silent.
    pub async fn current(&self) -> String {
        self.proxy(CURRENT_PATH, "{}").await
    }

    /// Recent alert history; the upstream serves a JSON array, so the
    /// placeholder is `[]`.
    pub async fn history(&self) -> String {
        self.proxy(HISTORY_PATH, "[]").await
    }

    async fn proxy(&self, path: &str, fallback: &str) -> String {
        match self.try_fetch(path).await {
            Ok(body) if !body.trim().is_empty() => body,
            Ok(_) => fallback.to_string(),
            Err(e) => {
                warn!("Alert proxy request for {} failed: {}", path, e);
                fallback.to_string()
            }
        }
    }

    async fn try_fetch(&self, path: &str) -> Result<String, reqwest::Error> {
        // The upstream rejects requests without these headers
        self.client
            .get(format!("{}{}", self.base_url, path))
            .header(header::REFERER, "https://www.oref.org.il/")
            .header("X-Requested-With", "XMLHttpRequest")
            .header(header::USER_AGENT, "Mozilla/5.0")
            .send()
            .await?
            .error_for_status()?
            .text()
            .await
    }
}

impl Default for AlertsClient {
    fn default() -> Self {
        Self::new()
    }
}
