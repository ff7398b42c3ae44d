use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub const DEFAULT_NOTIFY_TIMEOUT: Duration = Duration::from_secs(15);

/// Result payload posted to the caller's callback URL after each round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub email: String,
    pub task: String,
    pub round: u32,
    pub nonce: String,
    pub repo_url: String,
    pub commit_sha: String,
    pub pages_url: String,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Best-effort delivery. Returns whether the endpoint acknowledged with a
    /// success status; failures are logged and never propagated.
    async fn notify(&self, url: &str, payload: &NotificationPayload) -> bool;
}

pub struct HttpNotifier {
    client: Client,
}

impl HttpNotifier {
    pub fn new(timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!("Failed to build notification client ({}), using defaults", e);
                Client::new()
            });

        Self { client }
    }
}

impl Default for HttpNotifier {
    fn default() -> Self {
        Self::new(DEFAULT_NOTIFY_TIMEOUT)
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn notify(&self, url: &str, payload: &NotificationPayload) -> bool {
        match self.client.post(url).json(payload).send().await {
            Ok(response) if response.status().is_success() => {
                info!(
                    url = %url,
                    round = payload.round,
                    status = response.status().as_u16(),
                    "Callback notified"
                );
                true
            }
            Ok(response) => {
                warn!(
                    url = %url,
                    round = payload.round,
                    status = response.status().as_u16(),
                    "Callback rejected notification"
                );
                false
            }
            Err(e) => {
                warn!(url = %url, round = payload.round, error = %e, "Callback notification failed");
                false
            }
        }
    }
}
