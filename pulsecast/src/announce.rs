//! Out-of-band "now playing" notifications.
//!
//! On every rotation the engine POSTs a short message to a configured
//! webhook. Delivery is strictly best-effort: the request runs on its own
//! task, failures and non-2xx responses are logged and never retried, and
//! an empty URL disables the whole thing.

use pulseplaylist::Track;
use std::time::Duration;
use tracing::warn;

/// Timeout for webhook requests
const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(5);

/// Fire-and-forget webhook notifier.
pub struct Announcer {
    webhook: Option<String>,
    http: reqwest::Client,
}

impl Announcer {
    /// Create an announcer; `None` or an empty URL disables it.
    pub fn new(webhook: Option<String>) -> Self {
        Self {
            webhook: webhook.filter(|url| !url.is_empty()),
            http: reqwest::Client::new(),
        }
    }

    /// Whether a webhook URL is configured.
    pub fn enabled(&self) -> bool {
        self.webhook.is_some()
    }

    /// Post the now-playing message for `track` on a detached task.
    pub fn announce(&self, track: &Track) {
        let Some(url) = self.webhook.clone() else {
            return;
        };

        let body = serde_json::json!({
            "content": format!("🎶 Now playing: **{}** by *{}*", track.name, track.artist),
        });
        let http = self.http.clone();
        let track_id = track.id.clone();

        tokio::spawn(async move {
            match http
                .post(&url)
                .timeout(WEBHOOK_TIMEOUT)
                .json(&body)
                .send()
                .await
            {
                Ok(response) if !response.status().is_success() => {
                    warn!(
                        track = %track_id,
                        status = %response.status(),
                        "now-playing webhook rejected"
                    );
                }
                Ok(_) => {}
                Err(err) => warn!(track = %track_id, "now-playing webhook failed: {err}"),
            }
        });
    }
}
