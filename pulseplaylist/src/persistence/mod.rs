//! Snapshot persistence for the playlist.
//!
//! Both lists survive restarts through a remote JSON snapshot shaped as
//! `{"queue": [...], "random_next": [...]}`. The store is an abstract trait
//! so tests can point the provided GitHub-gist backend at a mock server.

use crate::error::{Error, Result};
use crate::playlist::Playlist;
use crate::track::Track;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// File name of the snapshot inside the gist
const SNAPSHOT_FILE: &str = "playlist.json";

/// Default GitHub API base URL
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// Default raw-content base URL for gists
pub const DEFAULT_RAW_BASE: &str = "https://gist.githubusercontent.com";

/// Timeout for snapshot HTTP requests
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Serializable capture of both playlist lists.
#[derive(Debug, Serialize, Deserialize)]
pub struct PlaylistSnapshot {
    /// Master list
    pub queue: Vec<Track>,
    /// Radio list
    pub random_next: Vec<Track>,
}

/// Abstract persistence interface for playlist snapshots.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Capture both lists and write them to the store.
    async fn save(&self, playlist: &Playlist) -> Result<()>;

    /// Read the stored snapshot and replace both lists wholesale.
    async fn load(&self, playlist: &Playlist) -> Result<()>;
}

/// Snapshot store backed by a single GitHub gist.
///
/// Saving PATCHes the gist's `playlist.json` file; loading reads the raw
/// file back. Base URLs are overridable for tests.
pub struct GistSnapshotStore {
    token: String,
    gist_id: String,
    api_base: String,
    raw_base: String,
    client: reqwest::Client,
}

impl GistSnapshotStore {
    /// Create a store for the given gist.
    pub fn new(token: impl Into<String>, gist_id: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            gist_id: gist_id.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            raw_base: DEFAULT_RAW_BASE.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Override the GitHub API base URL.
    pub fn api_base(mut self, url: impl Into<String>) -> Self {
        self.api_base = url.into();
        self
    }

    /// Override the raw-content base URL.
    pub fn raw_base(mut self, url: impl Into<String>) -> Self {
        self.raw_base = url.into();
        self
    }
}

#[async_trait]
impl SnapshotStore for GistSnapshotStore {
    async fn save(&self, playlist: &Playlist) -> Result<()> {
        let (queue, random_next) = playlist.snapshot();
        let snapshot = PlaylistSnapshot { queue, random_next };
        let content = serde_json::to_string_pretty(&snapshot)?;

        let payload = serde_json::json!({
            "files": { SNAPSHOT_FILE: { "content": content } }
        });

        let url = format!("{}/gists/{}", self.api_base, self.gist_id);
        let response = self
            .client
            .patch(&url)
            .timeout(REQUEST_TIMEOUT)
            .header(AUTHORIZATION, format!("token {}", self.token))
            .header(ACCEPT, "application/vnd.github.v3+json")
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Snapshot(format!(
                "gist update failed: {status}: {}",
                body.trim()
            )));
        }

        debug!(gist = %self.gist_id, "playlist snapshot saved");
        Ok(())
    }

    async fn load(&self, playlist: &Playlist) -> Result<()> {
        let url = format!("{}/{}/raw/{}", self.raw_base, self.gist_id, SNAPSHOT_FILE);
        let response = self
            .client
            .get(&url)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Snapshot(format!(
                "gist load failed: {status}: {}",
                body.trim()
            )));
        }

        let snapshot: PlaylistSnapshot = response.json().await?;
        debug!(
            gist = %self.gist_id,
            queue = snapshot.queue.len(),
            random_next = snapshot.random_next.len(),
            "playlist snapshot loaded"
        );
        playlist.replace_all(snapshot.queue, snapshot.random_next);
        Ok(())
    }
}
