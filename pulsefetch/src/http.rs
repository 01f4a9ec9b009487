//! HTTP implementation of the [`Fetcher`](crate::Fetcher) capability set.

use crate::catalog::{track_from_item, CatalogItem, CatalogPlaylist};
use crate::error::{Error, Result};
use crate::Fetcher;
use async_trait::async_trait;
use bytes::Bytes;
use pulseplaylist::Playlist;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Default timeout for upstream HTTP requests
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Default User-Agent
pub const DEFAULT_USER_AGENT: &str = concat!("pulseradio/", env!("CARGO_PKG_VERSION"));

/// Query protocol version expected by the upstream catalog
const PROTOCOL_VERSION: &str = "2";

/// Which playlist list a catalog load feeds.
#[derive(Clone, Copy)]
enum Target {
    Master,
    Radio,
}

/// HTTP client for the upstream catalog.
///
/// All requests hit the configured base URL: `?v=2&id=<track>` retrieves raw
/// audio bytes, `?v=2&search=<query>` resolves catalog queries whose results
/// feed the bound [`Playlist`].
///
/// # Example
///
/// ```no_run
/// use pulsefetch::{Fetcher, HttpFetcher};
/// use pulseplaylist::{Playlist, SelectorOptions};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let playlist = Playlist::new(SelectorOptions::default());
/// let fetcher = HttpFetcher::builder("https://catalog.example/api")
///     .build(playlist.clone())?;
///
/// let added = fetcher.load_song("so what").await?;
/// println!("{added} tracks queued");
/// # Ok(())
/// # }
/// ```
pub struct HttpFetcher {
    base_url: Url,
    client: reqwest::Client,
    playlist: Playlist,
}

impl HttpFetcher {
    /// Create a builder for configuring the fetcher.
    pub fn builder(base_url: impl Into<String>) -> HttpFetcherBuilder {
        HttpFetcherBuilder::new(base_url)
    }

    fn request_url(&self, key: &str, value: &str) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("v", PROTOCOL_VERSION)
            .append_pair(key, value);
        url
    }

    async fn search(&self, operation: &'static str, query: &str) -> Result<reqwest::Response> {
        let url = self.request_url("search", query);
        debug!(%url, "querying catalog");
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::UnexpectedStatus {
                operation,
                status: status.as_u16(),
            });
        }
        Ok(response)
    }

    /// Convert catalog items into tracks and feed the target list, skipping
    /// items without a parsable duration prefix.
    fn ingest(&self, items: Vec<CatalogItem>, target: Target) -> usize {
        let mut added = 0;
        for item in items {
            match track_from_item(&item) {
                Some(track) => {
                    let accepted = match target {
                        Target::Master => self.playlist.add(track),
                        Target::Radio => self.playlist.add_radio(track),
                    };
                    if accepted {
                        added += 1;
                    }
                }
                None => warn!(
                    item = %item.id,
                    artist = %item.artist,
                    "skipping catalog item without MM:SS duration prefix"
                ),
            }
        }
        added
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch_bytes(&self, track_id: &str) -> Result<Bytes> {
        let url = self.request_url("id", track_id);
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::UnexpectedStatus {
                operation: "fetch bytes",
                status: status.as_u16(),
            });
        }
        Ok(response.bytes().await?)
    }

    async fn load_song(&self, query: &str) -> Result<usize> {
        let items: Vec<CatalogItem> = self.search("load song", query).await?.json().await?;
        Ok(self.ingest(items, Target::Master))
    }

    async fn load_radio_segment(&self, query: &str) -> Result<usize> {
        let items: Vec<CatalogItem> =
            self.search("load radio segment", query).await?.json().await?;
        Ok(self.ingest(items, Target::Radio))
    }

    async fn load_playlist(&self, query: &str) -> Result<usize> {
        let lists: Vec<CatalogPlaylist> =
            self.search("load playlist", query).await?.json().await?;
        let first = lists.into_iter().next().ok_or(Error::EmptyPlaylist)?;
        Ok(self.ingest(first.playlist_items, Target::Master))
    }
}

/// Builder for configuring an [`HttpFetcher`].
#[derive(Debug)]
pub struct HttpFetcherBuilder {
    base_url: String,
    auth_token: Option<String>,
    user_agent: String,
    timeout: Duration,
}

impl HttpFetcherBuilder {
    /// Create a builder targeting the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            auth_token: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }

    /// Bearer token attached to every request.
    pub fn auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Set a custom User-Agent header.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the fetcher, binding it to the playlist its loads feed.
    pub fn build(self, playlist: Playlist) -> Result<HttpFetcher> {
        let base_url = Url::parse(&self.base_url)?;

        let mut headers = HeaderMap::new();
        if let Some(token) = &self.auth_token {
            match HeaderValue::from_str(&format!("Bearer {token}")) {
                Ok(value) => {
                    headers.insert(AUTHORIZATION, value);
                }
                Err(err) => warn!("ignoring unusable auth token: {err}"),
            }
        }

        let client = reqwest::Client::builder()
            .user_agent(&self.user_agent)
            .default_headers(headers)
            .timeout(self.timeout)
            .build()?;

        Ok(HttpFetcher {
            base_url,
            client,
            playlist,
        })
    }
}
