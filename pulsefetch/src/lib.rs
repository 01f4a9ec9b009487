//! # pulsefetch - upstream catalog access
//!
//! The broadcast service treats audio payloads as opaque bytes keyed by
//! track id and resolves operator queries against an upstream catalog. This
//! crate defines that capability set as the [`Fetcher`] trait and provides:
//!
//! - [`HttpFetcher`]: the production client (`?v=2&id=` for bytes,
//!   `?v=2&search=` for catalog queries, results fed into the bound
//!   playlist),
//! - [`StaticFetcher`]: a canned in-memory double for tests.
//!
//! Catalog durations arrive as an `MM:SS` prefix in the artist field; the
//! parsing lives in [`catalog`].

pub mod catalog;
pub mod error;
pub mod http;
pub mod testing;

pub use error::{Error, Result};
pub use http::{HttpFetcher, HttpFetcherBuilder};
pub use testing::StaticFetcher;

use async_trait::async_trait;
use bytes::Bytes;

/// Capability set the broadcast core depends on.
///
/// Byte retrieval failures are assumed transient; the broadcaster retries
/// them indefinitely. The three load operations resolve a query against the
/// upstream catalog and feed the resulting tracks into the playlist,
/// returning how many were added.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Retrieve the opaque audio payload for a track.
    async fn fetch_bytes(&self, track_id: &str) -> Result<Bytes>;

    /// Resolve a query and append the resulting tracks to the master list.
    async fn load_song(&self, query: &str) -> Result<usize>;

    /// Resolve a query and append the resulting tracks to the radio list.
    async fn load_radio_segment(&self, query: &str) -> Result<usize>;

    /// Resolve a playlist query and append its items to the master list.
    async fn load_playlist(&self, query: &str) -> Result<usize>;
}
