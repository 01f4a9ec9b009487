//! Canned in-memory fetcher.
//!
//! The broadcast engine only needs the byte-retrieval half of the
//! [`Fetcher`](crate::Fetcher) contract, so tests and local experiments can
//! run against this double instead of a live catalog. Payloads are
//! registered per track id, optionally with an artificial fetch delay and a
//! number of transient failures to serve first.

use crate::error::{Error, Result};
use crate::Fetcher;
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

struct CannedTrack {
    payload: Bytes,
    delay: Duration,
    failures_remaining: u32,
}

/// [`Fetcher`](crate::Fetcher) double serving canned payloads.
#[derive(Default)]
pub struct StaticFetcher {
    tracks: Mutex<HashMap<String, CannedTrack>>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a payload for `id`, served immediately.
    pub fn insert(&self, id: impl Into<String>, payload: impl Into<Bytes>) {
        self.insert_with_delay(id, payload, Duration::ZERO);
    }

    /// Register a payload for `id`, served after `delay` on every fetch.
    pub fn insert_with_delay(
        &self,
        id: impl Into<String>,
        payload: impl Into<Bytes>,
        delay: Duration,
    ) {
        self.tracks.lock().unwrap().insert(
            id.into(),
            CannedTrack {
                payload: payload.into(),
                delay,
                failures_remaining: 0,
            },
        );
    }

    /// Make the next `count` fetches of `id` fail before payloads flow again.
    pub fn fail_next(&self, id: &str, count: u32) {
        if let Some(track) = self.tracks.lock().unwrap().get_mut(id) {
            track.failures_remaining = count;
        }
    }
}

#[async_trait]
impl Fetcher for StaticFetcher {
    async fn fetch_bytes(&self, track_id: &str) -> Result<Bytes> {
        let (payload, delay, fail) = {
            let mut tracks = self.tracks.lock().unwrap();
            let track = tracks
                .get_mut(track_id)
                .ok_or_else(|| Error::UnknownTrack(track_id.to_string()))?;
            let fail = track.failures_remaining > 0;
            if fail {
                track.failures_remaining -= 1;
            }
            (track.payload.clone(), track.delay, fail)
        };

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if fail {
            return Err(Error::InjectedFailure(track_id.to_string()));
        }
        Ok(payload)
    }

    async fn load_song(&self, _query: &str) -> Result<usize> {
        Ok(0)
    }

    async fn load_radio_segment(&self, _query: &str) -> Result<usize> {
        Ok(0)
    }

    async fn load_playlist(&self, _query: &str) -> Result<usize> {
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_canned_payloads_round_trip() {
        let fetcher = StaticFetcher::new();
        fetcher.insert("a", vec![1u8, 2, 3]);

        assert_eq!(fetcher.fetch_bytes("a").await.unwrap().as_ref(), &[1, 2, 3]);
        assert!(matches!(
            fetcher.fetch_bytes("missing").await,
            Err(Error::UnknownTrack(_))
        ));
    }

    #[tokio::test]
    async fn test_transient_failures_then_success() {
        let fetcher = StaticFetcher::new();
        fetcher.insert("a", vec![1u8]);
        fetcher.fail_next("a", 2);

        assert!(fetcher.fetch_bytes("a").await.is_err());
        assert!(fetcher.fetch_bytes("a").await.is_err());
        assert!(fetcher.fetch_bytes("a").await.is_ok());
    }
}
