//! Track model shared by the whole broadcast pipeline.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Milliseconds, the duration unit used across the codebase
pub type DurationMs = u64;

/// An addressable unit of audio with a stable identifier and known duration.
///
/// Tracks are immutable records: mutation replaces the whole value. The
/// identifier is the identity; every list, history and lookup in the system
/// compares tracks by id only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    /// Stable identifier used to fetch the payload upstream
    pub id: String,

    /// Display name
    pub name: String,

    /// Artist label
    #[serde(default)]
    pub artist: String,

    /// Total playback duration in milliseconds
    #[serde(default)]
    pub duration_ms: DurationMs,
}

impl Track {
    /// Create a track with the minimal fields
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            artist: String::new(),
            duration_ms: 0,
        }
    }

    /// Set the artist label
    pub fn with_artist(mut self, artist: impl Into<String>) -> Self {
        self.artist = artist.into();
        self
    }

    /// Set the total duration in milliseconds
    pub fn with_duration_ms(mut self, duration_ms: DurationMs) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    /// Total duration as a [`Duration`]
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}

/// Two tracks are equal when their identifiers match.
impl PartialEq for Track {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Track {}
