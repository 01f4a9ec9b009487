//! # pulseplaylist - dual-list track selection for broadcast radio
//!
//! The playlist is the authoritative library state of the station: a master
//! list of regular tracks and a radio list of interstitial segments
//! (jingles, station IDs) injected between them on a time-based cooldown or
//! on operator demand. Bounded anti-repeat histories keep recently played
//! identifiers out of the draw.
//!
//! # Example
//!
//! ```
//! use pulseplaylist::{Playlist, SelectorOptions, Track};
//!
//! let playlist = Playlist::new(SelectorOptions::default());
//! playlist.add(Track::new("t-1", "So What").with_duration_ms(540_000));
//!
//! let track = playlist.next().expect("one track queued");
//! assert_eq!(track.id, "t-1");
//! ```
//!
//! Persistence lives in [`persistence`]: both lists round-trip through a
//! remote JSON snapshot (`{"queue": [...], "random_next": [...]}`).

pub mod error;
pub mod persistence;
pub mod playlist;
pub mod track;

pub use error::{Error, Result};
pub use persistence::{GistSnapshotStore, PlaylistSnapshot, SnapshotStore};
pub use playlist::{InjectionMode, Playlist, SelectorOptions};
pub use track::{DurationMs, Track};
