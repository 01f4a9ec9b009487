//! # pulsecast - synchronized broadcast of a shared audio stream
//!
//! The broadcast engine is the station's heartbeat: it picks tracks from the
//! playlist, prefetches their raw bytes through a [`Fetcher`], slices them
//! into time-aligned frames with `pulsechunk`, and pushes one frame per tick
//! to every registered listener so all of them hear the same frame at the
//! same wall-clock moment.
//!
//! ## Guarantees
//!
//! - Within a rotation, the `songChange` text frame precedes the first audio
//!   frame of the new track.
//! - Frame order within a track is strictly sequential, and globally
//!   consistent across endpoints.
//! - The tick loop never blocks on the network: listener queues absorb
//!   delivery, and prefetch runs on detached tasks with indefinite retry.
//!
//! ## Example
//!
//! ```no_run
//! use pulsecast::{Announcer, Broadcaster, ClientRegistry};
//! use pulsefetch::StaticFetcher;
//! use pulseplaylist::{Playlist, SelectorOptions, Track};
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let playlist = Playlist::new(SelectorOptions::default());
//! playlist.add(Track::new("t-1", "So What").with_duration_ms(2_000));
//!
//! let fetcher = Arc::new(StaticFetcher::new());
//! fetcher.insert("t-1", vec![0u8; 2000]);
//!
//! let registry = Arc::new(ClientRegistry::new());
//! let broadcaster = Broadcaster::new(
//!     Duration::from_millis(100),
//!     playlist,
//!     fetcher,
//!     Arc::clone(&registry),
//!     Announcer::new(None),
//! );
//!
//! let cancel = CancellationToken::new();
//! let engine = broadcaster.start(cancel.clone());
//!
//! let (_client, mut frames) = registry.register();
//! // ... forward frames to a websocket ...
//! # cancel.cancel();
//! # let _ = engine.await;
//! # }
//! ```

pub mod announce;
pub mod broadcaster;
pub mod error;
pub mod registry;

pub use announce::Announcer;
pub use broadcaster::{Broadcaster, PREFETCH_RETRY_DELAY};
pub use error::{Error, Result};
pub use registry::{ClientId, ClientRegistry, Frame};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
