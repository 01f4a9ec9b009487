//! The broadcast engine.
//!
//! A single cooperative task owns two track slots: `current`, whose frames
//! are being delivered one per tick, and `next`, pre-selected and prefetched
//! so rotation never waits on the network. Commands (skip, delete-current)
//! and the playlist's new-track signal arrive through coalescing channels;
//! prefetch tasks report back over a completion channel matched by track id.
//!
//! Liveness rule: nothing that happens to an individual track may stall the
//! tick loop. Fetch failures retry forever on their own task; a track whose
//! payload cannot be chunked pins its slot until an operator removes it and
//! skips; an empty playlist simply parks the engine on the new-track signal.

use crate::announce::Announcer;
use crate::error::{Error, Result};
use crate::registry::{ClientRegistry, Frame};
use bytes::Bytes;
use pulsefetch::Fetcher;
use pulseplaylist::{DurationMs, Playlist, Track};
use serde::Serialize;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Delay between prefetch attempts after a fetch error
pub const PREFETCH_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Text frame emitted to every endpoint on rotation, before any audio frame
/// of the new track.
#[derive(Debug, Serialize)]
struct SongChange<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    id: &'a str,
    name: &'a str,
    artist: &'a str,
    /// Milliseconds, like every duration on the wire.
    duration: DurationMs,
}

impl<'a> SongChange<'a> {
    fn for_track(track: &'a Track) -> Self {
        Self {
            kind: "songChange",
            id: &track.id,
            name: &track.name,
            artist: &track.artist,
            duration: track.duration_ms,
        }
    }
}

/// Handle to the broadcast engine.
///
/// Cloning is cheap; every clone drives the same engine. Construct once,
/// then call [`Broadcaster::start`] exactly once to spawn the loop.
#[derive(Clone)]
pub struct Broadcaster {
    playlist: Playlist,
    fetcher: Arc<dyn Fetcher>,
    registry: Arc<ClientRegistry>,
    announcer: Arc<Announcer>,
    interval: Duration,
    skip: Arc<Notify>,
    current: Arc<Mutex<Option<Track>>>,
}

impl Broadcaster {
    pub fn new(
        interval: Duration,
        playlist: Playlist,
        fetcher: Arc<dyn Fetcher>,
        registry: Arc<ClientRegistry>,
        announcer: Announcer,
    ) -> Self {
        Self {
            playlist,
            fetcher,
            registry,
            announcer: Arc::new(announcer),
            interval,
            skip: Arc::new(Notify::new()),
            current: Arc::new(Mutex::new(None)),
        }
    }

    /// Spawn the broadcast loop. The task exits promptly after `cancel`
    /// fires; in-flight prefetches are orphaned and their results dropped.
    pub fn start(&self, cancel: CancellationToken) -> JoinHandle<()> {
        let (prefetch_tx, prefetch_rx) = mpsc::channel(1);
        let engine = Engine {
            playlist: self.playlist.clone(),
            fetcher: Arc::clone(&self.fetcher),
            registry: Arc::clone(&self.registry),
            announcer: Arc::clone(&self.announcer),
            interval: self.interval,
            skip: Arc::clone(&self.skip),
            current_shared: Arc::clone(&self.current),
            prefetch_tx,
            prefetch_rx,
            current: None,
            curr_frames: Vec::new(),
            idx: 0,
            next: None,
            next_frames: None,
        };
        tokio::spawn(engine.run(cancel))
    }

    /// Request an immediate rotation. Coalescing: many pending skips are
    /// equivalent to one.
    pub fn skip(&self) {
        self.skip.notify_one();
    }

    /// Remove the currently playing track from the library and skip past it.
    ///
    /// Fails with [`Error::NoCurrentTrack`] when nothing has played yet.
    pub fn delete_current(&self) -> Result<Track> {
        let current = self
            .current
            .lock()
            .unwrap()
            .clone()
            .ok_or(Error::NoCurrentTrack)?;
        info!(track = %current.id, "deleting current track and skipping");
        self.playlist.remove(&current.id);
        self.skip();
        Ok(current)
    }

    /// The track currently on air (the last one announced).
    pub fn current_track(&self) -> Option<Track> {
        self.current.lock().unwrap().clone()
    }

    /// Registry of delivery endpoints fed by this engine.
    pub fn registry(&self) -> &Arc<ClientRegistry> {
        &self.registry
    }
}

/// Completed prefetch, matched to a slot by track id.
struct PrefetchDone {
    track_id: String,
    frames: Vec<Bytes>,
}

/// What woke the engine up.
enum Wake {
    Cancelled,
    Tick,
    Skip,
    NewTrack,
    Prefetch(Option<PrefetchDone>),
}

struct Engine {
    playlist: Playlist,
    fetcher: Arc<dyn Fetcher>,
    registry: Arc<ClientRegistry>,
    announcer: Arc<Announcer>,
    interval: Duration,
    skip: Arc<Notify>,
    current_shared: Arc<Mutex<Option<Track>>>,
    prefetch_tx: mpsc::Sender<PrefetchDone>,
    prefetch_rx: mpsc::Receiver<PrefetchDone>,

    current: Option<Track>,
    /// Prepared frames of `current`; empty while its fetch is in flight.
    curr_frames: Vec<Bytes>,
    idx: usize,
    next: Option<Track>,
    /// Prepared frames of `next`; `None` while its fetch is in flight.
    next_frames: Option<Vec<Bytes>>,
}

impl Engine {
    async fn run(mut self, cancel: CancellationToken) {
        info!(
            interval_ms = self.interval.as_millis() as u64,
            "broadcast engine starting"
        );

        // Phase 0: park until the playlist yields a first track.
        loop {
            match self.playlist.next() {
                Some(track) => {
                    info!(track = %track.id, name = %track.name, "first track selected");
                    self.install_current(track);
                    self.pick_next();
                    break;
                }
                None => {
                    debug!("playlist empty, waiting for a first track");
                    tokio::select! {
                        _ = cancel.cancelled() => return,
                        _ = self.playlist.wait_for_new_track() => {}
                    }
                }
            }
        }

        // Phase 1: the tick loop.
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            let wake = tokio::select! {
                _ = cancel.cancelled() => Wake::Cancelled,
                _ = ticker.tick() => Wake::Tick,
                _ = self.skip.notified() => Wake::Skip,
                _ = self.playlist.wait_for_new_track() => Wake::NewTrack,
                done = self.prefetch_rx.recv() => Wake::Prefetch(done),
            };

            match wake {
                Wake::Cancelled => {
                    info!("broadcast engine stopping");
                    return;
                }
                Wake::Tick => self.on_tick(),
                Wake::Skip => {
                    info!("skip requested, rotating immediately");
                    self.rotate();
                }
                Wake::NewTrack => self.on_new_track(),
                Wake::Prefetch(Some(done)) => self.on_prefetch_done(done),
                // Unreachable while the engine holds its own sender.
                Wake::Prefetch(None) => return,
            }
        }
    }

    /// Deliver one frame and rotate when the track is exhausted.
    fn on_tick(&mut self) {
        if self.curr_frames.is_empty() {
            // Current fetch still in flight (or nothing on air at all).
            return;
        }

        self.registry
            .broadcast(Frame::Audio(self.curr_frames[self.idx].clone()));
        self.idx += 1;

        if self.idx >= self.curr_frames.len() {
            if let Some(track) = &self.current {
                info!(track = %track.id, "track finished, rotating");
            }
            self.rotate();
        }
    }

    /// Advance `current ← next` and select a fresh `next`.
    ///
    /// Rotation never waits on a prefetch: when the next track's frames are
    /// not ready yet, they install as empty and ticks stay silent until the
    /// completion lands. Skip is therefore immediate at the selection layer
    /// while audible resumption waits on the fetch.
    fn rotate(&mut self) {
        self.current = self.next.take();
        self.curr_frames = self.next_frames.take().unwrap_or_default();
        self.idx = 0;

        if let Some(track) = self.current.clone() {
            *self.current_shared.lock().unwrap() = Some(track.clone());
            self.emit_song_change(&track);
            self.announcer.announce(&track);
            if self.curr_frames.is_empty() {
                debug!(track = %track.id, "rotated before prefetch finished, ticks stay silent");
            }
        } else {
            debug!("rotation with no queued track, stream goes silent");
        }

        self.pick_next();
    }

    /// Select a new `next` from the playlist and start prefetching it.
    fn pick_next(&mut self) {
        self.next_frames = None;
        self.next = self.playlist.next();
        match &self.next {
            Some(track) => {
                debug!(track = %track.id, "preloading next track");
                self.spawn_prefetch(track);
            }
            None => debug!("playlist empty, no next track queued"),
        }
    }

    /// Designate a track as current (bootstrap and idle-restart path).
    fn install_current(&mut self, track: Track) {
        *self.current_shared.lock().unwrap() = Some(track.clone());
        self.emit_song_change(&track);
        self.announcer.announce(&track);
        self.spawn_prefetch(&track);
        self.current = Some(track);
        self.curr_frames = Vec::new();
        self.idx = 0;
    }

    /// A track landed in a previously empty playlist.
    fn on_new_track(&mut self) {
        if self.current.is_none() {
            // Both slots drained while the playlist was empty; restart as in
            // bootstrap.
            if let Some(track) = self.playlist.next() {
                info!(track = %track.id, "track arrived on an idle stream");
                self.install_current(track);
                self.pick_next();
            }
            return;
        }

        if self.next.is_none() {
            self.pick_next();
            return;
        }

        debug!("new track noted, will be considered at the next rotation");
    }

    /// Route a completed prefetch to whichever slot still wants it.
    fn on_prefetch_done(&mut self, done: PrefetchDone) {
        if let Some(current) = &self.current {
            if current.id == done.track_id && self.curr_frames.is_empty() {
                info!(
                    track = %current.id,
                    frames = done.frames.len(),
                    "current track ready"
                );
                self.curr_frames = done.frames;
                self.idx = 0;
                return;
            }
        }

        if let Some(next) = &self.next {
            if next.id == done.track_id && self.next_frames.is_none() {
                debug!(track = %next.id, frames = done.frames.len(), "next track ready");
                self.next_frames = Some(done.frames);
                return;
            }
        }

        debug!(track = %done.track_id, "dropping prefetch result for a track no longer queued");
    }

    /// Fetch and chunk a track on a detached task.
    ///
    /// Fetch errors retry forever with a fixed delay so listeners never see
    /// them. A chunking error is permanent for the track: the task exits
    /// without completing and the slot stays pinned until the operator
    /// removes the track.
    fn spawn_prefetch(&self, track: &Track) {
        let fetcher = Arc::clone(&self.fetcher);
        let tx = self.prefetch_tx.clone();
        let track = track.clone();
        let interval = self.interval;

        tokio::spawn(async move {
            let data = loop {
                match fetcher.fetch_bytes(&track.id).await {
                    Ok(data) => break data,
                    Err(err) => {
                        warn!(
                            track = %track.id,
                            "prefetch failed: {err}; retrying in {}s",
                            PREFETCH_RETRY_DELAY.as_secs()
                        );
                        tokio::time::sleep(PREFETCH_RETRY_DELAY).await;
                    }
                }
            };

            match pulsechunk::prepare_chunks(data, track.duration(), interval) {
                Ok(frames) => {
                    // A closed receiver means the engine stopped; drop the result.
                    let _ = tx
                        .send(PrefetchDone {
                            track_id: track.id.clone(),
                            frames,
                        })
                        .await;
                }
                Err(err) => {
                    error!(
                        track = %track.id,
                        "cannot chunk track: {err}; remove it to unblock the slot"
                    );
                }
            }
        });
    }

    fn emit_song_change(&self, track: &Track) {
        match serde_json::to_string(&SongChange::for_track(track)) {
            Ok(payload) => self.registry.broadcast(Frame::Text(payload)),
            Err(err) => warn!(track = %track.id, "failed to encode songChange frame: {err}"),
        }
    }
}
