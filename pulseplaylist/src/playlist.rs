//! Dual-list track selection with anti-repeat history.
//!
//! The playlist keeps two disjoint ordered pools: the master list (the
//! station's main rotation) and the radio list (jingles and station IDs
//! injected between master tracks). Selection balances the two with a
//! time-based cooldown and a forced-override flag, while bounded per-list
//! histories keep recently played identifiers out of the draw.
//!
//! All state lives behind one exclusive lock held only for CPU-bound work.
//! The playlist also owns the "new track" wakeup: command tasks add tracks,
//! the broadcast engine awaits [`Playlist::wait_for_new_track`]. Repeated
//! signals before the engine drains collapse to one.

use crate::track::Track;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::Notify;

/// How radio segments are injected between master tracks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InjectionMode {
    /// The cooldown is a hard gate: inject as soon as it has elapsed.
    Threshold,
    /// Draw per selection with chance `min(1, elapsed/cooldown) · max_chance`.
    Probability {
        /// Cap on the injection chance, reached once the cooldown has elapsed.
        max_chance: f64,
    },
}

/// Tuning for the selection algorithm.
#[derive(Debug, Clone)]
pub struct SelectorOptions {
    /// Minimum interval between two radio-segment injections.
    pub cooldown: Duration,
    /// Injection policy applied once the radio list is non-empty.
    pub injection: InjectionMode,
}

impl Default for SelectorOptions {
    fn default() -> Self {
        Self {
            cooldown: Duration::from_secs(30 * 60),
            injection: InjectionMode::Threshold,
        }
    }
}

/// Thread-safe dual-list track picker. Cloning is cheap and every clone
/// operates on the same underlying state.
#[derive(Clone)]
pub struct Playlist {
    inner: Arc<PlaylistInner>,
}

struct PlaylistInner {
    state: Mutex<PlaylistState>,
    new_track: Notify,
}

struct PlaylistState {
    master: Vec<Track>,
    radio: Vec<Track>,
    master_history: VecDeque<String>,
    radio_history: VecDeque<String>,
    last_random: Option<Instant>,
    force_next_radio: bool,
    options: SelectorOptions,
}

impl Playlist {
    /// Create an empty playlist with the given selector tuning.
    pub fn new(options: SelectorOptions) -> Self {
        Self {
            inner: Arc::new(PlaylistInner {
                state: Mutex::new(PlaylistState {
                    master: Vec::new(),
                    radio: Vec::new(),
                    master_history: VecDeque::new(),
                    radio_history: VecDeque::new(),
                    last_random: None,
                    force_next_radio: false,
                    options,
                }),
                new_track: Notify::new(),
            }),
        }
    }

    /// Append a track to the master list.
    ///
    /// Idempotent on the identifier: a track already present leaves the list
    /// unchanged and returns `false`. The first track to land in a fully
    /// empty playlist fires the new-track signal.
    pub fn add(&self, track: Track) -> bool {
        let was_empty;
        {
            let mut state = self.inner.state.lock().unwrap();
            if state.master.iter().any(|t| t.id == track.id) {
                return false;
            }
            was_empty = state.master.is_empty() && state.radio.is_empty();
            state.master.push(track);
        }
        if was_empty {
            self.inner.new_track.notify_one();
        }
        true
    }

    /// Append a track to the radio list. Same semantics as [`Playlist::add`].
    pub fn add_radio(&self, track: Track) -> bool {
        let was_empty;
        {
            let mut state = self.inner.state.lock().unwrap();
            if state.radio.iter().any(|t| t.id == track.id) {
                return false;
            }
            was_empty = state.master.is_empty() && state.radio.is_empty();
            state.radio.push(track);
        }
        if was_empty {
            self.inner.new_track.notify_one();
        }
        true
    }

    /// Delete every occurrence of `id` from both lists and both histories.
    ///
    /// Returns `true` when anything was removed. Emits no signal.
    pub fn remove(&self, id: &str) -> bool {
        let mut state = self.inner.state.lock().unwrap();
        let before = state.master.len() + state.radio.len();
        state.master.retain(|t| t.id != id);
        state.radio.retain(|t| t.id != id);
        state.master_history.retain(|h| h != id);
        state.radio_history.retain(|h| h != id);
        state.master.len() + state.radio.len() != before
    }

    /// Force the next selection to come from the radio list, if non-empty.
    pub fn force_next_radio_segment(&self) {
        self.inner.state.lock().unwrap().force_next_radio = true;
    }

    /// Replace both lists atomically (snapshot reload).
    ///
    /// Duplicated identifiers within a list are dropped, keeping the first
    /// occurrence. Both histories are cleared so the fresh lists start with
    /// a full anti-repeat window. Fires the new-track signal when at least
    /// one list ends up non-empty.
    pub fn replace_all(&self, master: Vec<Track>, radio: Vec<Track>) {
        let non_empty;
        {
            let mut state = self.inner.state.lock().unwrap();
            state.master = dedup_by_id(master);
            state.radio = dedup_by_id(radio);
            state.master_history.clear();
            state.radio_history.clear();
            non_empty = !state.master.is_empty() || !state.radio.is_empty();
        }
        if non_empty {
            self.inner.new_track.notify_one();
        }
    }

    /// Select the next track to play.
    ///
    /// Selection order: forced radio override, then cooldown-based radio
    /// injection, then the master list. Returns `None` when both lists are
    /// empty; callers wait on [`Playlist::wait_for_new_track`]. The chosen
    /// identifier is recorded in its list's history, bounded at
    /// `max(1, ⌊len/2⌋)`, so no identifier repeats until at least half the
    /// list has played.
    pub fn next(&self) -> Option<Track> {
        let mut guard = self.inner.state.lock().unwrap();
        let state = &mut *guard;
        let now = Instant::now();

        if state.force_next_radio && !state.radio.is_empty() {
            state.force_next_radio = false;
            state.last_random = Some(now);
            return pick_from(&state.radio, &mut state.radio_history);
        }

        if !state.radio.is_empty() && state.radio_due(now) {
            state.last_random = Some(now);
            return pick_from(&state.radio, &mut state.radio_history);
        }

        if !state.master.is_empty() {
            return pick_from(&state.master, &mut state.master_history);
        }

        None
    }

    /// Wait until a track lands in a previously empty playlist.
    ///
    /// The signal is single-slot and coalescing: any number of adds between
    /// two waits wake the waiter exactly once.
    pub async fn wait_for_new_track(&self) {
        self.inner.new_track.notified().await;
    }

    /// Number of tracks in the master list.
    pub fn master_len(&self) -> usize {
        self.inner.state.lock().unwrap().master.len()
    }

    /// Number of tracks in the radio list.
    pub fn radio_len(&self) -> usize {
        self.inner.state.lock().unwrap().radio.len()
    }

    /// True when both lists are empty.
    pub fn is_empty(&self) -> bool {
        let state = self.inner.state.lock().unwrap();
        state.master.is_empty() && state.radio.is_empty()
    }

    /// Copies of both lists, master first (used by persistence and the API).
    pub fn snapshot(&self) -> (Vec<Track>, Vec<Track>) {
        let state = self.inner.state.lock().unwrap();
        (state.master.clone(), state.radio.clone())
    }
}

impl PlaylistState {
    /// Whether a radio injection is due at `now` under the configured mode.
    ///
    /// An unset `last_random` counts as "cooldown elapsed", so a fresh
    /// process injects a radio segment on its first selection.
    fn radio_due(&self, now: Instant) -> bool {
        let cooldown = self.options.cooldown;
        let ratio = match self.last_random {
            None => 1.0,
            Some(at) => {
                if cooldown.is_zero() {
                    1.0
                } else {
                    (now.duration_since(at).as_secs_f64() / cooldown.as_secs_f64()).min(1.0)
                }
            }
        };

        match self.options.injection {
            InjectionMode::Threshold => ratio >= 1.0,
            InjectionMode::Probability { max_chance } => {
                rand::thread_rng().gen_bool((ratio * max_chance).clamp(0.0, 1.0))
            }
        }
    }
}

/// Pick uniformly from `list`, excluding identifiers in `history`.
///
/// When every entry is cold the history resets and the whole list competes
/// again, which makes a single-entry list play every cycle. The pick is
/// recorded and the history trimmed to `max(1, ⌊len/2⌋)`.
fn pick_from(list: &[Track], history: &mut VecDeque<String>) -> Option<Track> {
    let mut rng = rand::thread_rng();
    let allowed: Vec<&Track> = list
        .iter()
        .filter(|t| !history.iter().any(|h| h == &t.id))
        .collect();

    let chosen = if allowed.is_empty() {
        history.clear();
        list.choose(&mut rng)?
    } else {
        *allowed.choose(&mut rng)?
    };

    let track = chosen.clone();
    history.push_back(track.id.clone());
    let bound = (list.len() / 2).max(1);
    while history.len() > bound {
        history.pop_front();
    }
    Some(track)
}

fn dedup_by_id(tracks: Vec<Track>) -> Vec<Track> {
    let mut seen = HashSet::new();
    tracks
        .into_iter()
        .filter(|t| seen.insert(t.id.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::Track;
    use std::time::Duration;

    fn track(id: &str) -> Track {
        Track::new(id, format!("Song {id}")).with_duration_ms(180_000)
    }

    fn options(cooldown_ms: u64) -> SelectorOptions {
        SelectorOptions {
            cooldown: Duration::from_millis(cooldown_ms),
            injection: InjectionMode::Threshold,
        }
    }

    #[test]
    fn test_add_is_idempotent() {
        let playlist = Playlist::new(SelectorOptions::default());
        assert!(playlist.add(track("a")));
        assert!(!playlist.add(track("a")));
        assert_eq!(playlist.master_len(), 1);

        assert!(playlist.add_radio(track("a")));
        assert!(!playlist.add_radio(track("a")));
        assert_eq!(playlist.radio_len(), 1);
    }

    #[test]
    fn test_empty_playlist_yields_no_track() {
        let playlist = Playlist::new(SelectorOptions::default());
        assert!(playlist.next().is_none());
    }

    #[test]
    fn test_remove_purges_everywhere() {
        // A long cooldown keeps selection on the master list after the
        // initial injection window is consumed by the radio pick.
        let playlist = Playlist::new(options(3_600_000));
        playlist.add(track("a"));
        playlist.add(track("b"));
        playlist.add_radio(track("a"));

        // First pick drains the initial radio injection.
        let first = playlist.next().unwrap();
        assert_eq!(first.id, "a");

        assert!(playlist.remove("a"));
        assert!(!playlist.remove("a"));
        assert_eq!(playlist.master_len(), 1);
        assert_eq!(playlist.radio_len(), 0);

        for _ in 0..20 {
            assert_eq!(playlist.next().unwrap().id, "b");
        }
    }

    #[test]
    fn test_single_track_plays_every_cycle() {
        let playlist = Playlist::new(options(3_600_000));
        playlist.add(track("only"));
        for _ in 0..10 {
            assert_eq!(playlist.next().unwrap().id, "only");
        }
    }

    #[test]
    fn test_anti_repeat_window() {
        let playlist = Playlist::new(options(3_600_000));
        for id in ["a", "b", "c", "d"] {
            playlist.add(track(id));
        }

        // Bound is ⌊4/2⌋ = 2: any three consecutive picks are distinct.
        for _ in 0..50 {
            let first = playlist.next().unwrap().id;
            let second = playlist.next().unwrap().id;
            let third = playlist.next().unwrap().id;
            assert_ne!(first, second);
            assert_ne!(second, third);
            assert_ne!(first, third);
        }
    }

    #[test]
    fn test_forced_radio_override() {
        let playlist = Playlist::new(options(3_600_000));
        playlist.add(track("a"));
        playlist.add(track("b"));
        playlist.add_radio(track("r"));

        // Drain the initial injection so the cooldown is armed.
        assert_eq!(playlist.next().unwrap().id, "r");

        playlist.force_next_radio_segment();
        assert_eq!(playlist.next().unwrap().id, "r");

        // Cooldown restarted by the forced pick: back to the master list.
        let after = playlist.next().unwrap();
        assert!(after.id == "a" || after.id == "b");
    }

    #[test]
    fn test_forced_flag_survives_empty_radio_list() {
        let playlist = Playlist::new(options(3_600_000));
        playlist.add(track("a"));

        playlist.force_next_radio_segment();
        assert_eq!(playlist.next().unwrap().id, "a");

        // The flag is still set; it applies once a segment exists.
        playlist.add_radio(track("r"));
        assert_eq!(playlist.next().unwrap().id, "r");
    }

    #[test]
    fn test_cooldown_gates_radio_injection() {
        let playlist = Playlist::new(options(200));
        playlist.add(track("a"));
        playlist.add(track("b"));
        playlist.add(track("c"));
        playlist.add_radio(track("r"));

        // last_random starts unset, so the very first pick injects.
        assert_eq!(playlist.next().unwrap().id, "r");

        // Within the cooldown every pick comes from the master list.
        for _ in 0..10 {
            assert_ne!(playlist.next().unwrap().id, "r");
        }

        std::thread::sleep(Duration::from_millis(250));
        assert_eq!(playlist.next().unwrap().id, "r");

        // And the cooldown restarts.
        for _ in 0..10 {
            assert_ne!(playlist.next().unwrap().id, "r");
        }
    }

    #[test]
    fn test_probability_mode_bounds() {
        let never = Playlist::new(SelectorOptions {
            cooldown: Duration::from_millis(1),
            injection: InjectionMode::Probability { max_chance: 0.0 },
        });
        never.add(track("a"));
        never.add_radio(track("r"));
        for _ in 0..50 {
            assert_eq!(never.next().unwrap().id, "a");
        }

        let always = Playlist::new(SelectorOptions {
            cooldown: Duration::from_millis(1),
            injection: InjectionMode::Probability { max_chance: 1.0 },
        });
        always.add(track("a"));
        always.add_radio(track("r"));
        std::thread::sleep(Duration::from_millis(5));
        // Elapsed >= cooldown and the cap is 1.0: injection is certain.
        assert_eq!(always.next().unwrap().id, "r");
    }

    #[test]
    fn test_replace_all_dedups_and_resets_history() {
        let playlist = Playlist::new(options(3_600_000));
        playlist.add(track("old"));
        playlist.next();

        playlist.replace_all(
            vec![track("a"), track("b"), track("a")],
            vec![track("r"), track("r")],
        );

        assert_eq!(playlist.master_len(), 2);
        assert_eq!(playlist.radio_len(), 1);

        let (master, radio) = playlist.snapshot();
        assert_eq!(master[0].id, "a");
        assert_eq!(master[1].id, "b");
        assert_eq!(radio[0].id, "r");

        for _ in 0..20 {
            assert_ne!(playlist.next().unwrap().id, "old");
        }
    }

    #[tokio::test]
    async fn test_new_track_signal_fires_on_first_add_only() {
        let playlist = Playlist::new(options(3_600_000));
        playlist.add(track("a"));

        // The permit stored by the first add is consumed immediately.
        tokio::time::timeout(Duration::from_millis(50), playlist.wait_for_new_track())
            .await
            .expect("first add must signal");

        // Adding to a non-empty playlist does not signal.
        playlist.add(track("b"));
        let waited =
            tokio::time::timeout(Duration::from_millis(50), playlist.wait_for_new_track()).await;
        assert!(waited.is_err());
    }

    #[tokio::test]
    async fn test_new_track_signal_coalesces() {
        let playlist = Playlist::new(options(3_600_000));
        playlist.replace_all(vec![track("a")], Vec::new());
        playlist.replace_all(vec![track("a"), track("b")], Vec::new());

        // Two replacements, one stored permit.
        tokio::time::timeout(Duration::from_millis(50), playlist.wait_for_new_track())
            .await
            .expect("signal expected");
        let waited =
            tokio::time::timeout(Duration::from_millis(50), playlist.wait_for_new_track()).await;
        assert!(waited.is_err());
    }
}
