//! Wire models for upstream catalog responses.
//!
//! The catalog encodes track durations as an `MM:SS` prefix inside the
//! artist field (`"3:45 Miles Davis"`). Items without a parsable prefix are
//! unplayable (the broadcaster cannot pace them) and get skipped upstream.

use pulseplaylist::{DurationMs, Track};
use serde::Deserialize;

/// One catalog entry as returned by a search query.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogItem {
    pub id: String,
    pub name: String,
    /// Raw field: `"MM:SS Artist Name"`
    #[serde(default)]
    pub artist: String,
}

/// Response shape of a playlist query: the first element carries the items.
#[derive(Debug, Deserialize)]
pub struct CatalogPlaylist {
    #[serde(default)]
    pub playlist_items: Vec<CatalogItem>,
}

/// Split the `MM:SS` prefix off an artist field.
///
/// Returns the duration in milliseconds and the remaining artist label, or
/// `None` when the prefix is missing or malformed.
pub fn parse_artist_field(artist: &str) -> Option<(DurationMs, &str)> {
    let (clock, rest) = artist.split_once(' ')?;
    let (minutes, seconds) = clock.split_once(':')?;
    let minutes: u64 = minutes.parse().ok()?;
    let seconds: u64 = seconds.parse().ok()?;
    Some(((minutes * 60 + seconds) * 1000, rest))
}

/// Convert a catalog item into a [`Track`], or `None` when the duration
/// prefix cannot be parsed.
pub fn track_from_item(item: &CatalogItem) -> Option<Track> {
    let (duration_ms, artist) = parse_artist_field(&item.artist)?;
    Some(
        Track::new(item.id.clone(), item.name.clone())
            .with_artist(artist)
            .with_duration_ms(duration_ms),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_artist_field() {
        assert_eq!(parse_artist_field("3:45 Miles Davis"), Some((225_000, "Miles Davis")));
        assert_eq!(parse_artist_field("0:07 X"), Some((7_000, "X")));
        // Minutes beyond an hour are legal, the catalog never rolls to H:MM:SS.
        assert_eq!(parse_artist_field("90:00 Long Mix"), Some((5_400_000, "Long Mix")));
    }

    #[test]
    fn test_parse_artist_field_rejects_malformed_input() {
        assert_eq!(parse_artist_field("Miles Davis"), None);
        assert_eq!(parse_artist_field("3:45"), None);
        assert_eq!(parse_artist_field("x:45 Foo"), None);
        assert_eq!(parse_artist_field(""), None);
    }

    #[test]
    fn test_track_from_item() {
        let item = CatalogItem {
            id: "t-1".to_string(),
            name: "So What".to_string(),
            artist: "9:00 Miles Davis".to_string(),
        };
        let track = track_from_item(&item).unwrap();
        assert_eq!(track.id, "t-1");
        assert_eq!(track.artist, "Miles Davis");
        assert_eq!(track.duration_ms, 540_000);
    }
}
