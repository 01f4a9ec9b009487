//! Integration tests for the gist snapshot store

use pulseplaylist::{GistSnapshotStore, Playlist, SelectorOptions, SnapshotStore, Track};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn playlist_with_tracks() -> Playlist {
    let playlist = Playlist::new(SelectorOptions::default());
    playlist.add(
        Track::new("t-1", "So What")
            .with_artist("Miles Davis")
            .with_duration_ms(540_000),
    );
    playlist.add(Track::new("t-2", "Giant Steps").with_artist("John Coltrane"));
    playlist.add_radio(Track::new("r-1", "Station ID"));
    playlist
}

#[tokio::test]
async fn test_save_patches_gist_with_snapshot() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/gists/g-123"))
        .and(header("authorization", "token secret"))
        .and(body_partial_json(json!({
            "files": { "playlist.json": {} }
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let store = GistSnapshotStore::new("secret", "g-123").api_base(mock_server.uri());
    store.save(&playlist_with_tracks()).await.unwrap();
}

#[tokio::test]
async fn test_save_surfaces_rejection() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/gists/g-123"))
        .respond_with(ResponseTemplate::new(403).set_body_string("bad credentials"))
        .mount(&mock_server)
        .await;

    let store = GistSnapshotStore::new("wrong", "g-123").api_base(mock_server.uri());
    let err = store.save(&playlist_with_tracks()).await.unwrap_err();
    assert!(err.to_string().contains("bad credentials"));
}

#[tokio::test]
async fn test_load_replaces_both_lists() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/g-123/raw/playlist.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "queue": [
                { "id": "a", "name": "Song A", "artist": "X", "duration_ms": 1000 },
                { "id": "b", "name": "Song B", "artist": "Y", "duration_ms": 2000 }
            ],
            "random_next": [
                { "id": "r", "name": "Jingle", "artist": "", "duration_ms": 500 }
            ]
        })))
        .mount(&mock_server)
        .await;

    let playlist = Playlist::new(SelectorOptions::default());
    playlist.add(Track::new("stale", "Old Song"));

    let store = GistSnapshotStore::new("secret", "g-123").raw_base(mock_server.uri());
    store.load(&playlist).await.unwrap();

    let (master, radio) = playlist.snapshot();
    assert_eq!(master.len(), 2);
    assert_eq!(master[0].id, "a");
    assert_eq!(master[1].duration_ms, 2000);
    assert_eq!(radio.len(), 1);
    assert_eq!(radio[0].id, "r");
}

#[tokio::test]
async fn test_load_error_leaves_playlist_untouched() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/g-123/raw/playlist.json"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let playlist = Playlist::new(SelectorOptions::default());
    playlist.add(Track::new("keep", "Still Here"));

    let store = GistSnapshotStore::new("secret", "g-123").raw_base(mock_server.uri());
    assert!(store.load(&playlist).await.is_err());

    let (master, _) = playlist.snapshot();
    assert_eq!(master.len(), 1);
    assert_eq!(master[0].id, "keep");
}
