//! REST command API.
//!
//! The operator surface over the playlist, the broadcaster and the fetcher.
//! Mutating routes sit behind an optional bearer token; every response is
//! JSON. Catalog loads report how many tracks they added.

use crate::AppState;
use axum::extract::{Request, State};
use axum::http::{header::AUTHORIZATION, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use pulsefetch::Fetcher;
use pulseplaylist::{SnapshotStore, Track};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Generic error payload.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// Current on-air track.
#[derive(Debug, Serialize)]
pub struct NowPlayingResponse {
    pub track: Option<Track>,
}

/// Both library lists plus the live listener count.
#[derive(Debug, Serialize)]
pub struct QueueResponse {
    pub queue: Vec<Track>,
    pub random_next: Vec<Track>,
    pub listeners: usize,
}

/// Body of the catalog-load routes.
#[derive(Debug, Deserialize)]
pub struct LoadRequest {
    pub query: String,
}

/// Result of a catalog load.
#[derive(Debug, Serialize)]
pub struct LoadResponse {
    pub added: usize,
}

/// Bearer-token gate over the command routes. A missing configured token
/// leaves the surface open (single-operator deployments).
pub async fn require_command_token(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let Some(expected) = state.command_token.as_deref() else {
        return next.run(request).await;
    };

    let provided = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "));

    if provided == Some(expected) {
        next.run(request).await
    } else {
        map_status(
            StatusCode::UNAUTHORIZED,
            "UNAUTHORIZED",
            "missing or invalid command token",
        )
    }
}

/// `GET /api/now`
pub async fn now_playing(State(state): State<AppState>) -> Response {
    Json(NowPlayingResponse {
        track: state.broadcaster.current_track(),
    })
    .into_response()
}

/// `GET /api/queue`
pub async fn queue(State(state): State<AppState>) -> Response {
    let (queue, random_next) = state.playlist.snapshot();
    Json(QueueResponse {
        queue,
        random_next,
        listeners: state.registry.len(),
    })
    .into_response()
}

/// `POST /api/skip`
pub async fn skip(State(state): State<AppState>) -> Response {
    state.broadcaster.skip();
    StatusCode::ACCEPTED.into_response()
}

/// `DELETE /api/current`
pub async fn delete_current(State(state): State<AppState>) -> Response {
    match state.broadcaster.delete_current() {
        Ok(track) => Json(track).into_response(),
        Err(err) => map_status(StatusCode::NOT_FOUND, "NO_CURRENT_TRACK", &err.to_string()),
    }
}

/// `POST /api/radio/force`
pub async fn force_radio(State(state): State<AppState>) -> Response {
    state.playlist.force_next_radio_segment();
    StatusCode::ACCEPTED.into_response()
}

/// `POST /api/songs`
pub async fn add_songs(State(state): State<AppState>, Json(req): Json<LoadRequest>) -> Response {
    match state.fetcher.load_song(&req.query).await {
        Ok(added) => Json(LoadResponse { added }).into_response(),
        Err(err) => upstream_error("load song", err),
    }
}

/// `POST /api/radio`
pub async fn add_radio(State(state): State<AppState>, Json(req): Json<LoadRequest>) -> Response {
    match state.fetcher.load_radio_segment(&req.query).await {
        Ok(added) => Json(LoadResponse { added }).into_response(),
        Err(err) => upstream_error("load radio segment", err),
    }
}

/// `POST /api/playlists`
pub async fn add_playlist(
    State(state): State<AppState>,
    Json(req): Json<LoadRequest>,
) -> Response {
    match state.fetcher.load_playlist(&req.query).await {
        Ok(added) => Json(LoadResponse { added }).into_response(),
        Err(err) => upstream_error("load playlist", err),
    }
}

/// `POST /api/save`
pub async fn save_snapshot(State(state): State<AppState>) -> Response {
    let Some(store) = state.snapshot_store.as_ref() else {
        return map_status(
            StatusCode::SERVICE_UNAVAILABLE,
            "SNAPSHOT_STORE_DISABLED",
            "no snapshot store configured",
        );
    };

    match store.save(&state.playlist).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            warn!("snapshot save failed: {err}");
            map_status(StatusCode::BAD_GATEWAY, "SNAPSHOT_SAVE_FAILED", &err.to_string())
        }
    }
}

fn upstream_error(operation: &str, err: pulsefetch::Error) -> Response {
    warn!("{operation} failed: {err}");
    map_status(StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR", &err.to_string())
}

fn map_status(status: StatusCode, error: &str, message: &str) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
            message: message.to_string(),
        }),
    )
        .into_response()
}
