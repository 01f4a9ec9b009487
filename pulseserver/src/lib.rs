//! # pulseserver - the station's HTTP surface
//!
//! Two faces on one listener:
//!
//! - `GET /listen`: the websocket endpoint every audio client connects to.
//!   Binary frames are opaque audio, text frames are JSON `songChange`
//!   announcements.
//! - `/api/*`: the operator command surface (now-playing, queue inspection,
//!   skip, delete-current, forced radio, catalog loads, snapshot save),
//!   optionally guarded by a bearer token.
//!
//! CORS is permissive so receiver web apps can connect from anywhere.

pub mod api;
pub mod ws;

use axum::middleware;
use axum::routing::{delete, get, post};
use axum::Router;
use pulsecast::{Broadcaster, ClientRegistry};
use pulsefetch::Fetcher;
use pulseplaylist::{Playlist, SnapshotStore};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tracing::info;

/// Shared state passed to all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub broadcaster: Broadcaster,
    pub playlist: Playlist,
    pub fetcher: Arc<dyn Fetcher>,
    pub registry: Arc<ClientRegistry>,
    pub snapshot_store: Option<Arc<dyn SnapshotStore>>,
    pub command_token: Option<String>,
}

/// Build the full router: the listener endpoint plus the command API.
pub fn router(state: AppState) -> Router {
    let commands = Router::new()
        .route("/now", get(api::now_playing))
        .route("/queue", get(api::queue))
        .route("/skip", post(api::skip))
        .route("/current", delete(api::delete_current))
        .route("/radio/force", post(api::force_radio))
        .route("/songs", post(api::add_songs))
        .route("/radio", post(api::add_radio))
        .route("/playlists", post(api::add_playlist))
        .route("/save", post(api::save_snapshot))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::require_command_token,
        ));

    Router::new()
        .route("/listen", get(ws::listen))
        .nest("/api", commands)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve until the cancellation token fires.
pub async fn serve(
    port: u16,
    state: AppState,
    cancel: CancellationToken,
) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "HTTP server listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
}
