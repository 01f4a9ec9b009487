//! PulseRadio service binary.
//!
//! Wires the configuration, playlist, fetcher, snapshot store, broadcast
//! engine and HTTP surface together, then runs until ctrl-c. A missing
//! required configuration value or a failed startup snapshot load aborts
//! with a non-zero exit code; a signal-driven shutdown exits 0.

use anyhow::{Context, Result};
use pulsecast::{Announcer, Broadcaster, ClientRegistry};
use pulseconfig::{Config, RadioInjectionMode};
use pulsefetch::{Fetcher, HttpFetcher};
use pulseplaylist::{GistSnapshotStore, InjectionMode, Playlist, SelectorOptions, SnapshotStore};
use pulseserver::AppState;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::prelude::*;
use tracing_subscriber::Registry;

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = Registry::default().with(
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_level(true)
            .with_ansi(true),
    );
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to install tracing subscriber")?;

    let config = Config::from_env().context("loading configuration from environment")?;
    info!(
        port = config.http_port,
        frame_interval_ms = config.frame_interval_ms,
        cooldown_secs = config.radio_cooldown_seconds,
        "PulseRadio starting"
    );

    let playlist = Playlist::new(SelectorOptions {
        cooldown: config.radio_cooldown(),
        injection: match config.radio_injection_mode {
            RadioInjectionMode::Threshold => InjectionMode::Threshold,
            RadioInjectionMode::Probability => InjectionMode::Probability {
                max_chance: config.random_max_chance,
            },
        },
    });

    let mut fetcher_builder = HttpFetcher::builder(config.fetch_base_url.clone());
    if let Some(token) = &config.fetch_auth_token {
        fetcher_builder = fetcher_builder.auth_token(token.clone());
    }
    let fetcher: Arc<dyn Fetcher> = Arc::new(
        fetcher_builder
            .build(playlist.clone())
            .context("building the upstream fetcher")?,
    );

    let snapshot_store: Option<Arc<dyn SnapshotStore>> =
        match (&config.github_token, &config.github_gist_id) {
            (Some(token), Some(gist_id)) => {
                Some(Arc::new(GistSnapshotStore::new(token.clone(), gist_id.clone())))
            }
            _ => {
                info!("snapshot store disabled (GITHUB_TOKEN / GITHUB_GIST_ID not set)");
                None
            }
        };

    if let Some(store) = &snapshot_store {
        store
            .load(&playlist)
            .await
            .context("loading the playlist snapshot at startup")?;
        info!(
            master = playlist.master_len(),
            radio = playlist.radio_len(),
            "playlist snapshot loaded"
        );
    }

    let registry = Arc::new(ClientRegistry::new());
    let announcer = Announcer::new(config.now_playing_webhook_url.clone());
    let broadcaster = Broadcaster::new(
        config.frame_interval(),
        playlist.clone(),
        Arc::clone(&fetcher),
        Arc::clone(&registry),
        announcer,
    );

    let cancel = CancellationToken::new();
    let engine = broadcaster.start(cancel.clone());

    if let Some(store) = snapshot_store.clone() {
        spawn_auto_save(store, playlist.clone(), &config, cancel.clone());
    }

    let state = AppState {
        broadcaster,
        playlist,
        fetcher,
        registry,
        snapshot_store,
        command_token: config.command_auth_token.clone(),
    };
    let server = tokio::spawn(pulseserver::serve(config.http_port, state, cancel.clone()));

    tokio::signal::ctrl_c()
        .await
        .context("waiting for the shutdown signal")?;
    info!("shutdown requested");
    cancel.cancel();

    let _ = engine.await;
    server
        .await
        .context("joining the HTTP server task")?
        .context("HTTP server")?;

    info!("goodbye");
    Ok(())
}

/// Periodically snapshot the playlist; failures are logged and retried at
/// the next tick, never fatal.
fn spawn_auto_save(
    store: Arc<dyn SnapshotStore>,
    playlist: Playlist,
    config: &Config,
    cancel: CancellationToken,
) {
    let interval = config.save_interval();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick of an interval fires immediately; saving a playlist
        // we just loaded is pointless.
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => match store.save(&playlist).await {
                    Ok(()) => info!("playlist snapshot auto-saved"),
                    Err(err) => warn!("playlist auto-save failed: {err}"),
                },
            }
        }
    });
}
