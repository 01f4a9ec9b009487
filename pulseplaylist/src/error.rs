//! Error types for playlist persistence

/// Result type alias for playlist operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the snapshot store
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON encoding/decoding failed
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    /// The remote store rejected the request
    #[error("snapshot store error: {0}")]
    Snapshot(String),
}
