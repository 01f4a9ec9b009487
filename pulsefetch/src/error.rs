//! Error types for the upstream catalog client

/// Result type alias for fetch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when talking to the upstream catalog
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid URL
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// JSON parsing failed
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    /// The upstream answered with a non-success status
    #[error("unexpected status {status} during {operation}")]
    UnexpectedStatus {
        operation: &'static str,
        status: u16,
    },

    /// A playlist query returned no playlist data at all
    #[error("catalog returned no playlist data")]
    EmptyPlaylist,

    /// No canned payload registered for this track (test double)
    #[error("no canned payload for track {0}")]
    UnknownTrack(String),

    /// Injected transient failure (test double)
    #[error("injected transient failure for track {0}")]
    InjectedFailure(String),
}
