//! Error types for the broadcast engine

/// Result type alias for broadcast operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced to operators of the broadcast engine
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// DeleteCurrent was called before any track has played
    #[error("no track has played yet")]
    NoCurrentTrack,
}
