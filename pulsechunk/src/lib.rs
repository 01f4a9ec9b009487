//! # pulsechunk - byte-to-frame slicing for time-aligned broadcast
//!
//! A track is delivered to listeners as a sequence of fixed-size frames, one
//! frame per tick of the broadcast clock. This crate computes that partition:
//! given the raw payload, the track's total duration and the tick interval,
//! it slices the payload so that replaying one frame per tick reproduces
//! real-time playback to within one frame's drift per track, independent of
//! the audio codec.
//!
//! The operation is pure and deterministic. Frames are [`Bytes`] sub-slices
//! of the input, so no payload data is copied.
//!
//! # Example
//!
//! ```
//! use bytes::Bytes;
//! use std::time::Duration;
//!
//! let payload = Bytes::from(vec![0u8; 2000]);
//! let frames = pulsechunk::prepare_chunks(
//!     payload,
//!     Duration::from_secs(2),
//!     Duration::from_millis(100),
//! )
//! .unwrap();
//!
//! assert_eq!(frames.len(), 20);
//! assert!(frames.iter().all(|f| f.len() == 100));
//! ```

use bytes::Bytes;
use std::time::Duration;

/// Result type alias for chunking operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while partitioning a payload into frames
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The track duration is zero or negative, so no byte rate exists
    #[error("track duration must be positive (got {0:?})")]
    ZeroDuration(Duration),

    /// The computed frame size degenerated to zero bytes
    #[error(
        "frame size computed to zero ({bytes} bytes over {total:?} at {interval:?} per frame)"
    )]
    DegenerateFrameSize {
        bytes: usize,
        total: Duration,
        interval: Duration,
    },
}

/// Partition `data` into consecutive frames sized for real-time delivery.
///
/// The frame size is `⌊(len / total_secs) · interval_secs⌋`. Every frame has
/// exactly that size except the last, which carries the remainder and may be
/// shorter (it is never dropped). Concatenating the returned frames yields
/// the input unchanged.
///
/// Returns an error instead of producing empty frames when the inputs
/// degenerate (zero duration, or a payload too small for one byte per
/// frame). Callers treat that as a permanently unplayable track.
pub fn prepare_chunks(data: Bytes, total: Duration, interval: Duration) -> Result<Vec<Bytes>> {
    let total_bytes = data.len();
    let total_secs = total.as_secs_f64();
    if total_secs <= 0.0 {
        return Err(Error::ZeroDuration(total));
    }

    let bytes_per_second = total_bytes as f64 / total_secs;
    let size = (bytes_per_second * interval.as_secs_f64()) as usize;
    if size == 0 {
        return Err(Error::DegenerateFrameSize {
            bytes: total_bytes,
            total,
            interval,
        });
    }

    let mut frames = Vec::with_capacity(total_bytes.div_ceil(size));
    let mut offset = 0;
    while offset < total_bytes {
        let end = usize::min(offset + size, total_bytes);
        frames.push(data.slice(offset..end));
        offset = end;
    }

    Ok(frames)
}
