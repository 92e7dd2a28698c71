//! Error types for playback management

use thiserror::Error;

/// Playback errors
///
/// None of these escape the coordinator: load and playback failures are
/// recorded in the owning engine's state, navigation on an empty queue
/// yields `None`, and out-of-range indices are clamped.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PlaybackError {
    /// Media could not be located or opened
    #[error("Failed to load media: {0}")]
    LoadFailure(String),

    /// Device or codec rejected playback after the media loaded
    #[error("Playback failed: {0}")]
    PlaybackFailure(String),

    /// Navigation requested with no items queued
    #[error("Queue is empty")]
    EmptyQueue,

    /// Index outside the queue, corrected by clamping
    #[error("Index {index} out of range for queue of {len}")]
    OutOfRangeIndex { index: usize, len: usize },

    /// Device-level failure outside a specific track
    #[error("Device error: {0}")]
    Device(String),
}

impl From<tandem_core::TandemError> for PlaybackError {
    fn from(err: tandem_core::TandemError) -> Self {
        PlaybackError::LoadFailure(err.to_string())
    }
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
