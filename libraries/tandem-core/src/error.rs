/// Core error types for Tandem
use thiserror::Error;

/// Result type alias using `TandemError`
pub type Result<T> = std::result::Result<T, TandemError>;

/// Core error type for Tandem
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TandemError {
    /// A track could not be turned into a playable location
    #[error("Cannot resolve stream for {track}: {reason}")]
    Unresolvable { track: String, reason: String },

    /// A base URL or generated URL is malformed
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Invalid input data
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl TandemError {
    /// Create an unresolvable-stream error
    pub fn unresolvable(track: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Unresolvable {
            track: track.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}
