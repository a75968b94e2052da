//! Error types for playback management

use thiserror::Error;

/// An engine operation that was rejected
///
/// Every [`Engine`](crate::Engine) method reports failure with this type.
/// `operation` names the capability that failed (`"start"`, `"write_input_file"`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("engine rejected {operation}: {message}")]
pub struct EngineError {
    /// Engine capability that failed
    pub operation: &'static str,

    /// Message reported by the engine
    pub message: String,
}

impl EngineError {
    /// Create an engine error for `operation`
    pub fn new(operation: &'static str, message: impl Into<String>) -> Self {
        Self {
            operation,
            message: message.into(),
        }
    }
}

/// Playback errors
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// Byte buffer could not be decoded as audio (visualization only)
    #[error("Decode error: {0}")]
    Decode(String),

    /// Engine rejected an operation; the session fell back to `Stopped`
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Next/previous/play attempted with no tracks
    #[error("Playlist is empty")]
    EmptyPlaylist,

    /// Index out of bounds
    #[error("Index out of bounds: {index} (playlist has {len} tracks)")]
    IndexOutOfBounds { index: usize, len: usize },

    /// No track is currently loaded
    #[error("No track loaded")]
    NoTrackLoaded,

    /// Operation issued after `shutdown()`
    #[error("Session has been shut down")]
    SessionClosed,

    /// Configuration rejected by `PlayerConfig::validate`
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl PlaybackError {
    /// Create a decode error
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Whether this error left the session in the `Stopped` fallback
    pub fn is_engine_failure(&self) -> bool {
        matches!(self, Self::Engine(_))
    }
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
