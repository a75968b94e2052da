/// Decode errors
use thiserror::Error;

/// Result type alias using `DecodeError`
pub type Result<T> = std::result::Result<T, DecodeError>;

#[derive(Error, Debug)]
pub enum DecodeError {
    /// Container not recognised
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Container has no decodable audio track
    #[error("No audio tracks found")]
    NoAudioTrack,

    /// Codec could not be set up
    #[error("Unsupported codec: {0}")]
    UnsupportedCodec(String),

    /// Stream broke off mid-decode
    #[error("Decode error: {0}")]
    Stream(String),
}

impl From<DecodeError> for orcplay_playback::PlaybackError {
    fn from(err: DecodeError) -> Self {
        orcplay_playback::PlaybackError::decode(err.to_string())
    }
}
