//! Visualization decoder trait
//!
//! Decoding only feeds the waveform and the progress duration. Playback goes
//! through the engine with the raw file bytes, so a decoder failure degrades
//! visualization and nothing else.

use crate::error::Result;
use std::time::Duration;

/// Decoded audio used for visualization
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    /// Total duration
    pub duration: Duration,

    /// Sample rate in Hz
    pub sample_rate: u32,

    /// Channel count of the source
    pub channels: u16,

    /// Samples of the first channel in [-1.0, 1.0]
    pub samples: Vec<f32>,
}

/// Decodes an in-memory file payload
///
/// Implementations are called from a blocking worker thread.
pub trait AudioDecoder: Send + Sync + 'static {
    /// Decode `bytes`; `extension` is a format hint taken from the file name
    fn decode(&self, bytes: &[u8], extension: Option<&str>) -> Result<DecodedAudio>;
}

/// Decoder that never produces audio
///
/// Useful when visualization is not wanted: every load degrades to
/// "no waveform, unknown duration" without touching the bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopDecoder;

impl AudioDecoder for NoopDecoder {
    fn decode(&self, _bytes: &[u8], _extension: Option<&str>) -> Result<DecodedAudio> {
        Err(crate::error::PlaybackError::decode("visualization decoding disabled"))
    }
}
