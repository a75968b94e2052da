//! Orcplay - Audio Decoding
//!
//! Decodes in-memory audio files with Symphonia so the playback session can
//! show a waveform and a duration. Playback itself happens in the engine.
//!
//! ```rust,no_run
//! use orcplay_decode::SymphoniaDecoder;
//!
//! let bytes = std::fs::read("song.flac").unwrap();
//! let audio = SymphoniaDecoder::new().decode_bytes(&bytes, Some("flac")).unwrap();
//! println!("{:?} at {} Hz", audio.duration, audio.sample_rate);
//! ```

mod decoder;
mod error;

pub use decoder::SymphoniaDecoder;
pub use error::{DecodeError, Result};
