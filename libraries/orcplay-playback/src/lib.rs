//! Orcplay - Playback Session
//!
//! Platform-agnostic playback control for players built on an external,
//! program-driven audio engine (a Csound-style engine that compiles an
//! instrument program, reads staged input files, and exposes named control
//! channels).
//!
//! This crate provides:
//! - Ordered playlist with wrapping next/previous navigation
//! - Transport state machine (Stopped, Playing, Paused)
//! - Wall-clock progress tracking across pause/resume
//! - Output level metering on a dB display scale with severity bands
//! - Volume control (linear or decibel curve, mute/unmute)
//! - Waveform peak extraction for display
//!
//! # Architecture
//!
//! `orcplay-playback` owns no audio I/O:
//! - The engine is consumed through the async [`Engine`] trait
//! - Decoding for display goes through [`AudioDecoder`]
//! - Every visible change is pushed to a [`Renderer`] as a [`UiUpdate`]
//!
//! Stale engine completions are discarded: each load or stop claims a new
//! request generation, and an in-flight sequence that sees a newer one gives
//! up without touching state.
//!
//! # Example
//!
//! ```rust,no_run
//! use orcplay_playback::{
//!     LoadTrigger, NoopDecoder, NullRenderer, PlaybackSession, PlayerConfig, Track,
//! };
//! # use orcplay_playback::Engine;
//! # use std::sync::Arc;
//!
//! # async fn demo<E: Engine>(engine: E) -> orcplay_playback::Result<()> {
//! let session = PlaybackSession::new(
//!     engine,
//!     Arc::new(NoopDecoder),
//!     Arc::new(NullRenderer),
//!     PlayerConfig::default(),
//! )?;
//!
//! let track = Track::new("song.wav", std::fs::read("song.wav").unwrap_or_default());
//! session.add_tracks(vec![track], LoadTrigger::Initial).await?;
//!
//! session.play().await?;
//! session.pause().await?;
//! session.next().await?;
//! session.stop().await?;
//! # Ok(())
//! # }
//! ```

mod decoder;
mod engine;
mod error;
mod events;
pub mod level;
mod playlist;
pub mod program;
mod progress;
mod session;
pub mod types;
mod volume;
pub mod waveform;

// Public exports
pub use decoder::{AudioDecoder, DecodedAudio, NoopDecoder};
pub use engine::{Engine, EngineResult, OutputState};
pub use error::{EngineError, PlaybackError, Result};
pub use events::{NullRenderer, Renderer, UiUpdate};
pub use level::{LevelMeter, LevelReading, SeverityBand};
pub use playlist::PlaylistManager;
pub use program::DEFAULT_PROGRAM;
pub use progress::{ProgressSnapshot, ProgressTick, ProgressTracker};
pub use session::PlaybackSession;
pub use types::{
    ChannelNames, LoadOutcome, LoadTrigger, PlayerConfig, Track, TrackId, TransportLabel,
    TransportState, VolumeCurve,
};
pub use volume::Volume;
pub use waveform::{PeakColumn, WaveformPeaks};
