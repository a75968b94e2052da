//! Core types for playback management

use crate::error::{PlaybackError, Result};
use crate::program::DEFAULT_PROGRAM;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Opaque track identifier, unique within a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrackId(Uuid);

impl TrackId {
    /// Generate a fresh identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TrackId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One playable unit
///
/// The payload is the original file as dropped by the user. It is loaded
/// once and shared immutably; cloning a track never copies the bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    /// Unique identifier
    pub id: TrackId,

    /// Name shown in the UI (the original file name)
    pub display_name: String,

    /// Original file payload
    pub source_bytes: Arc<[u8]>,

    /// Known only after a successful decode
    pub duration: Option<Duration>,
}

impl Track {
    /// Create a track from a file name and its bytes
    pub fn new(display_name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            id: TrackId::new(),
            display_name: display_name.into(),
            source_bytes: bytes.into(),
            duration: None,
        }
    }

    /// Lowercased file extension, used as a format hint when decoding
    pub fn extension(&self) -> Option<String> {
        let (stem, ext) = self.display_name.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }
}

/// Transport state
///
/// Exactly one value per session; owned by [`PlaybackSession`](crate::PlaybackSession).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransportState {
    /// Nothing playing (initial state, and the fallback after engine failures)
    #[default]
    Stopped,

    /// Engine transport running
    Playing,

    /// Engine transport suspended mid-track
    Paused,
}

/// Label of the play/pause button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransportLabel {
    Play,
    Pause,
}

impl TransportLabel {
    /// Label matching a transport state
    pub fn for_state(state: TransportState) -> Self {
        match state {
            TransportState::Playing => Self::Pause,
            TransportState::Stopped | TransportState::Paused => Self::Play,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Play => "Play",
            Self::Pause => "Pause",
        }
    }
}

/// What caused a track load
///
/// Browsers only allow audio output after a user gesture, so loads caused by
/// the initial page setup must not start transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadTrigger {
    /// Drop, next, previous, click-to-select, rewind
    UserAction,

    /// Initial setup; load without starting
    Initial,
}

impl LoadTrigger {
    /// Whether transport starts once the load completes
    pub fn autoplay(self) -> bool {
        matches!(self, Self::UserAction)
    }
}

/// Result of a load sequence that was not rejected by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The track is staged in the engine
    Loaded {
        /// Playlist index of the loaded track
        index: usize,
        /// Whether the visualization decode succeeded
        decoded: bool,
        /// Whether transport was started
        playing: bool,
    },

    /// A newer load or stop was requested before this one finished
    Superseded,
}

impl LoadOutcome {
    pub fn is_superseded(self) -> bool {
        matches!(self, Self::Superseded)
    }
}

/// Names of the control channels the program exchanges with the session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelNames {
    /// Scalar channel carrying the output gain
    pub volume: String,

    /// String channel naming the staged file to play
    pub file: String,

    /// Scalar channel the program publishes its output level on
    pub level: String,
}

impl Default for ChannelNames {
    fn default() -> Self {
        Self {
            volume: "vol".to_string(),
            file: "filename".to_string(),
            level: "level".to_string(),
        }
    }
}

/// How the 0-100 volume level maps onto the gain sent to the engine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VolumeCurve {
    /// gain = level / 100, like a plain range slider
    #[default]
    Linear,

    /// 0% = -60 dB, 100% = 0 dB
    Decibel,
}

/// Configuration for a playback session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Instrument program compiled into the engine before every load
    pub program: String,

    /// Output destination selected before transport starts (default: "dac")
    pub output_destination: String,

    /// Control channel names used by `program`
    pub channels: ChannelNames,

    /// Initial volume (0-100, default: 80)
    pub volume: u8,

    /// Volume curve (default: Linear)
    pub volume_curve: VolumeCurve,

    /// Progress/level polling cadence in Hz (default: 60)
    pub frame_rate_hz: u32,

    /// Load and play the next track when one ends (default: false)
    pub auto_advance: bool,

    /// Peak columns computed for the waveform (default: 800)
    pub waveform_columns: usize,

    /// Engine storage directory staged files are written under (default: "/")
    pub file_prefix: String,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            program: DEFAULT_PROGRAM.to_string(),
            output_destination: "dac".to_string(),
            channels: ChannelNames::default(),
            volume: 80,
            volume_curve: VolumeCurve::Linear,
            frame_rate_hz: 60,
            auto_advance: false,
            waveform_columns: 800,
            file_prefix: "/".to_string(),
        }
    }
}

impl PlayerConfig {
    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.frame_rate_hz == 0 {
            return Err(PlaybackError::InvalidConfig(
                "frame_rate_hz must be greater than zero".to_string(),
            ));
        }
        if self.waveform_columns == 0 {
            return Err(PlaybackError::InvalidConfig(
                "waveform_columns must be greater than zero".to_string(),
            ));
        }
        if self.program.trim().is_empty() {
            return Err(PlaybackError::InvalidConfig("program is empty".to_string()));
        }
        Ok(())
    }

    /// Interval between two polling frames
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.frame_rate_hz.max(1)))
    }

    /// Engine storage path a track is staged under
    pub fn staged_path(&self, track: &Track) -> String {
        let prefix = self.file_prefix.trim_end_matches('/');
        format!("{}/{}", prefix, track.display_name)
    }
}
