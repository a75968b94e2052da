//! UI updates
//!
//! The session calls outward through [`Renderer`] whenever something visible
//! changes. Rendering is a pure function of these values; the core never
//! draws anything itself.

use crate::level::SeverityBand;
use crate::types::TransportLabel;
use crate::waveform::WaveformPeaks;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

/// Updates emitted by the playback session
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UiUpdate {
    /// Progress cursor position in [0, 1]
    Progress { fraction: f64 },

    /// Level meter bar
    Level { percent: f64, band: SeverityBand },

    /// Peaks of the newly loaded track
    Waveform { peaks: Arc<WaveformPeaks> },

    /// Loaded track could not be decoded; hide the waveform
    WaveformCleared,

    /// Now-playing line
    Track {
        name: String,
        index: usize,
        total: usize,
    },

    /// File list with the active entry marked
    Playlist {
        names: Vec<String>,
        active: Option<usize>,
        can_navigate: bool,
    },

    /// Play/pause button label
    TransportLabel { label: TransportLabel },

    /// Track reached its end
    TrackFinished { index: usize },

    /// Engine rejected an operation
    Error { message: String },
}

/// UI collaborator
pub trait Renderer: Send + Sync + 'static {
    fn render(&self, update: UiUpdate);
}

/// Renderer that drops every update
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn render(&self, _update: UiUpdate) {}
}

/// Forward updates into a channel drained by the UI loop
impl Renderer for UnboundedSender<UiUpdate> {
    fn render(&self, update: UiUpdate) {
        // Receiver gone means the UI is shutting down
        let _ = self.send(update);
    }
}
