/// Waveform inspection of audio files
use crate::error::Result;
use orcplay_decode::SymphoniaDecoder;
use orcplay_playback::{PlaybackError, WaveformPeaks};
use serde::Serialize;
use std::path::Path;

/// What `orcplay inspect` prints for one file
#[derive(Debug, Clone, Serialize)]
pub struct InspectReport {
    pub name: String,
    pub duration_secs: f64,
    pub sample_rate: u32,
    pub channels: u16,
    pub peaks: WaveformPeaks,
}

impl InspectReport {
    /// Header line: `name  3.52s  44100 Hz  2 ch`
    pub fn summary(&self) -> String {
        format!(
            "{}  {:.2}s  {} Hz  {} ch",
            self.name, self.duration_secs, self.sample_rate, self.channels
        )
    }
}

/// Decode `path` and reduce it to `columns` peak pairs
pub fn inspect_file(path: &Path, columns: usize) -> Result<InspectReport> {
    let bytes = std::fs::read(path)?;
    let extension = path.extension().and_then(|ext| ext.to_str());
    let audio = SymphoniaDecoder::new()
        .decode_bytes(&bytes, extension)
        .map_err(PlaybackError::from)?;

    Ok(InspectReport {
        name: path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned()),
        duration_secs: audio.duration.as_secs_f64(),
        sample_rate: audio.sample_rate,
        channels: audio.channels,
        peaks: WaveformPeaks::from_samples(&audio.samples, columns.max(1)),
    })
}

/// Draw peaks as text rows, `height` rows tall
///
/// A cell is filled when the column's pixel span covers the row's centre.
/// Empty cells on the middle row show the zero line.
pub fn render_ascii(peaks: &WaveformPeaks, height: usize) -> Vec<String> {
    let height = height.max(1);
    let canvas = height as f32;
    let spans: Vec<(f32, f32)> = peaks
        .columns()
        .iter()
        .map(|column| column.to_pixels(canvas))
        .collect();
    let mid_row = height / 2;

    (0..height)
        .map(|row| {
            let y = row as f32 + 0.5;
            spans
                .iter()
                .map(|&(top, bottom)| {
                    if y >= top && y <= bottom {
                        '#'
                    } else if row == mid_row {
                        '-'
                    } else {
                        ' '
                    }
                })
                .collect::<String>()
                .trim_end()
                .to_string()
        })
        .collect()
}
