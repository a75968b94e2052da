//! Waveform peak extraction
//!
//! Reduces a channel of samples to one min/max pair per display column.
//! Drawing is left to the renderer.

use serde::{Deserialize, Serialize};

/// Min/max of the samples covered by one column
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeakColumn {
    pub min: f32,
    pub max: f32,
}

impl PeakColumn {
    /// Vertical pixel span `(top, bottom)` for a canvas of `height`,
    /// centred on the middle line
    pub fn to_pixels(self, height: f32) -> (f32, f32) {
        let mid = height / 2.0;
        (mid - self.max * mid, mid - self.min * mid)
    }
}

/// Per-column peaks of a decoded channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaveformPeaks {
    columns: Vec<PeakColumn>,
}

impl WaveformPeaks {
    /// Reduce `samples` to `columns` peak pairs
    ///
    /// Each column covers `ceil(len / columns)` samples; positions past the
    /// end of the data read as silence.
    pub fn from_samples(samples: &[f32], columns: usize) -> Self {
        if samples.is_empty() {
            return Self {
                columns: vec![PeakColumn { min: 0.0, max: 0.0 }; columns],
            };
        }

        let step = samples.len().div_ceil(columns.max(1));
        let columns = (0..columns)
            .map(|i| {
                let mut min = 1.0_f32;
                let mut max = -1.0_f32;
                for j in 0..step {
                    let datum = samples.get(i * step + j).copied().unwrap_or(0.0);
                    min = min.min(datum);
                    max = max.max(datum);
                }
                PeakColumn { min, max }
            })
            .collect();

        Self { columns }
    }

    pub fn columns(&self) -> &[PeakColumn] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Horizontal position of the progress cursor
pub fn progress_x(fraction: f64, width: f64) -> f64 {
    fraction.clamp(0.0, 1.0) * width
}
