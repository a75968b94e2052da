//! Output level metering
//!
//! The program publishes a linear 0-1 level; the meter maps it onto a
//! -60..0 dB display scale and a four-band severity classification.

use serde::{Deserialize, Serialize};

/// Levels at or below this are shown as silence
pub const SILENCE_FLOOR: f64 = 0.0001;

/// Bottom of the display scale in dB
pub const DISPLAY_RANGE_DB: f64 = 60.0;

/// Severity band used for meter colouring
///
/// Thresholds apply to the raw linear level, not to the dB display value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SeverityBand {
    /// level < 0.6
    Safe,
    /// 0.6 <= level < 0.8
    Moderate,
    /// 0.8 <= level < 0.9
    High,
    /// level >= 0.9
    Clipping,
}

impl SeverityBand {
    /// Classify a raw linear level
    pub fn classify(level: f64) -> Self {
        if level < 0.6 {
            Self::Safe
        } else if level < 0.8 {
            Self::Moderate
        } else if level < 0.9 {
            Self::High
        } else {
            Self::Clipping
        }
    }

    /// Conventional meter colour
    pub fn color(self) -> &'static str {
        match self {
            Self::Safe => "#4CAF50",
            Self::Moderate => "#FFC107",
            Self::High => "#FF9800",
            Self::Clipping => "#F44336",
        }
    }
}

/// Map a raw linear level to a display percentage in [0, 100]
///
/// -60 dB maps to 0 %, 0 dB (level 1.0) to 100 %, linear in dB between.
pub fn display_percent(level: f64) -> f64 {
    if level.is_nan() || level <= SILENCE_FLOOR {
        return 0.0;
    }
    let db = 20.0 * level.log10();
    (((db + DISPLAY_RANGE_DB) / DISPLAY_RANGE_DB) * 100.0).clamp(0.0, 100.0)
}

/// One meter reading
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelReading {
    /// Last polled level, clamped to [0, 1]
    pub raw: f64,

    /// Derived display value in [0, 100]
    pub display_percent: f64,

    /// Severity of `raw`
    pub band: SeverityBand,
}

impl LevelReading {
    /// Reading shown while the meter is idle
    pub const SILENT: Self = Self {
        raw: 0.0,
        display_percent: 0.0,
        band: SeverityBand::Safe,
    };

    /// Derive a reading from a raw level
    ///
    /// Non-finite input reads as silence.
    pub fn from_level(level: f64) -> Self {
        let raw = if level.is_finite() {
            level.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            raw,
            display_percent: display_percent(raw),
            band: SeverityBand::classify(raw),
        }
    }
}

impl Default for LevelReading {
    fn default() -> Self {
        Self::SILENT
    }
}

/// Level meter state
#[derive(Debug, Clone, Default)]
pub struct LevelMeter {
    reading: LevelReading,
    active: bool,
}

impl LevelMeter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin accepting polled values
    pub fn start(&mut self) {
        self.active = true;
    }

    /// Record a polled level
    ///
    /// Returns `None` when the meter is stopped; values polled after `stop`
    /// are discarded.
    pub fn update(&mut self, level: f64) -> Option<LevelReading> {
        if !self.active {
            return None;
        }
        self.reading = LevelReading::from_level(level);
        Some(self.reading)
    }

    /// Halt and reset the display to zero
    pub fn stop(&mut self) {
        self.active = false;
        self.reading = LevelReading::SILENT;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn reading(&self) -> LevelReading {
        self.reading
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silence_maps_to_zero() {
        assert_eq!(display_percent(0.0), 0.0);
        assert_eq!(display_percent(SILENCE_FLOOR), 0.0);
        assert_eq!(display_percent(-0.5), 0.0);
        assert_eq!(display_percent(f64::NAN), 0.0);
    }

    #[test]
    fn unity_maps_to_full_scale() {
        assert_eq!(display_percent(1.0), 100.0);
    }

    #[test]
    fn decibel_scale_midpoints() {
        // -30 dB sits half way
        let level = 10f64.powf(-30.0 / 20.0);
        assert!((display_percent(level) - 50.0).abs() < 1e-9);

        // -60 dB is the floor of the scale
        let level = 10f64.powf(-60.0 / 20.0);
        assert!(display_percent(level).abs() < 1e-9);

        // Quieter than -60 dB but above the silence floor clamps to zero
        assert_eq!(display_percent(0.0005), 0.0);
    }

    #[test]
    fn band_boundaries() {
        assert_eq!(SeverityBand::classify(0.59), SeverityBand::Safe);
        assert_eq!(SeverityBand::classify(0.6), SeverityBand::Moderate);
        assert_eq!(SeverityBand::classify(0.79), SeverityBand::Moderate);
        assert_eq!(SeverityBand::classify(0.8), SeverityBand::High);
        assert_eq!(SeverityBand::classify(0.89), SeverityBand::High);
        assert_eq!(SeverityBand::classify(0.9), SeverityBand::Clipping);
        assert_eq!(SeverityBand::classify(1.0), SeverityBand::Clipping);
    }

    #[test]
    fn band_uses_raw_level_not_display() {
        // 0.5 displays at ~90 % but is still safe
        let reading = LevelReading::from_level(0.5);
        assert!(reading.display_percent > 89.0);
        assert_eq!(reading.band, SeverityBand::Safe);
    }

    #[test]
    fn reading_clamps_input() {
        let reading = LevelReading::from_level(1.7);
        assert_eq!(reading.raw, 1.0);
        assert_eq!(reading.display_percent, 100.0);

        assert_eq!(LevelReading::from_level(f64::INFINITY), LevelReading::SILENT);
    }

    #[test]
    fn meter_ignores_updates_when_stopped() {
        let mut meter = LevelMeter::new();
        assert!(meter.update(0.7).is_none());

        meter.start();
        let reading = meter.update(0.7).unwrap();
        assert_eq!(reading.band, SeverityBand::Moderate);
        assert_eq!(meter.reading(), reading);

        meter.stop();
        assert!(!meter.is_active());
        assert_eq!(meter.reading().display_percent, 0.0);
        assert!(meter.update(0.95).is_none());
    }
}
