//! Volume control
//!
//! Volume is kept as a 0-100 level plus a mute flag. The gain pushed to the
//! engine's volume channel follows the configured [`VolumeCurve`].

use crate::types::VolumeCurve;

/// Lowest gain of the decibel curve, in dB
const DECIBEL_FLOOR: f32 = -60.0;

/// Volume controller
#[derive(Debug, Clone)]
pub struct Volume {
    /// Volume level (0-100)
    level: u8,

    /// Mute state (preserves volume level)
    muted: bool,

    /// Level to gain mapping
    curve: VolumeCurve,
}

impl Volume {
    /// Create new volume controller
    ///
    /// # Arguments
    /// * `level` - Initial volume (0-100, clamped)
    /// * `curve` - Mapping from level to gain
    pub fn new(level: u8, curve: VolumeCurve) -> Self {
        Self {
            level: level.min(100),
            muted: false,
            curve,
        }
    }

    /// Set volume level (0-100)
    pub fn set_level(&mut self, level: u8) {
        self.level = level.min(100);
    }

    /// Set volume from a 0.0-1.0 slider position
    pub fn set_fraction(&mut self, fraction: f64) {
        let fraction = if fraction.is_finite() {
            fraction.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.level = (fraction * 100.0).round() as u8;
    }

    /// Get current volume level (0-100)
    pub fn level(&self) -> u8 {
        self.level
    }

    /// Mute audio (preserves volume level)
    pub fn mute(&mut self) {
        self.muted = true;
    }

    /// Unmute audio (restores previous volume)
    pub fn unmute(&mut self) {
        self.muted = false;
    }

    /// Check if muted
    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn curve(&self) -> VolumeCurve {
        self.curve
    }

    /// Gain for the engine's volume channel
    ///
    /// Returns 0.0 if muted or at level 0.
    pub fn gain(&self) -> f64 {
        if self.muted || self.level == 0 {
            return 0.0;
        }

        match self.curve {
            VolumeCurve::Linear => f64::from(self.level) / 100.0,
            VolumeCurve::Decibel => {
                // Map 1-100% onto -60 dB..0 dB, then gain = 10^(dB/20)
                let db = (100.0 - f32::from(self.level)) / 100.0 * DECIBEL_FLOOR;
                f64::from(10.0_f32.powf(db / 20.0))
            }
        }
    }
}

impl Default for Volume {
    fn default() -> Self {
        Self::new(80, VolumeCurve::Linear)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_volume() {
        let vol = Volume::new(80, VolumeCurve::Linear);
        assert_eq!(vol.level(), 80);
        assert!(!vol.is_muted());
    }

    #[test]
    fn set_volume_level_clamps() {
        let mut vol = Volume::new(150, VolumeCurve::Linear);
        assert_eq!(vol.level(), 100);

        vol.set_level(75);
        assert_eq!(vol.level(), 75);

        vol.set_level(200);
        assert_eq!(vol.level(), 100);
    }

    #[test]
    fn set_fraction() {
        let mut vol = Volume::default();
        vol.set_fraction(0.25);
        assert_eq!(vol.level(), 25);

        vol.set_fraction(4.0);
        assert_eq!(vol.level(), 100);

        vol.set_fraction(f64::NAN);
        assert_eq!(vol.level(), 0);
    }

    #[test]
    fn linear_gain() {
        assert_eq!(Volume::new(0, VolumeCurve::Linear).gain(), 0.0);
        assert!((Volume::new(50, VolumeCurve::Linear).gain() - 0.5).abs() < 1e-9);
        assert!((Volume::new(100, VolumeCurve::Linear).gain() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn decibel_gain() {
        assert_eq!(Volume::new(0, VolumeCurve::Decibel).gain(), 0.0);

        // 100% is unity
        assert!((Volume::new(100, VolumeCurve::Decibel).gain() - 1.0).abs() < 0.001);

        // 50% is -30 dB
        assert!((Volume::new(50, VolumeCurve::Decibel).gain() - 0.0316).abs() < 0.001);

        // 80% is -12 dB
        assert!((Volume::new(80, VolumeCurve::Decibel).gain() - 0.251).abs() < 0.01);
    }

    #[test]
    fn mute_preserves_level() {
        let mut vol = Volume::new(80, VolumeCurve::Linear);
        vol.mute();
        assert!(vol.is_muted());
        assert_eq!(vol.gain(), 0.0);
        assert_eq!(vol.level(), 80);

        vol.unmute();
        assert!((vol.gain() - 0.8).abs() < 1e-9);
    }
}
