//! Wall-clock playback progress
//!
//! Elapsed time is derived from clock samples, not from the engine: the engine
//! exposes no position query. Every method takes the current instant so the
//! tracker stays a pure state machine; the session feeds it the runtime clock.

use serde::Serialize;
use std::time::{Duration, Instant};

/// Result of one progress poll
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProgressTick {
    /// Duration unknown (decode failed or pending); nothing to render
    Unknown,

    /// Still inside the track
    Advanced { elapsed: Duration, fraction: f64 },

    /// Reached the end; reported exactly once per track
    Ended { elapsed: Duration },

    /// End already reported
    Finished,
}

/// Point-in-time view of progress
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProgressSnapshot {
    pub elapsed: Duration,
    pub duration: Option<Duration>,
    /// elapsed / duration in [0, 1], when the duration is known
    pub fraction: Option<f64>,
}

/// Tracks elapsed playback time across pause/resume
#[derive(Debug, Clone, Default)]
pub struct ProgressTracker {
    /// Time folded in by earlier pauses
    accumulated: Duration,

    /// Reference timestamp of the running segment
    started_at: Option<Instant>,

    /// Duration of the active track, once decoded
    duration: Option<Duration>,

    /// End-of-track already signalled
    ended: bool,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or resume) advancing from `now`
    ///
    /// No-op while already running.
    pub fn start(&mut self, now: Instant) {
        if self.started_at.is_none() {
            self.started_at = Some(now);
        }
    }

    /// Fold the running segment into the accumulated time and stop advancing
    pub fn pause(&mut self, now: Instant) {
        if let Some(t0) = self.started_at.take() {
            self.accumulated += now.saturating_duration_since(t0);
        }
    }

    /// Zero the elapsed time and stop advancing
    ///
    /// The duration is kept; track changes call `set_duration` afterwards.
    pub fn reset(&mut self) {
        self.accumulated = Duration::ZERO;
        self.started_at = None;
        self.ended = false;
    }

    /// Set the duration of the active track
    pub fn set_duration(&mut self, duration: Option<Duration>) {
        self.duration = duration;
    }

    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }

    /// Whether elapsed time is currently advancing
    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    /// Whether end-of-track has been signalled
    pub fn has_ended(&self) -> bool {
        self.ended
    }

    /// Elapsed playback time at `now`, clamped to `[0, duration]`
    pub fn sample(&self, now: Instant) -> Duration {
        let running = self
            .started_at
            .map_or(Duration::ZERO, |t0| now.saturating_duration_since(t0));
        let elapsed = self.accumulated + running;

        match self.duration {
            Some(duration) => elapsed.min(duration),
            None => elapsed,
        }
    }

    /// Snapshot at `now`
    pub fn snapshot(&self, now: Instant) -> ProgressSnapshot {
        let elapsed = self.sample(now);
        ProgressSnapshot {
            elapsed,
            duration: self.duration,
            fraction: self.fraction_of(elapsed),
        }
    }

    /// Poll once per frame
    ///
    /// Once elapsed reaches the duration the tracker freezes at the end,
    /// returns `Ended` once, then `Finished` on every later poll.
    pub fn poll(&mut self, now: Instant) -> ProgressTick {
        if self.ended {
            return ProgressTick::Finished;
        }

        let Some(duration) = self.duration.filter(|d| !d.is_zero()) else {
            return ProgressTick::Unknown;
        };

        let elapsed = self.sample(now);
        if elapsed >= duration {
            self.ended = true;
            self.started_at = None;
            self.accumulated = duration;
            return ProgressTick::Ended { elapsed: duration };
        }

        ProgressTick::Advanced {
            elapsed,
            fraction: elapsed.as_secs_f64() / duration.as_secs_f64(),
        }
    }

    fn fraction_of(&self, elapsed: Duration) -> Option<f64> {
        let duration = self.duration.filter(|d| !d.is_zero())?;
        Some((elapsed.as_secs_f64() / duration.as_secs_f64()).clamp(0.0, 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: f64) -> Duration {
        Duration::from_secs_f64(s)
    }

    #[test]
    fn starts_at_zero() {
        let tracker = ProgressTracker::new();
        let now = Instant::now();
        assert_eq!(tracker.sample(now), Duration::ZERO);
        assert!(!tracker.is_running());
    }

    #[test]
    fn advances_while_running() {
        let mut tracker = ProgressTracker::new();
        let t0 = Instant::now();
        tracker.start(t0);

        assert_eq!(tracker.sample(t0 + secs(1.5)), secs(1.5));
    }

    #[test]
    fn pause_freezes_elapsed() {
        let mut tracker = ProgressTracker::new();
        let t0 = Instant::now();
        tracker.start(t0);
        tracker.pause(t0 + secs(2.0));

        assert_eq!(tracker.sample(t0 + secs(10.0)), secs(2.0));
        assert!(!tracker.is_running());
    }

    #[test]
    fn resume_continues_from_frozen_elapsed() {
        let mut tracker = ProgressTracker::new();
        let t0 = Instant::now();
        tracker.start(t0);
        tracker.pause(t0 + secs(2.0));
        tracker.start(t0 + secs(5.0));

        assert_eq!(tracker.sample(t0 + secs(5.0)), secs(2.0));
        assert_eq!(tracker.sample(t0 + secs(6.0)), secs(3.0));
    }

    #[test]
    fn start_while_running_keeps_reference() {
        let mut tracker = ProgressTracker::new();
        let t0 = Instant::now();
        tracker.start(t0);
        tracker.start(t0 + secs(3.0));

        assert_eq!(tracker.sample(t0 + secs(4.0)), secs(4.0));
    }

    #[test]
    fn clamps_to_duration() {
        let mut tracker = ProgressTracker::new();
        tracker.set_duration(Some(secs(3.0)));
        let t0 = Instant::now();
        tracker.start(t0);

        assert_eq!(tracker.sample(t0 + secs(30.0)), secs(3.0));
        assert_eq!(tracker.snapshot(t0 + secs(30.0)).fraction, Some(1.0));
    }

    #[test]
    fn reset_zeroes() {
        let mut tracker = ProgressTracker::new();
        let t0 = Instant::now();
        tracker.start(t0);
        tracker.pause(t0 + secs(4.0));
        tracker.reset();

        assert_eq!(tracker.sample(t0 + secs(8.0)), Duration::ZERO);
        assert!(!tracker.has_ended());
    }

    #[test]
    fn poll_without_duration_is_unknown() {
        let mut tracker = ProgressTracker::new();
        let t0 = Instant::now();
        tracker.start(t0);
        assert_eq!(tracker.poll(t0 + secs(1.0)), ProgressTick::Unknown);
    }

    #[test]
    fn poll_reports_fraction() {
        let mut tracker = ProgressTracker::new();
        tracker.set_duration(Some(secs(4.0)));
        let t0 = Instant::now();
        tracker.start(t0);

        match tracker.poll(t0 + secs(1.0)) {
            ProgressTick::Advanced { elapsed, fraction } => {
                assert_eq!(elapsed, secs(1.0));
                assert!((fraction - 0.25).abs() < 1e-9);
            }
            other => panic!("unexpected tick {:?}", other),
        }
    }

    #[test]
    fn end_is_signalled_exactly_once() {
        let mut tracker = ProgressTracker::new();
        tracker.set_duration(Some(secs(2.0)));
        let t0 = Instant::now();
        tracker.start(t0);

        assert_eq!(
            tracker.poll(t0 + secs(2.5)),
            ProgressTick::Ended { elapsed: secs(2.0) }
        );
        assert_eq!(tracker.poll(t0 + secs(3.0)), ProgressTick::Finished);
        assert_eq!(tracker.poll(t0 + secs(9.0)), ProgressTick::Finished);
        assert!(tracker.has_ended());
        assert!(!tracker.is_running());
        assert_eq!(tracker.sample(t0 + secs(9.0)), secs(2.0));
    }

    #[test]
    fn reset_rearms_end_signal() {
        let mut tracker = ProgressTracker::new();
        tracker.set_duration(Some(secs(1.0)));
        let t0 = Instant::now();
        tracker.start(t0);
        assert!(matches!(tracker.poll(t0 + secs(1.0)), ProgressTick::Ended { .. }));

        tracker.reset();
        tracker.start(t0 + secs(2.0));
        assert!(matches!(tracker.poll(t0 + secs(3.5)), ProgressTick::Ended { .. }));
    }
}
