//! Property-based tests for playlist, progress, meter and volume
//!
//! Uses proptest to verify invariants across many random inputs.

use orcplay_playback::level::display_percent;
use orcplay_playback::{
    LevelReading, PlaylistManager, ProgressTick, ProgressTracker, SeverityBand, Track, Volume,
    VolumeCurve, WaveformPeaks,
};
use proptest::prelude::*;
use std::time::{Duration, Instant};

// ===== Helpers =====

fn playlist_of(len: usize) -> PlaylistManager {
    let mut playlist = PlaylistManager::new();
    for i in 0..len {
        playlist.append(Track::new(format!("track{i}.wav"), vec![0u8; 4]));
    }
    playlist
}

#[derive(Debug, Clone)]
enum ClockOp {
    Start,
    Pause,
    Wait(u64),
}

fn clock_op() -> impl Strategy<Value = ClockOp> {
    prop_oneof![
        Just(ClockOp::Start),
        Just(ClockOp::Pause),
        (1u64..2_000).prop_map(ClockOp::Wait),
    ]
}

// ===== Property Tests =====

proptest! {
    /// Property: next then previous returns to the same track, and both wrap
    #[test]
    fn navigation_wraps_and_inverts(len in 1usize..20, start in 0usize..20) {
        let start = start % len;
        let mut playlist = playlist_of(len);
        playlist.select_at(start).unwrap();

        let next = playlist.next().unwrap();
        prop_assert_eq!(next, (start + 1) % len);
        let back = playlist.previous().unwrap();
        prop_assert_eq!(back, start);

        let previous = playlist.previous().unwrap();
        prop_assert_eq!(previous, (start + len - 1) % len);
    }

    /// Property: the active index stays valid through any removal sequence
    #[test]
    fn active_index_stays_valid(
        len in 1usize..20,
        selected in 0usize..20,
        removals in prop::collection::vec(0usize..20, 0..25)
    ) {
        let mut playlist = playlist_of(len);
        playlist.select_at(selected % len).unwrap();

        for index in removals {
            if playlist.is_empty() {
                break;
            }
            let index = index % playlist.len();
            playlist.remove(index).unwrap();

            match playlist.active_index() {
                Some(active) => prop_assert!(active < playlist.len()),
                None => prop_assert!(playlist.is_empty()),
            }
        }
    }

    /// Property: elapsed time never decreases and never exceeds the duration
    #[test]
    fn elapsed_is_monotonic_and_bounded(
        duration_ms in 1u64..10_000,
        ops in prop::collection::vec(clock_op(), 1..50)
    ) {
        let duration = Duration::from_millis(duration_ms);
        let mut tracker = ProgressTracker::new();
        tracker.set_duration(Some(duration));

        let mut now = Instant::now();
        let mut last = Duration::ZERO;
        let mut ended = 0;

        for op in ops {
            match op {
                ClockOp::Start => tracker.start(now),
                ClockOp::Pause => tracker.pause(now),
                ClockOp::Wait(ms) => now += Duration::from_millis(ms),
            }

            let elapsed = tracker.sample(now);
            prop_assert!(elapsed >= last, "elapsed went backwards");
            prop_assert!(elapsed <= duration);
            last = elapsed;

            match tracker.poll(now) {
                ProgressTick::Advanced { fraction, .. } => {
                    prop_assert!((0.0..1.0).contains(&fraction));
                }
                ProgressTick::Ended { elapsed } => {
                    ended += 1;
                    prop_assert_eq!(elapsed, duration);
                }
                ProgressTick::Finished | ProgressTick::Unknown => {}
            }
        }

        prop_assert!(ended <= 1, "end reported {} times", ended);
    }

    /// Property: display value stays in [0, 100] for any input
    #[test]
    fn meter_display_is_bounded(level in prop::num::f64::ANY) {
        let reading = LevelReading::from_level(level);
        prop_assert!((0.0..=100.0).contains(&reading.display_percent));
        prop_assert!((0.0..=1.0).contains(&reading.raw));
    }

    /// Property: louder never displays lower or classifies safer
    #[test]
    fn meter_is_monotonic(a in 0.0f64..=1.0, b in 0.0f64..=1.0) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(display_percent(lo) <= display_percent(hi));
        prop_assert!(SeverityBand::classify(lo) <= SeverityBand::classify(hi));
    }

    /// Property: gain is finite, within [0, 1], and rises with the level
    #[test]
    fn gain_is_bounded_and_monotonic(a in 0u8..=100, b in 0u8..=100, decibel in any::<bool>()) {
        let curve = if decibel { VolumeCurve::Decibel } else { VolumeCurve::Linear };
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let gain_lo = Volume::new(lo, curve).gain();
        let gain_hi = Volume::new(hi, curve).gain();

        prop_assert!(gain_lo.is_finite() && gain_hi.is_finite());
        prop_assert!((0.0..=1.0 + 1e-6).contains(&gain_hi));
        prop_assert!(gain_lo <= gain_hi);
    }

    /// Property: peaks have the requested width and min <= max
    #[test]
    fn peaks_are_well_formed(
        samples in prop::collection::vec(-1.0f32..=1.0, 1..5_000),
        columns in 1usize..400
    ) {
        let peaks = WaveformPeaks::from_samples(&samples, columns);
        prop_assert_eq!(peaks.len(), columns);
        for column in peaks.columns() {
            prop_assert!(column.min <= column.max);
            prop_assert!(column.min >= -1.0 && column.max <= 1.0);
        }
    }
}
