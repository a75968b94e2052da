/// Common test utilities and fixtures
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const SAMPLE_RATE: u32 = 8000;

/// Write a mono 16-bit sine WAV of `secs` seconds into `dir`
pub fn write_wav(dir: &Path, name: &str, secs: f64, amplitude: f32) -> PathBuf {
    let path = dir.join(name);
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&path, spec).unwrap();
    let frames = (secs * f64::from(SAMPLE_RATE)) as usize;
    for i in 0..frames {
        let t = i as f32 / SAMPLE_RATE as f32;
        let sample = (t * 440.0 * std::f32::consts::TAU).sin() * amplitude;
        writer.write_sample((sample * f32::from(i16::MAX)) as i16).unwrap();
    }
    writer.finalize().unwrap();
    path
}

/// Temp directory holding `count` short tracks named `track-N.wav`
pub fn short_tracks(count: usize, secs: f64) -> (TempDir, Vec<PathBuf>) {
    let dir = TempDir::new().unwrap();
    let paths = (0..count)
        .map(|i| write_wav(dir.path(), &format!("track-{i}.wav"), secs, 0.8))
        .collect();
    (dir, paths)
}
