/// In-memory audio decoding using Symphonia
use crate::error::{DecodeError, Result};
use orcplay_playback::{AudioDecoder, DecodedAudio};
use std::io::Cursor;
use std::time::Duration;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

/// Decodes a whole buffer to the first channel's samples
///
/// Supports: MP3, FLAC, OGG, WAV, AAC
///
/// Only the first channel is kept; the result feeds waveform peaks and the
/// track duration, not playback.
#[derive(Debug, Clone, Copy, Default)]
pub struct SymphoniaDecoder;

impl SymphoniaDecoder {
    pub fn new() -> Self {
        Self
    }

    /// Decode `bytes`, using `extension` as a format hint
    pub fn decode_bytes(&self, bytes: &[u8], extension: Option<&str>) -> Result<DecodedAudio> {
        let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes.to_vec())), Default::default());

        // Create a hint to help the format registry guess the format
        let mut hint = Hint::new();
        if let Some(ext) = extension {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| DecodeError::UnsupportedFormat(e.to_string()))?;
        let mut format = probed.format;

        let track = format.default_track().ok_or(DecodeError::NoAudioTrack)?;
        let track_id = track.id;
        let mut sample_rate = track.codec_params.sample_rate.unwrap_or(0);
        let mut channels = track
            .codec_params
            .channels
            .map_or(0, |c| c.count() as u16);
        let n_frames = track.codec_params.n_frames;

        let mut decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| DecodeError::UnsupportedCodec(e.to_string()))?;

        let mut samples = Vec::new();
        let mut frames: u64 = 0;

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    break;
                }
                Err(SymphoniaError::ResetRequired) => break,
                Err(e) => return Err(DecodeError::Stream(e.to_string())),
            };

            if packet.track_id() != track_id {
                continue;
            }

            let decoded = match decoder.decode(&packet) {
                Ok(decoded) => decoded,
                // Corrupt packet; keep going
                Err(SymphoniaError::DecodeError(e)) => {
                    warn!(error = %e, "skipping undecodable packet");
                    continue;
                }
                Err(e) => return Err(DecodeError::Stream(e.to_string())),
            };

            let spec = *decoded.spec();
            sample_rate = spec.rate;
            channels = spec.channels.count() as u16;
            frames += decoded.frames() as u64;

            let mut buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
            buffer.copy_interleaved_ref(decoded);
            let stride = usize::from(channels.max(1));
            samples.extend(buffer.samples().iter().step_by(stride).copied());
        }

        if sample_rate == 0 {
            return Err(DecodeError::Stream("unknown sample rate".to_string()));
        }

        let total_frames = n_frames.unwrap_or(frames);
        let duration = Duration::from_secs_f64(total_frames as f64 / f64::from(sample_rate));
        debug!(sample_rate, channels, frames, ?duration, "decoded audio");

        Ok(DecodedAudio {
            duration,
            sample_rate,
            channels,
            samples,
        })
    }
}

impl AudioDecoder for SymphoniaDecoder {
    fn decode(
        &self,
        bytes: &[u8],
        extension: Option<&str>,
    ) -> orcplay_playback::Result<DecodedAudio> {
        Ok(self.decode_bytes(bytes, extension)?)
    }
}
