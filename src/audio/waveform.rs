//! Owned mono sample buffer passed between pipeline stages.
//!
//! A [`WaveformBuffer`] is produced by the decoder (16 kHz, for recognition)
//! or by a speech synthesizer (model-defined rate, for playback).  It is
//! moved from stage to stage, never shared.

use super::wav::{encode_wav, WavError};

/// Mono `f32` samples plus their sample rate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WaveformBuffer {
    /// Mono PCM samples, nominally in `[-1.0, 1.0]`.
    pub samples: Vec<f32>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
}

impl WaveformBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Playback length in seconds; `0.0` when the rate is unknown.
    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / self.sample_rate as f32
    }

    /// Encode as a 16-bit PCM WAV file.
    pub fn to_wav(&self) -> Result<Vec<u8>, WavError> {
        encode_wav(&self.samples, self.sample_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_of_half_second() {
        let buf = WaveformBuffer::new(vec![0.0; 8_000], 16_000);
        assert!((buf.duration_secs() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn zero_rate_has_zero_duration() {
        let buf = WaveformBuffer::new(vec![0.0; 10], 0);
        assert_eq!(buf.duration_secs(), 0.0);
    }

    #[test]
    fn to_wav_matches_encoder() {
        let buf = WaveformBuffer::new(vec![0.25, -0.25], 24_000);
        assert_eq!(
            buf.to_wav().unwrap(),
            encode_wav(&[0.25, -0.25], 24_000).unwrap()
        );
    }
}
