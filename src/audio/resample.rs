//! Channel mixing and sample-rate conversion.
//!
//! The recognizer requires **16 kHz mono `f32`** audio.  This module
//! provides the two conversion steps:
//!
//! 1. [`downmix`]: reduce interleaved channels to mono per a [`Mixdown`]
//!    policy.
//! 2. [`resample_to_16k`]: band-limited sinc resampling (rubato
//!    `SincFixedIn`, Blackman-Harris window) from any source rate.

use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use serde::{Deserialize, Serialize};

use super::decode::DecodeError;

/// Sample rate expected by the recognizer.
pub const TARGET_SAMPLE_RATE: u32 = 16_000;

/// Frames fed to the resampler per call.
const CHUNK_SIZE: usize = 1024;

// ---------------------------------------------------------------------------
// Mixdown
// ---------------------------------------------------------------------------

/// How multi-channel recordings are reduced to mono.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mixdown {
    /// Keep only channel 0.
    #[default]
    FirstChannel,
    /// Average every channel of each frame.
    Average,
}

/// Mix interleaved `channels`-channel audio down to mono.
///
/// The output length is `samples.len() / channels`; a trailing partial
/// frame is dropped.  `channels == 0` yields an empty vector.
///
/// ```rust
/// use phono_coach::audio::{downmix, Mixdown};
///
/// let stereo = vec![0.5_f32, -0.5, 0.2, 0.4]; // L R L R
/// assert_eq!(downmix(&stereo, 2, Mixdown::FirstChannel), vec![0.5, 0.2]);
/// let avg = downmix(&stereo, 2, Mixdown::Average);
/// assert!((avg[1] - 0.3).abs() < 1e-6);
/// ```
pub fn downmix(samples: &[f32], channels: u16, policy: Mixdown) -> Vec<f32> {
    match channels {
        0 => Vec::new(),
        1 => samples.to_vec(),
        n => {
            let n = n as usize;
            let frames = samples.chunks_exact(n);
            match policy {
                Mixdown::FirstChannel => frames.map(|frame| frame[0]).collect(),
                Mixdown::Average => frames
                    .map(|frame| frame.iter().sum::<f32>() / n as f32)
                    .collect(),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// resample_to_16k
// ---------------------------------------------------------------------------

/// Resample mono `samples` from `source_rate` Hz to 16 000 Hz.
///
/// * `source_rate == 16_000` returns the input unchanged.
/// * Empty input returns an empty vector.
/// * Otherwise the output has `round(len × 16000 / source_rate)` samples,
///   aligned with the input (the filter delay is removed).
pub fn resample_to_16k(samples: &[f32], source_rate: u32) -> Result<Vec<f32>, DecodeError> {
    if source_rate == 0 {
        return Err(DecodeError::InvalidParameters(
            "sample rate must be non-zero".into(),
        ));
    }
    if source_rate == TARGET_SAMPLE_RATE {
        return Ok(samples.to_vec());
    }
    if samples.is_empty() {
        return Ok(Vec::new());
    }

    let ratio = TARGET_SAMPLE_RATE as f64 / source_rate as f64;
    let expected_len = (samples.len() as f64 * ratio).round() as usize;

    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };
    let mut resampler = SincFixedIn::<f32>::new(ratio, 1.0, params, CHUNK_SIZE, 1)
        .map_err(|e| DecodeError::Resample(e.to_string()))?;

    let delay = resampler.output_delay();
    let wanted = expected_len + delay;
    let mut output = Vec::with_capacity(wanted + CHUNK_SIZE);

    let mut chunks = samples.chunks_exact(CHUNK_SIZE);
    for chunk in &mut chunks {
        let input = [chunk];
        let out = resampler
            .process(&input[..], None)
            .map_err(|e| DecodeError::Resample(e.to_string()))?;
        extend_first(&mut output, &out);
    }

    let rest = chunks.remainder();
    if !rest.is_empty() {
        let input = [rest];
        let out = resampler
            .process_partial(Some(&input[..]), None)
            .map_err(|e| DecodeError::Resample(e.to_string()))?;
        extend_first(&mut output, &out);
    }

    // Drain the filter tail with silence until the delayed signal is out.
    while output.len() < wanted {
        let out = resampler
            .process_partial(None::<&[&[f32]]>, None)
            .map_err(|e| DecodeError::Resample(e.to_string()))?;
        if !extend_first(&mut output, &out) {
            break;
        }
    }

    output.drain(..delay.min(output.len()));
    output.truncate(expected_len);

    log::trace!(
        "resample: {} samples @ {source_rate} Hz -> {} samples @ {TARGET_SAMPLE_RATE} Hz",
        samples.len(),
        output.len()
    );
    Ok(output)
}

/// Append the single channel of `out` to `output`; `false` if it was empty.
fn extend_first(output: &mut Vec<f32>, out: &[Vec<f32>]) -> bool {
    match out.first() {
        Some(channel) if !channel.is_empty() => {
            output.extend_from_slice(channel);
            true
        }
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // ---- downmix -------------------------------------------------------------

    #[test]
    fn downmix_mono_is_identity() {
        let input = vec![0.1_f32, 0.2, 0.3];
        assert_eq!(downmix(&input, 1, Mixdown::Average), input);
        assert_eq!(downmix(&input, 1, Mixdown::FirstChannel), input);
    }

    #[test]
    fn downmix_first_channel_takes_left() {
        let input = vec![1.0_f32, -1.0, 0.5, 0.25];
        assert_eq!(downmix(&input, 2, Mixdown::FirstChannel), vec![1.0, 0.5]);
    }

    #[test]
    fn downmix_average_two_channel() {
        let input = vec![1.0_f32, -1.0, 0.5, 0.5];
        let out = downmix(&input, 2, Mixdown::Average);
        assert_eq!(out.len(), 2);
        assert!((out[0] - 0.0).abs() < 1e-6);
        assert!((out[1] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn downmix_drops_partial_frame() {
        let input = vec![0.1_f32, 0.2, 0.3, 0.4, 0.5];
        assert_eq!(downmix(&input, 2, Mixdown::FirstChannel), vec![0.1, 0.3]);
    }

    #[test]
    fn downmix_zero_channels() {
        assert!(downmix(&[1.0_f32, 2.0], 0, Mixdown::Average).is_empty());
    }

    #[test]
    fn mixdown_defaults_to_first_channel() {
        assert_eq!(Mixdown::default(), Mixdown::FirstChannel);
    }

    // ---- resample_to_16k -----------------------------------------------------

    #[test]
    fn already_16k_is_noop() {
        let input: Vec<f32> = (0..160).map(|i| i as f32 / 160.0).collect();
        let out = resample_to_16k(&input, 16_000).unwrap();
        assert_eq!(out, input);
    }

    #[test]
    fn empty_input() {
        assert!(resample_to_16k(&[], 48_000).unwrap().is_empty());
    }

    #[test]
    fn zero_rate_is_rejected() {
        assert!(matches!(
            resample_to_16k(&[0.0; 10], 0),
            Err(DecodeError::InvalidParameters(_))
        ));
    }

    #[test]
    fn downsample_48k_output_length() {
        let out = resample_to_16k(&vec![0.0_f32; 4_800], 48_000).unwrap();
        assert!(out.len().abs_diff(1_600) <= 1, "got {}", out.len());
    }

    #[test]
    fn downsample_44100_output_length() {
        let out = resample_to_16k(&vec![0.0_f32; 44_100], 44_100).unwrap();
        assert!(out.len().abs_diff(16_000) <= 1, "got {}", out.len());
    }

    #[test]
    fn short_input_smaller_than_one_chunk() {
        let out = resample_to_16k(&vec![0.0_f32; 480], 48_000).unwrap();
        assert!(out.len().abs_diff(160) <= 1, "got {}", out.len());
    }

    #[test]
    fn upsample_8k_output_length() {
        let out = resample_to_16k(&vec![0.0_f32; 8_000], 8_000).unwrap();
        assert!(out.len().abs_diff(16_000) <= 1, "got {}", out.len());
    }

    #[test]
    fn constant_signal_keeps_level_away_from_edges() {
        let input = vec![0.5_f32; 48_000];
        let out = resample_to_16k(&input, 48_000).unwrap();
        for &s in &out[1_000..out.len() - 1_000] {
            assert!((s - 0.5).abs() < 0.02, "amplitude drift: {s}");
        }
    }
}
