//! Canonical RIFF/WAVE encoder for synthesized speech.
//!
//! [`encode_wav`] always produces the same 44-byte header followed by mono
//! 16-bit little-endian PCM:
//!
//! | Offset | Size | Value |
//! |--------|------|-------|
//! | 0  | 4 | `"RIFF"` |
//! | 4  | 4 | `36 + 2·n` (file size − 8) |
//! | 8  | 4 | `"WAVE"` |
//! | 12 | 4 | `"fmt "` |
//! | 16 | 4 | `16` (fmt chunk size) |
//! | 20 | 2 | `1` (PCM) |
//! | 22 | 2 | `1` (mono) |
//! | 24 | 4 | sample rate |
//! | 28 | 4 | sample rate × 2 (byte rate) |
//! | 32 | 2 | `2` (block align) |
//! | 34 | 2 | `16` (bits per sample) |
//! | 36 | 4 | `"data"` |
//! | 40 | 4 | `2·n` (data size) |
//! | 44 | 2·n | samples |
//!
//! Browsers and media players rely on this exact layout.  `hound` writes
//! the header; this module owns the sample scaling.

use std::io::Cursor;

use hound::{SampleFormat, WavSpec, WavWriter};
use thiserror::Error;

/// Size of the fixed RIFF + fmt + data header in bytes.
pub const WAV_HEADER_LEN: usize = 44;

/// Errors from [`encode_wav`].
#[derive(Debug, Error)]
pub enum WavError {
    /// The writer refused the stream, e.g. the data chunk would exceed the
    /// 32-bit RIFF size fields.
    #[error("failed to write WAV stream: {0}")]
    Write(#[from] hound::Error),
}

/// Encode mono `samples` at `sample_rate` Hz into a playable WAV byte stream.
///
/// Each sample is clamped to `[-1, 1]`; negative values are scaled by
/// `32768`, non-negative values by `32767`, and the product is truncated
/// towards zero.  `NaN` encodes as silence.
///
/// The header is written by `hound`, which rejects a stream too large for
/// the 32-bit size fields instead of wrapping them.
///
/// ```rust
/// use phono_coach::audio::encode_wav;
///
/// let wav = encode_wav(&[0.0, 1.0, -1.0], 16_000).unwrap();
/// assert_eq!(wav.len(), 44 + 6);
/// assert_eq!(&wav[0..4], b"RIFF");
/// assert_eq!(&wav[46..48], &32_767_i16.to_le_bytes());
/// ```
pub fn encode_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>, WavError> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::with_capacity(WAV_HEADER_LEN + samples.len() * 2));
    let mut writer = WavWriter::new(&mut cursor, spec)?;
    for &sample in samples {
        writer.write_sample(float_to_pcm16(sample))?;
    }
    writer.finalize()?;

    Ok(cursor.into_inner())
}

/// Asymmetric float → i16 conversion so both `-1.0` and `1.0` reach full
/// scale.
fn float_to_pcm16(sample: f32) -> i16 {
    let s = f64::from(sample).clamp(-1.0, 1.0);
    let scaled = if s < 0.0 { s * 32_768.0 } else { s * 32_767.0 };
    // `as` truncates towards zero and maps NaN to 0.
    scaled as i16
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn u16_at(bytes: &[u8], at: usize) -> u16 {
        u16::from_le_bytes([bytes[at], bytes[at + 1]])
    }

    fn u32_at(bytes: &[u8], at: usize) -> u32 {
        u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
    }

    fn i16_at(bytes: &[u8], at: usize) -> i16 {
        i16::from_le_bytes([bytes[at], bytes[at + 1]])
    }

    // ---- Header layout -------------------------------------------------------

    #[test]
    fn header_fields_are_canonical() {
        let wav = encode_wav(&[0.0; 10], 22_050).unwrap();

        assert_eq!(wav.len(), WAV_HEADER_LEN + 20);
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(u32_at(&wav, 4), 36 + 20);
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(&wav[12..16], b"fmt ");
        assert_eq!(u32_at(&wav, 16), 16);
        assert_eq!(u16_at(&wav, 20), 1);
        assert_eq!(u16_at(&wav, 22), 1);
        assert_eq!(u32_at(&wav, 24), 22_050);
        assert_eq!(u32_at(&wav, 28), 44_100);
        assert_eq!(u16_at(&wav, 32), 2);
        assert_eq!(u16_at(&wav, 34), 16);
        assert_eq!(&wav[36..40], b"data");
        assert_eq!(u32_at(&wav, 40), 20);
    }

    #[test]
    fn empty_input_is_header_only() {
        let wav = encode_wav(&[], 16_000).unwrap();
        assert_eq!(wav.len(), WAV_HEADER_LEN);
        assert_eq!(u32_at(&wav, 4), 36);
        assert_eq!(u32_at(&wav, 40), 0);
    }

    // ---- Sample scaling ------------------------------------------------------

    #[test]
    fn zero_and_full_scale_samples() {
        let wav = encode_wav(&[0.0, 1.0, -1.0], 16_000).unwrap();
        assert_eq!(&wav[44..46], &[0x00, 0x00]);
        assert_eq!(&wav[46..48], &32_767_i16.to_le_bytes());
        assert_eq!(&wav[48..50], &[0x00, 0x80]);
    }

    #[test]
    fn out_of_range_samples_are_clamped() {
        let wav = encode_wav(&[2.5, -7.0], 16_000).unwrap();
        assert_eq!(i16_at(&wav, 44), 32_767);
        assert_eq!(i16_at(&wav, 46), -32_768);
    }

    #[test]
    fn scaling_truncates_towards_zero() {
        // 0.5 × 32767 = 16383.5 → 16383; -0.5 × 32768 = -16384 exactly.
        // 0.00002 × 32767 ≈ 0.655 → 0; -0.00002 × 32768 ≈ -0.655 → 0.
        let wav = encode_wav(&[0.5, -0.5, 0.000_02, -0.000_02], 8_000).unwrap();
        assert_eq!(i16_at(&wav, 44), 16_383);
        assert_eq!(i16_at(&wav, 46), -16_384);
        assert_eq!(i16_at(&wav, 48), 0);
        assert_eq!(i16_at(&wav, 50), 0);
    }

    #[test]
    fn nan_encodes_as_silence() {
        let wav = encode_wav(&[f32::NAN], 16_000).unwrap();
        assert_eq!(i16_at(&wav, 44), 0);
    }

    #[test]
    fn bytes_match_a_plain_hound_writer() {
        let samples = [0.0_f32, 1.0, -1.0, 0.5, -0.25];
        let ours = encode_wav(&samples, 16_000).unwrap();

        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 16_000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for pcm in [0_i16, 32_767, -32_768, 16_383, -8_192] {
            writer.write_sample(pcm).unwrap();
        }
        writer.finalize().unwrap();

        assert_eq!(ours, cursor.into_inner());
    }

    // ---- Round trip through an independent reader -----------------------------

    #[test]
    fn hound_reads_back_spec_and_samples() {
        let samples: Vec<f32> = (0..1_000)
            .map(|i| ((i as f32) * 0.05).sin() * 0.8)
            .collect();
        let wav = encode_wav(&samples, 16_000).unwrap();

        let mut reader = hound::WavReader::new(Cursor::new(wav)).expect("valid wav");
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 16_000);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(spec.sample_format, hound::SampleFormat::Int);

        let decoded: Vec<i16> = reader
            .samples::<i16>()
            .collect::<Result<_, _>>()
            .expect("samples");
        assert_eq!(decoded.len(), samples.len());

        // One quantisation step on either side of zero.
        let step = 1.0 / 32_767.0;
        for (orig, pcm) in samples.iter().zip(&decoded) {
            let recovered = if *pcm < 0 {
                f32::from(*pcm) / 32_768.0
            } else {
                f32::from(*pcm) / 32_767.0
            };
            assert!(
                (orig - recovered).abs() <= step,
                "sample drift: {orig} vs {recovered}"
            );
        }
    }
}
