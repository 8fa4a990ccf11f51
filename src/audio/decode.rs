//! Recorded bytes → 16 kHz mono waveform.
//!
//! ```text
//!  bytes + ContainerFormat
//!        │
//!        ├─ RawF32Le ───────────▶ f32 LE frames ─┐
//!        │                                       │
//!        └─ Wav/Ogg/WebM/Flac/Mp3                ├─▶ downmix ─▶ resample_to_16k ─▶ WaveformBuffer
//!             signature check ─▶ symphonia ──────┘
//! ```
//!
//! Decoding is CPU-bound and synchronous; async callers should run it under
//! `tokio::task::spawn_blocking`.

use std::fmt;
use std::io::Cursor;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use thiserror::Error;

use super::resample::{downmix, resample_to_16k, Mixdown, TARGET_SAMPLE_RATE};
use super::waveform::WaveformBuffer;

// ---------------------------------------------------------------------------
// ContainerFormat
// ---------------------------------------------------------------------------

/// Encoding of a captured byte stream, as declared by the capture device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerFormat {
    /// Headerless interleaved 32-bit float little-endian PCM.
    RawF32Le { sample_rate: u32, channels: u16 },
    Wav,
    Ogg,
    WebM,
    Flac,
    Mp3,
}

impl ContainerFormat {
    /// File extension used as a probe hint; `None` for raw PCM.
    pub fn extension(&self) -> Option<&'static str> {
        match self {
            Self::RawF32Le { .. } => None,
            Self::Wav => Some("wav"),
            Self::Ogg => Some("ogg"),
            Self::WebM => Some("webm"),
            Self::Flac => Some("flac"),
            Self::Mp3 => Some("mp3"),
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::RawF32Le { .. } => "audio/pcm",
            Self::Wav => "audio/wav",
            Self::Ogg => "audio/ogg",
            Self::WebM => "audio/webm",
            Self::Flac => "audio/flac",
            Self::Mp3 => "audio/mpeg",
        }
    }

    /// `true` when `bytes` start with this container's magic number.
    fn matches_signature(&self, bytes: &[u8]) -> bool {
        match self {
            Self::RawF32Le { .. } => true,
            Self::Wav => bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WAVE",
            Self::Ogg => bytes.starts_with(b"OggS"),
            Self::WebM => bytes.starts_with(&[0x1A, 0x45, 0xDF, 0xA3]),
            Self::Flac => bytes.starts_with(b"fLaC"),
            Self::Mp3 => {
                bytes.starts_with(b"ID3")
                    || (bytes.len() >= 2 && bytes[0] == 0xFF && bytes[1] & 0xE0 == 0xE0)
            }
        }
    }
}

impl fmt::Display for ContainerFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RawF32Le {
                sample_rate,
                channels,
            } => write!(f, "raw f32le {sample_rate} Hz x{channels}"),
            other => f.write_str(other.extension().unwrap_or("raw")),
        }
    }
}

// ---------------------------------------------------------------------------
// DecodeError
// ---------------------------------------------------------------------------

/// Errors that can occur while turning recorded bytes into a waveform.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    #[error("no audio data was captured")]
    Empty,

    #[error("data is not a valid {0} stream")]
    ContainerMismatch(ContainerFormat),

    #[error("raw PCM length {len} is not a whole number of {channels}-channel f32 frames")]
    TruncatedFrame { len: usize, channels: u16 },

    #[error("invalid stream parameters: {0}")]
    InvalidParameters(String),

    #[error("failed to probe container: {0}")]
    Probe(String),

    #[error("container has no decodable audio track")]
    NoTrack,

    #[error("unsupported codec: {0}")]
    UnsupportedCodec(String),

    #[error("failed to read audio packet: {0}")]
    Packet(String),

    #[error("stream contained no audio samples")]
    NoSamples,

    #[error("resampling failed: {0}")]
    Resample(String),
}

// ---------------------------------------------------------------------------
// decode
// ---------------------------------------------------------------------------

/// Decode `bytes` declared as `format` into 16 kHz mono samples.
///
/// Multi-channel audio is reduced with `mixdown` before resampling.
pub fn decode(
    bytes: &[u8],
    format: ContainerFormat,
    mixdown: Mixdown,
) -> Result<WaveformBuffer, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::Empty);
    }
    if !format.matches_signature(bytes) {
        return Err(DecodeError::ContainerMismatch(format));
    }

    let (mono, source_rate) = match format {
        ContainerFormat::RawF32Le {
            sample_rate,
            channels,
        } => (decode_raw(bytes, sample_rate, channels, mixdown)?, sample_rate),
        _ => decode_container(bytes, format, mixdown)?,
    };

    if mono.is_empty() {
        return Err(DecodeError::NoSamples);
    }

    let samples = resample_to_16k(&mono, source_rate)?;
    log::debug!(
        "decode: {} bytes of {format} -> {} samples ({:.2}s)",
        bytes.len(),
        samples.len(),
        samples.len() as f32 / TARGET_SAMPLE_RATE as f32
    );

    Ok(WaveformBuffer::new(samples, TARGET_SAMPLE_RATE))
}

fn decode_raw(
    bytes: &[u8],
    sample_rate: u32,
    channels: u16,
    mixdown: Mixdown,
) -> Result<Vec<f32>, DecodeError> {
    if sample_rate == 0 || channels == 0 {
        return Err(DecodeError::InvalidParameters(format!(
            "raw PCM needs a non-zero rate and channel count (got {sample_rate} Hz, {channels} ch)"
        )));
    }

    let frame_len = 4 * channels as usize;
    if bytes.len() % frame_len != 0 {
        return Err(DecodeError::TruncatedFrame {
            len: bytes.len(),
            channels,
        });
    }

    let interleaved: Vec<f32> = bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();

    Ok(downmix(&interleaved, channels, mixdown))
}

/// Probe and decode a container with symphonia; returns mono samples and
/// their native rate.
fn decode_container(
    bytes: &[u8],
    format: ContainerFormat,
    mixdown: Mixdown,
) -> Result<(Vec<f32>, u32), DecodeError> {
    let cursor = Cursor::new(bytes.to_vec());
    let mss = MediaSourceStream::new(Box::new(cursor), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = format.extension() {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| DecodeError::Probe(e.to_string()))?;
    let mut reader = probed.format;

    let track = reader.default_track().ok_or(DecodeError::NoTrack)?;
    let track_id = track.id;
    let codec_params = track.codec_params.clone();

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| DecodeError::UnsupportedCodec(e.to_string()))?;

    let mut source_rate = codec_params.sample_rate;
    let mut mono: Vec<f32> = Vec::new();

    loop {
        let packet = match reader.next_packet() {
            Ok(p) => p,
            Err(SymphoniaError::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => return Err(DecodeError::Packet(e.to_string())),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(SymphoniaError::DecodeError(e)) => {
                log::warn!("decode: skipping corrupt frame: {e}");
                continue;
            }
            Err(e) => return Err(DecodeError::Packet(e.to_string())),
        };

        let spec = *decoded.spec();
        let frames = decoded.frames();
        if frames == 0 {
            continue;
        }
        source_rate.get_or_insert(spec.rate);

        let mut buf = SampleBuffer::<f32>::new(frames as u64, spec);
        buf.copy_interleaved_ref(decoded);
        let channels = spec.channels.count() as u16;
        mono.extend(downmix(buf.samples(), channels, mixdown));
    }

    let rate = source_rate
        .ok_or_else(|| DecodeError::InvalidParameters("container has no sample rate".into()))?;
    Ok((mono, rate))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::encode_wav;

    fn raw_bytes(samples: &[f32]) -> Vec<u8> {
        samples.iter().flat_map(|s| s.to_le_bytes()).collect()
    }

    // ---- Raw PCM ---------------------------------------------------------

    #[test]
    fn raw_16k_mono_passes_through() {
        let samples = vec![0.0_f32, 0.25, -0.5, 1.0];
        let fmt = ContainerFormat::RawF32Le {
            sample_rate: 16_000,
            channels: 1,
        };
        let out = decode(&raw_bytes(&samples), fmt, Mixdown::FirstChannel).unwrap();
        assert_eq!(out.sample_rate, 16_000);
        assert_eq!(out.samples, samples);
    }

    #[test]
    fn raw_stereo_uses_mixdown_policy() {
        let interleaved = vec![0.5_f32, 0.1, -0.5, 0.3];
        let fmt = ContainerFormat::RawF32Le {
            sample_rate: 16_000,
            channels: 2,
        };
        let first = decode(&raw_bytes(&interleaved), fmt, Mixdown::FirstChannel).unwrap();
        assert_eq!(first.samples, vec![0.5, -0.5]);

        let avg = decode(&raw_bytes(&interleaved), fmt, Mixdown::Average).unwrap();
        assert!((avg.samples[0] - 0.3).abs() < 1e-6);
        assert!((avg.samples[1] + 0.1).abs() < 1e-6);
    }

    #[test]
    fn raw_48k_is_resampled() {
        let fmt = ContainerFormat::RawF32Le {
            sample_rate: 48_000,
            channels: 1,
        };
        let out = decode(&raw_bytes(&vec![0.0; 4_800]), fmt, Mixdown::FirstChannel).unwrap();
        assert_eq!(out.sample_rate, TARGET_SAMPLE_RATE);
        assert!(out.samples.len().abs_diff(1_600) <= 1);
    }

    #[test]
    fn raw_partial_frame_is_rejected() {
        let fmt = ContainerFormat::RawF32Le {
            sample_rate: 16_000,
            channels: 2,
        };
        let err = decode(&[0u8; 12], fmt, Mixdown::FirstChannel).unwrap_err();
        assert_eq!(
            err,
            DecodeError::TruncatedFrame {
                len: 12,
                channels: 2
            }
        );
    }

    #[test]
    fn raw_zero_channels_is_rejected() {
        let fmt = ContainerFormat::RawF32Le {
            sample_rate: 16_000,
            channels: 0,
        };
        assert!(matches!(
            decode(&[0u8; 8], fmt, Mixdown::FirstChannel),
            Err(DecodeError::InvalidParameters(_))
        ));
    }

    #[test]
    fn empty_bytes_are_rejected() {
        assert_eq!(
            decode(&[], ContainerFormat::Wav, Mixdown::FirstChannel),
            Err(DecodeError::Empty)
        );
    }

    // ---- Container signatures --------------------------------------------

    #[test]
    fn garbage_declared_as_wav_is_a_mismatch() {
        let err = decode(b"not a wave file", ContainerFormat::Wav, Mixdown::FirstChannel)
            .unwrap_err();
        assert_eq!(err, DecodeError::ContainerMismatch(ContainerFormat::Wav));
    }

    #[test]
    fn wav_bytes_declared_as_ogg_are_a_mismatch() {
        let wav = encode_wav(&[0.0; 16], 16_000).unwrap();
        assert!(matches!(
            decode(&wav, ContainerFormat::Ogg, Mixdown::FirstChannel),
            Err(DecodeError::ContainerMismatch(ContainerFormat::Ogg))
        ));
    }

    #[test]
    fn signatures() {
        assert!(ContainerFormat::Ogg.matches_signature(b"OggS\0\x02"));
        assert!(ContainerFormat::Flac.matches_signature(b"fLaC\0\0\0\x22"));
        assert!(ContainerFormat::WebM.matches_signature(&[0x1A, 0x45, 0xDF, 0xA3, 0x01]));
        assert!(ContainerFormat::Mp3.matches_signature(b"ID3\x04"));
        assert!(ContainerFormat::Mp3.matches_signature(&[0xFF, 0xFB, 0x90]));
        assert!(!ContainerFormat::Mp3.matches_signature(&[0xFF, 0x00]));
        assert!(!ContainerFormat::Wav.matches_signature(b"RIFF"));
    }

    // ---- Container decode ------------------------------------------------

    #[test]
    fn wav_container_decodes_to_16k() {
        let samples: Vec<f32> = (0..1_600).map(|i| ((i as f32) * 0.01).sin() * 0.5).collect();
        let wav = encode_wav(&samples, 16_000).unwrap();

        let out = decode(&wav, ContainerFormat::Wav, Mixdown::FirstChannel).unwrap();
        assert_eq!(out.sample_rate, 16_000);
        assert_eq!(out.samples.len(), samples.len());
        for (a, b) in samples.iter().zip(&out.samples) {
            assert!((a - b).abs() < 1e-3, "{a} vs {b}");
        }
    }

    #[test]
    fn wav_container_at_8k_is_upsampled() {
        let wav = encode_wav(&vec![0.0; 800], 8_000).unwrap();
        let out = decode(&wav, ContainerFormat::Wav, Mixdown::FirstChannel).unwrap();
        assert!(out.samples.len().abs_diff(1_600) <= 1);
    }

    #[test]
    fn display_names() {
        assert_eq!(ContainerFormat::Wav.to_string(), "wav");
        assert_eq!(
            ContainerFormat::RawF32Le {
                sample_rate: 48_000,
                channels: 2
            }
            .to_string(),
            "raw f32le 48000 Hz x2"
        );
    }
}
