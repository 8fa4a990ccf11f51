//! Audio pipeline: microphone capture, decoding to 16 kHz mono, and WAV
//! encoding for playback.
//!
//! # Pipeline
//!
//! ```text
//! AudioDevice ─▶ RawChunk (mpsc) ─▶ CaptureSession::finish ─▶ CapturedAudio
//!            ─▶ decode (symphonia / raw f32) ─▶ downmix ─▶ resample_to_16k
//!            ─▶ WaveformBuffer (16 kHz mono) ─▶ recognizer
//!
//! synthesizer ─▶ WaveformBuffer ─▶ encode_wav ─▶ playable bytes
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use phono_coach::audio::{
//!     decode, CaptureSession, CpalDevice, MicrophoneLock, Mixdown, SessionId,
//! };
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let device = CpalDevice::default();
//! let session = CaptureSession::start(SessionId(1), &MicrophoneLock::global(), &device).await?;
//! // ... speak ...
//! let captured = session.finish().await?;
//! let waveform = decode(&captured.bytes, captured.format, Mixdown::FirstChannel)?;
//! println!("{:.1}s of audio", waveform.duration_secs());
//! # Ok(()) }
//! ```

pub mod capture;
pub mod decode;
pub mod resample;
pub mod session;
pub mod wav;
pub mod waveform;

pub use capture::{AudioDevice, CaptureError, CpalDevice, DeviceStream, RawChunk};
pub use decode::{decode, ContainerFormat, DecodeError};
pub use resample::{downmix, resample_to_16k, Mixdown, TARGET_SAMPLE_RATE};
pub use session::{
    CaptureSession, CapturedAudio, MicrophoneLease, MicrophoneLock, SessionId,
};
pub use wav::{encode_wav, WavError, WAV_HEADER_LEN};
pub use waveform::WaveformBuffer;
