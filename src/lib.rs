//! Pronunciation practice engine.
//!
//! A learner reads a target sentence aloud; the recording is decoded to mono
//! 16 kHz, transcribed by Whisper, and compared word by word against the
//! target.  The result is a per-word alignment plus an accuracy percentage.
//!
//! ```text
//! microphone ─▶ audio::CaptureSession ─▶ audio::decode ─▶ recognition
//!                                                             │
//! target text ─▶ text::normalize ─▶ scoring::align ◀──────────┘
//!                                        │
//!                                        ▼
//!                                 scoring::Scorer ─▶ pipeline::PracticeReport
//!
//! text ─▶ synthesis::ReadAloud ─▶ audio::WaveformBuffer::to_wav ─▶ playable clip
//! ```

pub mod audio;
pub mod config;
pub mod pipeline;
pub mod recognition;
pub mod scoring;
pub mod synthesis;
pub mod text;
