//! Speech recognition: the recognizer seam plus a Whisper backend.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │               SpeechRecognizer (trait)                  │
//! │                                                        │
//! │   ┌─────────────┐    ┌────────────────────┐            │
//! │   │ ModelPaths   │    │ WhisperRecognizer  │            │
//! │   │ - resolve    │───▶│ - ctx              │            │
//! │   │ - exists?    │    └─────────┬──────────┘            │
//! │   └─────────────┘              │                       │
//! │                                ▼                       │
//! │              transcribe(WaveformBuffer@16k,            │
//! │                         RecognitionParams) → text      │
//! └────────────────────────────────────────────────────────┘
//! ```
//!
//! # Quick start
//!
//! ```rust,no_run
//! use phono_coach::audio::WaveformBuffer;
//! use phono_coach::recognition::{RecognitionParams, SpeechRecognizer, WhisperRecognizer};
//!
//! let recognizer = WhisperRecognizer::load("models/ggml-tiny.bin", false)
//!     .expect("model not found");
//! let audio = WaveformBuffer::new(vec![0.0; 16_000], 16_000);
//! let text = recognizer.transcribe(&audio, &RecognitionParams::default()).unwrap();
//! println!("{text}");
//! ```

pub mod engine;
pub mod model;
pub mod params;

pub use engine::{RecognitionError, SpeechRecognizer, UnavailableRecognizer, WhisperRecognizer};
pub use model::{
    find_model_by_id, ModelInfo, ModelPaths, ModelSize, DEFAULT_MODEL_ID, WHISPER_MODELS,
};
pub use params::{RecognitionParams, SamplingStrategy, Task};

#[cfg(test)]
pub use engine::MockRecognizer;
