//! Speech recognizer trait and its Whisper implementation.
//!
//! # Overview
//!
//! [`SpeechRecognizer`] is the interface used by the practice pipeline.  It
//! is object-safe and `Send + Sync` so it can be held behind an
//! `Arc<dyn SpeechRecognizer>` and called from the blocking thread pool.
//!
//! [`WhisperRecognizer`] is the production implementation that wraps a
//! `whisper_rs::WhisperContext`.  Construct it with
//! [`WhisperRecognizer::load`].
//!
//! [`MockRecognizer`] (available under `#[cfg(test)]`) returns a
//! pre-configured response without a model file.

use std::path::Path;

use thiserror::Error;
use whisper_rs::{FullParams, WhisperContext, WhisperContextParameters};

use super::params::{RecognitionParams, SamplingStrategy, Task};
use crate::audio::{WaveformBuffer, TARGET_SAMPLE_RATE};

// ---------------------------------------------------------------------------
// RecognitionError
// ---------------------------------------------------------------------------

/// All errors that can arise from speech recognition.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecognitionError {
    #[error("model not found: {0}")]
    ModelNotFound(String),

    #[error("whisper context initialisation failed: {0}")]
    ContextInit(String),

    #[error("no speech recognizer is loaded: {0}")]
    Unavailable(String),

    #[error("audio is empty")]
    EmptyAudio,

    #[error("audio must be {expected} Hz mono, got {actual} Hz")]
    UnsupportedSampleRate { expected: u32, actual: u32 },

    #[error("transcription error: {0}")]
    Transcription(String),
}

// ---------------------------------------------------------------------------
// SpeechRecognizer trait
// ---------------------------------------------------------------------------

/// Object-safe, thread-safe interface for speech-to-text engines.
///
/// # Contract
///
/// - `audio` must be 16 kHz mono.  Anything else is
///   [`RecognitionError::UnsupportedSampleRate`].
/// - Empty audio is [`RecognitionError::EmptyAudio`].
/// - The returned text has no leading or trailing whitespace.
/// - Calls block; async callers use `tokio::task::spawn_blocking`.
pub trait SpeechRecognizer: Send + Sync {
    fn transcribe(
        &self,
        audio: &WaveformBuffer,
        params: &RecognitionParams,
    ) -> Result<String, RecognitionError>;
}

// Compile-time assertion: Box<dyn SpeechRecognizer> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn SpeechRecognizer>) {}
};

/// Enforce the input half of the recognizer contract.
pub(crate) fn check_input(audio: &WaveformBuffer) -> Result<(), RecognitionError> {
    if audio.sample_rate != TARGET_SAMPLE_RATE {
        return Err(RecognitionError::UnsupportedSampleRate {
            expected: TARGET_SAMPLE_RATE,
            actual: audio.sample_rate,
        });
    }
    if audio.is_empty() {
        return Err(RecognitionError::EmptyAudio);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// WhisperRecognizer
// ---------------------------------------------------------------------------

/// Production recognizer wrapping a `whisper_rs::WhisperContext`.
///
/// A new `WhisperState` is created for every call so the recognizer can be
/// shared across threads without locking.  whisper.cpp windows long audio
/// internally in 30 s segments, which matches the default
/// `chunk_length_secs`.
pub struct WhisperRecognizer {
    ctx: WhisperContext,
}

impl std::fmt::Debug for WhisperRecognizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhisperRecognizer").finish_non_exhaustive()
    }
}

// SAFETY: WhisperContext is Send+Sync as declared by whisper-rs; the model
// weights are read-only after loading.
unsafe impl Send for WhisperRecognizer {}
unsafe impl Sync for WhisperRecognizer {}

impl WhisperRecognizer {
    /// Load a GGML model from `model_path`.
    ///
    /// # Errors
    ///
    /// - [`RecognitionError::ModelNotFound`]: `model_path` does not exist.
    /// - [`RecognitionError::ContextInit`]: whisper-rs failed to load it.
    pub fn load(model_path: impl AsRef<Path>, use_gpu: bool) -> Result<Self, RecognitionError> {
        let path = model_path.as_ref();

        if !path.exists() {
            return Err(RecognitionError::ModelNotFound(path.display().to_string()));
        }

        let path_str = path.to_str().ok_or_else(|| {
            RecognitionError::ModelNotFound(format!(
                "model path contains non-UTF-8 characters: {}",
                path.display()
            ))
        })?;

        let mut ctx_params = WhisperContextParameters::default();
        ctx_params.use_gpu(use_gpu);
        let ctx = WhisperContext::new_with_params(path_str, ctx_params)
            .map_err(|e| RecognitionError::ContextInit(e.to_string()))?;

        log::info!("recognition: loaded {} (gpu: {use_gpu})", path.display());
        Ok(Self { ctx })
    }
}

impl SpeechRecognizer for WhisperRecognizer {
    fn transcribe(
        &self,
        audio: &WaveformBuffer,
        params: &RecognitionParams,
    ) -> Result<String, RecognitionError> {
        check_input(audio)?;

        use whisper_rs::SamplingStrategy as WS;
        let strategy = match params.strategy {
            SamplingStrategy::Greedy { best_of } => WS::Greedy { best_of },
            SamplingStrategy::BeamSearch {
                beam_size,
                patience,
            } => WS::BeamSearch {
                beam_size,
                patience,
            },
        };

        let mut fp = FullParams::new(strategy);
        fp.set_language(params.language_hint());
        fp.set_translate(params.task == Task::Translate);
        fp.set_n_threads(params.n_threads);
        fp.set_print_progress(false);
        fp.set_print_realtime(false);
        fp.set_print_special(false);
        fp.set_print_timestamps(false);

        let mut state = self
            .ctx
            .create_state()
            .map_err(|e| RecognitionError::ContextInit(e.to_string()))?;

        let started = std::time::Instant::now();
        log::debug!(
            "recognition: {:.2}s of audio, language {:?}, chunk {}s / stride {}s",
            audio.duration_secs(),
            params.language,
            params.chunk_length_secs,
            params.stride_secs
        );

        state
            .full(fp, &audio.samples)
            .map_err(|e| RecognitionError::Transcription(e.to_string()))?;

        let n_segments = state
            .full_n_segments()
            .map_err(|e| RecognitionError::Transcription(e.to_string()))?;

        let mut text = String::new();
        for i in 0..n_segments {
            let segment = state
                .full_get_segment_text(i)
                .map_err(|e| RecognitionError::Transcription(format!("segment {i}: {e}")))?;
            text.push_str(&segment);
        }

        log::debug!(
            "recognition: {n_segments} segments in {} ms",
            started.elapsed().as_millis()
        );
        Ok(text.trim().to_string())
    }
}

// ---------------------------------------------------------------------------
// UnavailableRecognizer
// ---------------------------------------------------------------------------

/// Stand-in used when no model could be loaded; every call fails with
/// [`RecognitionError::Unavailable`] so the rest of the host keeps working.
#[derive(Debug, Clone)]
pub struct UnavailableRecognizer {
    reason: String,
}

impl UnavailableRecognizer {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl SpeechRecognizer for UnavailableRecognizer {
    fn transcribe(
        &self,
        _audio: &WaveformBuffer,
        _params: &RecognitionParams,
    ) -> Result<String, RecognitionError> {
        Err(RecognitionError::Unavailable(self.reason.clone()))
    }
}

// ---------------------------------------------------------------------------
// MockRecognizer  (test-only)
// ---------------------------------------------------------------------------

/// A test double that returns a pre-configured response and records the
/// parameters of every call.
#[cfg(test)]
pub struct MockRecognizer {
    response: Result<String, RecognitionError>,
    gate: Option<std::sync::Mutex<std::sync::mpsc::Receiver<()>>>,
    calls: std::sync::Mutex<Vec<RecognitionParams>>,
}

#[cfg(test)]
impl MockRecognizer {
    /// Always returns `Ok(text)`.
    pub fn ok(text: impl Into<String>) -> Self {
        Self {
            response: Ok(text.into()),
            gate: None,
            calls: Default::default(),
        }
    }

    /// Always returns `Err(error)`.
    pub fn err(error: RecognitionError) -> Self {
        Self {
            response: Err(error),
            gate: None,
            calls: Default::default(),
        }
    }

    /// Returns `Ok(text)`, but each call blocks until the returned sender
    /// fires (or is dropped).
    pub fn gated(text: impl Into<String>) -> (Self, std::sync::mpsc::Sender<()>) {
        let (tx, rx) = std::sync::mpsc::channel();
        let mock = Self {
            gate: Some(std::sync::Mutex::new(rx)),
            ..Self::ok(text)
        };
        (mock, tx)
    }

    /// Parameters of every call so far.
    pub fn calls(&self) -> Vec<RecognitionParams> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[cfg(test)]
impl SpeechRecognizer for MockRecognizer {
    fn transcribe(
        &self,
        audio: &WaveformBuffer,
        params: &RecognitionParams,
    ) -> Result<String, RecognitionError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(params.clone());
        }
        check_input(audio)?;
        if let Some(gate) = &self.gate {
            if let Ok(rx) = gate.lock() {
                let _ = rx.recv();
            }
        }
        self.response.clone()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
