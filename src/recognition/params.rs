//! Parameters handed to a [`SpeechRecognizer`](super::SpeechRecognizer) for
//! one transcription call.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// SamplingStrategy
// ---------------------------------------------------------------------------

/// Mirrors `whisper_rs::SamplingStrategy` but is owned and `Clone`.
///
/// Greedy decoding is the low-latency choice for short practice sentences.
/// [`SamplingStrategy::BeamSearch`] is slightly more accurate at 2-4× the
/// latency.
#[derive(Debug, Clone, PartialEq)]
pub enum SamplingStrategy {
    Greedy {
        /// Number of candidate tokens evaluated per step.  1 is fastest.
        best_of: i32,
    },
    BeamSearch {
        beam_size: i32,
        /// Beam-search patience factor (≥1.0 = standard beam search).
        patience: f32,
    },
}

impl Default for SamplingStrategy {
    fn default() -> Self {
        Self::Greedy { best_of: 1 }
    }
}

// ---------------------------------------------------------------------------
// Task
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Task {
    /// Output text in the spoken language.
    #[default]
    Transcribe,
    /// Output English text regardless of the spoken language.
    Translate,
}

// ---------------------------------------------------------------------------
// RecognitionParams
// ---------------------------------------------------------------------------

/// All parameters for a single recognition call.
///
/// ```
/// use phono_coach::recognition::RecognitionParams;
///
/// let params = RecognitionParams::default().with_language("fr");
/// assert_eq!(params.language, "fr");
/// assert_eq!(params.chunk_length_secs, 30);
/// assert_eq!(params.stride_secs, 5);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RecognitionParams {
    /// ISO-639-1 language code, or `"auto"` for detection.
    pub language: String,
    pub task: Task,
    /// Window length for long-form audio, in seconds.
    pub chunk_length_secs: u32,
    /// Overlap between consecutive windows, in seconds.
    pub stride_secs: u32,
    pub strategy: SamplingStrategy,
    /// CPU threads for inference.
    pub n_threads: i32,
}

impl Default for RecognitionParams {
    fn default() -> Self {
        Self {
            language: "en".into(),
            task: Task::Transcribe,
            chunk_length_secs: 30,
            stride_secs: 5,
            strategy: SamplingStrategy::default(),
            n_threads: optimal_threads(),
        }
    }
}

impl RecognitionParams {
    /// Copy of these parameters with the language replaced.
    pub fn with_language(&self, language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            ..self.clone()
        }
    }

    /// `None` when the language should be detected.
    pub fn language_hint(&self) -> Option<&str> {
        match self.language.as_str() {
            "" | "auto" => None,
            lang => Some(lang),
        }
    }
}

/// Number of CPU threads to use for inference, capped at 8.
pub(crate) fn optimal_threads() -> i32 {
    std::thread::available_parallelism()
        .map(|n| n.get().min(8) as i32)
        .unwrap_or(4)
}
