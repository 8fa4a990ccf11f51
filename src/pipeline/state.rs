//! Practice session states and the values that flow through them.
//!
//! [`PracticeState`] is the coarse phase the UI renders.  The coach keeps
//! the data for each phase privately; callers see the phase through
//! [`PracticeCoach::state`](super::PracticeCoach::state) and the result
//! through [`Outcome`].

use std::fmt;

use serde::Serialize;

use super::coach::PracticeError;
use crate::audio::SessionId;
use crate::scoring::{AlignmentResult, Score};

// ---------------------------------------------------------------------------
// PracticeState
// ---------------------------------------------------------------------------

/// States of a practice attempt.
///
/// ```text
/// Idle ──start──▶ Recording ──stop──▶ Finalizing ──▶ Done
///                                               └──▶ Error
/// Done / Error ──take_outcome──▶ Idle
/// Recording / Finalizing ──cancel──▶ Idle
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum PracticeState {
    /// Ready for a new attempt.
    #[default]
    Idle,

    /// The microphone is live and chunks are being buffered.
    Recording,

    /// Capture has stopped; decoding and recognition are running.
    Finalizing,

    /// A report is ready.
    Done,

    /// The attempt failed; the reason is held until consumed.
    Error,
}

impl PracticeState {
    /// Returns `true` while an attempt is in progress.
    ///
    /// ```
    /// use phono_coach::pipeline::PracticeState;
    ///
    /// assert!(!PracticeState::Idle.is_busy());
    /// assert!(PracticeState::Recording.is_busy());
    /// assert!(PracticeState::Finalizing.is_busy());
    /// assert!(!PracticeState::Done.is_busy());
    /// assert!(!PracticeState::Error.is_busy());
    /// ```
    pub fn is_busy(&self) -> bool {
        matches!(self, PracticeState::Recording | PracticeState::Finalizing)
    }

    /// `true` for the states `take_outcome` consumes.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PracticeState::Done | PracticeState::Error)
    }

    /// A short human-readable label for status lines.
    pub fn label(&self) -> &'static str {
        match self {
            PracticeState::Idle => "Idle",
            PracticeState::Recording => "Recording",
            PracticeState::Finalizing => "Finalizing",
            PracticeState::Done => "Done",
            PracticeState::Error => "Error",
        }
    }
}

impl fmt::Display for PracticeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// PracticeRequest / PracticeReport
// ---------------------------------------------------------------------------

/// What the learner is about to read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PracticeRequest {
    pub target_text: String,
    /// Language code passed to the recognizer (`"auto"` to detect).
    pub language: String,
    /// Compare with punctuation kept attached to words.
    pub with_punctuation: bool,
}

impl PracticeRequest {
    pub fn new(target_text: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            target_text: target_text.into(),
            language: language.into(),
            with_punctuation: false,
        }
    }

    pub fn with_punctuation(mut self, with_punctuation: bool) -> Self {
        self.with_punctuation = with_punctuation;
        self
    }
}

/// Result of a completed attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PracticeReport {
    pub session: SessionId,
    /// Recognizer output, trimmed.
    pub transcription: String,
    pub alignment: AlignmentResult,
    pub score: Score,
    /// Length of the decoded recording in seconds.
    pub audio_secs: f32,
}

/// A consumed terminal state.
#[derive(Debug, Clone)]
pub enum Outcome {
    Done(PracticeReport),
    Failed(PracticeError),
}

impl Outcome {
    pub fn into_result(self) -> Result<PracticeReport, PracticeError> {
        match self {
            Outcome::Done(report) => Ok(report),
            Outcome::Failed(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_idle() {
        assert_eq!(PracticeState::default(), PracticeState::Idle);
    }

    #[test]
    fn terminal_states() {
        assert!(PracticeState::Done.is_terminal());
        assert!(PracticeState::Error.is_terminal());
        assert!(!PracticeState::Recording.is_terminal());
        assert!(!PracticeState::Idle.is_terminal());
    }

    #[test]
    fn labels_are_distinct() {
        let all = [
            PracticeState::Idle,
            PracticeState::Recording,
            PracticeState::Finalizing,
            PracticeState::Done,
            PracticeState::Error,
        ];
        for (i, a) in all.iter().enumerate() {
            for b in &all[i + 1..] {
                assert_ne!(a.label(), b.label());
            }
        }
        assert_eq!(PracticeState::Finalizing.to_string(), "Finalizing");
    }

    #[test]
    fn request_builder() {
        let r = PracticeRequest::new("Hello, world!", "en").with_punctuation(true);
        assert_eq!(r.target_text, "Hello, world!");
        assert!(r.with_punctuation);
    }
}
