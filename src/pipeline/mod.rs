//! Practice pipeline: record an attempt, recognize it, and score it against
//! the target sentence.
//!
//! # Architecture
//!
//! ```text
//! PracticeCoach::start(PracticeRequest)
//!        │
//!        ▼
//! CaptureSession (AudioDevice + MicrophoneLock)          [Recording]
//!        │ stop()
//!        ▼
//! finish ─▶ decode ─▶ SpeechRecognizer (spawn_blocking)  [Finalizing]
//!        │
//!        ▼
//! compare_text: normalize ×2 ─▶ align ─▶ score
//!        │
//!        ▼
//! PracticeReport                                         [Done | Error]
//! ```
//!
//! [`compare_text`] is also usable on its own when the transcription comes
//! from somewhere else.

pub mod coach;
pub mod compare;
pub mod state;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use coach::{CoachSettings, PracticeCoach, PracticeError, RecordingStatus};
pub use compare::{compare_text, Comparison};
pub use state::{Outcome, PracticeReport, PracticeRequest, PracticeState};
