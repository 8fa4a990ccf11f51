//! Practice coach: drives one attempt from microphone to score.
//!
//! [`PracticeCoach`] owns the state machine.  The microphone and the speech
//! recognizer are injected as trait objects.
//!
//! # Flow
//!
//! ```text
//! start(request)
//!   └─▶ take MicrophoneLock ─▶ AudioDevice::acquire        [Recording]
//!
//! stop()
//!   └─▶ CaptureSession::finish (flush + concatenate)       [Finalizing]
//!         └─▶ spawn_blocking(decode ─▶ recognizer.transcribe)
//!               └─▶ compare_text (normalize ─▶ align ─▶ score)
//!                     ├─ Ok  ─▶ [Done(report)]
//!                     └─ Err ─▶ [Error(reason)]
//!
//! take_outcome()  Done / Error ─▶ Idle
//! cancel()        Recording / Finalizing ─▶ Idle (in-flight result dropped)
//! ```
//!
//! Every `start` and `cancel` bumps a generation counter.  A completion is
//! stored only if the generation it started under is still current, so a
//! cancelled attempt can never overwrite a newer one.
//!
//! The coach reports `Recording` from the moment the lease is taken, while
//! the device is still opening, so a concurrent `start` fails with
//! [`PracticeError::InvalidStateTransition`] instead of a busy microphone.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use thiserror::Error;

use super::compare::compare_text;
use super::state::{Outcome, PracticeReport, PracticeRequest, PracticeState};
use crate::audio::{decode, AudioDevice, CaptureSession, DecodeError, MicrophoneLock, Mixdown, SessionId};
use crate::recognition::{RecognitionError, RecognitionParams, SpeechRecognizer};
use crate::scoring::Scorer;

// ---------------------------------------------------------------------------
// PracticeError
// ---------------------------------------------------------------------------

/// Errors surfaced by [`PracticeCoach`].
///
/// `Clone` so the same value can be stored in the `Error` state and
/// returned from `stop`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PracticeError {
    #[error("microphone unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("could not decode the recording: {0}")]
    Decode(#[from] DecodeError),

    #[error("speech recognition failed: {0}")]
    Recognition(#[from] RecognitionError),

    #[error("cannot {operation} while {state}")]
    InvalidStateTransition {
        operation: &'static str,
        state: PracticeState,
    },

    #[error("session {0} was cancelled before it completed")]
    Cancelled(SessionId),

    #[error("internal error: {0}")]
    Internal(String),
}

// ---------------------------------------------------------------------------
// CoachSettings
// ---------------------------------------------------------------------------

/// Tunables that do not change between attempts.
#[derive(Debug, Clone, Default)]
pub struct CoachSettings {
    pub scorer: Scorer,
    pub mixdown: Mixdown,
    /// Base recognition parameters; the language comes from each request.
    pub recognition: RecognitionParams,
}

/// Snapshot of a live recording for status displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordingStatus {
    pub session: SessionId,
    pub elapsed: Duration,
    pub chunks: usize,
    pub bytes: usize,
}

// ---------------------------------------------------------------------------
// Machine
// ---------------------------------------------------------------------------

enum Phase {
    Idle,
    /// Lease taken; the device is being opened.
    Starting {
        session: SessionId,
    },
    Recording {
        session: CaptureSession,
        request: PracticeRequest,
    },
    Finalizing {
        session: SessionId,
    },
    Done(PracticeReport),
    Error(PracticeError),
}

impl Phase {
    fn state(&self) -> PracticeState {
        match self {
            Phase::Idle => PracticeState::Idle,
            Phase::Starting { .. } | Phase::Recording { .. } => PracticeState::Recording,
            Phase::Finalizing { .. } => PracticeState::Finalizing,
            Phase::Done(_) => PracticeState::Done,
            Phase::Error(_) => PracticeState::Error,
        }
    }
}

struct Machine {
    phase: Phase,
    generation: u64,
    next_session: u64,
    /// Cancelled session whose detached work may still hold the microphone.
    releasing: Option<SessionId>,
}

// ---------------------------------------------------------------------------
// PracticeCoach
// ---------------------------------------------------------------------------

/// Runs practice attempts against an injected microphone and recognizer.
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use phono_coach::audio::{CpalDevice, MicrophoneLock};
/// use phono_coach::pipeline::{CoachSettings, PracticeCoach, PracticeRequest};
/// use phono_coach::recognition::WhisperRecognizer;
///
/// # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
/// let coach = PracticeCoach::new(
///     Arc::new(CpalDevice::default()),
///     Arc::new(WhisperRecognizer::load("models/ggml-tiny.bin", false)?),
///     MicrophoneLock::global(),
///     CoachSettings::default(),
/// );
/// coach.start(PracticeRequest::new("the cat sat", "en")).await?;
/// // ... learner reads ...
/// let report = coach.stop().await?;
/// println!("{}", report.score);
/// coach.take_outcome()?;
/// # Ok(()) }
/// ```
pub struct PracticeCoach {
    device: Arc<dyn AudioDevice>,
    recognizer: Arc<dyn SpeechRecognizer>,
    microphone: MicrophoneLock,
    settings: CoachSettings,
    machine: Mutex<Machine>,
}

impl PracticeCoach {
    pub fn new(
        device: Arc<dyn AudioDevice>,
        recognizer: Arc<dyn SpeechRecognizer>,
        microphone: MicrophoneLock,
        settings: CoachSettings,
    ) -> Self {
        Self {
            device,
            recognizer,
            microphone,
            settings,
            machine: Mutex::new(Machine {
                phase: Phase::Idle,
                generation: 0,
                next_session: 1,
                releasing: None,
            }),
        }
    }

    /// Current phase.
    pub fn state(&self) -> PracticeState {
        self.machine().phase.state()
    }

    /// Session being recorded or finalized, if any.
    pub fn active_session(&self) -> Option<SessionId> {
        match &self.machine().phase {
            Phase::Recording { session, .. } => Some(session.id()),
            Phase::Starting { session } | Phase::Finalizing { session } => Some(*session),
            _ => None,
        }
    }

    /// Progress of the live recording; `None` unless `Recording`.
    pub fn recording_status(&self) -> Option<RecordingStatus> {
        let mut m = self.machine();
        match &mut m.phase {
            Phase::Recording { session, .. } => {
                session.collect_pending();
                Some(RecordingStatus {
                    session: session.id(),
                    elapsed: session.elapsed(),
                    chunks: session.chunk_count(),
                    bytes: session.buffered_bytes(),
                })
            }
            _ => None,
        }
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    /// Take the microphone and begin recording.  Requires `Idle`.
    pub async fn start(&self, request: PracticeRequest) -> Result<SessionId, PracticeError> {
        let (id, generation, lease) = {
            let mut m = self.machine();
            if !matches!(m.phase, Phase::Idle) {
                return Err(invalid("start", m.phase.state()));
            }
            let Some(lease) = self.microphone.try_acquire() else {
                return Err(microphone_busy(m.releasing));
            };
            m.releasing = None;
            let id = SessionId(m.next_session);
            m.next_session += 1;
            m.generation += 1;
            // A concurrent `start` now sees `Recording` and is rejected.
            m.phase = Phase::Starting { session: id };
            (id, m.generation, lease)
        };

        let opened = CaptureSession::open(id, lease, self.device.as_ref()).await;

        let mut m = self.machine();
        let current = m.generation == generation;
        match opened {
            Ok(session) if current => {
                m.phase = Phase::Recording { session, request };
                log::debug!("coach: Idle -> Recording (session {id})");
                Ok(id)
            }
            Ok(session) => {
                // Cancelled while the device was being opened.
                drop(session);
                clear_releasing(&mut m, id);
                log::debug!("coach: discarding cancelled session {id} after acquisition");
                Err(PracticeError::Cancelled(id))
            }
            Err(e) => {
                log::error!("coach: session {id} failed to acquire the microphone: {e}");
                if current {
                    m.phase = Phase::Idle;
                } else {
                    clear_releasing(&mut m, id);
                }
                Err(PracticeError::DeviceUnavailable(e.to_string()))
            }
        }
    }

    /// Stop recording and score the attempt.  Requires `Recording`.
    ///
    /// The outcome is stored as `Done` / `Error` and also returned.  If the
    /// attempt is cancelled while finalizing, the result is discarded and
    /// [`PracticeError::Cancelled`] is returned instead.
    pub async fn stop(&self) -> Result<PracticeReport, PracticeError> {
        let (session, request, generation) = {
            let mut m = self.machine();
            match std::mem::replace(&mut m.phase, Phase::Idle) {
                Phase::Recording { session, request } => {
                    m.phase = Phase::Finalizing {
                        session: session.id(),
                    };
                    (session, request, m.generation)
                }
                other => {
                    let state = other.state();
                    m.phase = other;
                    return Err(invalid("stop", state));
                }
            }
        };
        let id = session.id();
        log::debug!("coach: Recording -> Finalizing (session {id})");

        let outcome = self.finalize(session, &request).await;

        let mut m = self.machine();
        if m.generation != generation {
            clear_releasing(&mut m, id);
            log::debug!("coach: discarding completion of cancelled session {id}");
            return Err(PracticeError::Cancelled(id));
        }
        m.phase = match &outcome {
            Ok(report) => {
                log::debug!("coach: Finalizing -> Done (session {id}, score {})", report.score);
                Phase::Done(report.clone())
            }
            Err(e) => {
                log::error!("coach: Finalizing -> Error (session {id}): {e}");
                Phase::Error(e.clone())
            }
        };
        outcome
    }

    /// Abandon the current attempt.  Requires `Recording` or `Finalizing`.
    ///
    /// A session cancelled while its device is still being opened or
    /// flushed keeps the microphone until that work returns; a `start` in
    /// the meantime names the session being released.
    pub fn cancel(&self) -> Result<(), PracticeError> {
        let mut m = self.machine();
        let from = m.phase.state();
        let detached = match &m.phase {
            Phase::Recording { .. } => None,
            Phase::Starting { session } | Phase::Finalizing { session } => Some(*session),
            _ => return Err(invalid("cancel", from)),
        };
        // Dropping a Recording session stops the device.
        m.phase = Phase::Idle;
        m.generation += 1;
        m.releasing = detached;
        log::debug!("coach: {from} -> Idle (cancelled)");
        Ok(())
    }

    /// Consume a `Done` / `Error` state and return to `Idle`.
    pub fn take_outcome(&self) -> Result<Outcome, PracticeError> {
        let mut m = self.machine();
        match std::mem::replace(&mut m.phase, Phase::Idle) {
            Phase::Done(report) => {
                log::debug!("coach: Done -> Idle");
                Ok(Outcome::Done(report))
            }
            Phase::Error(err) => {
                log::debug!("coach: Error -> Idle");
                Ok(Outcome::Failed(err))
            }
            other => {
                let state = other.state();
                m.phase = other;
                Err(invalid("take the outcome", state))
            }
        }
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    async fn finalize(
        &self,
        session: CaptureSession,
        request: &PracticeRequest,
    ) -> Result<PracticeReport, PracticeError> {
        let id = session.id();
        let captured = session
            .finish()
            .await
            .map_err(|e| PracticeError::DeviceUnavailable(e.to_string()))?;

        let recognizer = Arc::clone(&self.recognizer);
        let params = self.settings.recognition.with_language(&request.language);
        let mixdown = self.settings.mixdown;

        let (transcription, audio_secs) =
            tokio::task::spawn_blocking(move || -> Result<(String, f32), PracticeError> {
                let waveform = decode(&captured.bytes, captured.format, mixdown)?;
                let text = recognizer.transcribe(&waveform, &params)?;
                Ok((text, waveform.duration_secs()))
            })
            .await
            .map_err(|e| PracticeError::Internal(e.to_string()))??;

        log::debug!("coach: session {id} heard {transcription:?}");

        let comparison = compare_text(
            &request.target_text,
            &transcription,
            request.with_punctuation,
            &self.settings.scorer,
        );

        Ok(PracticeReport {
            session: id,
            transcription,
            alignment: comparison.alignment,
            score: comparison.score,
            audio_secs,
        })
    }

    fn machine(&self) -> MutexGuard<'_, Machine> {
        self.machine.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn invalid(operation: &'static str, state: PracticeState) -> PracticeError {
    log::warn!("coach: cannot {operation} while {state}");
    PracticeError::InvalidStateTransition { operation, state }
}

fn microphone_busy(releasing: Option<SessionId>) -> PracticeError {
    let reason = match releasing {
        Some(id) => format!("microphone is still being released by cancelled session {id}"),
        None => "microphone is already in use by another session".to_string(),
    };
    log::warn!("coach: {reason}");
    PracticeError::DeviceUnavailable(reason)
}

fn clear_releasing(machine: &mut Machine, id: SessionId) {
    if machine.releasing == Some(id) {
        machine.releasing = None;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
