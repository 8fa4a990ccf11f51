//! "Listen to the sentence" service.
//!
//! ```text
//! text ─▶ validate ─▶ VoiceModel::for_language ─▶ SpeechSynthesizer
//!      ─▶ WaveformBuffer::to_wav ─▶ SpeechClip (kept until the next success)
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::engine::{SpeechSynthesizer, SynthesisError, SynthesisRequest, VoiceModel};
use crate::audio::WaveformBuffer;
use crate::config::SynthesisConfig;

/// A synthesized utterance ready for playback.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechClip {
    pub waveform: WaveformBuffer,
    /// `waveform` encoded as a 16-bit PCM WAV file.
    pub wav: Vec<u8>,
}

impl SpeechClip {
    pub fn duration_secs(&self) -> f32 {
        self.waveform.duration_secs()
    }
}

#[derive(Debug, Default)]
struct Slot {
    clip: Option<SpeechClip>,
    last_error: Option<String>,
    busy: bool,
}

/// Generates speech for a sentence and holds on to the latest good clip.
pub struct ReadAloud {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    config: SynthesisConfig,
    slot: Mutex<Slot>,
}

impl ReadAloud {
    pub fn new(synthesizer: Arc<dyn SpeechSynthesizer>, config: SynthesisConfig) -> Self {
        Self {
            synthesizer,
            config,
            slot: Mutex::new(Slot::default()),
        }
    }

    /// Synthesize `text` with the voice for `language` (or the default
    /// voice when `None`).
    ///
    /// Blank text fails with [`SynthesisError::EmptyText`] without calling
    /// the synthesizer.  On failure the previous clip is kept and the error
    /// message is available from [`last_error`](Self::last_error).
    pub async fn generate(
        &self,
        text: &str,
        language: Option<&str>,
    ) -> Result<SpeechClip, SynthesisError> {
        if text.trim().is_empty() {
            self.slot().last_error = Some(SynthesisError::EmptyText.to_string());
            return Err(SynthesisError::EmptyText);
        }

        let request = SynthesisRequest {
            text: text.to_string(),
            voice: VoiceModel::for_language(language, &self.config),
            speaker_embeddings: Some(self.config.speaker_embeddings.clone())
                .filter(|s| !s.is_empty()),
        };

        {
            let mut slot = self.slot();
            slot.busy = true;
            slot.last_error = None;
        }
        log::debug!("read-aloud: synthesizing {} chars with {}", text.len(), request.voice);

        let result = self
            .synthesizer
            .synthesize(&request)
            .await
            .and_then(|out| {
                if out.sampling_rate == 0 {
                    return Err(SynthesisError::InvalidSampleRate);
                }
                let waveform = out.into_waveform();
                let wav = waveform
                    .to_wav()
                    .map_err(|e| SynthesisError::Encode(e.to_string()))?;
                Ok(SpeechClip { waveform, wav })
            });

        let mut slot = self.slot();
        slot.busy = false;
        match &result {
            Ok(clip) => {
                log::debug!("read-aloud: {:.2}s clip ready", clip.duration_secs());
                slot.clip = Some(clip.clone());
            }
            Err(e) => {
                log::warn!("read-aloud: {e}");
                slot.last_error = Some(e.to_string());
            }
        }
        result
    }

    /// The most recent successfully generated clip.
    pub fn clip(&self) -> Option<SpeechClip> {
        self.slot().clip.clone()
    }

    pub fn last_error(&self) -> Option<String> {
        self.slot().last_error.clone()
    }

    /// `true` while a synthesis call is in flight.
    pub fn is_busy(&self) -> bool {
        self.slot().busy
    }

    fn slot(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
