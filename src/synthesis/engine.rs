//! Text-to-speech seam.
//!
//! The crate bundles no TTS model.  Hosts plug one in by implementing
//! [`SpeechSynthesizer`]; the [`ReadAloud`](super::ReadAloud) service takes
//! care of input validation, voice selection and WAV encoding.

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

use crate::audio::WaveformBuffer;
use crate::config::SynthesisConfig;

// ---------------------------------------------------------------------------
// SynthesisError
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SynthesisError {
    #[error("text cannot be empty")]
    EmptyText,

    #[error("failed to load voice model {model}: {reason}")]
    ModelLoad { model: String, reason: String },

    #[error("speech synthesis failed: {0}")]
    Synthesis(String),

    #[error("synthesizer returned audio with a zero sample rate")]
    InvalidSampleRate,

    #[error("failed to encode audio: {0}")]
    Encode(String),
}

// ---------------------------------------------------------------------------
// VoiceModel
// ---------------------------------------------------------------------------

/// Identifier of the TTS model that voices a request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VoiceModel(String);

impl VoiceModel {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Language-specific MMS voice when `language` is given, otherwise the
    /// configured default voice.
    ///
    /// ```rust
    /// use phono_coach::config::SynthesisConfig;
    /// use phono_coach::synthesis::VoiceModel;
    ///
    /// let cfg = SynthesisConfig::default();
    /// assert_eq!(VoiceModel::for_language(Some("fra"), &cfg).as_str(), "Xenova/mms-tts-fra");
    /// assert_eq!(VoiceModel::for_language(None, &cfg).as_str(), "Xenova/speecht5_tts");
    /// ```
    pub fn for_language(language: Option<&str>, config: &SynthesisConfig) -> Self {
        match language.map(str::trim).filter(|l| !l.is_empty()) {
            Some(lang) => Self(format!("{}{lang}", config.mms_prefix)),
            None => Self(config.default_model.clone()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VoiceModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Request / response
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisRequest {
    pub text: String,
    pub voice: VoiceModel,
    /// Location of speaker embeddings for voices that need them.
    pub speaker_embeddings: Option<String>,
}

/// Raw model output: mono samples plus their rate.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesizedAudio {
    pub audio: Vec<f32>,
    pub sampling_rate: u32,
}

impl SynthesizedAudio {
    pub fn into_waveform(self) -> WaveformBuffer {
        WaveformBuffer::new(self.audio, self.sampling_rate)
    }
}

// ---------------------------------------------------------------------------
// SpeechSynthesizer trait
// ---------------------------------------------------------------------------

#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(
        &self,
        request: &SynthesisRequest,
    ) -> Result<SynthesizedAudio, SynthesisError>;
}

// ---------------------------------------------------------------------------
// MockSynthesizer  (test-only)
// ---------------------------------------------------------------------------

/// Test double that returns a fixed response and records every request.
#[cfg(test)]
pub struct MockSynthesizer {
    response: Result<SynthesizedAudio, SynthesisError>,
    requests: std::sync::Mutex<Vec<SynthesisRequest>>,
}

#[cfg(test)]
impl MockSynthesizer {
    pub fn ok(audio: Vec<f32>, sampling_rate: u32) -> Self {
        Self {
            response: Ok(SynthesizedAudio {
                audio,
                sampling_rate,
            }),
            requests: Default::default(),
        }
    }

    pub fn err(error: SynthesisError) -> Self {
        Self {
            response: Err(error),
            requests: Default::default(),
        }
    }

    pub fn requests(&self) -> Vec<SynthesisRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[cfg(test)]
#[async_trait]
impl SpeechSynthesizer for MockSynthesizer {
    async fn synthesize(
        &self,
        request: &SynthesisRequest,
    ) -> Result<SynthesizedAudio, SynthesisError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        self.response.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_language_uses_default_voice() {
        let cfg = SynthesisConfig::default();
        assert_eq!(
            VoiceModel::for_language(Some("  "), &cfg),
            VoiceModel::new("Xenova/speecht5_tts")
        );
    }

    #[test]
    fn custom_prefix_is_honoured() {
        let cfg = SynthesisConfig {
            mms_prefix: "local/mms-".into(),
            ..SynthesisConfig::default()
        };
        assert_eq!(
            VoiceModel::for_language(Some("deu"), &cfg).to_string(),
            "local/mms-deu"
        );
    }

    #[test]
    fn synthesized_audio_becomes_waveform() {
        let out = SynthesizedAudio {
            audio: vec![0.1, 0.2],
            sampling_rate: 22_050,
        };
        assert_eq!(
            out.into_waveform(),
            WaveformBuffer::new(vec![0.1, 0.2], 22_050)
        );
    }

    #[test]
    fn empty_text_message() {
        assert_eq!(SynthesisError::EmptyText.to_string(), "text cannot be empty");
    }
}
