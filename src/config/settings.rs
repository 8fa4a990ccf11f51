//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files.  Every section is
//! `#[serde(default)]`, so a settings file only needs the keys it changes.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;
use crate::audio::Mixdown;
use crate::pipeline::CoachSettings;
use crate::recognition::{RecognitionParams, Task, DEFAULT_MODEL_ID};
use crate::scoring::{RoundingMode, Scorer};

// ---------------------------------------------------------------------------
// PracticeConfig
// ---------------------------------------------------------------------------

/// Defaults for a practice attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PracticeConfig {
    /// Language of the practice sentences (ISO-639-1, or `"auto"`).
    pub language: String,
    /// Compare with punctuation kept attached to words.
    pub with_punctuation: bool,
    /// How exact `.5` percentages are rounded.
    pub rounding: RoundingMode,
}

impl Default for PracticeConfig {
    fn default() -> Self {
        Self {
            language: "en".into(),
            with_punctuation: false,
            rounding: RoundingMode::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// RecognitionConfig
// ---------------------------------------------------------------------------

/// Settings for the Whisper recognizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognitionConfig {
    /// Model id from the registry (e.g. `"whisper-tiny"`).
    pub model: String,
    /// Attempt GPU-accelerated inference when available.
    pub use_gpu: bool,
    pub task: Task,
    pub chunk_length_secs: u32,
    pub stride_secs: u32,
    /// Inference threads; `None` picks from the CPU count.
    pub n_threads: Option<i32>,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL_ID.into(),
            use_gpu: false,
            task: Task::Transcribe,
            chunk_length_secs: 30,
            stride_secs: 5,
            n_threads: None,
        }
    }
}

impl RecognitionConfig {
    /// Recognition parameters for `language`.
    pub fn params(&self, language: &str) -> RecognitionParams {
        let defaults = RecognitionParams::default();
        RecognitionParams {
            language: language.into(),
            task: self.task,
            chunk_length_secs: self.chunk_length_secs,
            stride_secs: self.stride_secs,
            n_threads: self.n_threads.unwrap_or(defaults.n_threads),
            strategy: defaults.strategy,
        }
    }
}

// ---------------------------------------------------------------------------
// AudioConfig
// ---------------------------------------------------------------------------

/// Microphone and decoding settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Input device name; `None` means the system default.
    pub input_device: Option<String>,
    /// How multi-channel recordings are reduced to mono.
    pub mixdown: Mixdown,
}

// ---------------------------------------------------------------------------
// SynthesisConfig
// ---------------------------------------------------------------------------

/// Voice selection for the read-aloud feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    /// Voice used when no language is given.
    pub default_model: String,
    /// Prefix of per-language voices; the language code is appended.
    pub mms_prefix: String,
    /// Speaker embeddings passed with every request; empty to omit.
    pub speaker_embeddings: String,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            default_model: "Xenova/speecht5_tts".into(),
            mms_prefix: "Xenova/mms-tts-".into(),
            speaker_embeddings: "https://huggingface.co/datasets/Xenova/transformers.js-docs/resolve/main/speaker_embeddings.bin".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use phono_coach::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
///
/// // Modify and save
/// // config.save().unwrap();
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub practice: PracticeConfig,
    pub recognition: RecognitionConfig,
    pub audio: AudioConfig,
    pub synthesis: SynthesisConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Coach tunables derived from this configuration.
    pub fn coach_settings(&self) -> CoachSettings {
        CoachSettings {
            scorer: Scorer::new(self.practice.rounding),
            mixdown: self.audio.mixdown,
            recognition: self.recognition.params(&self.practice.language),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
