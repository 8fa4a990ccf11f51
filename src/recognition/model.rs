//! Whisper model registry and path resolution.
//!
//! [`WHISPER_MODELS`] lists the multilingual GGML checkpoints the host knows
//! how to load.  [`ModelPaths`] resolves where a model lives on disk given an
//! [`AppPaths`] instance.

use std::path::PathBuf;

use crate::config::AppPaths;

/// Model used when the configuration does not name one.
pub const DEFAULT_MODEL_ID: &str = "whisper-tiny";

// ---------------------------------------------------------------------------
// ModelSize / ModelInfo
// ---------------------------------------------------------------------------

/// Approximate capacity tier of a Whisper GGML model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelSize {
    /// ~75 MB, near real time on any CPU.
    Tiny,
    /// ~142 MB.
    Base,
    /// ~466 MB.
    Small,
    /// ~1.5 GB.
    Medium,
}

/// Static metadata for a single GGML model file.
#[derive(Debug)]
pub struct ModelInfo {
    /// Identifier used in `[recognition].model` (e.g. `"whisper-tiny"`).
    pub id: &'static str,
    pub display_name: &'static str,
    pub size: ModelSize,
    /// File name under the models directory.
    pub file_name: &'static str,
    pub file_size_mb: u64,
    pub ram_required_mb: u64,
    pub source_url: &'static str,
}

const GGML_SOURCE: &str = "https://huggingface.co/ggerganov/whisper.cpp";

/// Standard multilingual Whisper models, smallest first.
pub const WHISPER_MODELS: &[ModelInfo] = &[
    ModelInfo {
        id: "whisper-tiny",
        display_name: "Whisper Tiny (Multilingual) [Default]",
        size: ModelSize::Tiny,
        file_name: "ggml-tiny.bin",
        file_size_mb: 75,
        ram_required_mb: 390,
        source_url: GGML_SOURCE,
    },
    ModelInfo {
        id: "whisper-base",
        display_name: "Whisper Base (Multilingual)",
        size: ModelSize::Base,
        file_name: "ggml-base.bin",
        file_size_mb: 142,
        ram_required_mb: 500,
        source_url: GGML_SOURCE,
    },
    ModelInfo {
        id: "whisper-small",
        display_name: "Whisper Small (Multilingual)",
        size: ModelSize::Small,
        file_name: "ggml-small.bin",
        file_size_mb: 466,
        ram_required_mb: 1_000,
        source_url: GGML_SOURCE,
    },
    ModelInfo {
        id: "whisper-medium",
        display_name: "Whisper Medium (Multilingual)",
        size: ModelSize::Medium,
        file_name: "ggml-medium.bin",
        file_size_mb: 1_500,
        ram_required_mb: 2_600,
        source_url: GGML_SOURCE,
    },
];

/// Find a [`ModelInfo`] by its `id`.
pub fn find_model_by_id(id: &str) -> Option<&'static ModelInfo> {
    WHISPER_MODELS.iter().find(|m| m.id == id)
}

// ---------------------------------------------------------------------------
// ModelPaths
// ---------------------------------------------------------------------------

/// Resolves the on-disk location of model files from [`AppPaths`].
///
/// ```rust,no_run
/// use phono_coach::config::AppPaths;
/// use phono_coach::recognition::{ModelPaths, WHISPER_MODELS};
///
/// let paths = ModelPaths::from_app_paths(&AppPaths::new());
/// let available: Vec<_> = WHISPER_MODELS.iter()
///     .filter(|m| paths.is_available(m))
///     .collect();
/// ```
#[derive(Debug, Clone)]
pub struct ModelPaths {
    pub models_dir: PathBuf,
}

impl ModelPaths {
    pub fn from_app_paths(app_paths: &AppPaths) -> Self {
        Self {
            models_dir: app_paths.models_dir.clone(),
        }
    }

    pub fn new(models_dir: impl Into<PathBuf>) -> Self {
        Self {
            models_dir: models_dir.into(),
        }
    }

    pub fn model_path(&self, model: &ModelInfo) -> PathBuf {
        self.models_dir.join(model.file_name)
    }

    pub fn is_available(&self, model: &ModelInfo) -> bool {
        self.model_path(model).exists()
    }

    pub fn list_local_models(&self) -> Vec<&'static ModelInfo> {
        WHISPER_MODELS
            .iter()
            .filter(|m| self.is_available(m))
            .collect()
    }
}
