//! Error types for face-analysis operations.

use std::path::Path;
use thiserror::Error;

/// Result type for face-analysis operations.
pub type VisionResult<T> = Result<T, VisionError>;

/// Errors that can occur during face analysis.
///
/// `ModelLoad` is fatal and raised at construction time; callers should
/// not serve requests with an unloaded model. `Inference` and `Encode`
/// are per-call failures that the hosting layer turns into a clean
/// failure response.
#[derive(Debug, Error)]
pub enum VisionError {
    #[error("failed to load model {path}: {message}")]
    ModelLoad { path: String, message: String },

    #[error("inference failed: {0}")]
    Inference(String),

    #[error("image encoding failed: {0}")]
    Encode(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

impl VisionError {
    /// Create a model-load failure error.
    pub fn model_load(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Self::ModelLoad {
            path: path.as_ref().display().to_string(),
            message: message.into(),
        }
    }

    /// Create an inference failure error.
    pub fn inference(message: impl Into<String>) -> Self {
        Self::Inference(message.into())
    }

    /// Create an encoding failure error.
    pub fn encode(message: impl Into<String>) -> Self {
        Self::Encode(message.into())
    }
}
