//! Configuration for the face-analysis pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default score threshold below which detector candidates are dropped.
pub const DEFAULT_SCORE_THRESHOLD: f32 = 0.5;

/// Default IoU threshold for non-maximum suppression.
pub const DEFAULT_IOU_THRESHOLD: f32 = 0.4;

/// Fixed network input edge for the face detector.
pub const DEFAULT_DETECTOR_INPUT: u32 = 640;

/// Face-analysis configuration.
///
/// Model artifacts are opaque ONNX graphs loaded once at startup; the
/// paths come from the environment (or a `.env` file loaded by the
/// binary) with sensible defaults for a local `models/` directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaceAnalysisConfig {
    /// Path to the face-detection model artifact
    pub detector_model: PathBuf,
    /// Path to the age/gender estimation model artifact
    pub genderage_model: PathBuf,
    /// Minimum confidence for a detection to be kept
    pub score_threshold: f32,
    /// IoU threshold for non-maximum suppression
    pub iou_threshold: f32,
    /// Detector network input width
    pub input_width: u32,
    /// Detector network input height
    pub input_height: u32,
}

impl Default for FaceAnalysisConfig {
    fn default() -> Self {
        Self {
            detector_model: PathBuf::from("models/det_10g.onnx"),
            genderage_model: PathBuf::from("models/genderage.onnx"),
            score_threshold: DEFAULT_SCORE_THRESHOLD,
            iou_threshold: DEFAULT_IOU_THRESHOLD,
            input_width: DEFAULT_DETECTOR_INPUT,
            input_height: DEFAULT_DETECTOR_INPUT,
        }
    }
}

impl FaceAnalysisConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            detector_model: std::env::var("VISAGE_DETECTOR_MODEL")
                .map(PathBuf::from)
                .unwrap_or(defaults.detector_model),
            genderage_model: std::env::var("VISAGE_GENDERAGE_MODEL")
                .map(PathBuf::from)
                .unwrap_or(defaults.genderage_model),
            score_threshold: std::env::var("VISAGE_SCORE_THRESHOLD")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_SCORE_THRESHOLD),
            iou_threshold: std::env::var("VISAGE_IOU_THRESHOLD")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_IOU_THRESHOLD),
            input_width: std::env::var("VISAGE_DETECTOR_INPUT_WIDTH")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_DETECTOR_INPUT),
            input_height: std::env::var("VISAGE_DETECTOR_INPUT_HEIGHT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_DETECTOR_INPUT),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = FaceAnalysisConfig::default();
        assert_eq!(config.score_threshold, DEFAULT_SCORE_THRESHOLD);
        assert_eq!(config.iou_threshold, DEFAULT_IOU_THRESHOLD);
        assert_eq!(config.input_width, 640);
        assert_eq!(config.input_height, 640);
    }
}
