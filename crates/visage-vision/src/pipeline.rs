//! Face analysis pipeline: detect, estimate, annotate.
//!
//! Orchestrates one detector call and one estimator call per detected
//! face, draws the overlays on a working copy, and hands back a
//! display-order image plus index-aligned gender/age lists. The
//! pipeline holds shared read-only model handles, keeps no state
//! between calls, and never retries: inference is deterministic, so a
//! malformed image is a hard failure for that call.

use std::sync::Arc;

use image::RgbImage;
use tracing::debug;

use visage_models::{Detection, FaceAttributes, Frame, Gender};

use crate::annotate;
use crate::config::FaceAnalysisConfig;
use crate::detector::ScrfdDetector;
use crate::error::VisionResult;
use crate::estimator::GenderAgeEstimator;

/// Face detection seam.
///
/// Implementations return detections in original-image pixel
/// coordinates; an empty vec is a valid result.
pub trait DetectFaces: Send + Sync {
    fn detect(&self, frame: &Frame) -> VisionResult<Vec<Detection>>;
}

/// Per-face attribute estimation seam.
pub trait EstimateFace: Send + Sync {
    fn estimate(&self, frame: &Frame, detection: &Detection) -> VisionResult<FaceAttributes>;
}

/// Result of analyzing one frame.
///
/// `genders[i]` and `ages[i]` belong to the i-th detection in detection
/// order; detections carry no other identifying key, so callers rely on
/// index alignment.
#[derive(Debug, Clone)]
pub struct FaceAnalysisReport {
    /// Annotated image in display (RGB) channel order
    pub annotated: RgbImage,
    /// Estimated gender per detected face
    pub genders: Vec<Gender>,
    /// Estimated age in years per detected face
    pub ages: Vec<f32>,
}

impl FaceAnalysisReport {
    /// Number of faces found in the frame.
    pub fn face_count(&self) -> usize {
        self.genders.len()
    }
}

/// The face analysis pipeline.
///
/// Detector and estimator are shared read-only handles; the analyzer is
/// cheap to clone and safe to call from multiple request-handling
/// threads, since the only mutable buffer is the per-call annotation
/// copy.
pub struct FaceAnalyzer<D = ScrfdDetector, E = GenderAgeEstimator> {
    detector: Arc<D>,
    estimator: Arc<E>,
    draw_landmarks: bool,
}

impl<D, E> Clone for FaceAnalyzer<D, E> {
    fn clone(&self) -> Self {
        Self {
            detector: Arc::clone(&self.detector),
            estimator: Arc::clone(&self.estimator),
            draw_landmarks: self.draw_landmarks,
        }
    }
}

impl FaceAnalyzer {
    /// Load both models described by a config and build the pipeline.
    pub fn from_config(config: &FaceAnalysisConfig) -> VisionResult<Self> {
        let detector = Arc::new(ScrfdDetector::from_config(config)?);
        let estimator = Arc::new(GenderAgeEstimator::from_config(config)?);
        Ok(Self::new(detector, estimator))
    }
}

impl<D: DetectFaces, E: EstimateFace> FaceAnalyzer<D, E> {
    /// Build a pipeline from existing model handles.
    pub fn new(detector: Arc<D>, estimator: Arc<E>) -> Self {
        Self {
            detector,
            estimator,
            draw_landmarks: false,
        }
    }

    /// Also draw the five facial landmark dots on each face.
    pub fn with_landmarks(mut self, draw_landmarks: bool) -> Self {
        self.draw_landmarks = draw_landmarks;
        self
    }

    /// Analyze one frame.
    ///
    /// The caller's frame is never mutated; estimates are always taken
    /// from the original frame so earlier overlays cannot pollute later
    /// crops. The annotated buffer is converted to display channel
    /// order exactly once, as the final step.
    pub fn analyze(&self, frame: &Frame) -> VisionResult<FaceAnalysisReport> {
        let detections = self.detector.detect(frame)?;

        let mut annotated = frame.clone();
        let mut genders = Vec::with_capacity(detections.len());
        let mut ages = Vec::with_capacity(detections.len());

        for detection in &detections {
            let attrs = self.estimator.estimate(frame, detection)?;

            let label = format!(
                "Gender: {}, Age: {}",
                attrs.gender,
                attrs.age_years()
            );
            annotate::draw_detection(&mut annotated, detection);
            if self.draw_landmarks {
                annotate::draw_landmarks(&mut annotated, detection);
            }
            annotate::draw_label(&mut annotated, &label, detection.bbox.x1, detection.bbox.y1);

            genders.push(attrs.gender);
            ages.push(attrs.age);
        }

        debug!(faces = detections.len(), "face analysis complete");

        Ok(FaceAnalysisReport {
            annotated: annotated.to_display(),
            genders,
            ages,
        })
    }
}
