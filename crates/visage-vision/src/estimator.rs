//! Age and gender estimation for detected faces.
//!
//! Wraps a genderage-family ONNX graph. The network takes a 96x96
//! float32 NCHW tensor of raw `0..=255` channel values in RGB order and
//! emits a flat 3-vector `[female_score, male_score, age_factor]`.
//! Gender is the argmax of the first two entries; age is the scalar
//! regression output scaled by 100 years. That decoding is part of the
//! model contract, fixed here rather than inferred per call.

use std::path::Path;
use std::sync::Mutex;

use image::imageops::{self, FilterType};
use ndarray::Array4;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Tensor;
use tracing::{debug, info};

use visage_models::{BoundingBox, Detection, FaceAttributes, Frame, Gender};

use crate::config::FaceAnalysisConfig;
use crate::error::{VisionError, VisionResult};
use crate::pipeline::EstimateFace;

/// Fixed network input edge.
const INPUT_SIZE: u32 = 96;

/// The crop is a square of `CROP_EXPANSION * max(box_w, box_h)`
/// centered on the detection, so the network sees hair/chin context.
const CROP_EXPANSION: f32 = 1.5;

/// Age/gender estimator backed by an ONNX Runtime session.
///
/// Loaded once at startup and shared read-only across calls; the
/// `Mutex` exists only because the runtime's `run` call takes `&mut`.
pub struct GenderAgeEstimator {
    session: Mutex<Session>,
}

impl GenderAgeEstimator {
    /// Load the estimator described by a pipeline config.
    pub fn from_config(config: &FaceAnalysisConfig) -> VisionResult<Self> {
        Self::load(&config.genderage_model)
    }

    /// Load an estimator from a model artifact on disk.
    pub fn load(model_path: &Path) -> VisionResult<Self> {
        if !model_path.exists() {
            return Err(VisionError::model_load(model_path, "model file not found"));
        }

        let session = Session::builder()
            .map_err(|e| VisionError::model_load(model_path, format!("session builder: {e}")))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| VisionError::model_load(model_path, format!("optimization level: {e}")))?
            .commit_from_file(model_path)
            .map_err(|e| VisionError::model_load(model_path, format!("load graph: {e}")))?;

        info!(path = %model_path.display(), "age/gender model loaded");

        Ok(Self {
            session: Mutex::new(session),
        })
    }

    /// Estimate gender and age for one detected face.
    pub fn estimate(&self, frame: &Frame, detection: &Detection) -> VisionResult<FaceAttributes> {
        let (x, y, w, h) = square_crop(&detection.bbox, frame.width(), frame.height())?;

        let face = imageops::crop_imm(frame.buffer(), x, y, w, h).to_image();
        let resized = imageops::resize(&face, INPUT_SIZE, INPUT_SIZE, FilterType::Triangle);

        let size = INPUT_SIZE as usize;
        let mut input = Array4::<f32>::zeros((1, 3, size, size));
        for (px_x, px_y, px) in resized.enumerate_pixels() {
            // Working frames are BGR; the network expects raw RGB values
            let [b, g, r] = px.0;
            let (tx, ty) = (px_x as usize, px_y as usize);
            input[[0, 0, ty, tx]] = r as f32;
            input[[0, 1, ty, tx]] = g as f32;
            input[[0, 2, ty, tx]] = b as f32;
        }

        let tensor = Tensor::from_array(input)
            .map_err(|e| VisionError::inference(format!("input tensor: {e}")))?;

        let output: Vec<f32> = {
            let mut session = self
                .session
                .lock()
                .map_err(|_| VisionError::inference("estimator session poisoned"))?;
            let outputs = session
                .run(ort::inputs![tensor])
                .map_err(|e| VisionError::inference(format!("estimator run: {e}")))?;
            outputs[0]
                .try_extract_array::<f32>()
                .map_err(|e| VisionError::inference(format!("output extract: {e}")))?
                .iter()
                .copied()
                .collect()
        };

        if output.len() < 3 {
            return Err(VisionError::inference(format!(
                "estimator returned {} values, expected 3",
                output.len()
            )));
        }

        let gender = Gender::from_scores(output[0], output[1]);
        let age = (output[2] * 100.0).max(0.0);

        debug!(%gender, age, "face attributes estimated");
        Ok(FaceAttributes::new(gender, age))
    }
}

impl EstimateFace for GenderAgeEstimator {
    fn estimate(&self, frame: &Frame, detection: &Detection) -> VisionResult<FaceAttributes> {
        GenderAgeEstimator::estimate(self, frame, detection)
    }
}

/// Compute the expanded square crop for a detection, clamped to the
/// frame. Fails when the box degenerates to zero extent after clamping.
fn square_crop(bbox: &BoundingBox, width: u32, height: u32) -> VisionResult<(u32, u32, u32, u32)> {
    let clamped = bbox.clamp(width, height);
    if clamped.is_degenerate() {
        return Err(VisionError::inference(
            "face box has zero extent after clamping to the frame",
        ));
    }

    let side = clamped.width().max(clamped.height()) * CROP_EXPANSION;
    let mut x = clamped.cx() - side / 2.0;
    let mut y = clamped.cy() - side / 2.0;
    let mut w = side;
    let mut h = side;

    // Shift-and-shrink against the frame edges
    if x < 0.0 {
        w += x;
        x = 0.0;
    }
    if y < 0.0 {
        h += y;
        y = 0.0;
    }
    if x + w > width as f32 {
        w = width as f32 - x;
    }
    if y + h > height as f32 {
        h = height as f32 - y;
    }

    let x = x.floor() as u32;
    let y = y.floor() as u32;
    let w = (w.round() as u32).min(width - x);
    let h = (h.round() as u32).min(height - y);

    if w == 0 || h == 0 {
        return Err(VisionError::inference("face crop has zero extent"));
    }

    Ok((x, y, w, h))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_crop_centered_face() {
        // 100x100 box centered at (320, 240) in a 640x480 frame
        let bbox = BoundingBox::new(270.0, 190.0, 370.0, 290.0);
        let (x, y, w, h) = square_crop(&bbox, 640, 480).unwrap();

        // Expanded side: 150, centered on (320, 240)
        assert_eq!((x, y), (245, 165));
        assert_eq!((w, h), (150, 150));
    }

    #[test]
    fn test_square_crop_clamps_at_frame_edge() {
        let bbox = BoundingBox::new(0.0, 0.0, 40.0, 40.0);
        let (x, y, w, h) = square_crop(&bbox, 640, 480).unwrap();

        assert_eq!((x, y), (0, 0));
        // Top-left half of the expansion is cut off by the frame edge
        assert!(w < 60 && h < 60);
        assert!(w > 0 && h > 0);
    }

    #[test]
    fn test_square_crop_rejects_off_frame_box() {
        let bbox = BoundingBox::new(700.0, 100.0, 800.0, 200.0);
        assert!(square_crop(&bbox, 640, 480).is_err());
    }

    #[test]
    fn test_square_crop_rejects_degenerate_box() {
        let bbox = BoundingBox::new(100.0, 100.0, 100.0, 200.0);
        assert!(square_crop(&bbox, 640, 480).is_err());
    }

    #[test]
    fn test_square_crop_never_exceeds_frame() {
        let bbox = BoundingBox::new(600.0, 440.0, 639.0, 479.0);
        let (x, y, w, h) = square_crop(&bbox, 640, 480).unwrap();
        assert!(x + w <= 640);
        assert!(y + h <= 480);
    }
}
