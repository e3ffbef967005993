//! SCRFD face detector.
//!
//! Wraps a pretrained SCRFD-family ONNX graph. The network consumes a
//! fixed-size float32 NCHW tensor, normalized `(v - 127.5) / 128` with
//! channels in RGB order, and emits per-stride score/box/landmark maps
//! where boxes and landmarks are distances from the anchor-cell origin
//! in units of stride. Decoding, score filtering, NMS and the inverse
//! letterbox mapping all happen here; callers only ever see detections
//! in original-image pixel coordinates.

use std::path::Path;
use std::sync::Mutex;

use image::imageops::{self, FilterType};
use ndarray::{Array2, Array4, Axis, Ix2};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::{Tensor, Value};
use tracing::{debug, info};

use visage_models::{BoundingBox, Detection, Frame, Landmarks, Point};

use crate::config::FaceAnalysisConfig;
use crate::error::{VisionError, VisionResult};
use crate::mapping::LetterboxMap;
use crate::pipeline::DetectFaces;

/// A decoded, pre-NMS candidate in network space.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    bbox: BoundingBox,
    kps: [[f32; 2]; 5],
    score: f32,
}

/// SCRFD face detector backed by an ONNX Runtime session.
///
/// The session is loaded once and shared read-only; the `Mutex` exists
/// only because the runtime's `run` call takes `&mut`.
pub struct ScrfdDetector {
    session: Mutex<Session>,
    score_threshold: f32,
    iou_threshold: f32,
    input_width: u32,
    input_height: u32,
}

impl ScrfdDetector {
    /// Load the detector described by a pipeline config.
    pub fn from_config(config: &FaceAnalysisConfig) -> VisionResult<Self> {
        Self::load(
            &config.detector_model,
            config.score_threshold,
            config.iou_threshold,
            config.input_width,
            config.input_height,
        )
    }

    /// Load a detector from a model artifact on disk.
    pub fn load(
        model_path: &Path,
        score_threshold: f32,
        iou_threshold: f32,
        input_width: u32,
        input_height: u32,
    ) -> VisionResult<Self> {
        if !model_path.exists() {
            return Err(VisionError::model_load(model_path, "model file not found"));
        }

        let session = Session::builder()
            .map_err(|e| VisionError::model_load(model_path, format!("session builder: {e}")))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| VisionError::model_load(model_path, format!("optimization level: {e}")))?
            .commit_from_file(model_path)
            .map_err(|e| VisionError::model_load(model_path, format!("load graph: {e}")))?;

        info!(
            path = %model_path.display(),
            input = format!("{input_width}x{input_height}"),
            score_threshold,
            iou_threshold,
            "face detection model loaded"
        );

        Ok(Self {
            session: Mutex::new(session),
            score_threshold,
            iou_threshold,
            input_width,
            input_height,
        })
    }

    /// Detect faces in a frame.
    ///
    /// Returns detections in original-image pixel coordinates, ordered
    /// by descending confidence. An empty vec is a valid result.
    pub fn detect(&self, frame: &Frame) -> VisionResult<Vec<Detection>> {
        let map = LetterboxMap::anchored(
            frame.width(),
            frame.height(),
            self.input_width,
            self.input_height,
        );

        let input = pack_input(frame, &map, self.input_width, self.input_height);
        let tensor = Tensor::from_array(input)
            .map_err(|e| VisionError::inference(format!("input tensor: {e}")))?;

        let raw_outputs: Vec<Array2<f32>> = {
            let mut session = self
                .session
                .lock()
                .map_err(|_| VisionError::inference("detector session poisoned"))?;
            let outputs = session
                .run(ort::inputs![tensor])
                .map_err(|e| VisionError::inference(format!("detector run: {e}")))?;
            (0..outputs.len())
                .map(|i| extract_2d(&outputs[i]))
                .collect::<VisionResult<_>>()?
        };

        let candidates = decode_levels(
            &raw_outputs,
            self.input_width,
            self.input_height,
            self.score_threshold,
        )?;

        let total = candidates.len();
        let kept = nms(candidates, self.iou_threshold);

        let mut detections = Vec::with_capacity(kept.len());
        for cand in kept {
            let bbox = map.box_to_image(&cand.bbox);
            if bbox.is_degenerate() {
                continue;
            }
            let mut points = [Point::new(0.0, 0.0); 5];
            for (point, kp) in points.iter_mut().zip(cand.kps) {
                let (x, y) = map.to_image(kp[0], kp[1]);
                *point = Point::new(x, y);
            }
            detections.push(Detection::new(
                bbox,
                Landmarks::from_points(points),
                cand.score.clamp(0.0, 1.0),
            ));
        }

        debug!(
            candidates = total,
            faces = detections.len(),
            "face detection complete"
        );
        Ok(detections)
    }
}

impl DetectFaces for ScrfdDetector {
    fn detect(&self, frame: &Frame) -> VisionResult<Vec<Detection>> {
        ScrfdDetector::detect(self, frame)
    }
}

/// Letterbox a frame into the network input tensor.
///
/// The frame is resized aspect-preserving and placed at the canvas
/// origin; the unfilled region keeps the value black pixels normalize
/// to, matching the network's training-time padding.
fn pack_input(
    frame: &Frame,
    map: &LetterboxMap,
    input_width: u32,
    input_height: u32,
) -> Array4<f32> {
    let resized = imageops::resize(
        frame.buffer(),
        map.scaled_width,
        map.scaled_height,
        FilterType::Triangle,
    );

    let w = input_width as usize;
    let h = input_height as usize;
    let mut input = Array4::from_elem((1, 3, h, w), (0.0 - 127.5) / 128.0);

    let x0 = map.pad_left as usize;
    let y0 = map.pad_top as usize;
    for (x, y, px) in resized.enumerate_pixels() {
        // Working frames are BGR; the network expects RGB channel order
        let [b, g, r] = px.0;
        let tx = x as usize + x0;
        let ty = y as usize + y0;
        if tx >= w || ty >= h {
            continue;
        }
        input[[0, 0, ty, tx]] = (r as f32 - 127.5) / 128.0;
        input[[0, 1, ty, tx]] = (g as f32 - 127.5) / 128.0;
        input[[0, 2, ty, tx]] = (b as f32 - 127.5) / 128.0;
    }

    input
}

/// Decode per-stride output maps into network-space candidates.
///
/// SCRFD exports come in four shapes distinguished by output count:
/// 3 or 5 stride levels, with or without landmark maps. Output order is
/// all score maps, then all box maps, then (optionally) all landmark
/// maps, each ordered by stride.
fn decode_levels(
    outputs: &[Array2<f32>],
    input_width: u32,
    input_height: u32,
    score_threshold: f32,
) -> VisionResult<Vec<Candidate>> {
    let (fmc, strides, num_anchors, use_kps): (usize, &[u32], usize, bool) = match outputs.len() {
        6 => (3, &[8, 16, 32], 2, false),
        9 => (3, &[8, 16, 32], 2, true),
        10 => (5, &[8, 16, 32, 64, 128], 1, false),
        15 => (5, &[8, 16, 32, 64, 128], 1, true),
        n => {
            return Err(VisionError::inference(format!(
                "unexpected detector output count: {n}"
            )))
        }
    };

    let mut candidates = Vec::new();

    for (level, stride) in strides.iter().enumerate() {
        let stride = *stride as f32;
        let scores = &outputs[level];
        let boxes = &outputs[level + fmc];
        if scores.ncols() < 1 || boxes.ncols() < 4 {
            return Err(VisionError::inference(format!(
                "malformed detector output: score cols={}, box cols={}",
                scores.ncols(),
                boxes.ncols()
            )));
        }

        let kps = if use_kps {
            let kps = &outputs[level + fmc * 2];
            if kps.ncols() < 10 {
                return Err(VisionError::inference(format!(
                    "malformed landmark output: {} cols",
                    kps.ncols()
                )));
            }
            Some(kps)
        } else {
            None
        };

        let feat_w = (input_width as usize) / stride as usize;
        let feat_h = (input_height as usize) / stride as usize;
        let expected = feat_w * feat_h * num_anchors;
        let count = scores.nrows().min(boxes.nrows());
        if count != expected {
            return Err(VisionError::inference(format!(
                "detector output size mismatch: expected {expected} anchors, got {count}"
            )));
        }

        for i in 0..count {
            let score = scores[[i, 0]];
            if score < score_threshold {
                continue;
            }

            // Anchor-cell origin in network pixels; distances are
            // predicted in units of stride
            let cell = i / num_anchors;
            let ax = (cell % feat_w) as f32 * stride;
            let ay = (cell / feat_w) as f32 * stride;

            let bbox = BoundingBox::new(
                ax - boxes[[i, 0]] * stride,
                ay - boxes[[i, 1]] * stride,
                ax + boxes[[i, 2]] * stride,
                ay + boxes[[i, 3]] * stride,
            );

            let mut points = [[0.0f32; 2]; 5];
            if let Some(kps) = kps {
                for (p, point) in points.iter_mut().enumerate() {
                    point[0] = ax + kps[[i, p * 2]] * stride;
                    point[1] = ay + kps[[i, p * 2 + 1]] * stride;
                }
            }

            candidates.push(Candidate {
                bbox,
                kps: points,
                score,
            });
        }
    }

    Ok(candidates)
}

/// Greedy non-maximum suppression.
///
/// Candidates are visited in descending score order; a candidate is
/// kept only if it overlaps no already-kept box above the threshold, so
/// the higher-confidence box always survives.
fn nms(mut candidates: Vec<Candidate>, iou_threshold: f32) -> Vec<Candidate> {
    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep: Vec<Candidate> = Vec::new();
    for cand in candidates {
        if keep.iter().all(|k| k.bbox.iou(&cand.bbox) <= iou_threshold) {
            keep.push(cand);
        }
    }
    keep
}

/// Extract an output as a 2D float array, accepting a leading batch
/// dimension of one.
fn extract_2d(value: &Value) -> VisionResult<Array2<f32>> {
    let arr = value
        .try_extract_array::<f32>()
        .map_err(|e| VisionError::inference(format!("output extract: {e}")))?;
    match arr.ndim() {
        2 => arr
            .into_dimensionality::<Ix2>()
            .map(|a| a.to_owned())
            .map_err(|e| VisionError::inference(format!("output shape: {e}"))),
        3 if arr.shape()[0] == 1 => arr
            .index_axis(Axis(0), 0)
            .into_dimensionality::<Ix2>()
            .map(|a| a.to_owned())
            .map_err(|e| VisionError::inference(format!("output shape: {e}"))),
        _ => Err(VisionError::inference(format!(
            "expected 2D detector output, got shape {:?}",
            arr.shape()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(x1: f32, y1: f32, x2: f32, y2: f32, score: f32) -> Candidate {
        Candidate {
            bbox: BoundingBox::new(x1, y1, x2, y2),
            kps: [[0.0; 2]; 5],
            score,
        }
    }

    #[test]
    fn test_nms_keeps_higher_confidence_of_overlapping_pair() {
        let kept = nms(
            vec![
                candidate(0.0, 0.0, 100.0, 100.0, 0.6),
                candidate(10.0, 10.0, 110.0, 110.0, 0.9),
            ],
            0.4,
        );
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].score, 0.9);
    }

    #[test]
    fn test_nms_keeps_disjoint_boxes() {
        let kept = nms(
            vec![
                candidate(0.0, 0.0, 50.0, 50.0, 0.7),
                candidate(200.0, 200.0, 260.0, 260.0, 0.9),
            ],
            0.4,
        );
        assert_eq!(kept.len(), 2);
        // Output is ordered by descending score
        assert!(kept[0].score > kept[1].score);
    }

    #[test]
    fn test_nms_below_threshold_overlap_survives() {
        // IoU of these two is well under 0.4
        let kept = nms(
            vec![
                candidate(0.0, 0.0, 100.0, 100.0, 0.9),
                candidate(90.0, 90.0, 190.0, 190.0, 0.8),
            ],
            0.4,
        );
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn test_pack_input_normalizes_and_swaps_channels() {
        // 2x2 frame, one pure-red display pixel at the origin
        let mut display = image::RgbImage::new(2, 2);
        display.put_pixel(0, 0, image::Rgb([255, 0, 0]));
        let frame = Frame::from_display(&display);

        let map = LetterboxMap::anchored(2, 2, 4, 4);
        let input = pack_input(&frame, &map, 4, 4);

        // Red lands in channel 0 despite BGR storage
        assert!(input[[0, 0, 0, 0]] > 0.9);
        assert!(input[[0, 2, 0, 0]] < 0.0);
    }

    #[test]
    fn test_pack_input_padding_matches_black() {
        // 2x1 frame scaled into a 4x4 canvas leaves bottom padding
        let display = image::RgbImage::new(2, 1);
        let frame = Frame::from_display(&display);

        let map = LetterboxMap::anchored(2, 1, 4, 4);
        let input = pack_input(&frame, &map, 4, 4);

        let black = (0.0 - 127.5) / 128.0;
        assert_eq!(input[[0, 0, 3, 3]], black);
        assert_eq!(input[[0, 1, 3, 0]], black);
    }

    #[test]
    fn test_decode_levels_single_candidate() {
        // 32x32 canvas: stride 8/16/32 grids of 4x4, 2x2 and 1x1 cells
        // with 2 anchors each. One confident candidate in the stride-8
        // map, everything else below threshold.
        let mut outputs = Vec::new();
        for (rows, hot) in [(32usize, Some(0usize)), (8, None), (2, None)] {
            let mut scores = Array2::<f32>::zeros((rows, 1));
            if let Some(i) = hot {
                scores[[i, 0]] = 0.9;
            }
            outputs.push(scores);
        }
        for rows in [32usize, 8, 2] {
            outputs.push(Array2::<f32>::from_elem((rows, 4), 0.25));
        }

        let candidates = decode_levels(&outputs, 32, 32, 0.5).unwrap();
        assert_eq!(candidates.len(), 1);

        let c = &candidates[0];
        assert_eq!(c.score, 0.9);
        // Anchor origin (0,0), distances 0.25 * 8 = 2 pixels each side
        assert_eq!(c.bbox, BoundingBox::new(-2.0, -2.0, 2.0, 2.0));
    }

    #[test]
    fn test_decode_levels_rejects_unknown_output_count() {
        let outputs = vec![Array2::<f32>::zeros((1, 1)); 7];
        assert!(decode_levels(&outputs, 32, 32, 0.5).is_err());
    }

    #[test]
    fn test_decode_levels_rejects_size_mismatch() {
        let mut outputs = Vec::new();
        for _ in 0..3 {
            outputs.push(Array2::<f32>::zeros((5, 1)));
        }
        for _ in 0..3 {
            outputs.push(Array2::<f32>::zeros((5, 4)));
        }
        assert!(decode_levels(&outputs, 32, 32, 0.5).is_err());
    }
}
