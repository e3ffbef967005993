//! Face detection results.

use serde::{Deserialize, Serialize};

use crate::geometry::{BoundingBox, Point};

/// The five facial landmarks produced by the face detector, in the
/// pixel space of the input image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmarks {
    pub left_eye: Point,
    pub right_eye: Point,
    pub nose: Point,
    pub left_mouth: Point,
    pub right_mouth: Point,
}

impl Landmarks {
    /// The landmarks as an ordered array (eyes, nose, mouth corners).
    pub fn points(&self) -> [Point; 5] {
        [
            self.left_eye,
            self.right_eye,
            self.nose,
            self.left_mouth,
            self.right_mouth,
        ]
    }

    /// Build from an ordered array (eyes, nose, mouth corners).
    pub fn from_points(points: [Point; 5]) -> Self {
        Self {
            left_eye: points[0],
            right_eye: points[1],
            nose: points[2],
            left_mouth: points[3],
            right_mouth: points[4],
        }
    }
}

/// One detected face: bounding box, landmarks and confidence.
///
/// Detections carry no identity; callers correlate per-face outputs by
/// index in detection order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Bounding box in input-image pixel coordinates
    pub bbox: BoundingBox,
    /// Facial landmark points in input-image pixel coordinates
    pub landmarks: Landmarks,
    /// Confidence score in [0, 1]
    pub score: f32,
}

impl Detection {
    /// Create a new detection.
    pub fn new(bbox: BoundingBox, landmarks: Landmarks, score: f32) -> Self {
        Self {
            bbox,
            landmarks,
            score,
        }
    }
}
