//! Shared data models for the Visage face-analysis service.
//!
//! This crate provides the types exchanged between the inference core
//! and its callers:
//! - Pixel frames in the pipeline's working channel order
//! - Bounding boxes and facial landmarks
//! - Per-face attribute estimates (gender, age)

pub mod attributes;
pub mod detection;
pub mod frame;
pub mod geometry;

// Re-export common types
pub use attributes::{FaceAttributes, Gender};
pub use detection::{Detection, Landmarks};
pub use frame::{Frame, FrameError};
pub use geometry::{BoundingBox, Point};
