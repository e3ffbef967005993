//! Face detection and age/gender estimation pipeline.
//!
//! This crate provides:
//! - An SCRFD face detector wrapper with letterbox preprocessing,
//!   distance decoding, NMS and exact coordinate remapping
//! - A genderage attribute estimator running per detected face
//! - The analysis pipeline tying both together and drawing overlays
//! - Data-URI encoding for embedding annotated results in responses
//!
//! Models load once at startup and are shared read-only; each
//! `analyze` call runs synchronously on the calling thread.

pub mod annotate;
pub mod codec;
pub mod config;
pub mod detector;
pub mod error;
pub mod estimator;
pub mod mapping;
pub mod pipeline;

// Re-export common types
pub use codec::{decode_frame, encode_data_uri, is_allowed_extension, ImageEncoding};
pub use config::FaceAnalysisConfig;
pub use detector::ScrfdDetector;
pub use error::{VisionError, VisionResult};
pub use estimator::GenderAgeEstimator;
pub use mapping::LetterboxMap;
pub use pipeline::{DetectFaces, EstimateFace, FaceAnalysisReport, FaceAnalyzer};
