//! Per-face attribute estimates.

use serde::{Deserialize, Serialize};

/// Estimated gender class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Female,
    Male,
}

impl Gender {
    /// Pick the higher-scoring class from the estimator's two
    /// gender outputs (`[female, male]`).
    pub fn from_scores(female: f32, male: f32) -> Self {
        if male > female {
            Gender::Male
        } else {
            Gender::Female
        }
    }
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Gender::Female => write!(f, "Female"),
            Gender::Male => write!(f, "Male"),
        }
    }
}

/// Attribute estimate for a single detected face.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaceAttributes {
    /// Estimated gender class
    pub gender: Gender,
    /// Estimated age in years (non-negative, fractional)
    pub age: f32,
}

impl FaceAttributes {
    /// Create a new attribute estimate.
    pub fn new(gender: Gender, age: f32) -> Self {
        Self { gender, age }
    }

    /// Age rounded to whole years for display.
    pub fn age_years(&self) -> u32 {
        self.age.round().max(0.0) as u32
    }
}
