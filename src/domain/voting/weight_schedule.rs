//! Weight schedule for successive votes by the same user.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::ValidationError;

/// Weights applied to a user's 1st, 2nd, 3rd... vote in a session.
///
/// Sequences past the end of the schedule reuse the last weight.
///
/// # Invariants
///
/// - at least one weight
/// - every weight finite and positive
/// - non-increasing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct WeightSchedule(Vec<f64>);

impl WeightSchedule {
    pub const DEFAULT_WEIGHTS: [f64; 3] = [1.0, 0.5, 0.25];

    pub fn new(weights: Vec<f64>) -> Result<Self, ValidationError> {
        if weights.is_empty() {
            return Err(ValidationError::empty_field("weight_schedule"));
        }
        for (i, w) in weights.iter().enumerate() {
            if !w.is_finite() || *w <= 0.0 {
                return Err(ValidationError::invalid_format(
                    "weight_schedule",
                    format!("weight #{} must be a positive number, got {}", i + 1, w),
                ));
            }
        }
        if weights.windows(2).any(|pair| pair[1] > pair[0]) {
            return Err(ValidationError::invalid_format(
                "weight_schedule",
                "weights must not increase with the vote sequence",
            ));
        }
        Ok(Self(weights))
    }

    /// Weight of the vote with the given 1-based sequence number.
    pub fn weight_for(&self, sequence: u32) -> f64 {
        let idx = (sequence.max(1) - 1) as usize;
        let last = self.0.len() - 1;
        self.0[idx.min(last)]
    }

    pub fn weights(&self) -> &[f64] {
        &self.0
    }
}

impl Default for WeightSchedule {
    fn default() -> Self {
        Self(Self::DEFAULT_WEIGHTS.to_vec())
    }
}

impl TryFrom<Vec<f64>> for WeightSchedule {
    type Error = ValidationError;

    fn try_from(value: Vec<f64>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<WeightSchedule> for Vec<f64> {
    fn from(value: WeightSchedule) -> Self {
        value.0
    }
}
