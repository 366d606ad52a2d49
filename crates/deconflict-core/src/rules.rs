//! Safety rules and thresholds for deconfliction.

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};

/// Configuration shared by the geometric checker and the ML pre-screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeconflictionRules {
    /// Minimum allowed 3D separation in meters
    pub safety_buffer_m: f64,
    /// Sampling step across the shared airtime in seconds
    pub time_resolution_s: f64,
    /// Detections closer in time than this collapse into one episode
    pub dedup_threshold_s: f64,
    /// Classifier probability at or above which a mission gets a geometric check
    pub ml_threshold: f64,
}

impl Default for DeconflictionRules {
    fn default() -> Self {
        Self {
            safety_buffer_m: 15.0,
            time_resolution_s: 0.5,
            dedup_threshold_s: 5.0,
            ml_threshold: 0.2,
        }
    }
}

impl DeconflictionRules {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(self.safety_buffer_m.is_finite() && self.safety_buffer_m > 0.0) {
            return Err(ValidationError::InvalidSafetyBuffer(self.safety_buffer_m));
        }
        if !(self.time_resolution_s.is_finite() && self.time_resolution_s > 0.0) {
            return Err(ValidationError::InvalidTimeResolution(self.time_resolution_s));
        }
        if !(self.dedup_threshold_s.is_finite() && self.dedup_threshold_s >= 0.0) {
            return Err(ValidationError::InvalidDedupThreshold(self.dedup_threshold_s));
        }
        if !(0.0..=1.0).contains(&self.ml_threshold) {
            return Err(ValidationError::InvalidProbabilityThreshold(self.ml_threshold));
        }
        Ok(())
    }
}
