//! Spatial math for separation checks.

use crate::error::ValidationError;
use crate::models::Waypoint;

/// Calculate straight-line distance between two positions.
pub fn distance_3d(p1: &Waypoint, p2: &Waypoint) -> f64 {
    p1.distance_to(p2)
}

/// Closest approach between two sampled trajectories.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosestApproach {
    pub distance: f64,
    pub time_a: f64,
    pub time_b: f64,
}

/// "Too close" predicate against a fixed safety buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProximityChecker {
    safety_buffer: f64,
}

impl ProximityChecker {
    pub fn new(safety_buffer: f64) -> Result<Self, ValidationError> {
        if !(safety_buffer.is_finite() && safety_buffer > 0.0) {
            return Err(ValidationError::InvalidSafetyBuffer(safety_buffer));
        }
        Ok(Self { safety_buffer })
    }

    pub fn safety_buffer(&self) -> f64 {
        self.safety_buffer
    }

    pub fn distance(&self, p1: &Waypoint, p2: &Waypoint) -> f64 {
        distance_3d(p1, p2)
    }

    /// Strictly closer than the buffer; exactly at the buffer is still safe.
    pub fn is_conflict(&self, p1: &Waypoint, p2: &Waypoint) -> bool {
        self.distance(p1, p2) < self.safety_buffer
    }

    /// Brute-force minimum distance over every pair of samples, ignoring time alignment.
    ///
    /// Returns `None` if either trajectory has no samples.
    pub fn closest_approach<A, B>(&self, samples_a: A, samples_b: B) -> Option<ClosestApproach>
    where
        A: IntoIterator<Item = (f64, Waypoint)>,
        B: IntoIterator<Item = (f64, Waypoint)>,
    {
        let samples_b: Vec<(f64, Waypoint)> = samples_b.into_iter().collect();
        let mut best: Option<ClosestApproach> = None;

        for (time_a, pos_a) in samples_a {
            for (time_b, pos_b) in &samples_b {
                let distance = self.distance(&pos_a, pos_b);
                let replace = best
                    .as_ref()
                    .map(|best| distance < best.distance)
                    .unwrap_or(true);
                if replace {
                    best = Some(ClosestApproach {
                        distance,
                        time_a,
                        time_b: *time_b,
                    });
                }
            }
        }

        best
    }
}
