//! Temporal conflict detection between two planned missions.
//!
//! Samples the shared airtime of a mission pair at a fixed cadence, checks
//! separation at every sample and collapses runs of adjacent detections into
//! one conflict per near-miss episode.

use crate::error::ValidationError;
use crate::models::Conflict;
use crate::rules::DeconflictionRules;
use crate::spatial::ProximityChecker;
use crate::trajectory::TrajectoryInterpolator;

pub const DEFAULT_TIME_RESOLUTION_S: f64 = 0.5;
pub const DEFAULT_DEDUP_THRESHOLD_S: f64 = 5.0;

/// Pairwise detector. Stateless between calls.
#[derive(Debug, Clone)]
pub struct TemporalConflictDetector {
    checker: ProximityChecker,
    /// Sampling step (seconds)
    time_resolution: f64,
    /// Minimum gap between reported conflicts of one pair (seconds)
    dedup_threshold: f64,
}

impl TemporalConflictDetector {
    pub fn new(checker: ProximityChecker, time_resolution: f64) -> Result<Self, ValidationError> {
        if !(time_resolution.is_finite() && time_resolution > 0.0) {
            return Err(ValidationError::InvalidTimeResolution(time_resolution));
        }
        Ok(Self {
            checker,
            time_resolution,
            dedup_threshold: DEFAULT_DEDUP_THRESHOLD_S,
        })
    }

    pub fn with_dedup_threshold(mut self, dedup_threshold: f64) -> Result<Self, ValidationError> {
        if !(dedup_threshold.is_finite() && dedup_threshold >= 0.0) {
            return Err(ValidationError::InvalidDedupThreshold(dedup_threshold));
        }
        self.dedup_threshold = dedup_threshold;
        Ok(self)
    }

    pub fn from_rules(rules: &DeconflictionRules) -> Result<Self, ValidationError> {
        let checker = ProximityChecker::new(rules.safety_buffer_m)?;
        Self::new(checker, rules.time_resolution_s)?.with_dedup_threshold(rules.dedup_threshold_s)
    }

    pub fn checker(&self) -> &ProximityChecker {
        &self.checker
    }

    pub fn time_resolution(&self) -> f64 {
        self.time_resolution
    }

    /// Find conflicts between `primary` and `other`, one per episode, in time order.
    ///
    /// Missions that are never airborne together yield no conflicts.
    pub fn detect(
        &self,
        primary: &TrajectoryInterpolator<'_>,
        other: &TrajectoryInterpolator<'_>,
    ) -> Vec<Conflict> {
        let primary_window = primary.mission().time_window();
        let other_window = other.mission().time_window();
        let Some(overlap) = primary_window.overlap(&other_window) else {
            return Vec::new();
        };

        let safety_buffer = self.checker.safety_buffer();
        let steps = (overlap.duration() / self.time_resolution).ceil() as usize;
        let mut conflicts = Vec::new();
        let mut previous = f64::NEG_INFINITY;

        // Index-based stepping, last sample clamped to the end of the overlap.
        for i in 0..=steps {
            let time = (overlap.start + i as f64 * self.time_resolution).min(overlap.end);
            if time <= previous {
                break;
            }
            previous = time;

            let (Some(primary_pos), Some(other_pos)) =
                (primary.position_at(time), other.position_at(time))
            else {
                continue;
            };

            let distance = self.checker.distance(&primary_pos, &other_pos);
            if distance < safety_buffer {
                conflicts.push(Conflict {
                    time,
                    primary_location: primary_pos,
                    other_drone_id: other.mission().id().to_string(),
                    other_location: other_pos,
                    distance,
                    safety_buffer,
                });
            }
        }

        let raw = conflicts.len();
        let conflicts = dedup_conflicts(conflicts, self.dedup_threshold);
        tracing::debug!(
            primary = primary.mission().id(),
            other = other.mission().id(),
            raw,
            kept = conflicts.len(),
            "pairwise check complete"
        );
        conflicts
    }
}

/// Keep the first conflict of each episode.
///
/// After sorting by time, a conflict is kept only if it comes at least
/// `threshold` seconds after the last kept one.
pub fn dedup_conflicts(mut conflicts: Vec<Conflict>, threshold: f64) -> Vec<Conflict> {
    conflicts.sort_by(|a, b| a.time.total_cmp(&b.time));

    let mut kept: Vec<Conflict> = Vec::with_capacity(conflicts.len());
    for conflict in conflicts {
        let keep = kept
            .last()
            .map(|last| conflict.time - last.time >= threshold)
            .unwrap_or(true);
        if keep {
            kept.push(conflict);
        }
    }
    kept
}
