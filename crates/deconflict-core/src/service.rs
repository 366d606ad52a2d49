//! Mission-level deconfliction: primary mission against all other traffic.

use std::time::Instant;

use crate::conflict::TemporalConflictDetector;
use crate::error::ValidationError;
use crate::models::{DeconflictionReport, DeconflictionStatus, DroneMission};
use crate::rules::DeconflictionRules;
use crate::trajectory::TrajectoryInterpolator;

/// Exact geometric checker for a primary mission.
#[derive(Debug, Clone)]
pub struct DeconflictionService {
    detector: TemporalConflictDetector,
}

impl DeconflictionService {
    pub fn new(rules: &DeconflictionRules) -> Result<Self, ValidationError> {
        rules.validate()?;
        Ok(Self {
            detector: TemporalConflictDetector::from_rules(rules)?,
        })
    }

    pub fn with_detector(detector: TemporalConflictDetector) -> Self {
        Self { detector }
    }

    pub fn safety_buffer(&self) -> f64 {
        self.detector.checker().safety_buffer()
    }

    /// Check `primary` against every mission in `others`.
    ///
    /// Conflicts stay grouped by other mission, in the order the missions
    /// were given. An empty `others` is always CLEAR.
    pub fn verify<'a, I>(&self, primary: &'a DroneMission, others: I) -> DeconflictionReport<'a>
    where
        I: IntoIterator<Item = &'a DroneMission>,
    {
        let started = Instant::now();
        let primary_interp = TrajectoryInterpolator::new(primary);

        let mut other_missions = Vec::new();
        let mut conflicts = Vec::new();
        for other in others {
            let other_interp = TrajectoryInterpolator::new(other);
            conflicts.extend(self.detector.detect(&primary_interp, &other_interp));
            other_missions.push(other);
        }

        let status = if conflicts.is_empty() {
            DeconflictionStatus::Clear
        } else {
            DeconflictionStatus::Conflict
        };
        let analysis_time = started.elapsed();

        tracing::info!(
            primary = primary.id(),
            others = other_missions.len(),
            conflicts = conflicts.len(),
            %status,
            elapsed_ms = analysis_time.as_secs_f64() * 1000.0,
            "geometric verification complete"
        );

        DeconflictionReport {
            status,
            conflicts,
            primary_mission: primary,
            other_missions,
            safety_buffer: self.safety_buffer(),
            analysis_time,
            screening: None,
        }
    }
}
