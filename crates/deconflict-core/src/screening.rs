//! Classifier pre-screening in front of the geometric checker.
//!
//! Every candidate mission is reduced to a small feature vector computed from
//! static geometry and timing. An external classifier scores the whole batch
//! and only missions at or above the probability threshold reach the exact
//! check. Missions below it are assumed conflict-free, so a badly calibrated
//! classifier can hide a real conflict.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::error::{ClassifierError, ValidationError};
use crate::models::{DeconflictionReport, DroneMission, ScreeningSummary, Waypoint};
use crate::rules::DeconflictionRules;
use crate::service::DeconflictionService;

pub const FEATURE_COUNT: usize = 10;

/// Features of one (primary, other) pair, in this order:
///
/// 0. bounding-box intersection volume
/// 1. time-window overlap duration
/// 2. minimum waypoint-to-waypoint distance
/// 3. altitude-range overlap
/// 4. 5. 6. bounding-box gap along x, y, z
/// 7. path-length ratio (shorter / longer)
/// 8. absolute average-speed difference
/// 9. time-window gap
pub type FeatureVector = [f64; FEATURE_COUNT];

/// Scoring contract for an external conflict classifier.
///
/// Implementations must return exactly one probability in `[0, 1]` per input
/// vector and keep no state between calls.
pub trait ConflictClassifier: Send + Sync {
    fn score(&self, batch: &[FeatureVector]) -> Result<Vec<f64>, ClassifierError>;
}

/// Classifier that gives every pair the same probability.
#[derive(Debug, Clone, Copy)]
pub struct ConstantClassifier(pub f64);

impl ConflictClassifier for ConstantClassifier {
    fn score(&self, batch: &[FeatureVector]) -> Result<Vec<f64>, ClassifierError> {
        Ok(vec![self.0; batch.len()])
    }
}

/// Logistic regression over the raw feature vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticClassifier {
    pub weights: FeatureVector,
    pub bias: f64,
}

impl ConflictClassifier for LogisticClassifier {
    fn score(&self, batch: &[FeatureVector]) -> Result<Vec<f64>, ClassifierError> {
        Ok(batch
            .iter()
            .map(|features| {
                let logit = self
                    .weights
                    .iter()
                    .zip(features)
                    .fold(self.bias, |acc, (w, x)| acc + w * x);
                1.0 / (1.0 + (-logit).exp())
            })
            .collect())
    }
}

/// Axis-aligned box around a mission's waypoints.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Waypoint,
    pub max: Waypoint,
}

impl BoundingBox {
    pub fn of(mission: &DroneMission) -> Self {
        let first = mission.waypoints()[0];
        mission
            .waypoints()
            .iter()
            .fold(Self { min: first, max: first }, |bbox, wp| Self {
                min: Waypoint::new(bbox.min.x.min(wp.x), bbox.min.y.min(wp.y), bbox.min.z.min(wp.z)),
                max: Waypoint::new(bbox.max.x.max(wp.x), bbox.max.y.max(wp.y), bbox.max.z.max(wp.z)),
            })
    }

    /// Intersection length along each axis (0 where the boxes are apart).
    pub fn axis_overlap(&self, other: &BoundingBox) -> [f64; 3] {
        let (lo_a, hi_a, lo_b, hi_b) = self.axes(other);
        std::array::from_fn(|i| (hi_a[i].min(hi_b[i]) - lo_a[i].max(lo_b[i])).max(0.0))
    }

    /// Separation along each axis (0 where the boxes overlap).
    pub fn axis_gap(&self, other: &BoundingBox) -> [f64; 3] {
        let (lo_a, hi_a, lo_b, hi_b) = self.axes(other);
        std::array::from_fn(|i| (lo_a[i].max(lo_b[i]) - hi_a[i].min(hi_b[i])).max(0.0))
    }

    pub fn overlap_volume(&self, other: &BoundingBox) -> f64 {
        self.axis_overlap(other).iter().product()
    }

    fn axes(&self, other: &BoundingBox) -> ([f64; 3], [f64; 3], [f64; 3], [f64; 3]) {
        (
            self.min.to_array(),
            self.max.to_array(),
            other.min.to_array(),
            other.max.to_array(),
        )
    }
}

/// Static pair features. No trajectory simulation involved.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureExtractor;

impl FeatureExtractor {
    pub fn time_overlap_duration(m1: &DroneMission, m2: &DroneMission) -> f64 {
        m1.time_window()
            .overlap(&m2.time_window())
            .map(|overlap| overlap.duration())
            .unwrap_or(0.0)
    }

    /// All-pairs minimum over waypoints, not trajectory-aware.
    pub fn min_waypoint_distance(m1: &DroneMission, m2: &DroneMission) -> f64 {
        m1.waypoints()
            .iter()
            .flat_map(|a| m2.waypoints().iter().map(move |b| a.distance_to(b)))
            .fold(f64::INFINITY, f64::min)
    }

    pub fn altitude_overlap(m1: &DroneMission, m2: &DroneMission) -> f64 {
        BoundingBox::of(m1).axis_overlap(&BoundingBox::of(m2))[2]
    }

    /// Shorter path over longer path; 0 if either path has no length.
    pub fn path_length_ratio(m1: &DroneMission, m2: &DroneMission) -> f64 {
        let len1 = m1.path_length();
        let len2 = m2.path_length();
        if len1 == 0.0 || len2 == 0.0 {
            return 0.0;
        }
        len1.min(len2) / len1.max(len2)
    }

    pub fn average_speed_difference(m1: &DroneMission, m2: &DroneMission) -> f64 {
        (m1.average_speed() - m2.average_speed()).abs()
    }

    pub fn extract(primary: &DroneMission, other: &DroneMission) -> FeatureVector {
        let box1 = BoundingBox::of(primary);
        let box2 = BoundingBox::of(other);
        let gap = box1.axis_gap(&box2);

        [
            box1.overlap_volume(&box2),
            Self::time_overlap_duration(primary, other),
            Self::min_waypoint_distance(primary, other),
            Self::altitude_overlap(primary, other),
            gap[0],
            gap[1],
            gap[2],
            Self::path_length_ratio(primary, other),
            Self::average_speed_difference(primary, other),
            primary.time_window().gap(&other.time_window()),
        ]
    }
}

/// Running totals across verification calls.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScreeningStats {
    /// Verification calls
    pub total_checks: u64,
    /// Missions assumed safe by the classifier
    pub ml_filtered: u64,
    /// Missions sent to the geometric check
    pub geometric_checks: u64,
    /// Calls where the classifier failed and every mission was checked
    pub classifier_failures: u64,
    pub ml_time: Duration,
    pub geometric_time: Duration,
}

impl ScreeningStats {
    /// Share of screened missions that skipped the geometric check.
    pub fn filter_rate(&self) -> f64 {
        let screened = self.ml_filtered + self.geometric_checks;
        if screened == 0 {
            return 0.0;
        }
        self.ml_filtered as f64 / screened as f64
    }

    pub fn avg_ml_time(&self) -> Duration {
        self.per_check(self.ml_time)
    }

    pub fn avg_geometric_time(&self) -> Duration {
        self.per_check(self.geometric_time)
    }

    pub fn avg_total_time(&self) -> Duration {
        self.per_check(self.ml_time + self.geometric_time)
    }

    fn per_check(&self, total: Duration) -> Duration {
        if self.total_checks == 0 {
            return Duration::ZERO;
        }
        total.div_f64(self.total_checks as f64)
    }
}

/// Geometric checker with an optional classifier in front of it.
pub struct ScreeningPipeline {
    service: DeconflictionService,
    classifier: Option<Box<dyn ConflictClassifier>>,
    threshold: f64,
    stats: ScreeningStats,
}

impl ScreeningPipeline {
    pub fn new(
        rules: &DeconflictionRules,
        classifier: Option<Box<dyn ConflictClassifier>>,
    ) -> Result<Self, ValidationError> {
        Self::with_service(DeconflictionService::new(rules)?, classifier, rules.ml_threshold)
    }

    pub fn with_service(
        service: DeconflictionService,
        classifier: Option<Box<dyn ConflictClassifier>>,
        threshold: f64,
    ) -> Result<Self, ValidationError> {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ValidationError::InvalidProbabilityThreshold(threshold));
        }
        Ok(Self {
            service,
            classifier,
            threshold,
            stats: ScreeningStats::default(),
        })
    }

    pub fn has_classifier(&self) -> bool {
        self.classifier.is_some()
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn service(&self) -> &DeconflictionService {
        &self.service
    }

    pub fn stats(&self) -> ScreeningStats {
        self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = ScreeningStats::default();
    }

    /// Screen `others`, then run the geometric check on the high-risk subset.
    ///
    /// Without a classifier, or if the classifier fails, every mission is
    /// checked. The report's `analysis_time` covers screening and geometry.
    pub fn verify<'a>(
        &mut self,
        primary: &'a DroneMission,
        others: &'a [DroneMission],
    ) -> DeconflictionReport<'a> {
        let started = Instant::now();
        let mut summary = ScreeningSummary {
            candidates: others.len(),
            ..Default::default()
        };
        let mut ml_time = Duration::ZERO;
        let mut failed = false;

        let high_risk: Vec<&'a DroneMission> = match &self.classifier {
            Some(classifier) if !others.is_empty() => {
                let ml_started = Instant::now();
                let screened = self.screen(classifier.as_ref(), primary, others);
                ml_time = ml_started.elapsed();
                match screened {
                    Ok(high_risk) => high_risk,
                    Err(err) => {
                        tracing::warn!(
                            primary = primary.id(),
                            "Classifier failed, checking all {} missions: {}",
                            others.len(),
                            err
                        );
                        failed = true;
                        summary.classifier_error = Some(err.to_string());
                        others.iter().collect()
                    }
                }
            }
            _ => others.iter().collect(),
        };
        summary.checked = high_risk.len();
        summary.filtered = others.len() - high_risk.len();

        let geom_started = Instant::now();
        let mut report = self.service.verify(primary, high_risk);
        let geometric_time = geom_started.elapsed();

        report.analysis_time = started.elapsed();
        tracing::debug!(
            primary = primary.id(),
            filtered = summary.filtered,
            checked = summary.checked,
            ml_ms = ml_time.as_secs_f64() * 1000.0,
            geometric_ms = geometric_time.as_secs_f64() * 1000.0,
            "screened verification complete"
        );
        report.screening = Some(summary.clone());

        self.stats.total_checks += 1;
        self.stats.ml_filtered += summary.filtered as u64;
        self.stats.geometric_checks += summary.checked as u64;
        self.stats.classifier_failures += u64::from(failed);
        self.stats.ml_time += ml_time;
        self.stats.geometric_time += geometric_time;

        report
    }

    fn screen<'a>(
        &self,
        classifier: &dyn ConflictClassifier,
        primary: &DroneMission,
        others: &'a [DroneMission],
    ) -> Result<Vec<&'a DroneMission>, ClassifierError> {
        let batch: Vec<FeatureVector> = others
            .iter()
            .map(|other| FeatureExtractor::extract(primary, other))
            .collect();

        let probabilities = classifier.score(&batch)?;
        if probabilities.len() != batch.len() {
            return Err(ClassifierError::BatchLengthMismatch {
                expected: batch.len(),
                actual: probabilities.len(),
            });
        }
        if let Some((index, &value)) = probabilities
            .iter()
            .enumerate()
            .find(|(_, p)| !(0.0..=1.0).contains(*p))
        {
            return Err(ClassifierError::InvalidProbability { index, value });
        }

        Ok(others
            .iter()
            .zip(probabilities)
            .filter(|(_, probability)| *probability >= self.threshold)
            .map(|(mission, _)| mission)
            .collect())
    }
}

impl std::fmt::Debug for ScreeningPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScreeningPipeline")
            .field("service", &self.service)
            .field("has_classifier", &self.classifier.is_some())
            .field("threshold", &self.threshold)
            .field("stats", &self.stats)
            .finish()
    }
}
