pub mod conflict;
pub mod error;
pub mod models;
pub mod rules;
pub mod scenarios;
pub mod screening;
pub mod service;
pub mod spatial;
pub mod trajectory;

pub use conflict::{dedup_conflicts, TemporalConflictDetector};
pub use error::{ClassifierError, ValidationError};
pub use models::{
    Conflict, DeconflictionReport, DeconflictionStatus, DroneMission, ScreeningSummary,
    TimeWindow, Waypoint,
};
pub use rules::DeconflictionRules;
pub use scenarios::Scenario;
pub use screening::{
    BoundingBox, ConflictClassifier, ConstantClassifier, FeatureExtractor, FeatureVector,
    LogisticClassifier, ScreeningPipeline, ScreeningStats, FEATURE_COUNT,
};
pub use service::DeconflictionService;
pub use spatial::{distance_3d, ClosestApproach, ProximityChecker};
pub use trajectory::{TrajectoryInterpolator, TrajectorySamples};
