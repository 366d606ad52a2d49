//! Core data models for mission deconfliction.

use crate::error::ValidationError;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::time::Duration;

/// A point on a planned flight path. `z` is altitude.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Waypoint {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    /// Straight-line 3D distance.
    pub fn distance_to(&self, other: &Waypoint) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        let dz = other.z - self.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Linear interpolation toward `other`; `t = 0` is `self`, `t = 1` is `other`.
    pub fn lerp(&self, other: &Waypoint, t: f64) -> Waypoint {
        Waypoint {
            x: self.x + t * (other.x - self.x),
            y: self.y + t * (other.y - self.y),
            z: self.z + t * (other.z - self.z),
        }
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl fmt::Display for Waypoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.1}, {:.1}, {:.1})", self.x, self.y, self.z)
    }
}

/// Interval during which a mission is airborne. Both ends are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: f64,
    pub end: f64,
}

impl TimeWindow {
    /// Create a window, rejecting zero or negative duration.
    pub fn new(start: f64, end: f64) -> Result<Self, ValidationError> {
        let window = Self { start, end };
        window.validate()?;
        Ok(window)
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    pub fn contains(&self, time: f64) -> bool {
        self.start <= time && time <= self.end
    }

    /// Shared airtime of two windows, if any.
    pub fn overlap(&self, other: &TimeWindow) -> Option<TimeWindow> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        (start < end).then_some(TimeWindow { start, end })
    }

    /// Idle time between two disjoint windows (0 when they touch or overlap).
    pub fn gap(&self, other: &TimeWindow) -> f64 {
        (self.start.max(other.start) - self.end.min(other.end)).max(0.0)
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if !self.start.is_finite() || !self.end.is_finite() {
            return Err(ValidationError::NonFiniteValue {
                field: "time window",
            });
        }
        if self.duration() <= 0.0 {
            return Err(ValidationError::EmptyTimeWindow {
                start: self.start,
                end: self.end,
            });
        }
        Ok(())
    }
}

/// A planned flight: an ordered polyline flown across one time window.
///
/// Only constructible through [`DroneMission::new`] (or deserialization,
/// which goes through the same checks), so every instance has at least two
/// waypoints and a positive-duration window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "MissionRecord")]
pub struct DroneMission {
    id: String,
    waypoints: Vec<Waypoint>,
    time_window: TimeWindow,
}

/// Unvalidated wire form of a mission.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MissionRecord {
    id: String,
    waypoints: Vec<Waypoint>,
    time_window: TimeWindow,
}

impl TryFrom<MissionRecord> for DroneMission {
    type Error = ValidationError;

    fn try_from(record: MissionRecord) -> Result<Self, Self::Error> {
        DroneMission::new(record.id, record.waypoints, record.time_window)
    }
}

impl DroneMission {
    pub fn new(
        id: impl Into<String>,
        waypoints: Vec<Waypoint>,
        time_window: TimeWindow,
    ) -> Result<Self, ValidationError> {
        let id = id.into();
        if waypoints.len() < 2 {
            return Err(ValidationError::TooFewWaypoints {
                mission_id: id,
                count: waypoints.len(),
            });
        }
        if !waypoints.iter().all(Waypoint::is_finite) {
            return Err(ValidationError::NonFiniteValue {
                field: "waypoint coordinate",
            });
        }
        time_window.validate()?;

        Ok(Self {
            id,
            waypoints,
            time_window,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    pub fn time_window(&self) -> TimeWindow {
        self.time_window
    }

    /// Total polyline length.
    pub fn path_length(&self) -> f64 {
        self.waypoints
            .windows(2)
            .map(|pair| pair[0].distance_to(&pair[1]))
            .sum()
    }

    /// Constant speed implied by flying the whole path within the window.
    pub fn average_speed(&self) -> f64 {
        self.path_length() / self.time_window.duration()
    }
}

/// A single instant at which two missions are closer than the safety buffer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Conflict {
    pub time: f64,
    #[serde(rename = "location")]
    pub primary_location: Waypoint,
    pub other_drone_id: String,
    pub other_location: Waypoint,
    pub distance: f64,
    pub safety_buffer: f64,
}

impl Conflict {
    /// 0 at the buffer edge, approaching 1 as the drones coincide.
    pub fn severity(&self) -> f64 {
        1.0 - self.distance / self.safety_buffer
    }
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Conflict(time={:.1}s, drone={}, distance={:.2}m, location={})",
            self.time, self.other_drone_id, self.distance, self.primary_location
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeconflictionStatus {
    /// No conflicts found, mission may fly
    Clear,
    /// At least one conflict found
    Conflict,
}

impl fmt::Display for DeconflictionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeconflictionStatus::Clear => write!(f, "CLEAR"),
            DeconflictionStatus::Conflict => write!(f, "CONFLICT"),
        }
    }
}

/// Outcome of the classifier pre-screen for a single verification.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreeningSummary {
    /// Missions offered to the pre-screen
    pub candidates: usize,
    /// Missions assumed safe without a geometric check
    pub filtered: usize,
    /// Missions forwarded to the geometric check
    pub checked: usize,
    /// Set when the classifier failed and every candidate was checked instead
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classifier_error: Option<String>,
}

/// Mission-level verdict for one verification call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeconflictionReport<'a> {
    pub status: DeconflictionStatus,
    pub conflicts: Vec<Conflict>,
    #[serde(skip)]
    pub primary_mission: &'a DroneMission,
    /// Missions that went through the geometric check
    #[serde(skip)]
    pub other_missions: Vec<&'a DroneMission>,
    pub safety_buffer: f64,
    #[serde(serialize_with = "serialize_secs")]
    pub analysis_time: Duration,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screening: Option<ScreeningSummary>,
}

fn serialize_secs<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64())
}

/// Conflicts listed per drone in the summary before collapsing the rest.
const SUMMARY_CONFLICTS_PER_DRONE: usize = 3;

impl DeconflictionReport<'_> {
    pub fn is_clear(&self) -> bool {
        self.status == DeconflictionStatus::Clear
    }

    /// Human-readable verdict, grouping conflicts by drone in first-seen order.
    pub fn conflict_summary(&self) -> String {
        if self.is_clear() {
            return "Mission CLEAR for execution. No conflicts detected.".to_string();
        }

        let mut by_drone: Vec<(&str, Vec<&Conflict>)> = Vec::new();
        for conflict in &self.conflicts {
            match by_drone
                .iter_mut()
                .find(|(id, _)| *id == conflict.other_drone_id)
            {
                Some((_, group)) => group.push(conflict),
                None => by_drone.push((&conflict.other_drone_id, vec![conflict])),
            }
        }

        let mut summary = format!(
            "CONFLICT DETECTED: {} conflict(s) found\nSafety Buffer: {}m\n",
            self.conflicts.len(),
            self.safety_buffer
        );
        for (drone_id, group) in by_drone {
            summary.push_str(&format!("\n  Conflicting with {drone_id}:"));
            for (i, conflict) in group.iter().take(SUMMARY_CONFLICTS_PER_DRONE).enumerate() {
                summary.push_str(&format!(
                    "\n    {}. Time: {:.1}s, Location: {}, Distance: {:.2}m",
                    i + 1,
                    conflict.time,
                    conflict.primary_location,
                    conflict.distance
                ));
            }
            if group.len() > SUMMARY_CONFLICTS_PER_DRONE {
                summary.push_str(&format!(
                    "\n    ... and {} more",
                    group.len() - SUMMARY_CONFLICTS_PER_DRONE
                ));
            }
        }
        summary
    }
}
