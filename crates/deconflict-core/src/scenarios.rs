//! Built-in demo scenarios for the CLI and the HTTP API.

use serde::Serialize;

use crate::error::ValidationError;
use crate::models::{DroneMission, TimeWindow, Waypoint};

/// A primary mission and the traffic it must be checked against.
#[derive(Debug, Clone, Serialize)]
pub struct Scenario {
    pub name: String,
    pub primary: DroneMission,
    pub others: Vec<DroneMission>,
}

fn mission(id: &str, points: [(f64, f64, f64); 4], start: f64, end: f64) -> Result<DroneMission, ValidationError> {
    let waypoints = points
        .into_iter()
        .map(|(x, y, z)| Waypoint::new(x, y, z))
        .collect();
    DroneMission::new(id, waypoints, TimeWindow::new(start, end)?)
}

/// Primary climbs through the corridor Drone-A is descending along.
///
/// - Drone-A: head-on along the primary's route, loses separation around t=90
/// - Drone-B: parallel track to the north, stays clear
pub fn conflict_scenario() -> Result<Scenario, ValidationError> {
    Ok(Scenario {
        name: "Conflict Scenario".to_string(),
        primary: mission(
            "PRIMARY",
            [(0.0, 0.0, 50.0), (50.0, 50.0, 60.0), (100.0, 50.0, 70.0), (150.0, 0.0, 70.0)],
            30.0,
            150.0,
        )?,
        others: vec![
            mission(
                "Drone-A",
                [(150.0, 100.0, 55.0), (100.0, 75.0, 65.0), (70.0, 50.0, 60.0), (0.0, 25.0, 50.0)],
                30.0,
                150.0,
            )?,
            mission(
                "Drone-B",
                [(25.0, 100.0, 45.0), (75.0, 75.0, 55.0), (125.0, 50.0, 65.0), (150.0, 25.0, 70.0)],
                0.0,
                100.0,
            )?,
        ],
    })
}

/// Same airspace, but the other drones are stacked above and below the primary.
pub fn clear_scenario() -> Result<Scenario, ValidationError> {
    Ok(Scenario {
        name: "Clear Scenario".to_string(),
        primary: mission(
            "PRIMARY",
            [(0.0, 0.0, 50.0), (50.0, 25.0, 60.0), (100.0, 25.0, 70.0), (150.0, 0.0, 50.0)],
            0.0,
            120.0,
        )?,
        others: vec![
            mission(
                "Drone-A",
                [(0.0, 100.0, 100.0), (50.0, 100.0, 110.0), (100.0, 100.0, 120.0), (150.0, 100.0, 100.0)],
                0.0,
                120.0,
            )?,
            mission(
                "Drone-B",
                [(150.0, 50.0, 30.0), (100.0, 75.0, 25.0), (50.0, 75.0, 20.0), (0.0, 50.0, 30.0)],
                50.0,
                170.0,
            )?,
        ],
    })
}

/// Every built-in scenario keyed by its short name.
pub fn all() -> Result<Vec<(&'static str, Scenario)>, ValidationError> {
    Ok(vec![
        ("conflict", conflict_scenario()?),
        ("clear", clear_scenario()?),
    ])
}
