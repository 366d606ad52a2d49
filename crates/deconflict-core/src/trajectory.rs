//! Continuous position model for a planned mission.
//!
//! A mission is flown at the constant speed that covers its whole polyline
//! exactly within its time window, so time maps to distance traveled rather
//! than to waypoint index.

use crate::models::{DroneMission, Waypoint};

/// Position-over-time for one mission. Build once, query many times.
#[derive(Debug, Clone)]
pub struct TrajectoryInterpolator<'a> {
    mission: &'a DroneMission,
    segment_lengths: Vec<f64>,
    /// Arc length at each waypoint; `cumulative[0] == 0`
    cumulative: Vec<f64>,
    total_length: f64,
}

impl<'a> TrajectoryInterpolator<'a> {
    pub fn new(mission: &'a DroneMission) -> Self {
        let segment_lengths: Vec<f64> = mission
            .waypoints()
            .windows(2)
            .map(|pair| pair[0].distance_to(&pair[1]))
            .collect();

        let mut cumulative = Vec::with_capacity(segment_lengths.len() + 1);
        cumulative.push(0.0);
        let mut running = 0.0;
        for length in &segment_lengths {
            running += length;
            cumulative.push(running);
        }

        Self {
            mission,
            segment_lengths,
            cumulative,
            total_length: running,
        }
    }

    pub fn mission(&self) -> &'a DroneMission {
        self.mission
    }

    pub fn total_length(&self) -> f64 {
        self.total_length
    }

    /// Position at `time`, or `None` while the drone is not airborne.
    pub fn position_at(&self, time: f64) -> Option<Waypoint> {
        let window = self.mission.time_window();
        if !window.contains(time) {
            return None;
        }

        let progress = (time - window.start) / window.duration();
        let target = progress * self.total_length;

        // First cumulative entry >= target, minus one, clamped to a real segment.
        let last_segment = self.segment_lengths.len() - 1;
        let segment = self
            .cumulative
            .partition_point(|&distance| distance < target)
            .saturating_sub(1)
            .min(last_segment);

        let length = self.segment_lengths[segment];
        let fraction = if length > 0.0 {
            ((target - self.cumulative[segment]) / length).clamp(0.0, 1.0)
        } else {
            0.0
        };

        let waypoints = self.mission.waypoints();
        Some(waypoints[segment].lerp(&waypoints[segment + 1], fraction))
    }

    /// `count` evenly spaced `(time, position)` pairs spanning the window.
    pub fn samples(&self, count: usize) -> TrajectorySamples<'_, 'a> {
        TrajectorySamples {
            interpolator: self,
            index: 0,
            count,
        }
    }
}

/// Iterator over evenly spaced trajectory samples. Clone it to restart.
#[derive(Debug, Clone)]
pub struct TrajectorySamples<'i, 'a> {
    interpolator: &'i TrajectoryInterpolator<'a>,
    index: usize,
    count: usize,
}

impl Iterator for TrajectorySamples<'_, '_> {
    type Item = (f64, Waypoint);

    fn next(&mut self) -> Option<Self::Item> {
        while self.index < self.count {
            let window = self.interpolator.mission.time_window();
            let time = if self.count == 1 {
                window.start
            } else if self.index + 1 == self.count {
                window.end
            } else {
                window.start + window.duration() * self.index as f64 / (self.count - 1) as f64
            };
            self.index += 1;

            if let Some(position) = self.interpolator.position_at(time) {
                return Some((time, position));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.count - self.index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TimeWindow;

    fn mission(waypoints: Vec<Waypoint>, start: f64, end: f64) -> DroneMission {
        DroneMission::new("T", waypoints, TimeWindow::new(start, end).unwrap()).unwrap()
    }

    fn close(a: Waypoint, b: Waypoint) -> bool {
        a.distance_to(&b) < 1e-9
    }

    #[test]
    fn endpoints_match_first_and_last_waypoint() {
        let m = mission(
            vec![
                Waypoint::new(0.0, 0.0, 50.0),
                Waypoint::new(50.0, 50.0, 60.0),
                Waypoint::new(100.0, 50.0, 70.0),
                Waypoint::new(150.0, 0.0, 50.0),
            ],
            30.0,
            150.0,
        );
        let interp = TrajectoryInterpolator::new(&m);
        assert!(close(interp.position_at(30.0).unwrap(), Waypoint::new(0.0, 0.0, 50.0)));
        assert!(close(interp.position_at(150.0).unwrap(), Waypoint::new(150.0, 0.0, 50.0)));
    }

    #[test]
    fn outside_window_is_not_airborne() {
        let m = mission(
            vec![Waypoint::new(0.0, 0.0, 0.0), Waypoint::new(10.0, 0.0, 0.0)],
            10.0,
            20.0,
        );
        let interp = TrajectoryInterpolator::new(&m);
        assert!(interp.position_at(9.999).is_none());
        assert!(interp.position_at(20.001).is_none());
        assert!(interp.position_at(15.0).is_some());
    }

    #[test]
    fn time_maps_to_distance_not_waypoint_index() {
        // Short first leg (10), long second leg (90): halfway in time is 50 along the path.
        let m = mission(
            vec![
                Waypoint::new(0.0, 0.0, 0.0),
                Waypoint::new(10.0, 0.0, 0.0),
                Waypoint::new(100.0, 0.0, 0.0),
            ],
            0.0,
            100.0,
        );
        let interp = TrajectoryInterpolator::new(&m);
        assert!(close(interp.position_at(50.0).unwrap(), Waypoint::new(50.0, 0.0, 0.0)));
        assert!(close(interp.position_at(10.0).unwrap(), Waypoint::new(10.0, 0.0, 0.0)));
        assert_eq!(interp.total_length(), 100.0);
    }

    #[test]
    fn zero_length_segment_is_instantaneous() {
        let m = mission(
            vec![
                Waypoint::new(0.0, 0.0, 0.0),
                Waypoint::new(0.0, 0.0, 0.0),
                Waypoint::new(20.0, 0.0, 0.0),
            ],
            0.0,
            20.0,
        );
        let interp = TrajectoryInterpolator::new(&m);
        assert!(close(interp.position_at(0.0).unwrap(), Waypoint::new(0.0, 0.0, 0.0)));
        assert!(close(interp.position_at(5.0).unwrap(), Waypoint::new(5.0, 0.0, 0.0)));
    }

    #[test]
    fn hovering_mission_stays_put() {
        let m = mission(
            vec![Waypoint::new(3.0, 4.0, 5.0), Waypoint::new(3.0, 4.0, 5.0)],
            0.0,
            10.0,
        );
        let interp = TrajectoryInterpolator::new(&m);
        assert_eq!(interp.total_length(), 0.0);
        assert!(close(interp.position_at(7.0).unwrap(), Waypoint::new(3.0, 4.0, 5.0)));
    }

    #[test]
    fn samples_span_window_and_restart() {
        let m = mission(
            vec![Waypoint::new(0.0, 0.0, 0.0), Waypoint::new(100.0, 0.0, 0.0)],
            0.0,
            10.0,
        );
        let interp = TrajectoryInterpolator::new(&m);
        let samples = interp.samples(11);
        let first: Vec<_> = samples.clone().collect();
        let again: Vec<_> = samples.collect();

        assert_eq!(first.len(), 11);
        assert_eq!(first, again);
        assert_eq!(first[0].0, 0.0);
        assert_eq!(first[10].0, 10.0);
        assert!(close(first[5].1, Waypoint::new(50.0, 0.0, 0.0)));
        assert_eq!(interp.samples(0).count(), 0);
        assert_eq!(interp.samples(1).next().map(|(t, _)| t), Some(0.0));
    }
}
