use std::path::Path;

use gps_logic::{Fix, PositionError};
use serde::{Deserialize, Serialize};

use crate::prelude::*;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
/// One thing the replayed device does
pub enum TrackStep {
    /// Report a fix
    Fix(Fix),
    /// Report a failure
    Error(PositionError),
    /// Do nothing for this many milliseconds
    Wait(u64),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
/// A scripted run of a device
pub struct Track {
    pub steps: Vec<TrackStep>,
}

impl Track {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read track {}", path.display()))?;
        serde_json::from_str(&raw).context("Failed to parse track")
    }

    /// A device moving in a straight line, reporting a fix every `interval_ms` starting
    /// at `start` and moving by `step` (degrees lat, long) each time. No speeds are
    /// reported, so the sampler has to derive them.
    pub fn straight_line(
        points: usize,
        start: (f64, f64),
        step: (f64, f64),
        interval_ms: u64,
        start_millis: i64,
    ) -> Self {
        let mut steps = Vec::with_capacity(points * 2);
        for i in 0..points {
            if i != 0 {
                steps.push(TrackStep::Wait(interval_ms));
            }
            let n = i as f64;
            let fix = Fix::new(
                start.0 + step.0 * n,
                start.1 + step.1 * n,
                start_millis + interval_ms as i64 * i as i64,
            );
            steps.push(TrackStep::Fix(fix));
        }
        Self { steps }
    }

    pub fn fix_count(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| matches!(s, TrackStep::Fix(_)))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_track() {
        let raw = r#"{
            "steps": [
                {"fix": {"latitude": 1.0, "longitude": 2.0, "timestamp_millis": 0}},
                {"wait": 500},
                {"error": "timeout"},
                {"fix": {"latitude": 1.0, "longitude": 2.1, "timestamp_millis": 1000, "speed": 2.5}}
            ]
        }"#;
        let track: Track = serde_json::from_str(raw).unwrap();

        assert_eq!(track.steps.len(), 4);
        assert_eq!(track.steps[1], TrackStep::Wait(500));
        assert_eq!(track.steps[2], TrackStep::Error(PositionError::Timeout));
        assert_eq!(
            track.steps[3],
            TrackStep::Fix(Fix::new(1.0, 2.1, 1000).with_speed(2.5))
        );
        assert_eq!(track.fix_count(), 2);
    }

    #[test]
    fn test_straight_line() {
        let track = Track::straight_line(3, (10.0, 20.0), (0.0, 0.5), 1000, 5000);

        assert_eq!(
            track.steps,
            vec![
                TrackStep::Fix(Fix::new(10.0, 20.0, 5000)),
                TrackStep::Wait(1000),
                TrackStep::Fix(Fix::new(10.0, 20.5, 6000)),
                TrackStep::Wait(1000),
                TrackStep::Fix(Fix::new(10.0, 21.0, 7000)),
            ]
        );
    }

    #[test]
    fn test_load_missing() {
        let err = Track::load(Path::new("/definitely/not/a/track.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read track"));
    }
}
