use serde::{Deserialize, Serialize};

use crate::{geo::path_distance, reading::Reading};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
/// Every reading accepted this session, in the order they arrived.
/// Nothing is ever removed or reordered.
pub struct LocationHistory {
    readings: Vec<Reading>,
}

impl LocationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a reading to the end, it becomes the current reading
    pub fn append(&mut self, reading: Reading) {
        self.readings.push(reading);
    }

    /// The most recently appended reading
    pub fn current(&self) -> Option<&Reading> {
        self.readings.last()
    }

    pub fn all(&self) -> &[Reading] {
        &self.readings
    }

    pub fn iter(&self) -> impl Iterator<Item = &Reading> {
        self.readings.iter()
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// Sum of the great-circle legs between consecutive readings, in meters
    pub fn total_distance(&self) -> f64 {
        path_distance(&self.readings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(longitude: f64, timestamp_millis: i64) -> Reading {
        Reading {
            latitude: 0.0,
            longitude,
            timestamp_millis,
            speed: None,
        }
    }

    #[test]
    fn test_empty() {
        let history = LocationHistory::new();
        assert!(history.is_empty());
        assert!(history.current().is_none());
        assert!(history.all().is_empty());
        assert_eq!(history.total_distance(), 0.0);
    }

    #[test]
    fn test_append_order_and_current() {
        let mut history = LocationHistory::new();

        // Duplicates and out of order timestamps are kept as-is
        let readings = [reading(0.0, 1000), reading(0.5, 500), reading(0.5, 500)];

        for (i, r) in readings.iter().enumerate() {
            history.append(*r);
            assert_eq!(history.len(), i + 1);
            assert_eq!(history.current(), Some(r));
            assert_eq!(history.all().last(), history.current());
        }

        assert_eq!(history.all(), &readings);
    }

    #[test]
    fn test_total_distance() {
        let mut history = LocationHistory::new();
        history.append(reading(0.0, 0));
        history.append(reading(0.5, 1000));
        history.append(reading(1.0, 2000));

        let d = history.total_distance();
        assert!((d - 111_195.0).abs() < 1.0, "Distance was {d}");
    }
}
