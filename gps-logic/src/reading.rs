use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{error::PositionError, geo::derive_speed};

/// Convenience alias for UTC DT
pub type UtcDT = DateTime<Utc>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
/// A raw position report as handed to us by the device
pub struct Fix {
    /// Latitude in degrees
    pub latitude: f64,
    /// Longitude in degrees
    pub longitude: f64,
    /// Milliseconds since the unix epoch the fix was taken at
    pub timestamp_millis: i64,
    /// Ground speed in m/s, devices leave this out (or send garbage) when they can't tell
    #[serde(default)]
    pub speed: Option<f64>,
}

impl Fix {
    pub fn new(latitude: f64, longitude: f64, timestamp_millis: i64) -> Self {
        Self {
            latitude,
            longitude,
            timestamp_millis,
            speed: None,
        }
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = Some(speed);
        self
    }

    fn coords_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    fn device_speed(&self) -> Option<f64> {
        self.speed.filter(|s| s.is_finite() && *s >= 0.0)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
/// A normalized fix, this is what ends up in history
pub struct Reading {
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp_millis: i64,
    /// Speed in m/s, either from the device or derived from the previous reading
    pub speed: Option<f64>,
}

impl Reading {
    /// Normalize a fix, falling back to the speed implied by `previous` when the device
    /// didn't report one.
    pub fn from_fix(fix: Fix, previous: Option<&Reading>) -> Result<Self, PositionError> {
        if !fix.coords_valid() {
            return Err(PositionError::PositionUnavailable);
        }

        let mut reading = Self {
            latitude: fix.latitude,
            longitude: fix.longitude,
            timestamp_millis: fix.timestamp_millis,
            speed: fix.device_speed(),
        };

        if reading.speed.is_none() {
            reading.speed = previous.and_then(|prev| derive_speed(prev, &reading));
        }

        Ok(reading)
    }

    pub fn recorded_at(&self) -> Option<UtcDT> {
        DateTime::from_timestamp_millis(self.timestamp_millis)
    }

    pub fn speed_in(&self, unit: SpeedUnit) -> Option<f64> {
        self.speed.map(|s| unit.from_mps(s))
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
/// Unit speeds are displayed in, readings always store m/s
pub enum SpeedUnit {
    #[default]
    MetersPerSecond,
    KilometersPerHour,
}

impl SpeedUnit {
    pub fn from_mps(&self, mps: f64) -> f64 {
        match self {
            Self::MetersPerSecond => mps,
            Self::KilometersPerHour => mps * 3.6,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::MetersPerSecond => "m/s",
            Self::KilometersPerHour => "km/h",
        }
    }
}
