use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{reading::SpeedUnit, source::PositionOptions};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
/// How the sampler gets fixes out of the device
pub enum SamplingMode {
    /// Subscribe once and let the device push fixes as it gets them
    #[default]
    Watch,
    /// Ask the device for a single fix every `interval_ms`
    Poll { interval_ms: u64 },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
/// Settings for a sampler, any missing fields take their default
pub struct SamplerSettings {
    /// Watch or poll the device
    pub mode: SamplingMode,
    /// Ask the device for its most accurate (and power hungry) fixes
    pub high_accuracy: bool,
    /// Oldest cached fix the device may hand back, in ms. 0 forces a fresh fix.
    pub max_cached_age_ms: u32,
    /// How long the device gets to acquire a fix before reporting a timeout, in ms
    pub acquisition_timeout_ms: u32,
    /// Unit speeds are displayed in
    pub speed_unit: SpeedUnit,
}

impl SamplerSettings {
    pub fn position_options(&self) -> PositionOptions {
        PositionOptions {
            high_accuracy: self.high_accuracy,
            max_cached_age_ms: self.max_cached_age_ms,
            acquisition_timeout_ms: self.acquisition_timeout_ms,
        }
    }

    /// Interval between requests when polling, `None` when watching
    pub fn poll_interval(&self) -> Option<Duration> {
        match self.mode {
            SamplingMode::Watch => None,
            // Zero intervals make tokio panic, clamp to something sane
            SamplingMode::Poll { interval_ms } => {
                Some(Duration::from_millis(interval_ms.max(1)))
            }
        }
    }
}

impl Default for SamplerSettings {
    fn default() -> Self {
        Self {
            mode: SamplingMode::default(),
            high_accuracy: true,
            max_cached_age_ms: 2000,
            acquisition_timeout_ms: 10000,
            speed_unit: SpeedUnit::default(),
        }
    }
}
