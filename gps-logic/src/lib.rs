mod error;
mod geo;
mod history;
mod reading;
mod sampler;
mod settings;
mod source;
mod state;
#[cfg(test)]
mod tests;

pub use error::{PositionError, SamplerError};
pub use geo::{EARTH_RADIUS_METERS, derive_speed, haversine_distance, path_distance};
pub use history::LocationHistory;
pub use reading::{Fix, Reading, SpeedUnit, UtcDT};
pub use sampler::{Sampler, StateUpdateSender, SubscriptionHandle};
pub use settings::{SamplerSettings, SamplingMode};
pub use source::{FixResult, FixSender, PositionOptions, PositionSource, WatchId};
pub use state::SamplerUiState;
