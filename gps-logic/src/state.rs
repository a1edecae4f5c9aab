use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::{
    error::SamplerError,
    history::LocationHistory,
    reading::{Fix, Reading},
    sampler::SubscriptionHandle,
    source::WatchId,
};

/// Bookkeeping for the one subscription a sampler may have running
pub struct ActiveSubscription {
    pub handle: SubscriptionHandle,
    /// Device watch backing this subscription, `None` when polling
    pub watch: Option<WatchId>,
    pub cancel: CancellationToken,
}

/// Everything the sampler mutates, guarded by a single lock
#[derive(Default)]
pub struct SamplerState {
    active: Option<ActiveSubscription>,
    history: LocationHistory,
    last_error: Option<SamplerError>,
    capability_missing: bool,
}

impl SamplerState {
    pub fn handle(&self) -> Option<SubscriptionHandle> {
        self.active.as_ref().map(|a| a.handle)
    }

    /// Whether fixes for `handle` should still be applied
    pub fn is_current(&self, handle: SubscriptionHandle) -> bool {
        self.active
            .as_ref()
            .is_some_and(|a| a.handle == handle && !a.cancel.is_cancelled())
    }

    pub fn activate(&mut self, active: ActiveSubscription) {
        self.active = Some(active);
    }

    pub fn deactivate(&mut self) -> Option<ActiveSubscription> {
        self.active.take()
    }

    /// Normalize and store a fix, returning the new current reading
    pub fn accept_fix(&mut self, fix: Fix) -> Result<Reading, SamplerError> {
        let reading = Reading::from_fix(fix, self.history.current())?;
        self.history.append(reading);
        self.last_error = None;
        Ok(reading)
    }

    pub fn record_error(&mut self, err: SamplerError) {
        self.last_error = Some(err);
    }

    /// Mark the device as lacking a position capability.
    /// Returns `true` only the first time so it's surfaced once.
    pub fn record_capability_missing(&mut self) -> bool {
        if self.capability_missing {
            false
        } else {
            self.capability_missing = true;
            self.last_error = Some(SamplerError::CapabilityUnavailable);
            true
        }
    }

    pub fn last_error(&self) -> Option<SamplerError> {
        self.last_error
    }

    pub fn history(&self) -> &LocationHistory {
        &self.history
    }

    pub fn as_ui_state(&self) -> SamplerUiState {
        SamplerUiState {
            active: self.active.is_some(),
            current: self.history.current().copied(),
            history: self.history.all().to_vec(),
            last_error: self.last_error.map(|e| e.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
/// Snapshot of the sampler for whatever is rendering it
pub struct SamplerUiState {
    /// Whether a subscription is currently running
    pub active: bool,
    /// Latest reading, always the last entry of `history`
    pub current: Option<Reading>,
    pub history: Vec<Reading>,
    /// Message for the last error, cleared by the next good reading
    pub last_error: Option<String>,
}
