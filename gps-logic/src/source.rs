use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::{error::PositionError, reading::Fix};

/// Outcome of a single attempt to get a fix
pub type FixResult = Result<Fix, PositionError>;

/// Channel a [PositionSource] pushes fixes into while a watch is active
pub type FixSender = mpsc::Sender<FixResult>;

/// Identifier the device hands out for a watch, only meaningful to that device
pub type WatchId = u32;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
/// Options passed to the device with every request or watch
pub struct PositionOptions {
    pub high_accuracy: bool,
    pub max_cached_age_ms: u32,
    pub acquisition_timeout_ms: u32,
}

/// The device's position reporting capability
pub trait PositionSource: Send + Sync + 'static {
    /// Whether the device can report positions at all
    fn is_available(&self) -> bool {
        true
    }

    /// Get a single fix
    fn request_once(
        &self,
        options: PositionOptions,
    ) -> impl std::future::Future<Output = FixResult> + Send;

    /// Start continuously reporting fixes (and errors) into `sender`. The source dropping
    /// the sender signals that it stopped reporting on its own.
    fn subscribe(&self, options: PositionOptions, sender: FixSender)
    -> Result<WatchId, PositionError>;

    /// Stop a watch, calling this on an unknown or already stopped watch does nothing
    fn unsubscribe(&self, id: WatchId);
}
