use std::{fmt, sync::Arc, time::Duration};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::{RwLock, mpsc};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::{
    error::SamplerError,
    reading::Reading,
    settings::SamplerSettings,
    source::{FixResult, PositionOptions, PositionSource, WatchId},
    state::{ActiveSubscription, SamplerState, SamplerUiState},
};

/// How many fixes a watch can have in flight before the device has to wait on us
const FIX_BUFFER: usize = 16;

pub trait StateUpdateSender: Send + Sync + 'static {
    fn send_update(&self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// Opaque token for the subscription a sampler currently has running
pub struct SubscriptionHandle(Uuid);

impl SubscriptionHandle {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SubscriptionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// State shared between the sampler and its pump task
struct Shared<S: StateUpdateSender> {
    state: RwLock<SamplerState>,
    updates: S,
}

impl<S: StateUpdateSender> Shared<S> {
    /// Apply the outcome of a fix attempt, ignored if `handle` is no longer the running
    /// subscription.
    async fn deliver(&self, handle: SubscriptionHandle, res: FixResult) {
        let mut state = self.state.write().await;

        if !state.is_current(handle) {
            debug!("Dropping fix for stale subscription {handle}");
            return;
        }

        match res {
            Ok(fix) => match state.accept_fix(fix) {
                Ok(reading) => debug!(
                    "Reading ({}, {}) at {} speed {:?}",
                    reading.latitude, reading.longitude, reading.timestamp_millis, reading.speed
                ),
                Err(why) => {
                    warn!("Rejected fix {fix:?}: {why}");
                    state.record_error(why);
                }
            },
            Err(why) => {
                warn!("Failed to get location: {why:?}");
                state.record_error(why.into());
            }
        }

        drop(state);
        self.updates.send_update();
    }

    /// The device stopped reporting on its own
    async fn subscription_ended(&self, handle: SubscriptionHandle) {
        let mut state = self.state.write().await;
        if state.is_current(handle) {
            state.deactivate();
            drop(state);
            info!("Device ended subscription {handle}");
            self.updates.send_update();
        }
    }

    async fn watch_loop<P: PositionSource>(
        self: Arc<Self>,
        source: Arc<P>,
        handle: SubscriptionHandle,
        watch: WatchId,
        mut fixes: mpsc::Receiver<FixResult>,
        cancel: CancellationToken,
    ) {
        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    break;
                }

                res = fixes.recv() => {
                    match res {
                        Some(res) => self.deliver(handle, res).await,
                        None => {
                            self.subscription_ended(handle).await;
                            break;
                        }
                    }
                }
            }
        }

        source.unsubscribe(watch);
    }

    async fn poll_loop<P: PositionSource>(
        self: Arc<Self>,
        source: Arc<P>,
        handle: SubscriptionHandle,
        options: PositionOptions,
        interval: Duration,
        cancel: CancellationToken,
    ) {
        let mut interval = tokio::time::interval(interval);
        // A slow request pushes the schedule back instead of firing the missed ticks at once
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        'poll: loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    break 'poll;
                }

                _ = interval.tick() => {
                    let res = tokio::select! {
                        biased;

                        _ = cancel.cancelled() => {
                            break 'poll;
                        }

                        res = source.request_once(options) => res,
                    };

                    self.deliver(handle, res).await;
                }
            }
        }
    }
}

/// Samples a [PositionSource], either by watching it or polling it on an interval, and
/// keeps the history of everything it got.
///
/// At most one subscription is running at a time. Dropping the sampler tears down any
/// running subscription.
pub struct Sampler<P: PositionSource, S: StateUpdateSender> {
    shared: Arc<Shared<S>>,
    source: Arc<P>,
    settings: SamplerSettings,
    cancel: CancellationToken,
}

impl<P: PositionSource, S: StateUpdateSender> Sampler<P, S> {
    pub fn new(settings: SamplerSettings, source: Arc<P>, state_update_sender: S) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: RwLock::new(SamplerState::default()),
                updates: state_update_sender,
            }),
            source,
            settings,
            cancel: CancellationToken::new(),
        }
    }

    pub fn settings(&self) -> &SamplerSettings {
        &self.settings
    }

    /// Start sampling. Fails with [SamplerError::AlreadyActive] if a subscription is
    /// already running, in which case nothing changes.
    pub async fn start(&self) -> Result<SubscriptionHandle, SamplerError> {
        let mut state = self.shared.state.write().await;

        if let Some(handle) = state.handle() {
            warn!("Tried to start sampling while subscription {handle} is active");
            return Err(SamplerError::AlreadyActive);
        }

        if !self.source.is_available() {
            if state.record_capability_missing() {
                drop(state);
                warn!("Device has no location capability");
                self.shared.updates.send_update();
            }
            return Err(SamplerError::CapabilityUnavailable);
        }

        let handle = SubscriptionHandle::new();
        let cancel = self.cancel.child_token();
        let options = self.settings.position_options();

        let watch = if let Some(interval) = self.settings.poll_interval() {
            tokio::spawn(self.shared.clone().poll_loop(
                self.source.clone(),
                handle,
                options,
                interval,
                cancel.clone(),
            ));
            None
        } else {
            let (tx, rx) = mpsc::channel(FIX_BUFFER);
            let watch = match self.source.subscribe(options, tx) {
                Ok(watch) => watch,
                Err(why) => {
                    let err = SamplerError::from(why);
                    state.record_error(err);
                    drop(state);
                    warn!("Failed to subscribe to location updates: {why:?}");
                    self.shared.updates.send_update();
                    return Err(err);
                }
            };
            tokio::spawn(self.shared.clone().watch_loop(
                self.source.clone(),
                handle,
                watch,
                rx,
                cancel.clone(),
            ));
            Some(watch)
        };

        state.activate(ActiveSubscription {
            handle,
            watch,
            cancel,
        });
        drop(state);

        info!(
            "Started sampling ({:?}) with subscription {handle}",
            self.settings.mode
        );
        self.shared.updates.send_update();

        Ok(handle)
    }

    /// Stop sampling, does nothing if not running. Once this returns no fix from the old
    /// subscription will be applied.
    pub async fn stop(&self) {
        let mut state = self.shared.state.write().await;
        if let Some(active) = state.deactivate() {
            drop(state);
            Self::teardown(&self.source, active);
            self.shared.updates.send_update();
        }
    }

    fn teardown(source: &P, active: ActiveSubscription) {
        active.cancel.cancel();
        if let Some(watch) = active.watch {
            source.unsubscribe(watch);
        }
        info!("Stopped sampling subscription {}", active.handle);
    }

    pub async fn is_active(&self) -> bool {
        self.shared.state.read().await.handle().is_some()
    }

    pub async fn current_reading(&self) -> Option<Reading> {
        self.shared.state.read().await.history().current().copied()
    }

    /// Every reading so far, oldest first
    pub async fn history(&self) -> Vec<Reading> {
        self.shared.state.read().await.history().all().to_vec()
    }

    /// Total distance covered by the history, in meters
    pub async fn total_distance(&self) -> f64 {
        self.shared.state.read().await.history().total_distance()
    }

    /// Message for the last error, cleared once a good reading comes in
    pub async fn last_error(&self) -> Option<String> {
        self.shared
            .state
            .read()
            .await
            .last_error()
            .map(|e| e.to_string())
    }

    pub async fn get_ui_state(&self) -> SamplerUiState {
        self.shared.state.read().await.as_ui_state()
    }
}

impl<P: PositionSource, S: StateUpdateSender> Drop for Sampler<P, S> {
    fn drop(&mut self) {
        // Kills every pump, they unsubscribe from their watch on the way out
        self.cancel.cancel();
        if let Ok(mut state) = self.shared.state.try_write() {
            if let Some(active) = state.deactivate() {
                Self::teardown(&self.source, active);
            }
        }
    }
}
