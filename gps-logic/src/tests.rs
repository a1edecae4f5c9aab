use std::{
    collections::{HashMap, VecDeque},
    sync::{
        Mutex,
        atomic::{AtomicU32, AtomicUsize, Ordering},
    },
    time::Duration,
};

use tokio::sync::mpsc;

use crate::{
    FixResult, FixSender, PositionError, PositionOptions, PositionSource, StateUpdateSender,
    WatchId,
};

/// Device that only reports what the test tells it to
pub struct MockSource {
    available: bool,
    subscribe_error: Option<PositionError>,
    next_id: AtomicU32,
    watches: Mutex<HashMap<WatchId, FixSender>>,
    /// Results for `request_once`, each answered after its delay
    once: Mutex<VecDeque<(Duration, FixResult)>>,
    requests: AtomicUsize,
}

impl MockSource {
    pub fn new() -> Self {
        Self {
            available: true,
            subscribe_error: None,
            next_id: AtomicU32::new(1),
            watches: Mutex::default(),
            once: Mutex::default(),
            requests: AtomicUsize::new(0),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new()
        }
    }

    pub fn failing(err: PositionError) -> Self {
        Self {
            subscribe_error: Some(err),
            ..Self::new()
        }
    }

    /// Queue up the result of the next `request_once`
    pub fn queue_once(&self, res: FixResult) {
        self.queue_once_after(Duration::ZERO, res);
    }

    /// Queue up a `request_once` result the device takes `delay` to come up with
    pub fn queue_once_after(&self, delay: Duration, res: FixResult) {
        self.once.lock().unwrap().push_back((delay, res));
    }

    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn active_watches(&self) -> usize {
        self.watches.lock().unwrap().len()
    }

    /// Report a fix (or error) to every active watch
    pub async fn push(&self, res: FixResult) {
        let senders = self.watches.lock().unwrap().values().cloned().collect::<Vec<_>>();
        for tx in senders {
            tx.send(res).await.ok();
        }
    }

    /// Stop every watch from the device side
    pub fn end_watches(&self) {
        self.watches.lock().unwrap().clear();
    }
}

impl PositionSource for MockSource {
    fn is_available(&self) -> bool {
        self.available
    }

    async fn request_once(&self, _options: PositionOptions) -> FixResult {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let next = self.once.lock().unwrap().pop_front();
        match next {
            Some((delay, res)) => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                res
            }
            None => Err(PositionError::PositionUnavailable),
        }
    }

    fn subscribe(
        &self,
        _options: PositionOptions,
        sender: FixSender,
    ) -> Result<WatchId, PositionError> {
        if let Some(err) = self.subscribe_error {
            return Err(err);
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.watches.lock().unwrap().insert(id, sender);
        Ok(id)
    }

    fn unsubscribe(&self, id: WatchId) {
        self.watches.lock().unwrap().remove(&id);
    }
}

pub type UpdateRx = mpsc::UnboundedReceiver<()>;

/// Forwards every state update to a channel the test can wait on
pub struct ChannelSender(mpsc::UnboundedSender<()>);

impl ChannelSender {
    pub fn channel() -> (Self, UpdateRx) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self(tx), rx)
    }
}

impl StateUpdateSender for ChannelSender {
    fn send_update(&self) {
        self.0.send(()).ok();
    }
}

pub struct DummySender;

impl StateUpdateSender for DummySender {
    fn send_update(&self) {}
}
