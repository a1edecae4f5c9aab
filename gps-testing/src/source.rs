use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicU32, Ordering},
    },
    time::Duration,
};

use gps_logic::{FixResult, FixSender, PositionError, PositionOptions, PositionSource, WatchId};
use log::debug;
use tokio_util::sync::CancellationToken;

use crate::track::{Track, TrackStep};

/// A fake device that plays back a [Track].
///
/// Watches each get their own playthrough of the whole track. One-shot requests share a
/// cursor, each one waits out any `wait` steps and returns the next fix or error. A wait
/// longer than the acquisition timeout turns into a timeout error, like a real device.
pub struct ReplaySource {
    available: bool,
    steps: Arc<[TrackStep]>,
    cursor: Mutex<usize>,
    exhausted: AtomicBool,
    next_id: AtomicU32,
    watches: Mutex<HashMap<WatchId, CancellationToken>>,
}

impl ReplaySource {
    pub fn new(track: Track) -> Self {
        Self {
            available: true,
            steps: track.steps.into(),
            cursor: Mutex::new(0),
            exhausted: AtomicBool::new(false),
            next_id: AtomicU32::new(1),
            watches: Mutex::default(),
        }
    }

    /// Set whether the device claims to have location capability at all
    pub fn with_available(mut self, available: bool) -> Self {
        self.available = available;
        self
    }

    /// Whether a one-shot request has found the track empty
    pub fn requests_exhausted(&self) -> bool {
        self.exhausted.load(Ordering::SeqCst)
    }

    pub fn active_watches(&self) -> usize {
        self.watches.lock().map(|w| w.len()).unwrap_or_default()
    }

    /// Take everything up to and including the next fix or error off the shared cursor,
    /// returns the total time to wait first.
    fn next_request(&self) -> Option<(u64, FixResult)> {
        let mut cursor = self.cursor.lock().ok()?;
        let mut waited = 0;
        while let Some(step) = self.steps.get(*cursor) {
            *cursor += 1;
            match step {
                TrackStep::Wait(ms) => waited += ms,
                TrackStep::Fix(fix) => return Some((waited, Ok(*fix))),
                TrackStep::Error(err) => return Some((waited, Err(*err))),
            }
        }
        None
    }

    async fn play(
        steps: Arc<[TrackStep]>,
        sender: FixSender,
        timeout: Duration,
        cancel: CancellationToken,
    ) {
        for step in steps.iter() {
            let done = tokio::select! {
                biased;

                _ = cancel.cancelled() => true,

                done = Self::play_step(*step, &sender, timeout) => done,
            };

            if done {
                return;
            }
        }
        debug!("Replay finished, ending watch");
    }

    /// Returns whether playback should stop
    async fn play_step(step: TrackStep, sender: &FixSender, timeout: Duration) -> bool {
        match step {
            TrackStep::Wait(ms) => {
                let wait = Duration::from_millis(ms);
                if wait > timeout {
                    tokio::time::sleep(timeout).await;
                    if sender.send(Err(PositionError::Timeout)).await.is_err() {
                        return true;
                    }
                    tokio::time::sleep(wait - timeout).await;
                } else {
                    tokio::time::sleep(wait).await;
                }
                false
            }
            TrackStep::Fix(fix) => sender.send(Ok(fix)).await.is_err(),
            TrackStep::Error(err) => sender.send(Err(err)).await.is_err(),
        }
    }
}

fn acquisition_timeout(options: &PositionOptions) -> Duration {
    Duration::from_millis(options.acquisition_timeout_ms as u64)
}

impl PositionSource for ReplaySource {
    fn is_available(&self) -> bool {
        self.available
    }

    async fn request_once(&self, options: PositionOptions) -> FixResult {
        let timeout = acquisition_timeout(&options);
        match self.next_request() {
            Some((waited, res)) => {
                let waited = Duration::from_millis(waited);
                if waited > timeout {
                    tokio::time::sleep(timeout).await;
                    Err(PositionError::Timeout)
                } else {
                    tokio::time::sleep(waited).await;
                    res
                }
            }
            None => {
                self.exhausted.store(true, Ordering::SeqCst);
                Err(PositionError::PositionUnavailable)
            }
        }
    }

    fn subscribe(
        &self,
        options: PositionOptions,
        sender: FixSender,
    ) -> Result<WatchId, PositionError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let cancel = CancellationToken::new();

        self.watches
            .lock()
            .map_err(|_| PositionError::PositionUnavailable)?
            .insert(id, cancel.clone());

        tokio::spawn(Self::play(
            self.steps.clone(),
            sender,
            acquisition_timeout(&options),
            cancel,
        ));

        debug!("Started replay watch {id}");
        Ok(id)
    }

    fn unsubscribe(&self, id: WatchId) {
        let cancel = self.watches.lock().ok().and_then(|mut w| w.remove(&id));
        if let Some(cancel) = cancel {
            cancel.cancel();
            debug!("Stopped replay watch {id}");
        }
    }
}
