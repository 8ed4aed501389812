//! Debounced requests with stale-response suppression.
//!
//! Each scheduled request gets a [`RequestId`] from a monotonically
//! increasing counter. Scheduling a new request aborts the pending timer of
//! the previous one, and any result that still arrives for an older id is
//! discarded when the results are drained.

use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(u64);

impl RequestId {
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Generation counter deciding which response may still update state.
#[derive(Debug, Default)]
pub struct RequestTracker {
    latest: u64,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&mut self) -> RequestId {
        self.latest += 1;
        RequestId(self.latest)
    }

    /// Makes every id issued so far stale.
    pub fn invalidate(&mut self) {
        self.latest += 1;
    }

    pub fn is_current(&self, id: RequestId) -> bool {
        id.0 == self.latest
    }
}

pub struct Debounced<T> {
    delay: Duration,
    tracker: RequestTracker,
    pending: Option<JoinHandle<()>>,
    sender: mpsc::UnboundedSender<(RequestId, T)>,
    receiver: mpsc::UnboundedReceiver<(RequestId, T)>,
}

impl<T: Send + 'static> Debounced<T> {
    pub fn new(delay: Duration) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            delay,
            tracker: RequestTracker::new(),
            pending: None,
            sender,
            receiver,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Runs `request` after the debounce delay, superseding any pending request.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule<F>(&mut self, request: F) -> RequestId
    where
        F: Future<Output = T> + Send + 'static,
    {
        self.abort_pending();
        let id = self.tracker.issue();
        let sender = self.sender.clone();
        let delay = self.delay;

        self.pending = Some(tokio::spawn(async move {
            if !delay.is_zero() {
                sleep(delay).await;
            }
            let value = request.await;
            if sender.send((id, value)).is_err() {
                debug!(request = id.0, "debounced receiver dropped");
            }
        }));

        id
    }

    /// Drops the pending request and marks all earlier responses stale.
    pub fn cancel(&mut self) {
        self.abort_pending();
        self.tracker.invalidate();
    }

    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Waits for the pending request, then returns the newest current result.
    pub async fn settle(&mut self) -> Option<T> {
        if let Some(handle) = self.pending.take() {
            if let Err(err) = handle.await {
                if !err.is_cancelled() {
                    warn!(error = %err, "debounced request task failed");
                }
            }
        }

        let mut current = None;
        while let Ok((id, value)) = self.receiver.try_recv() {
            if self.tracker.is_current(id) {
                current = Some(value);
            } else {
                debug!(request = id.0, "discarding stale response");
            }
        }
        current
    }

    fn abort_pending(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

impl<T> Drop for Debounced<T> {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}
