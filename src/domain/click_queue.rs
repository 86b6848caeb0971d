//! Bounded in-memory queue decoupling redirects from click persistence.
//!
//! The queue is the single shared mutable resource between the redirect path
//! (many producers, one per in-flight request) and the worker pool (a fixed
//! set of consumers). Boundedness is what protects the redirect path from a
//! persistence slowdown: once the buffer is full, new events are shed at the
//! ingress instead of queueing unbounded work.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{Mutex, mpsc};
use tracing::warn;

use crate::domain::click_event::ClickEvent;

/// Creates a bounded click queue with the given capacity.
///
/// Returns the producer and consumer handles. Both are cheaply cloneable;
/// the queue closes once every [`ClickSender`] has been dropped, after which
/// [`ClickReceiver::recv`] drains the remaining buffer and then yields `None`.
pub fn click_queue(capacity: usize) -> (ClickSender, ClickReceiver) {
    let (tx, rx) = mpsc::channel(capacity);

    let sender = ClickSender {
        tx,
        dropped: Arc::new(AtomicU64::new(0)),
    };
    let receiver = ClickReceiver {
        rx: Arc::new(Mutex::new(rx)),
    };

    (sender, receiver)
}

/// Producer handle for the click queue.
#[derive(Debug, Clone)]
pub struct ClickSender {
    tx: mpsc::Sender<ClickEvent>,
    dropped: Arc<AtomicU64>,
}

impl ClickSender {
    /// Attempts to enqueue a click event without blocking.
    ///
    /// Returns `true` if the event was accepted. Returns `false` immediately
    /// when the queue is at capacity (or already closed); the event is dropped
    /// and the drop is counted and logged, never surfaced to the request that
    /// produced it.
    pub fn try_publish(&self, event: ClickEvent) -> bool {
        match self.tx.try_send(event) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(event)) => {
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                warn!(
                    link_id = event.link_id,
                    total_dropped = dropped,
                    "click queue full, dropping event"
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(event)) => {
                warn!(link_id = event.link_id, "click queue closed, dropping event");
                false
            }
        }
    }

    /// Number of events dropped so far because the queue was full.
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Consumer handle for the click queue, shared by the worker pool.
///
/// The underlying receiver is guarded by an async mutex; the lock is held
/// only across a single `recv`, so workers take turns dequeuing while
/// persisting in parallel.
#[derive(Debug, Clone)]
pub struct ClickReceiver {
    rx: Arc<Mutex<mpsc::Receiver<ClickEvent>>>,
}

impl ClickReceiver {
    /// Waits for the next event.
    ///
    /// Returns `None` once the queue is closed and fully drained, signalling
    /// the calling worker to stop.
    pub async fn recv(&self) -> Option<ClickEvent> {
        self.rx.lock().await.recv().await
    }
}
