//! Fixed-size worker pool draining the click queue into durable storage.
//!
//! Each worker is an independent loop: dequeue one event, persist it, repeat.
//! Workers never coordinate with each other beyond the shared queue and the
//! store client. A persistence failure drops that single event (at-most-once
//! delivery); it is never retried or re-enqueued, so a slow or failing store
//! can never feed work back into the bounded queue.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::domain::click_queue::ClickReceiver;
use crate::domain::repositories::ClickRepository;

/// Runs a single click worker until the queue is closed and drained.
///
/// A worker mid-persist finishes that one write before observing closure.
pub async fn run_click_worker(
    worker_id: usize,
    receiver: ClickReceiver,
    clicks: Arc<dyn ClickRepository>,
) {
    debug!(worker_id, "click worker started");

    while let Some(event) = receiver.recv().await {
        let link_id = event.link_id;

        if let Err(e) = clicks.create(event.into_new_click()).await {
            // Best effort: the event is lost, the worker keeps going.
            error!(worker_id, link_id, error = %e, "failed to persist click, dropping event");
        }
    }

    debug!(worker_id, "click worker stopped");
}

/// Spawns `count` workers consuming from the shared receiver.
///
/// Must be called before the ingress starts accepting traffic so that no
/// accepted event can sit in the queue without a consumer.
pub fn spawn_click_workers(
    count: usize,
    receiver: ClickReceiver,
    clicks: Arc<dyn ClickRepository>,
) -> JoinSet<()> {
    let mut pool = JoinSet::new();

    for worker_id in 0..count {
        pool.spawn(run_click_worker(
            worker_id,
            receiver.clone(),
            clicks.clone(),
        ));
    }

    info!(workers = count, "click worker pool started");
    pool
}

/// Waits for every worker to stop, bounded by a grace period.
///
/// The queue must already be closed (all senders dropped) so the workers can
/// observe completion. If the grace period elapses first, the pool is aborted
/// and any events still buffered are lost. That loss window is the documented
/// tradeoff for a fast, clean shutdown.
pub async fn shutdown_worker_pool(mut pool: JoinSet<()>, grace: Duration) {
    let drained = tokio::time::timeout(grace, async {
        while pool.join_next().await.is_some() {}
    })
    .await;

    match drained {
        Ok(()) => info!("click worker pool drained and stopped"),
        Err(_) => {
            warn!(
                grace_seconds = grace.as_secs(),
                "shutdown grace period elapsed, aborting click workers; buffered events are lost"
            );
            pool.abort_all();
        }
    }
}
