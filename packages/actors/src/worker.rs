//! Worker loop draining the shared message queue.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use dispatch_core::DispatchEvent;
use ractor::ActorRef;
use tokio::sync::{broadcast, watch};

use crate::delivery::{self, MessageDelivery};
use crate::message_queue::{MessageQueue, QueueItem};
use crate::messages::DispatcherMessage;
use crate::pool::PoolSignal;
use crate::rate_limiter::RateLimiter;

/// Shared handles every worker needs.
#[derive(Clone)]
pub struct WorkerDeps {
    pub queue: Arc<MessageQueue>,
    pub limiter: Arc<RateLimiter>,
    pub delivery: Arc<dyn MessageDelivery>,
    pub dispatcher: ActorRef<DispatcherMessage>,
    pub idle_poll: Duration,
    pub event_tx: Option<broadcast::Sender<DispatchEvent>>,
}

/// State for one worker task.
pub struct WorkerContext {
    pub worker_id: String,
    pub deps: WorkerDeps,
    pub signal: watch::Receiver<PoolSignal>,
}

impl WorkerContext {
    fn signal(&self) -> PoolSignal {
        *self.signal.borrow()
    }

    fn broadcast(&self, event: DispatchEvent) {
        if let Some(ref tx) = self.deps.event_tx {
            let _ = tx.send(event);
        }
    }
}

/// Run one worker until it receives a poison pill or the dispatcher is gone.
pub async fn run_worker(ctx: WorkerContext) {
    tracing::info!("Starting worker: {}", ctx.worker_id);
    ctx.broadcast(DispatchEvent::WorkerStarted {
        worker_id: ctx.worker_id.clone(),
        timestamp: Utc::now(),
    });

    let deps = &ctx.deps;
    loop {
        if ctx.signal() == PoolSignal::Paused {
            tokio::time::sleep(deps.idle_poll).await;
            continue;
        }

        let queued = match deps.queue.dequeue().await {
            QueueItem::Shutdown => break,
            QueueItem::Job(queued) => queued,
        };

        // The run may have been stopped while we were waiting on the queue.
        if queued.is_cancelled() || ctx.signal() == PoolSignal::Draining {
            tracing::debug!(
                worker = %ctx.worker_id,
                run_id = %queued.job.run_id,
                "discarding job of a stopped run"
            );
            continue;
        }
        if ctx.signal() == PoolSignal::Paused {
            deps.queue.requeue_front(queued).await;
            continue;
        }

        let job = queued.job;
        deps.limiter.acquire().await;
        let delivered = delivery::deliver(deps.delivery.as_ref(), &job).await;

        let report = DispatcherMessage::JobFinished {
            run_id: job.run_id,
            delivered,
        };
        if let Err(e) = deps.dispatcher.send_message(report) {
            tracing::warn!(worker = %ctx.worker_id, "dispatcher unreachable, exiting: {}", e);
            break;
        }

        tokio::time::sleep(job.pacing_interval()).await;
    }

    tracing::info!("Worker stopped: {}", ctx.worker_id);
    ctx.broadcast(DispatchEvent::WorkerStopped {
        worker_id: ctx.worker_id.clone(),
        timestamp: Utc::now(),
    });
}
