//! Fixed-size worker pool that survives across batches.

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::message_queue::MessageQueue;
use crate::worker::{WorkerContext, WorkerDeps, run_worker};

/// Process-wide run flag as seen by the workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolSignal {
    /// Idle without consuming from the queue.
    Paused,
    /// Pull and deliver jobs.
    Dispatching,
    /// Discard remaining jobs and exit on the poison pill.
    Draining,
}

pub struct WorkerPool {
    signal_tx: watch::Sender<PoolSignal>,
    workers: Vec<JoinHandle<()>>,
    /// Worker counter for unique IDs.
    worker_counter: u64,
}

impl WorkerPool {
    pub fn new() -> Self {
        let (signal_tx, _) = watch::channel(PoolSignal::Paused);
        Self {
            signal_tx,
            workers: Vec::new(),
            worker_counter: 0,
        }
    }

    pub fn signal(&self) -> PoolSignal {
        *self.signal_tx.borrow()
    }

    pub fn set_signal(&self, signal: PoolSignal) {
        let previous = self.signal_tx.send_replace(signal);
        if previous != signal {
            tracing::debug!(?previous, ?signal, "worker pool signal changed");
        }
    }

    /// Workers whose task has not exited.
    pub fn live_workers(&self) -> usize {
        self.workers.iter().filter(|h| !h.is_finished()).count()
    }

    /// Bring the pool up to `size` live workers.
    ///
    /// Live workers are reused, so calling this for every batch never grows
    /// the pool past `size`. Returns how many workers were spawned.
    pub fn ensure_started(&mut self, size: usize, deps: &WorkerDeps) -> usize {
        self.workers.retain(|h| !h.is_finished());
        let missing = size.saturating_sub(self.workers.len());

        for _ in 0..missing {
            self.worker_counter += 1;
            let ctx = WorkerContext {
                worker_id: format!("worker-{}", self.worker_counter),
                deps: deps.clone(),
                signal: self.signal_tx.subscribe(),
            };
            self.workers.push(tokio::spawn(run_worker(ctx)));
        }

        if missing > 0 {
            tracing::info!(spawned = missing, size, "worker pool started");
        }
        missing
    }

    /// Discard queued jobs, send one poison pill per worker and wait for
    /// every worker to exit.
    pub async fn shutdown(&mut self, queue: &MessageQueue) -> usize {
        self.set_signal(PoolSignal::Draining);
        let discarded = queue.drain().await;
        if discarded > 0 {
            tracing::info!(discarded, "discarded queued jobs on shutdown");
        }

        let workers = std::mem::take(&mut self.workers);
        queue.shutdown(workers.len()).await;

        let mut joined = 0;
        for handle in workers {
            match handle.await {
                Ok(()) => joined += 1,
                Err(e) => tracing::error!("worker task failed: {}", e),
            }
        }
        joined
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new()
    }
}
