//! Unbounded FIFO of pending send jobs shared by all workers.

use std::collections::VecDeque;

use dispatch_core::SendJob;
use tokio::sync::{Mutex, Notify};
use tokio_util::sync::CancellationToken;

/// A job waiting in the queue, with the stop token of the run it belongs to.
#[derive(Debug, Clone)]
pub struct QueuedJob {
    pub job: SendJob,
    pub cancel: CancellationToken,
}

impl QueuedJob {
    pub fn new(job: SendJob, cancel: CancellationToken) -> Self {
        Self { job, cancel }
    }

    /// Whether the owning run was stopped after this job was queued.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Item handed out by [`MessageQueue::dequeue`].
#[derive(Debug, Clone)]
pub enum QueueItem {
    Job(QueuedJob),
    /// Poison pill: the worker that receives it exits its loop.
    Shutdown,
}

/// Unbounded FIFO; `dequeue` blocks until an item is available.
#[derive(Debug, Default)]
pub struct MessageQueue {
    items: Mutex<VecDeque<QueueItem>>,
    notify: Notify,
}

impl MessageQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn enqueue(&self, job: QueuedJob) {
        self.push_back(QueueItem::Job(job)).await;
    }

    pub async fn enqueue_all(&self, jobs: impl IntoIterator<Item = QueuedJob>) -> usize {
        let mut items = self.items.lock().await;
        let before = items.len();
        items.extend(jobs.into_iter().map(QueueItem::Job));
        let added = items.len() - before;
        drop(items);

        for _ in 0..added {
            self.notify.notify_one();
        }
        added
    }

    /// Put a job back at the head of the queue.
    pub async fn requeue_front(&self, job: QueuedJob) {
        self.items.lock().await.push_front(QueueItem::Job(job));
        self.notify.notify_one();
    }

    /// Append one poison pill per worker.
    pub async fn shutdown(&self, workers: usize) {
        for _ in 0..workers {
            self.push_back(QueueItem::Shutdown).await;
        }
    }

    /// Wait for the next item.
    pub async fn dequeue(&self) -> QueueItem {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            // Register before checking so an enqueue in between is not missed.
            notified.as_mut().enable();

            if let Some(item) = self.items.lock().await.pop_front() {
                return item;
            }
            notified.await;
        }
    }

    pub async fn try_dequeue(&self) -> Option<QueueItem> {
        self.items.lock().await.pop_front()
    }

    /// Remove every queued item without processing it.
    pub async fn drain(&self) -> usize {
        let mut items = self.items.lock().await;
        let drained = items.len();
        items.clear();
        drained
    }

    pub async fn len(&self) -> usize {
        self.items.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.lock().await.is_empty()
    }

    async fn push_back(&self, item: QueueItem) {
        self.items.lock().await.push_back(item);
        self.notify.notify_one();
    }
}
