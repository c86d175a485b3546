//! Event types for real-time updates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Progress, RunId};

/// Events emitted by the dispatcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DispatchEvent {
    /// A batch was accepted and its jobs queued.
    RunStarted {
        run_id: RunId,
        destination_id: String,
        total: u64,
        timestamp: DateTime<Utc>,
    },
    /// Queued jobs were discarded without being processed.
    QueueDrained {
        discarded: usize,
        timestamp: DateTime<Utc>,
    },
    /// A job was delivered.
    JobDelivered {
        run_id: RunId,
        progress: Progress,
        timestamp: DateTime<Utc>,
    },
    /// A job failed to deliver.
    JobFailed {
        run_id: RunId,
        progress: Progress,
        timestamp: DateTime<Utc>,
    },
    /// A run was stopped before every job had an outcome.
    RunStopped {
        run_id: RunId,
        progress: Progress,
        timestamp: DateTime<Utc>,
    },
    /// Every job of a run has an outcome.
    RunCompleted {
        run_id: RunId,
        progress: Progress,
        timestamp: DateTime<Utc>,
    },
    WorkerStarted {
        worker_id: String,
        timestamp: DateTime<Utc>,
    },
    WorkerStopped {
        worker_id: String,
        timestamp: DateTime<Utc>,
    },
}

impl DispatchEvent {
    /// Get the timestamp of the event.
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            DispatchEvent::RunStarted { timestamp, .. }
            | DispatchEvent::QueueDrained { timestamp, .. }
            | DispatchEvent::JobDelivered { timestamp, .. }
            | DispatchEvent::JobFailed { timestamp, .. }
            | DispatchEvent::RunStopped { timestamp, .. }
            | DispatchEvent::RunCompleted { timestamp, .. }
            | DispatchEvent::WorkerStarted { timestamp, .. }
            | DispatchEvent::WorkerStopped { timestamp, .. } => *timestamp,
        }
    }

    /// Get the run ID associated with this event, if any.
    pub fn run_id(&self) -> Option<RunId> {
        match self {
            DispatchEvent::RunStarted { run_id, .. }
            | DispatchEvent::JobDelivered { run_id, .. }
            | DispatchEvent::JobFailed { run_id, .. }
            | DispatchEvent::RunStopped { run_id, .. }
            | DispatchEvent::RunCompleted { run_id, .. } => Some(*run_id),
            _ => None,
        }
    }

    /// Get a short description of this event for logging.
    pub fn description(&self) -> String {
        match self {
            DispatchEvent::RunStarted {
                run_id,
                destination_id,
                total,
                ..
            } => format!("Run {} started: {} messages to {}", run_id, total, destination_id),
            DispatchEvent::QueueDrained { discarded, .. } => {
                format!("Queue drained: {} jobs discarded", discarded)
            }
            DispatchEvent::JobDelivered {
                run_id, progress, ..
            } => format!(
                "Run {}: delivered ({}/{})",
                run_id,
                progress.processed(),
                progress.total
            ),
            DispatchEvent::JobFailed {
                run_id, progress, ..
            } => format!(
                "Run {}: failed ({}/{})",
                run_id,
                progress.processed(),
                progress.total
            ),
            DispatchEvent::RunStopped { run_id, .. } => format!("Run {} stopped", run_id),
            DispatchEvent::RunCompleted {
                run_id, progress, ..
            } => format!(
                "Run {} completed: {} delivered, {} failed",
                run_id, progress.success, progress.failed
            ),
            DispatchEvent::WorkerStarted { worker_id, .. } => {
                format!("Worker {} started", worker_id)
            }
            DispatchEvent::WorkerStopped { worker_id, .. } => {
                format!("Worker {} stopped", worker_id)
            }
        }
    }
}
