//! Message types for actor communication.

use dispatch_core::{BatchRequest, Progress, RunId, RunState, RunStatus, ValidationError};
use ractor::RpcReplyPort;

/// Messages for the Dispatcher actor.
#[derive(Debug)]
pub enum DispatcherMessage {
    /// Validate a batch, supersede the current run and queue its jobs.
    SubmitBatch {
        run_id: RunId,
        batch: BatchRequest,
        reply: RpcReplyPort<Result<RunState, DispatchError>>,
    },

    /// Stop a run; `None` means the current one.
    Stop {
        run_id: Option<RunId>,
        reply: RpcReplyPort<Result<RunState, DispatchError>>,
    },

    /// Get the current run's counters.
    GetProgress { reply: RpcReplyPort<Option<Progress>> },

    /// Get the current run.
    GetRun { reply: RpcReplyPort<Option<RunState>> },

    /// Derive the current run's status.
    GetStatus { reply: RpcReplyPort<RunStatus> },

    /// Number of live workers in the pool.
    GetWorkerCount { reply: RpcReplyPort<usize> },

    /// A worker finished a job.
    JobFinished { run_id: RunId, delivered: bool },

    /// Stop all workers and the dispatcher.
    Shutdown { reply: RpcReplyPort<()> },
}

/// Error type for dispatcher operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("No task found with ID {0}")]
    RunNotFound(RunId),

    #[error("No run has been started")]
    NoActiveRun,

    #[error("Rate limit exceeded. Please try again later.")]
    RateLimited,

    #[error("Dispatcher unavailable: {0}")]
    Unavailable(String),
}
