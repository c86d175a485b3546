//! Registry of runs owned by the dispatcher.

use std::collections::HashMap;

use dispatch_core::{RunId, RunState};
use tokio_util::sync::CancellationToken;

/// One registered run and its stop token.
#[derive(Debug, Clone)]
pub struct RunEntry {
    pub state: RunState,
    pub cancel: CancellationToken,
}

/// Outcome of recording a job result against a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recorded {
    /// Counters updated; `completed` is true when this was the last job.
    Updated { state: RunState, completed: bool },
    /// Every job already had an outcome.
    Overflow,
    /// The run was reaped before the result arrived.
    UnknownRun,
}

/// Maps run ids to their state.
///
/// Entries are created when a batch is submitted and reaped when the next
/// batch supersedes them.
#[derive(Debug, Default)]
pub struct RunRegistry {
    runs: HashMap<RunId, RunEntry>,
    current: Option<RunId>,
}

impl RunRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new current run, stopping and reaping every other run.
    ///
    /// Returns the superseded runs as they were when stopped.
    pub fn begin(&mut self, state: RunState) -> (CancellationToken, Vec<RunState>) {
        let mut superseded = Vec::new();
        for (_, mut entry) in self.runs.drain() {
            entry.cancel.cancel();
            entry.state.is_running = false;
            superseded.push(entry.state);
        }

        let cancel = CancellationToken::new();
        let run_id = state.run_id;
        self.runs.insert(
            run_id,
            RunEntry {
                state,
                cancel: cancel.clone(),
            },
        );
        self.current = Some(run_id);
        (cancel, superseded)
    }

    pub fn current_id(&self) -> Option<RunId> {
        self.current
    }

    pub fn current(&self) -> Option<&RunState> {
        self.current
            .and_then(|id| self.runs.get(&id))
            .map(|entry| &entry.state)
    }

    pub fn get(&self, run_id: RunId) -> Option<&RunState> {
        self.runs.get(&run_id).map(|entry| &entry.state)
    }

    /// Clear the running flag and cancel the run's token.
    pub fn stop(&mut self, run_id: RunId) -> Option<RunState> {
        let entry = self.runs.get_mut(&run_id)?;
        entry.state.is_running = false;
        entry.cancel.cancel();
        Some(entry.state.clone())
    }

    pub fn record(&mut self, run_id: RunId, delivered: bool) -> Recorded {
        let Some(entry) = self.runs.get_mut(&run_id) else {
            return Recorded::UnknownRun;
        };
        if !entry.state.progress.record(delivered) {
            return Recorded::Overflow;
        }
        Recorded::Updated {
            completed: entry.state.progress.is_complete(),
            state: entry.state.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }
}
