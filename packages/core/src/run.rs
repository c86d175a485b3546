//! Run domain types: one batch submission and its lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Unique identifier for a run, using ULID for chronological sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub Ulid);

impl RunId {
    /// Create a new unique run ID.
    pub fn new() -> Self {
        Self(Ulid::new())
    }

    /// Parse a run ID from a string.
    pub fn parse(s: &str) -> Result<Self, ulid::DecodeError> {
        Ok(Self(Ulid::from_string(s.trim())?))
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Delivery counters for a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub success: u64,
    pub failed: u64,
    pub total: u64,
    pub start_time: DateTime<Utc>,
    pub last_update: DateTime<Utc>,
}

impl Progress {
    /// Fresh counters for a run of `total` jobs.
    pub fn new(total: u64) -> Self {
        let now = Utc::now();
        Self {
            success: 0,
            failed: 0,
            total,
            start_time: now,
            last_update: now,
        }
    }

    /// Jobs that have an outcome, successful or not.
    pub fn processed(&self) -> u64 {
        self.success + self.failed
    }

    /// Jobs still waiting for an outcome.
    pub fn remaining(&self) -> u64 {
        self.total.saturating_sub(self.processed())
    }

    pub fn is_complete(&self) -> bool {
        self.processed() >= self.total
    }

    /// Record one outcome.
    ///
    /// Returns `false` and leaves the counters untouched when every job
    /// already has an outcome, so `success + failed` never exceeds `total`.
    pub fn record(&mut self, delivered: bool) -> bool {
        if self.is_complete() {
            return false;
        }
        if delivered {
            self.success += 1;
        } else {
            self.failed += 1;
        }
        self.last_update = Utc::now();
        true
    }

    /// Percentage of processed jobs, for display.
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            (self.processed() as f64 / self.total as f64) * 100.0
        }
    }
}

/// State of one run as seen by the status endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunState {
    pub run_id: RunId,
    pub destination_id: String,
    pub is_running: bool,
    pub progress: Progress,
}

impl RunState {
    /// A running state for a freshly submitted batch.
    pub fn started(run_id: RunId, destination_id: impl Into<String>, total: u64) -> Self {
        Self {
            run_id,
            destination_id: destination_id.into(),
            is_running: true,
            progress: Progress::new(total),
        }
    }

    pub fn status(&self) -> RunStatus {
        RunStatus::derive(Some(self))
    }
}

/// Coarse status of the current run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// No run was ever started.
    #[default]
    Idle,
    Running,
    Stopped,
    Completed,
}

impl RunStatus {
    /// Derive the status from the current run, if any.
    ///
    /// Completion wins over the running flag.
    pub fn derive(run: Option<&RunState>) -> Self {
        match run {
            None => RunStatus::Idle,
            Some(run) if run.progress.is_complete() => RunStatus::Completed,
            Some(run) if run.is_running => RunStatus::Running,
            Some(_) => RunStatus::Stopped,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Idle => "idle",
            RunStatus::Running => "running",
            RunStatus::Stopped => "stopped",
            RunStatus::Completed => "completed",
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_with(success: u64, failed: u64, total: u64, is_running: bool) -> RunState {
        let mut run = RunState::started(RunId::new(), "grp1", total);
        run.progress.success = success;
        run.progress.failed = failed;
        run.is_running = is_running;
        run
    }

    #[test]
    fn status_without_run_is_idle() {
        assert_eq!(RunStatus::derive(None), RunStatus::Idle);
    }

    #[test]
    fn completed_wins_over_running_flag() {
        assert_eq!(run_with(3, 2, 5, true).status(), RunStatus::Completed);
        assert_eq!(run_with(3, 2, 5, false).status(), RunStatus::Completed);
    }

    #[test]
    fn partial_progress_follows_running_flag() {
        assert_eq!(run_with(1, 0, 5, true).status(), RunStatus::Running);
        assert_eq!(run_with(1, 0, 5, false).status(), RunStatus::Stopped);
    }

    #[test]
    fn record_never_exceeds_total() {
        let mut progress = Progress::new(2);
        assert!(progress.record(true));
        assert!(progress.record(false));
        assert!(!progress.record(true));

        assert_eq!(progress.success, 1);
        assert_eq!(progress.failed, 1);
        assert_eq!(progress.remaining(), 0);
        assert!(progress.is_complete());
    }

    #[test]
    fn status_serializes_lowercase() -> Result<(), serde_json::Error> {
        assert_eq!(serde_json::to_string(&RunStatus::Stopped)?, "\"stopped\"");
        Ok(())
    }

    #[test]
    fn run_id_round_trips_through_display() -> Result<(), ulid::DecodeError> {
        let id = RunId::new();
        assert_eq!(RunId::parse(&id.to_string())?, id);
        Ok(())
    }
}
