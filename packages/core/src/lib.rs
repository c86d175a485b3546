//! Core domain types for the message dispatcher.
//!
//! This crate contains shared types used across all packages:
//! - SendJob for a single outbound message
//! - RunState, Progress and RunStatus for one batch run
//! - BatchRequest validation and fan-out
//! - DispatchConfig for pool sizing, pacing and rate limits
//! - Events for real-time updates
//! - System stats reported by the dashboard

mod batch;
mod config;
mod events;
mod job;
mod monitor;
mod run;

pub use batch::{
    BatchRequest, BatchSnapshot, MAX_PACING_INTERVAL_SECS, MIN_PACING_INTERVAL_SECS,
    ValidatedBatch, ValidationError, parse_interval, split_lines,
};
pub use config::{ConfigError, DispatchConfig, RateLimitConfig};
pub use events::DispatchEvent;
pub use job::SendJob;
pub use monitor::{DiskUsage, MemoryUsage, SystemStats, Uptime};
pub use run::{Progress, RunId, RunState, RunStatus};
