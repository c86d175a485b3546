//! Server API functions for the message dispatcher.
//!
//! This crate contains all shared fullstack server functions for:
//! - Batch submission and stop
//! - Progress and status polling
//! - Host statistics

mod dispatch;
mod stats;

#[cfg(feature = "server")]
mod init;

#[cfg(feature = "server")]
mod monitor;

// Re-export all server functions
pub use dispatch::*;
pub use stats::*;

#[cfg(feature = "server")]
pub use init::*;

#[cfg(feature = "server")]
pub use monitor::collect_stats;

// Re-export core types for convenience
pub use dispatch_core::{Progress, RunId, RunState, RunStatus, SystemStats};
