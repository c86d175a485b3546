//! Actor system for the message dispatcher.
//!
//! This crate provides the Ractor-based dispatcher and the pieces its
//! workers are built from.
//!
//! # Architecture
//!
//! - `Dispatcher` - Actor owning every run, the queue and the worker pool
//! - `WorkerPool` - Fixed set of worker tasks, spawned once and reused
//! - `MessageQueue` - Unbounded FIFO of pending send jobs
//! - `RateLimiter` - Rolling-window quota on outbound calls
//! - `MessageDelivery` - One outbound call per job
//!
//! # Usage
//!
//! ```ignore
//! use actors::{HttpDelivery, start_dispatcher};
//!
//! let delivery = Arc::new(HttpDelivery::from_config(&config)?);
//! let (dispatcher, _handle) = start_dispatcher(config, delivery).await?;
//! let run = dispatcher.submit_batch(RunId::new(), batch).await?;
//! ```

mod delivery;
mod dispatcher;
mod handle;
mod message_queue;
mod messages;
mod pool;
mod rate_limiter;
pub mod registry;
mod runs;
mod worker;

pub use delivery::{
    DeliveryFuture, DeliveryOutcome, FnDelivery, HttpDelivery, MessageDelivery, deliver,
};
pub use dispatcher::{Dispatcher, DispatcherArgs, DispatcherState};
pub use handle::{DispatcherHandle, start_dispatcher};
pub use message_queue::{MessageQueue, QueueItem, QueuedJob};
pub use messages::{DispatchError, DispatcherMessage};
pub use pool::{PoolSignal, WorkerPool};
pub use rate_limiter::RateLimiter;
pub use registry::{ActorRegistry, global_registry};
pub use runs::{Recorded, RunEntry, RunRegistry};
pub use worker::{WorkerContext, WorkerDeps, run_worker};

/// Re-export ractor types for convenience.
pub use ractor::{Actor, ActorRef, RpcReplyPort, SpawnErr, concurrency};
