//! Dispatcher actor: single owner of run state and the worker pool.

use std::sync::Arc;

use chrono::Utc;
use dispatch_core::{
    BatchRequest, DispatchConfig, DispatchEvent, RunId, RunState, RunStatus,
};
use ractor::{Actor, ActorProcessingErr, ActorRef};
use tokio::sync::broadcast;

use crate::delivery::MessageDelivery;
use crate::message_queue::{MessageQueue, QueuedJob};
use crate::messages::{DispatchError, DispatcherMessage};
use crate::pool::{PoolSignal, WorkerPool};
use crate::rate_limiter::RateLimiter;
use crate::runs::{Recorded, RunRegistry};
use crate::worker::WorkerDeps;

/// Dispatcher actor arguments.
pub struct DispatcherArgs {
    pub config: DispatchConfig,
    pub delivery: Arc<dyn MessageDelivery>,
    pub event_tx: broadcast::Sender<DispatchEvent>,
}

/// State for the dispatcher actor.
pub struct DispatcherState {
    pub config: DispatchConfig,
    /// Pending jobs shared with the workers.
    pub queue: Arc<MessageQueue>,
    /// Outbound call quota shared by all workers.
    pub limiter: Arc<RateLimiter>,
    /// Quota for batch submissions.
    submissions: RateLimiter,
    delivery: Arc<dyn MessageDelivery>,
    pool: WorkerPool,
    runs: RunRegistry,
    event_tx: broadcast::Sender<DispatchEvent>,
}

impl DispatcherState {
    pub fn new(args: DispatcherArgs) -> Self {
        Self {
            queue: Arc::new(MessageQueue::new()),
            limiter: Arc::new(RateLimiter::from_config(&args.config.rate_limit)),
            submissions: RateLimiter::from_config(&args.config.rate_limit),
            delivery: args.delivery,
            pool: WorkerPool::new(),
            runs: RunRegistry::new(),
            event_tx: args.event_tx,
            config: args.config,
        }
    }

    /// Broadcast an event.
    fn broadcast(&self, event: DispatchEvent) {
        tracing::debug!("{}", event.description());
        let _ = self.event_tx.send(event);
    }

    fn worker_deps(&self, myself: ActorRef<DispatcherMessage>) -> WorkerDeps {
        WorkerDeps {
            queue: self.queue.clone(),
            limiter: self.limiter.clone(),
            delivery: self.delivery.clone(),
            dispatcher: myself,
            idle_poll: self.config.idle_poll(),
            event_tx: Some(self.event_tx.clone()),
        }
    }

    async fn submit(
        &mut self,
        myself: ActorRef<DispatcherMessage>,
        run_id: RunId,
        batch: BatchRequest,
    ) -> Result<RunState, DispatchError> {
        let batch = batch.validate()?;
        if !self.submissions.try_acquire().await {
            return Err(DispatchError::RateLimited);
        }

        // Hold the workers while the queue is swapped over to the new run.
        self.pool.set_signal(PoolSignal::Paused);

        let run = RunState::started(run_id, &batch.destination_id, batch.total());
        let (cancel, superseded) = self.runs.begin(run.clone());
        for old in superseded {
            if !old.progress.is_complete() {
                tracing::info!("Run {} superseded by {}", old.run_id, run_id);
                self.broadcast(DispatchEvent::RunStopped {
                    run_id: old.run_id,
                    progress: old.progress,
                    timestamp: Utc::now(),
                });
            }
        }

        let discarded = self.queue.drain().await;
        if discarded > 0 {
            tracing::info!(discarded, "cleared jobs left over from the previous run");
            self.broadcast(DispatchEvent::QueueDrained {
                discarded,
                timestamp: Utc::now(),
            });
        }

        let deps = self.worker_deps(myself);
        self.pool.ensure_started(self.config.worker_count, &deps);

        let jobs = batch
            .fan_out(run_id)
            .into_iter()
            .map(|job| QueuedJob::new(job, cancel.clone()));
        let queued = self.queue.enqueue_all(jobs).await;

        self.pool.set_signal(PoolSignal::Dispatching);

        tracing::info!(
            run_id = %run_id,
            destination = %batch.destination_id,
            queued,
            interval_secs = batch.pacing_interval_secs,
            "run started"
        );
        self.broadcast(DispatchEvent::RunStarted {
            run_id,
            destination_id: batch.destination_id.clone(),
            total: batch.total(),
            timestamp: Utc::now(),
        });

        Ok(run)
    }

    fn stop(&mut self, run_id: Option<RunId>) -> Result<RunState, DispatchError> {
        let run_id = run_id
            .or(self.runs.current_id())
            .ok_or(DispatchError::NoActiveRun)?;
        let stopped = self
            .runs
            .stop(run_id)
            .ok_or(DispatchError::RunNotFound(run_id))?;

        if self.runs.current_id() == Some(run_id) {
            self.pool.set_signal(PoolSignal::Paused);
        }

        tracing::info!("Run {} stopped", run_id);
        self.broadcast(DispatchEvent::RunStopped {
            run_id,
            progress: stopped.progress.clone(),
            timestamp: Utc::now(),
        });
        Ok(stopped)
    }

    fn job_finished(&mut self, run_id: RunId, delivered: bool) {
        match self.runs.record(run_id, delivered) {
            Recorded::Updated { state, completed } => {
                let progress = state.progress;
                let event = if delivered {
                    DispatchEvent::JobDelivered {
                        run_id,
                        progress: progress.clone(),
                        timestamp: Utc::now(),
                    }
                } else {
                    DispatchEvent::JobFailed {
                        run_id,
                        progress: progress.clone(),
                        timestamp: Utc::now(),
                    }
                };
                self.broadcast(event);

                if completed {
                    tracing::info!(
                        run_id = %run_id,
                        success = progress.success,
                        failed = progress.failed,
                        "run completed"
                    );
                    self.broadcast(DispatchEvent::RunCompleted {
                        run_id,
                        progress,
                        timestamp: Utc::now(),
                    });
                }
            }
            Recorded::Overflow => {
                tracing::warn!("Run {} received more outcomes than jobs", run_id);
            }
            Recorded::UnknownRun => {
                tracing::debug!("Ignoring outcome for reaped run {}", run_id);
            }
        }
    }
}

/// Dispatcher actor that owns every run and the worker pool.
pub struct Dispatcher;

impl Actor for Dispatcher {
    type Msg = DispatcherMessage;
    type State = DispatcherState;
    type Arguments = DispatcherArgs;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        args.config
            .validate()
            .map_err(|e| ActorProcessingErr::from(e.to_string()))?;

        tracing::info!(
            workers = args.config.worker_count,
            max_calls = args.config.rate_limit.max_calls,
            window_secs = args.config.rate_limit.window_secs,
            "Starting dispatcher"
        );
        Ok(DispatcherState::new(args))
    }

    async fn handle(
        &self,
        myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            DispatcherMessage::SubmitBatch {
                run_id,
                batch,
                reply,
            } => {
                let result = state.submit(myself, run_id, batch).await;
                if let Err(ref e) = result {
                    tracing::warn!("Rejected batch {}: {}", run_id, e);
                }
                let _ = reply.send(result);
            }

            DispatcherMessage::Stop { run_id, reply } => {
                let _ = reply.send(state.stop(run_id));
            }

            DispatcherMessage::GetProgress { reply } => {
                let _ = reply.send(state.runs.current().map(|run| run.progress.clone()));
            }

            DispatcherMessage::GetRun { reply } => {
                let _ = reply.send(state.runs.current().cloned());
            }

            DispatcherMessage::GetStatus { reply } => {
                let _ = reply.send(RunStatus::derive(state.runs.current()));
            }

            DispatcherMessage::GetWorkerCount { reply } => {
                let _ = reply.send(state.pool.live_workers());
            }

            DispatcherMessage::JobFinished { run_id, delivered } => {
                state.job_finished(run_id, delivered);
            }

            DispatcherMessage::Shutdown { reply } => {
                tracing::info!("Shutting down dispatcher");
                if let Some(run_id) = state.runs.current_id() {
                    state.runs.stop(run_id);
                }
                let joined = state.pool.shutdown(&state.queue).await;
                tracing::info!(joined, "worker pool stopped");
                let _ = reply.send(());
                myself.stop(None);
            }
        }

        Ok(())
    }
}
