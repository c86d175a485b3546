//! Handle used by the control surface to talk to the dispatcher.

use std::sync::Arc;

use dispatch_core::{BatchRequest, DispatchConfig, DispatchEvent, Progress, RunId, RunState, RunStatus};
use ractor::rpc::CallResult;
use ractor::{Actor, ActorRef, RpcReplyPort};
use tokio::sync::broadcast;

use crate::delivery::MessageDelivery;
use crate::dispatcher::{Dispatcher, DispatcherArgs};
use crate::messages::{DispatchError, DispatcherMessage};

/// Cloneable reference to the process-wide dispatcher.
///
/// The web layer holds this handle; all run state stays inside the actor.
#[derive(Clone)]
pub struct DispatcherHandle {
    actor: ActorRef<DispatcherMessage>,
    event_tx: broadcast::Sender<DispatchEvent>,
}

impl DispatcherHandle {
    pub fn actor(&self) -> &ActorRef<DispatcherMessage> {
        &self.actor
    }

    /// Subscribe to dispatcher events.
    pub fn subscribe(&self) -> broadcast::Receiver<DispatchEvent> {
        self.event_tx.subscribe()
    }

    pub async fn submit_batch(
        &self,
        run_id: RunId,
        batch: BatchRequest,
    ) -> Result<RunState, DispatchError> {
        self.call(|reply| DispatcherMessage::SubmitBatch {
            run_id,
            batch,
            reply,
        })
        .await?
    }

    /// Stop the given run, or the current one.
    pub async fn stop(&self, run_id: Option<RunId>) -> Result<RunState, DispatchError> {
        self.call(|reply| DispatcherMessage::Stop { run_id, reply })
            .await?
    }

    pub async fn get_progress(&self) -> Result<Option<Progress>, DispatchError> {
        self.call(|reply| DispatcherMessage::GetProgress { reply })
            .await
    }

    pub async fn get_run(&self) -> Result<Option<RunState>, DispatchError> {
        self.call(|reply| DispatcherMessage::GetRun { reply }).await
    }

    pub async fn get_status(&self) -> Result<RunStatus, DispatchError> {
        self.call(|reply| DispatcherMessage::GetStatus { reply })
            .await
    }

    pub async fn worker_count(&self) -> Result<usize, DispatchError> {
        self.call(|reply| DispatcherMessage::GetWorkerCount { reply })
            .await
    }

    /// Stop every worker and the dispatcher itself.
    pub async fn shutdown(&self) -> Result<(), DispatchError> {
        self.call(|reply| DispatcherMessage::Shutdown { reply })
            .await
    }

    async fn call<T, F>(&self, build: F) -> Result<T, DispatchError>
    where
        T: Send + 'static,
        F: FnOnce(RpcReplyPort<T>) -> DispatcherMessage,
    {
        // ractor::rpc::call returns Result<CallResult<T>, MessagingErr<M>>
        match ractor::rpc::call(&self.actor, build, None).await {
            Ok(CallResult::Success(value)) => Ok(value),
            Ok(CallResult::Timeout) => Err(DispatchError::Unavailable("request timed out".into())),
            Ok(CallResult::SenderError) => Err(DispatchError::Unavailable(
                "dispatcher dropped the request".into(),
            )),
            Err(e) => Err(DispatchError::Unavailable(e.to_string())),
        }
    }
}

/// Spawn the dispatcher actor.
pub async fn start_dispatcher(
    config: DispatchConfig,
    delivery: Arc<dyn MessageDelivery>,
) -> Result<(DispatcherHandle, tokio::task::JoinHandle<()>), ractor::SpawnErr> {
    let (event_tx, _) = broadcast::channel(1024);
    let args = DispatcherArgs {
        config,
        delivery,
        event_tx: event_tx.clone(),
    };
    let (actor, handle) = Actor::spawn(None, Dispatcher, args).await?;
    Ok((DispatcherHandle { actor, event_tx }, handle))
}
