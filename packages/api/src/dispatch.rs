//! Dispatch control server functions.

use dioxus::prelude::*;
use dispatch_core::{Progress, RunState, RunStatus};

#[cfg(feature = "server")]
async fn dispatcher() -> Result<actors::DispatcherHandle, ServerFnError> {
    crate::ensure_initialized()
        .await
        .map_err(|e| ServerFnError::new(format!("Initialization failed: {}", e)))?;

    actors::global_registry()
        .get_dispatcher()
        .ok_or_else(|| ServerFnError::new("Dispatcher not available"))
}

/// Submit a batch. Credentials and messages are one per line.
///
/// Replaces whatever run was in progress.
#[post("/api/dispatch")]
pub async fn submit_batch(
    destination_id: String,
    credentials: String,
    messages: String,
    pacing_interval: String,
) -> Result<RunState, ServerFnError> {
    #[cfg(feature = "server")]
    {
        use dispatch_core::{BatchRequest, RunId};

        let request =
            BatchRequest::from_form(&destination_id, &credentials, &messages, &pacing_interval)
                .map_err(|e| ServerFnError::new(e.to_string()))?;
        let validated = request
            .validate()
            .map_err(|e| ServerFnError::new(e.to_string()))?;

        let dispatcher = dispatcher().await?;
        let run_id = RunId::new();

        let archive =
            crate::archive().ok_or_else(|| ServerFnError::new("Archive not available"))?;
        if let Err(e) = archive.record(&validated.snapshot(run_id), &validated).await {
            tracing::error!("Archiving batch {} failed: {}", run_id, e);
            return Err(ServerFnError::new("Failed to save batch"));
        }

        dispatcher
            .submit_batch(run_id, request)
            .await
            .map_err(|e| ServerFnError::new(e.to_string()))
    }

    #[cfg(not(feature = "server"))]
    {
        let _ = (destination_id, credentials, messages, pacing_interval);
        Err(ServerFnError::new("Server-only function"))
    }
}

/// Stop a run. Without an id the current run is stopped.
#[post("/api/dispatch/stop")]
pub async fn stop_dispatch(run_id: Option<String>) -> Result<RunState, ServerFnError> {
    #[cfg(feature = "server")]
    {
        use dispatch_core::RunId;

        let run_id = run_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(RunId::parse)
            .transpose()
            .map_err(|e| ServerFnError::new(format!("Invalid run ID: {}", e)))?;

        dispatcher()
            .await?
            .stop(run_id)
            .await
            .map_err(|e| ServerFnError::new(e.to_string()))
    }

    #[cfg(not(feature = "server"))]
    {
        let _ = run_id;
        Err(ServerFnError::new("Server-only function"))
    }
}

/// Counters of the current run, if any.
#[get("/api/dispatch/progress")]
pub async fn get_progress() -> Result<Option<Progress>, ServerFnError> {
    #[cfg(feature = "server")]
    {
        dispatcher()
            .await?
            .get_progress()
            .await
            .map_err(|e| ServerFnError::new(e.to_string()))
    }

    #[cfg(not(feature = "server"))]
    {
        Err(ServerFnError::new("Server-only function"))
    }
}

/// Status of the current run.
#[get("/api/dispatch/status")]
pub async fn get_status() -> Result<RunStatus, ServerFnError> {
    #[cfg(feature = "server")]
    {
        dispatcher()
            .await?
            .get_status()
            .await
            .map_err(|e| ServerFnError::new(e.to_string()))
    }

    #[cfg(not(feature = "server"))]
    {
        Err(ServerFnError::new("Server-only function"))
    }
}

/// The current run, including its destination and id.
#[get("/api/dispatch/run")]
pub async fn get_run() -> Result<Option<RunState>, ServerFnError> {
    #[cfg(feature = "server")]
    {
        dispatcher()
            .await?
            .get_run()
            .await
            .map_err(|e| ServerFnError::new(e.to_string()))
    }

    #[cfg(not(feature = "server"))]
    {
        Err(ServerFnError::new("Server-only function"))
    }
}
