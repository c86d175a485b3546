//! Server initialization for the dispatcher.

use std::sync::{Arc, OnceLock};

use actors::{HttpDelivery, global_registry, start_dispatcher};
use dispatch_core::{ConfigError, DispatchConfig};
use storage::{BatchArchive, StorageError};
use tokio::sync::OnceCell;

static INIT: OnceCell<()> = OnceCell::const_new();
static ARCHIVE: OnceLock<BatchArchive> = OnceLock::new();

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("archive error: {0}")]
    Storage(#[from] StorageError),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("failed to start dispatcher: {0}")]
    Spawn(#[from] actors::SpawnErr),
}

/// Start the dispatcher once per process.
///
/// Safe to call from every request; later calls return immediately.
pub async fn ensure_initialized() -> Result<(), InitError> {
    INIT.get_or_try_init(init_dispatcher).await.map(|_| ())
}

async fn init_dispatcher() -> Result<(), InitError> {
    tracing::info!("Initializing dispatcher...");
    crate::monitor::mark_start();

    let config = DispatchConfig::from_env()?;
    let archive = BatchArchive::from_env()?;
    tracing::info!(backend = archive.kind_str(), "batch archive ready");
    let _ = ARCHIVE.set(archive);

    let delivery = Arc::new(HttpDelivery::from_config(&config)?);
    let (dispatcher, _handle) = start_dispatcher(config, delivery).await?;
    global_registry().register_dispatcher(dispatcher);

    tracing::info!("Dispatcher initialized");
    Ok(())
}

/// The batch archive, once initialized.
pub fn archive() -> Option<&'static BatchArchive> {
    ARCHIVE.get()
}
