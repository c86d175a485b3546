//! Host statistics server function.

use dioxus::prelude::*;
use dispatch_core::SystemStats;

/// CPU, memory, disk and uptime of the server process.
#[get("/api/stats")]
pub async fn get_stats() -> Result<SystemStats, ServerFnError> {
    #[cfg(feature = "server")]
    {
        tokio::task::spawn_blocking(crate::monitor::collect_stats)
            .await
            .map_err(|e| ServerFnError::new(format!("Failed to collect stats: {}", e)))
    }

    #[cfg(not(feature = "server"))]
    {
        Err(ServerFnError::new("Server-only function"))
    }
}
