//! Dispatch console components.

mod dispatch_form;
mod page;
mod progress_panel;
mod stats_card;
mod status_badge;

pub use dispatch_form::DispatchForm;
pub use page::DispatchPage;
pub use progress_panel::ProgressPanel;
pub use stats_card::SystemStatsCard;
pub use status_badge::StatusBadge;

/// Wait between two polls of the server.
pub(crate) async fn sleep_ms(ms: u32) {
    #[cfg(target_arch = "wasm32")]
    gloo_timers::future::TimeoutFuture::new(ms).await;

    #[cfg(not(target_arch = "wasm32"))]
    tokio::time::sleep(std::time::Duration::from_millis(ms as u64)).await;
}
