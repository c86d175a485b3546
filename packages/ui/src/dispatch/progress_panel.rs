//! Live view of the current run.

use dioxus::prelude::*;
use dispatch_core::{RunState, RunStatus};

use super::{StatusBadge, sleep_ms};

/// Refresh interval in milliseconds (2 seconds).
const REFRESH_INTERVAL_MS: u32 = 2000;

/// Shows counters for the current run and lets the operator stop it.
#[component]
pub fn ProgressPanel() -> Element {
    let mut run = use_signal(|| None::<RunState>);
    let mut status = use_signal(RunStatus::default);
    let mut error = use_signal(|| None::<String>);

    let _refresh = use_coroutine(move |_rx: UnboundedReceiver<()>| async move {
        loop {
            if let Ok(current) = api::get_run().await {
                run.set(current);
            }
            if let Ok(s) = api::get_status().await {
                status.set(s);
            }

            sleep_ms(REFRESH_INTERVAL_MS).await;
        }
    });

    let on_stop = move |_| {
        let run_id = run().map(|r| r.run_id.to_string());
        spawn(async move {
            match api::stop_dispatch(run_id).await {
                Ok(stopped) => {
                    status.set(RunStatus::derive(Some(&stopped)));
                    run.set(Some(stopped));
                }
                Err(e) => error.set(Some(format!("Failed to stop run: {}", e))),
            }
        });
    };

    let percent = run().map(|r| r.progress.percent()).unwrap_or_default();

    rsx! {
        div { class: "progress-panel",
            div { class: "panel-header",
                h3 { "Current Run" }
                StatusBadge { status: status() }
            }

            if let Some(err) = error() {
                div { class: "error-message", "{err}" }
            }

            if let Some(current) = run() {
                div { class: "run-summary",
                    p { class: "run-id", "Run {current.run_id}" }
                    p { "Destination: {current.destination_id}" }
                }

                div { class: "progress-bar",
                    div {
                        class: "progress-fill",
                        style: "width: {percent:.0}%",
                    }
                }

                div { class: "progress-counters",
                    span { class: "counter-success", "Sent: {current.progress.success}" }
                    span { class: "counter-failed", "Failed: {current.progress.failed}" }
                    span { class: "counter-total", "Total: {current.progress.total}" }
                }

                if status() == RunStatus::Running {
                    button {
                        class: "btn btn-danger",
                        onclick: on_stop,
                        "Stop"
                    }
                }
            } else {
                p { class: "empty-state", "No run yet" }
            }
        }
    }
}
