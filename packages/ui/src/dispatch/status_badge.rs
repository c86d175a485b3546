//! Run status badge.

use dioxus::prelude::*;
use dispatch_core::RunStatus;

/// Badge for displaying the status of the current run.
#[component]
pub fn StatusBadge(status: RunStatus) -> Element {
    let (bg_class, text) = match status {
        RunStatus::Idle => ("badge-default", "Idle"),
        RunStatus::Running => ("badge-running", "Running"),
        RunStatus::Stopped => ("badge-stopped", "Stopped"),
        RunStatus::Completed => ("badge-completed", "Completed"),
    };

    rsx! {
        span {
            class: "status-badge {bg_class}",
            {text}
        }
    }
}
