//! Dispatch console page.

use dioxus::prelude::*;
use dispatch_core::RunState;

use super::{DispatchForm, ProgressPanel, SystemStatsCard};

/// Main page: batch form, current run and host stats.
#[component]
pub fn DispatchPage() -> Element {
    let mut last_started = use_signal(|| None::<RunState>);

    rsx! {
        div { class: "dispatch-page",
            header { class: "page-header",
                h1 { "Message Dispatch" }
            }

            if let Some(run) = last_started() {
                div { class: "info-banner",
                    span { "Started run {run.run_id} with {run.progress.total} messages" }
                    button {
                        onclick: move |_| last_started.set(None),
                        "x"
                    }
                }
            }

            div { class: "dispatch-content",
                section { class: "main-panel",
                    DispatchForm {
                        on_started: move |run: RunState| last_started.set(Some(run)),
                    }
                }
                aside { class: "side-panel",
                    ProgressPanel {}
                    SystemStatsCard {}
                }
            }
        }
    }
}
