//! Batch submission form.

use dioxus::prelude::*;
use dispatch_core::RunState;

/// Props for DispatchForm component.
#[derive(Props, Clone, PartialEq)]
pub struct DispatchFormProps {
    /// Callback when a run was started.
    pub on_started: EventHandler<RunState>,
}

/// Form for submitting a batch of messages.
#[component]
pub fn DispatchForm(props: DispatchFormProps) -> Element {
    let mut destination = use_signal(String::new);
    let mut credentials = use_signal(String::new);
    let mut messages = use_signal(String::new);
    let mut interval = use_signal(|| "60".to_string());
    let mut error = use_signal(|| None::<String>);
    let mut submitting = use_signal(|| false);

    let submit = move |_| {
        let destination_val = destination();
        let credentials_val = credentials();
        let messages_val = messages();
        let interval_val = interval();

        spawn(async move {
            submitting.set(true);
            error.set(None);

            match api::submit_batch(destination_val, credentials_val, messages_val, interval_val)
                .await
            {
                Ok(run) => {
                    tracing::info!("Started run {}", run.run_id);
                    props.on_started.call(run);
                }
                Err(e) => {
                    error.set(Some(format!("Failed to start run: {}", e)));
                }
            }

            submitting.set(false);
        });
    };

    rsx! {
        div { class: "dispatch-form",
            h3 { "New Batch" }

            if let Some(err) = error() {
                div { class: "error-message", "{err}" }
            }

            div { class: "form-group",
                label { "Destination ID" }
                input {
                    r#type: "text",
                    value: "{destination}",
                    oninput: move |e| destination.set(e.value()),
                }
            }

            div { class: "form-group",
                label { "Credentials (one per line)" }
                textarea {
                    rows: 4,
                    value: "{credentials}",
                    oninput: move |e| credentials.set(e.value()),
                }
            }

            div { class: "form-group",
                label { "Messages (one per line)" }
                textarea {
                    rows: 8,
                    value: "{messages}",
                    oninput: move |e| messages.set(e.value()),
                }
            }

            div { class: "form-group",
                label { "Interval between sends (seconds, 1-7200)" }
                input {
                    r#type: "number",
                    min: "1",
                    max: "7200",
                    value: "{interval}",
                    oninput: move |e| interval.set(e.value()),
                }
            }

            div { class: "form-actions",
                button {
                    class: "btn btn-primary",
                    disabled: submitting(),
                    onclick: submit,
                    if submitting() { "Starting..." } else { "Start" }
                }
            }
        }
    }
}
