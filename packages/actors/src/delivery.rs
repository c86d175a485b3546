//! Message delivery: one outbound call per job, reduced to an outcome.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;

use chrono::Local;
use dispatch_core::{DispatchConfig, SendJob};
use futures_util::FutureExt;
use serde::Serialize;

/// Result of one delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The endpoint accepted the message.
    Delivered { status: u16 },
    /// The endpoint answered with a non-success status.
    Rejected { status: u16, body: String },
    /// The request never produced a response.
    Transport { error: String },
}

impl DeliveryOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, DeliveryOutcome::Delivered { .. })
    }
}

/// Future type for async deliveries.
pub type DeliveryFuture = Pin<Box<dyn Future<Output = DeliveryOutcome> + Send>>;

/// Trait for delivery backends.
///
/// Implementations must not retry; a failed job is counted and the worker
/// moves on.
pub trait MessageDelivery: Send + Sync + 'static {
    fn deliver(&self, job: &SendJob) -> DeliveryFuture;
}

/// Deliver one job and log the outcome.
///
/// Never fails: errors and panics inside the backend become `false`.
pub async fn deliver(delivery: &dyn MessageDelivery, job: &SendJob) -> bool {
    let attempt = match std::panic::catch_unwind(AssertUnwindSafe(|| delivery.deliver(job))) {
        Ok(future) => AssertUnwindSafe(future).catch_unwind().await,
        Err(panic) => Err(panic),
    };
    let at = Local::now().format("%Y-%m-%d %I:%M:%S %p");

    match attempt {
        Ok(DeliveryOutcome::Delivered { status }) => {
            tracing::info!(
                run_id = %job.run_id,
                destination = %job.destination_id,
                status,
                "Success - message sent at {at}"
            );
            true
        }
        Ok(DeliveryOutcome::Rejected { status, body }) => {
            tracing::error!(
                run_id = %job.run_id,
                destination = %job.destination_id,
                status,
                "Failed at {at}: {body}"
            );
            false
        }
        Ok(DeliveryOutcome::Transport { error }) => {
            tracing::error!(
                run_id = %job.run_id,
                destination = %job.destination_id,
                "Error sending message at {at}: {error}"
            );
            false
        }
        Err(_) => {
            tracing::error!(
                run_id = %job.run_id,
                destination = %job.destination_id,
                "Delivery panicked at {at}"
            );
            false
        }
    }
}

#[derive(Serialize)]
struct MessagePayload<'a> {
    access_token: &'a str,
    message: &'a str,
}

/// Delivers jobs as JSON POSTs to a configured endpoint.
#[derive(Debug, Clone)]
pub struct HttpDelivery {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpDelivery {
    /// `endpoint` may contain `{destination}`, replaced per job.
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    pub fn from_config(cfg: &DispatchConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(cfg.request_timeout())
            .user_agent(concat!("bulk-dispatch/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::new(client, cfg.endpoint.clone()))
    }

    pub fn url_for(&self, destination_id: &str) -> String {
        self.endpoint.replace("{destination}", destination_id)
    }
}

impl MessageDelivery for HttpDelivery {
    fn deliver(&self, job: &SendJob) -> DeliveryFuture {
        let request = self
            .client
            .post(self.url_for(&job.destination_id))
            .json(&MessagePayload {
                access_token: &job.credential,
                message: &job.message_text,
            });

        Box::pin(async move {
            match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        DeliveryOutcome::Delivered {
                            status: status.as_u16(),
                        }
                    } else {
                        let body = response.text().await.unwrap_or_default();
                        DeliveryOutcome::Rejected {
                            status: status.as_u16(),
                            body,
                        }
                    }
                }
                Err(e) => DeliveryOutcome::Transport {
                    error: e.to_string(),
                },
            }
        })
    }
}

/// A simple function-based delivery backend.
pub struct FnDelivery<F>
where
    F: Fn(&SendJob) -> DeliveryFuture + Send + Sync + 'static,
{
    delivery: F,
}

impl<F> FnDelivery<F>
where
    F: Fn(&SendJob) -> DeliveryFuture + Send + Sync + 'static,
{
    pub fn new(delivery: F) -> Self {
        Self { delivery }
    }
}

impl<F> MessageDelivery for FnDelivery<F>
where
    F: Fn(&SendJob) -> DeliveryFuture + Send + Sync + 'static,
{
    fn deliver(&self, job: &SendJob) -> DeliveryFuture {
        (self.delivery)(job)
    }
}
