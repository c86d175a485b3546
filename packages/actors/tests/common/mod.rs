#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use actors::{
    DeliveryFuture, DeliveryOutcome, DispatcherHandle, FnDelivery, MessageDelivery,
    start_dispatcher,
};
use dispatch_core::{BatchRequest, DispatchConfig, DispatchEvent, RateLimitConfig, SendJob};
use tokio::sync::broadcast::{self, error::RecvError};

/// Upper bound for waiting on an event; time is paused in these tests.
pub const EVENT_WAIT: Duration = Duration::from_secs(7 * 24 * 3600);

pub fn config(workers: usize) -> DispatchConfig {
    DispatchConfig {
        worker_count: workers,
        rate_limit: RateLimitConfig {
            max_calls: 10_000,
            window_secs: 3600,
        },
        idle_poll_ms: 1000,
        ..DispatchConfig::default()
    }
}

pub fn batch(destination: &str, credentials: &[&str], messages: &[&str], interval: i64) -> BatchRequest {
    BatchRequest {
        destination_id: destination.to_string(),
        credentials: credentials.iter().map(|s| s.to_string()).collect(),
        messages: messages.iter().map(|s| s.to_string()).collect(),
        pacing_interval_secs: interval,
    }
}

/// Delivery backend that records every job it is handed.
#[derive(Clone, Default)]
pub struct Recorder {
    sent: Arc<Mutex<Vec<SendJob>>>,
}

impl Recorder {
    /// Every job succeeds.
    pub fn accepting(&self) -> Arc<dyn MessageDelivery> {
        self.delivery(|_| true)
    }

    /// Jobs succeed when `accept` returns true.
    pub fn delivery(&self, accept: fn(&SendJob) -> bool) -> Arc<dyn MessageDelivery> {
        let sent = Arc::clone(&self.sent);
        Arc::new(FnDelivery::new(move |job: &SendJob| -> DeliveryFuture {
            sent.lock().unwrap().push(job.clone());
            let ok = accept(job);
            Box::pin(async move {
                if ok {
                    DeliveryOutcome::Delivered { status: 200 }
                } else {
                    DeliveryOutcome::Rejected {
                        status: 500,
                        body: "rejected".into(),
                    }
                }
            })
        }))
    }

    pub fn sent(&self) -> Vec<SendJob> {
        self.sent.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

pub async fn start(
    config: DispatchConfig,
    delivery: Arc<dyn MessageDelivery>,
) -> (DispatcherHandle, broadcast::Receiver<DispatchEvent>) {
    let (dispatcher, _join) = start_dispatcher(config, delivery)
        .await
        .expect("dispatcher should start");
    let events = dispatcher.subscribe();
    (dispatcher, events)
}

/// Wait for the first event matching `pred`.
pub async fn wait_for<F>(
    events: &mut broadcast::Receiver<DispatchEvent>,
    mut pred: F,
) -> Option<DispatchEvent>
where
    F: FnMut(&DispatchEvent) -> bool,
{
    let wait = async {
        loop {
            match events.recv().await {
                Ok(event) if pred(&event) => return Some(event),
                Ok(_) | Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => return None,
            }
        }
    };
    tokio::time::timeout(EVENT_WAIT, wait).await.ok().flatten()
}

pub async fn wait_for_completion(
    events: &mut broadcast::Receiver<DispatchEvent>,
) -> Option<DispatchEvent> {
    wait_for(events, |e| matches!(e, DispatchEvent::RunCompleted { .. })).await
}
