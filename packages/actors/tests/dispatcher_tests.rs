#![allow(clippy::disallowed_methods)]

mod common;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use actors::{DeliveryFuture, DeliveryOutcome, DispatchError, FnDelivery};
use common::{Recorder, batch, config, start, wait_for, wait_for_completion};
use dispatch_core::{DispatchEvent, RateLimitConfig, RunId, RunStatus, SendJob, ValidationError};
use tokio::sync::mpsc;
use tokio::time::Instant;

#[tokio::test(start_paused = true)]
async fn three_message_batch_completes_with_round_robin_credentials() {
    let recorder = Recorder::default();
    let (dispatcher, mut events) = start(config(5), recorder.accepting()).await;
    assert_eq!(dispatcher.get_status().await, Ok(RunStatus::Idle));

    let run = dispatcher
        .submit_batch(RunId::new(), batch("grp1", &["t1", "t2"], &["hi", "yo", "sup"], 2))
        .await
        .expect("batch should be accepted");
    assert_eq!(run.progress.total, 3);
    assert!(run.is_running);

    assert!(wait_for_completion(&mut events).await.is_some());

    let credential_by_message: HashMap<String, String> = recorder
        .sent()
        .into_iter()
        .map(|job| (job.message_text, job.credential))
        .collect();
    assert_eq!(credential_by_message.len(), 3);
    assert_eq!(credential_by_message["hi"], "t1");
    assert_eq!(credential_by_message["yo"], "t2");
    assert_eq!(credential_by_message["sup"], "t1");

    let progress = dispatcher.get_progress().await.unwrap().expect("progress");
    assert_eq!((progress.success, progress.failed, progress.total), (3, 0, 3));
    assert_eq!(dispatcher.get_status().await, Ok(RunStatus::Completed));
}

#[tokio::test(start_paused = true)]
async fn every_job_is_delivered_exactly_once() {
    let recorder = Recorder::default();
    let (dispatcher, mut events) = start(config(5), recorder.accepting()).await;

    let messages: Vec<String> = (0..40).map(|i| format!("message {i}")).collect();
    let refs: Vec<&str> = messages.iter().map(String::as_str).collect();
    dispatcher
        .submit_batch(RunId::new(), batch("grp1", &["t1", "t2", "t3"], &refs, 1))
        .await
        .unwrap();

    assert!(wait_for_completion(&mut events).await.is_some());

    let mut delivered: Vec<String> = recorder.sent().into_iter().map(|j| j.message_text).collect();
    delivered.sort();
    let mut expected = messages.clone();
    expected.sort();
    assert_eq!(delivered, expected);

    let progress = dispatcher.get_progress().await.unwrap().unwrap();
    assert_eq!(progress.total, 40);
    assert_eq!(progress.success, 40);
}

#[tokio::test(start_paused = true)]
async fn progress_is_monotonic_and_bounded_by_total() {
    let recorder = Recorder::default();
    let delivery = recorder.delivery(|job: &SendJob| !job.message_text.ends_with("odd"));
    let (dispatcher, mut events) = start(config(3), delivery).await;

    let messages: Vec<String> = (0..12)
        .map(|i| if i % 2 == 0 { format!("{i} even") } else { format!("{i} odd") })
        .collect();
    let refs: Vec<&str> = messages.iter().map(String::as_str).collect();
    dispatcher
        .submit_batch(RunId::new(), batch("grp1", &["t1"], &refs, 3))
        .await
        .unwrap();

    let mut processed = Vec::new();
    loop {
        let event = wait_for(&mut events, |e| {
            matches!(
                e,
                DispatchEvent::JobDelivered { .. } | DispatchEvent::JobFailed { .. }
            )
        })
        .await
        .expect("outcome event");
        let progress = match event {
            DispatchEvent::JobDelivered { progress, .. } | DispatchEvent::JobFailed { progress, .. } => progress,
            _ => unreachable!(),
        };
        assert!(progress.processed() <= progress.total);
        processed.push(progress.processed());
        if progress.is_complete() {
            break;
        }
    }

    assert_eq!(processed, (1..=12).collect::<Vec<u64>>());
    let progress = dispatcher.get_progress().await.unwrap().unwrap();
    assert_eq!((progress.success, progress.failed), (6, 6));
    assert_eq!(dispatcher.get_status().await, Ok(RunStatus::Completed));
}

#[tokio::test(start_paused = true)]
async fn stop_halts_new_dequeues_but_in_flight_job_completes() {
    let (started_tx, mut started_rx) = mpsc::unbounded_channel::<String>();
    let delivery = Arc::new(FnDelivery::new(move |job: &SendJob| -> DeliveryFuture {
        let _ = started_tx.send(job.message_text.clone());
        Box::pin(async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            DeliveryOutcome::Delivered { status: 200 }
        })
    }));
    let (dispatcher, mut events) = start(config(1), delivery).await;

    dispatcher
        .submit_batch(RunId::new(), batch("grp1", &["t1"], &["a", "b", "c", "d"], 10))
        .await
        .unwrap();

    // First job is now in flight.
    assert_eq!(started_rx.recv().await.as_deref(), Some("a"));
    let stopped = dispatcher.stop(None).await.unwrap();
    assert!(!stopped.is_running);
    assert_eq!(dispatcher.get_status().await, Ok(RunStatus::Stopped));

    // The in-flight delivery still lands in the counters.
    let event = wait_for(&mut events, |e| matches!(e, DispatchEvent::JobDelivered { .. })).await;
    assert!(event.is_some());

    // Several pacing and poll cycles later nothing else was picked up.
    tokio::time::sleep(Duration::from_secs(120)).await;
    assert!(started_rx.try_recv().is_err());

    let progress = dispatcher.get_progress().await.unwrap().unwrap();
    assert_eq!((progress.success, progress.failed, progress.total), (1, 0, 4));
    assert_eq!(dispatcher.get_status().await, Ok(RunStatus::Stopped));
}

#[tokio::test(start_paused = true)]
async fn repeated_submissions_reuse_the_worker_pool() {
    let recorder = Recorder::default();
    let (dispatcher, mut events) = start(config(5), recorder.accepting()).await;
    assert_eq!(dispatcher.worker_count().await, Ok(0));

    for round in 0..3 {
        dispatcher
            .submit_batch(RunId::new(), batch("grp1", &["t1"], &["x", "y"], 1))
            .await
            .unwrap();
        assert_eq!(dispatcher.worker_count().await, Ok(5), "round {round}");
        assert!(wait_for_completion(&mut events).await.is_some());
    }

    assert_eq!(dispatcher.worker_count().await, Ok(5));
}

#[tokio::test(start_paused = true)]
async fn new_batch_drains_the_previous_one() {
    let recorder = Recorder::default();
    let (dispatcher, mut events) = start(config(1), recorder.accepting()).await;

    let first = RunId::new();
    dispatcher
        .submit_batch(first, batch("old", &["t1"], &["o1", "o2", "o3", "o4"], 600))
        .await
        .unwrap();
    wait_for(&mut events, |e| matches!(e, DispatchEvent::JobDelivered { .. })).await;

    let second = RunId::new();
    dispatcher
        .submit_batch(second, batch("new", &["t2"], &["n1", "n2"], 1))
        .await
        .unwrap();

    let completed = wait_for_completion(&mut events).await.expect("completion");
    assert_eq!(completed.run_id(), Some(second));

    let sent = recorder.sent();
    let old: Vec<_> = sent.iter().filter(|j| j.destination_id == "old").collect();
    let new: Vec<_> = sent.iter().filter(|j| j.destination_id == "new").collect();
    assert_eq!(old.len(), 1);
    assert_eq!(new.len(), 2);

    let run = dispatcher.get_run().await.unwrap().unwrap();
    assert_eq!(run.run_id, second);
    assert_eq!(run.progress.total, 2);
    assert_eq!(
        dispatcher.stop(Some(first)).await,
        Err(DispatchError::RunNotFound(first))
    );
}

#[tokio::test(start_paused = true)]
async fn invalid_batch_is_rejected_before_queueing() {
    let recorder = Recorder::default();
    let (dispatcher, _events) = start(config(2), recorder.accepting()).await;

    let err = dispatcher
        .submit_batch(RunId::new(), batch("  ", &["t1"], &["hi"], 5))
        .await;
    assert_eq!(
        err,
        Err(DispatchError::Validation(ValidationError::EmptyDestination))
    );

    let err = dispatcher
        .submit_batch(RunId::new(), batch("grp1", &["t1"], &["hi"], 7201))
        .await;
    assert_eq!(
        err,
        Err(DispatchError::Validation(ValidationError::IntervalOutOfRange(7201)))
    );

    let err = dispatcher
        .submit_batch(RunId::new(), batch("grp1", &[""], &["hi"], 5))
        .await;
    assert_eq!(
        err,
        Err(DispatchError::Validation(ValidationError::NoCredentials))
    );

    assert_eq!(dispatcher.get_status().await, Ok(RunStatus::Idle));
    assert_eq!(dispatcher.worker_count().await, Ok(0));
    assert_eq!(recorder.count(), 0);
}

#[tokio::test(start_paused = true)]
async fn stop_without_a_run_is_reported() {
    let (dispatcher, _events) = start(config(1), Recorder::default().accepting()).await;
    assert_eq!(dispatcher.stop(None).await, Err(DispatchError::NoActiveRun));

    let unknown = RunId::new();
    assert_eq!(
        dispatcher.stop(Some(unknown)).await,
        Err(DispatchError::RunNotFound(unknown))
    );
}

#[tokio::test(start_paused = true)]
async fn failed_deliveries_still_complete_the_run() {
    let recorder = Recorder::default();
    let (dispatcher, mut events) = start(config(2), recorder.delivery(|_| false)).await;

    dispatcher
        .submit_batch(RunId::new(), batch("grp1", &["t1"], &["a", "b", "c"], 1))
        .await
        .unwrap();
    assert!(wait_for_completion(&mut events).await.is_some());

    let progress = dispatcher.get_progress().await.unwrap().unwrap();
    assert_eq!((progress.success, progress.failed), (0, 3));
    assert_eq!(dispatcher.get_status().await, Ok(RunStatus::Completed));
}

#[tokio::test(start_paused = true)]
async fn workers_wait_for_the_rate_limit_window() {
    let recorder = Recorder::default();
    let mut cfg = config(2);
    cfg.rate_limit = RateLimitConfig {
        max_calls: 2,
        window_secs: 60,
    };
    let (dispatcher, mut events) = start(cfg, recorder.accepting()).await;

    let begun = Instant::now();
    dispatcher
        .submit_batch(RunId::new(), batch("grp1", &["t1"], &["a", "b", "c"], 1))
        .await
        .unwrap();
    assert!(wait_for_completion(&mut events).await.is_some());

    // The third call had to wait for the first slot to free up.
    assert!(begun.elapsed() >= Duration::from_secs(60));
    assert_eq!(recorder.count(), 3);
}

#[tokio::test(start_paused = true)]
async fn submissions_share_the_configured_quota() {
    let mut cfg = config(1);
    cfg.rate_limit = RateLimitConfig {
        max_calls: 1,
        window_secs: 3600,
    };
    let (dispatcher, _events) = start(cfg, Recorder::default().accepting()).await;

    dispatcher
        .submit_batch(RunId::new(), batch("grp1", &["t1"], &["a"], 1))
        .await
        .unwrap();
    let second = dispatcher
        .submit_batch(RunId::new(), batch("grp1", &["t1"], &["b"], 1))
        .await;
    assert_eq!(second, Err(DispatchError::RateLimited));
}

#[tokio::test(start_paused = true)]
async fn shutdown_stops_every_worker() {
    let recorder = Recorder::default();
    let (dispatcher, mut events) = start(config(3), recorder.accepting()).await;

    dispatcher
        .submit_batch(RunId::new(), batch("grp1", &["t1"], &["a"], 1))
        .await
        .unwrap();
    assert!(wait_for_completion(&mut events).await.is_some());

    dispatcher.shutdown().await.unwrap();

    let mut stopped = 0;
    while stopped < 3 {
        let event = wait_for(&mut events, |e| matches!(e, DispatchEvent::WorkerStopped { .. })).await;
        assert!(event.is_some());
        stopped += 1;
    }
}
