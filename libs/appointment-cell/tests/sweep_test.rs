// libs/appointment-cell/tests/sweep_test.rs
mod common;

use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use chrono::{Duration as ChronoDuration, SecondsFormat, Utc};

use appointment_cell::models::{AppointmentError, AppointmentStatus, CreateAppointmentRequest};
use appointment_cell::services::{OverdueSweepService, OverdueSweepWorker};
use common::{at, TestSetup};

#[tokio::test]
async fn test_sweep_marks_only_past_pending_appointments() {
    let setup = TestSetup::new();
    let now = at(2026, 10, 15, 12, 0);

    let past_scheduled = setup.seed("A", AppointmentStatus::Scheduled, at(2026, 10, 15, 9, 0)).await;
    let past_postponed = setup.seed("B", AppointmentStatus::Postponed, at(2026, 10, 14, 9, 0)).await;
    let future_scheduled = setup.seed("C", AppointmentStatus::Scheduled, at(2026, 10, 15, 15, 0)).await;
    let exactly_now = setup.seed("D", AppointmentStatus::Scheduled, now).await;
    let past_completed = setup.seed("E", AppointmentStatus::Completed, at(2026, 10, 10, 9, 0)).await;
    let past_cancelled = setup.seed("F", AppointmentStatus::Cancelled, at(2026, 10, 10, 9, 0)).await;

    let modified = setup.state.sweep.run_overdue_sweep(now).await.unwrap();

    assert_eq!(modified, 2);
    assert_eq!(setup.stored(past_scheduled).await.status, AppointmentStatus::Overdue);
    assert_eq!(setup.stored(past_postponed).await.status, AppointmentStatus::Overdue);
    assert_eq!(setup.stored(future_scheduled).await.status, AppointmentStatus::Scheduled);
    assert_eq!(setup.stored(exactly_now).await.status, AppointmentStatus::Scheduled);
    assert_eq!(setup.stored(past_completed).await.status, AppointmentStatus::Completed);
    assert_eq!(setup.stored(past_cancelled).await.status, AppointmentStatus::Cancelled);
}

#[tokio::test]
async fn test_sweep_keeps_scheduled_time_and_is_idempotent() {
    let setup = TestSetup::new();
    let now = at(2026, 10, 15, 12, 0);
    let original_time = at(2026, 10, 15, 9, 30);
    let id = setup.seed("A", AppointmentStatus::Scheduled, original_time).await;

    assert_eq!(setup.state.sweep.run_overdue_sweep(now).await.unwrap(), 1);
    assert_eq!(setup.state.sweep.run_overdue_sweep(now).await.unwrap(), 0);

    let stored = setup.stored(id).await;
    assert_eq!(stored.status, AppointmentStatus::Overdue);
    assert_eq!(stored.scheduled_at, original_time);
}

#[tokio::test]
async fn test_appointment_booked_for_yesterday_is_swept_overdue() {
    let setup = TestSetup::new();
    let yesterday = (Utc::now() - ChronoDuration::days(1)).to_rfc3339_opts(SecondsFormat::Secs, true);

    let created = setup
        .state
        .booking
        .create_appointment(CreateAppointmentRequest {
            client_name: "Ana Costa".to_string(),
            phone: "(11) 91234-5678".to_string(),
            client_document: None,
            consultation_type: "dentista".to_string(),
            scheduled_at: Some(yesterday),
        })
        .await
        .unwrap();
    let id = created.id.expect("store assigns identity");
    assert_eq!(created.status, AppointmentStatus::Scheduled);

    let modified = setup.state.sweep.run_overdue_sweep(Utc::now()).await.unwrap();

    assert_eq!(modified, 1);
    let stored = setup.stored(id).await;
    assert_eq!(stored.status, AppointmentStatus::Overdue);
    assert_eq!(stored.scheduled_at, created.scheduled_at);
}

#[tokio::test]
async fn test_sweep_on_empty_store_modifies_nothing() {
    let setup = TestSetup::new();
    assert_eq!(setup.state.sweep.run_overdue_sweep(at(2026, 10, 15, 12, 0)).await.unwrap(), 0);
}

#[tokio::test]
async fn test_sweep_does_not_undo_a_cancellation() {
    let setup = TestSetup::new();
    let id = setup.seed("A", AppointmentStatus::Scheduled, at(2026, 10, 15, 9, 0)).await;

    setup.state.booking.cancel_appointment(id).await.unwrap();
    let modified = setup.state.sweep.run_overdue_sweep(at(2026, 10, 15, 12, 0)).await.unwrap();

    assert_eq!(modified, 0);
    assert_eq!(setup.stored(id).await.status, AppointmentStatus::Cancelled);
}

#[tokio::test]
async fn test_sweep_failure_is_reported_and_leaves_records() {
    let setup = TestSetup::new();
    let id = setup.seed("A", AppointmentStatus::Scheduled, at(2026, 10, 15, 9, 0)).await;
    setup.store.fail_next_writes(1);

    let result = setup.state.sweep.run_overdue_sweep(at(2026, 10, 15, 12, 0)).await;

    assert_matches!(result, Err(AppointmentError::Persistence(_)));
    assert_eq!(setup.stored(id).await.status, AppointmentStatus::Scheduled);
}

#[tokio::test]
async fn test_worker_run_once_skips_failed_cycle() {
    let setup = TestSetup::new();
    setup.seed("A", AppointmentStatus::Scheduled, at(2020, 1, 1, 9, 0)).await;
    let worker = OverdueSweepWorker::new(Arc::clone(&setup.state.sweep), Duration::from_secs(60));

    setup.store.fail_next_writes(1);
    assert!(worker.run_once().await.is_none());

    let report = worker.run_once().await.expect("second cycle succeeds");
    assert_eq!(report.modified, 1);
}

#[tokio::test]
async fn test_worker_sweeps_on_start_and_stops_on_shutdown() {
    let setup = TestSetup::new();
    let id = setup.seed("A", AppointmentStatus::Postponed, at(2020, 1, 1, 9, 0)).await;

    let sweep: Arc<OverdueSweepService> = Arc::clone(&setup.state.sweep);
    let worker = Arc::new(OverdueSweepWorker::new(sweep, Duration::from_millis(20)));
    let handle = tokio::spawn({
        let worker = Arc::clone(&worker);
        async move { worker.start().await }
    });

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(setup.stored(id).await.status, AppointmentStatus::Overdue);

    worker.shutdown();
    tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("worker stops after shutdown")
        .expect("worker task does not panic");
}

#[tokio::test]
async fn test_worker_shutdown_before_start_returns_immediately() {
    let setup = TestSetup::new();
    let worker = OverdueSweepWorker::new(Arc::clone(&setup.state.sweep), Duration::from_secs(3600));

    worker.shutdown();
    tokio::time::timeout(Duration::from_secs(1), worker.start())
        .await
        .expect("start observes the earlier shutdown");
}
