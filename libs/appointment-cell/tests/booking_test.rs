// libs/appointment-cell/tests/booking_test.rs
mod common;

use std::sync::Arc;

use assert_matches::assert_matches;
use async_trait::async_trait;
use chrono::{DateTime, Duration, FixedOffset, Utc};
use uuid::Uuid;

use appointment_cell::models::{
    Appointment, AppointmentError, AppointmentOperation, AppointmentStatus, CreateAppointmentRequest,
};
use appointment_cell::services::{
    AppointmentBookingService, AppointmentFilter, AppointmentPatch, AppointmentStore,
    InMemoryAppointmentStore,
};
use common::{at, TestSetup};

fn create_request(scheduled_at: &str) -> CreateAppointmentRequest {
    CreateAppointmentRequest {
        client_name: "João Silva".to_string(),
        phone: "(11) 98765-4321".to_string(),
        client_document: Some("123.456.789-00".to_string()),
        consultation_type: "pediatra".to_string(),
        scheduled_at: Some(scheduled_at.to_string()),
    }
}

// ==============================================================================
// CREATE
// ==============================================================================

#[tokio::test]
async fn test_create_forces_scheduled_and_assigns_id() {
    let setup = TestSetup::new();

    let appointment = setup
        .state
        .booking
        .create_appointment(create_request("2026-10-20T14:00:00Z"))
        .await
        .unwrap();

    let id = appointment.id.expect("store assigns identity");
    assert_eq!(appointment.status, AppointmentStatus::Scheduled);
    assert_eq!(appointment.scheduled_at, at(2026, 10, 20, 14, 0));

    let stored = setup.stored(id).await;
    assert_eq!(stored, appointment);
}

#[tokio::test]
async fn test_create_rejects_missing_fields_before_writing() {
    let setup = TestSetup::new();

    let cases = vec![
        CreateAppointmentRequest { client_name: "  ".into(), ..create_request("2026-10-20T14:00:00Z") },
        CreateAppointmentRequest { phone: String::new(), ..create_request("2026-10-20T14:00:00Z") },
        CreateAppointmentRequest { consultation_type: String::new(), ..create_request("2026-10-20T14:00:00Z") },
        CreateAppointmentRequest { scheduled_at: None, ..create_request("") },
        create_request("20/10/2026 14h"),
    ];

    for request in cases {
        let result = setup.state.booking.create_appointment(request).await;
        assert_matches!(result, Err(AppointmentError::Validation(_)));
    }
    assert!(setup.store.is_empty().await);
}

#[tokio::test]
async fn test_create_reads_naive_times_in_clinic_offset() {
    let store: Arc<dyn AppointmentStore> = Arc::new(InMemoryAppointmentStore::new());
    let service = AppointmentBookingService::new(store, FixedOffset::west_opt(3 * 3600).unwrap());

    let appointment = service
        .create_appointment(create_request("2026-10-20T14:00"))
        .await
        .unwrap();

    assert_eq!(appointment.scheduled_at, at(2026, 10, 20, 17, 0));
}

#[tokio::test]
async fn test_create_surfaces_persistence_failure() {
    let setup = TestSetup::new();
    setup.store.fail_next_writes(1);

    let result = setup
        .state
        .booking
        .create_appointment(create_request("2026-10-20T14:00:00Z"))
        .await;

    assert_matches!(result, Err(AppointmentError::Persistence(_)));
}

// ==============================================================================
// TRANSITIONS
// ==============================================================================

#[tokio::test]
async fn test_cancel_and_complete_from_active_states() {
    let setup = TestSetup::new();
    let when = Utc::now() + Duration::days(1);

    for status in [AppointmentStatus::Scheduled, AppointmentStatus::Postponed, AppointmentStatus::Overdue] {
        let to_cancel = setup.seed("Ana", status, when).await;
        let to_complete = setup.seed("Bia", status, when).await;

        let cancelled = setup.state.booking.cancel_appointment(to_cancel).await.unwrap();
        let completed = setup.state.booking.complete_appointment(to_complete).await.unwrap();

        assert_eq!(cancelled.status, AppointmentStatus::Cancelled);
        assert_eq!(completed.status, AppointmentStatus::Completed);
        assert_eq!(setup.stored(to_cancel).await.status, AppointmentStatus::Cancelled);
        assert_eq!(setup.stored(to_complete).await.status, AppointmentStatus::Completed);
        assert_eq!(setup.stored(to_cancel).await.scheduled_at, when);
    }
}

#[tokio::test]
async fn test_postpone_replaces_time_for_past_and_future_targets() {
    let setup = TestSetup::new();
    let id = setup.seed("Ana", AppointmentStatus::Overdue, at(2026, 10, 1, 9, 0)).await;

    for target in ["2027-01-05T10:30:00Z", "2025-03-01T08:00:00Z"] {
        let postponed = setup
            .state
            .booking
            .postpone_appointment(id, Some(target))
            .await
            .unwrap();

        assert_eq!(postponed.status, AppointmentStatus::Postponed);
        let expected = DateTime::parse_from_rfc3339(target).unwrap().with_timezone(&Utc);
        assert_eq!(postponed.scheduled_at, expected);

        let stored = setup.stored(id).await;
        assert_eq!(stored.status, AppointmentStatus::Postponed);
        assert_eq!(stored.scheduled_at, postponed.scheduled_at);
    }
}

#[tokio::test]
async fn test_postpone_without_valid_time_does_not_touch_record() {
    let setup = TestSetup::new();
    let id = setup.seed("Ana", AppointmentStatus::Scheduled, at(2026, 10, 20, 9, 0)).await;
    let before = setup.stored(id).await;

    for raw in [None, Some(""), Some("amanhã")] {
        let result = setup.state.booking.postpone_appointment(id, raw).await;
        assert_matches!(result, Err(AppointmentError::Validation(_)));
    }

    assert_eq!(setup.stored(id).await, before);
}

#[tokio::test]
async fn test_terminal_records_reject_every_operation_unchanged() {
    let setup = TestSetup::new();

    for status in [AppointmentStatus::Completed, AppointmentStatus::Cancelled] {
        let id = setup.seed("Ana", status, at(2026, 10, 20, 9, 0)).await;
        let before = serde_json::to_vec(&setup.stored(id).await).unwrap();

        assert_matches!(
            setup.state.booking.cancel_appointment(id).await,
            Err(AppointmentError::InvalidTransition { from, operation: AppointmentOperation::Cancel }) if from == status
        );
        assert_matches!(
            setup.state.booking.complete_appointment(id).await,
            Err(AppointmentError::InvalidTransition { operation: AppointmentOperation::Complete, .. })
        );
        assert_matches!(
            setup.state.booking.postpone_appointment(id, Some("2026-12-01T10:00:00Z")).await,
            Err(AppointmentError::InvalidTransition { operation: AppointmentOperation::Postpone, .. })
        );

        let after = serde_json::to_vec(&setup.stored(id).await).unwrap();
        assert_eq!(before, after);
    }
}

#[tokio::test]
async fn test_unknown_id_is_not_found() {
    let setup = TestSetup::new();
    let missing = Uuid::new_v4();

    assert_matches!(setup.state.booking.get_appointment(missing).await, Err(AppointmentError::NotFound));
    assert_matches!(setup.state.booking.cancel_appointment(missing).await, Err(AppointmentError::NotFound));
    assert_matches!(setup.state.booking.complete_appointment(missing).await, Err(AppointmentError::NotFound));
    assert_matches!(
        setup.state.booking.postpone_appointment(missing, Some("2026-12-01T10:00:00Z")).await,
        Err(AppointmentError::NotFound)
    );
}

#[tokio::test]
async fn test_get_reconciles_without_writing() {
    let setup = TestSetup::new();
    let id = setup.seed("Ana", AppointmentStatus::Scheduled, Utc::now() - Duration::days(1)).await;

    let view = setup.state.booking.get_appointment(id).await.unwrap();

    assert_eq!(view.status, AppointmentStatus::Overdue);
    assert_eq!(setup.stored(id).await.status, AppointmentStatus::Scheduled);
}

// ==============================================================================
// CONCURRENT SWEEP
// ==============================================================================

/// Lets a sweep land between a transition's read and its write.
struct SweepBetweenReadAndWrite {
    inner: InMemoryAppointmentStore,
}

#[async_trait]
impl AppointmentStore for SweepBetweenReadAndWrite {
    async fn find(&self, filter: &AppointmentFilter) -> Result<Vec<Appointment>, AppointmentError> {
        self.inner.find(filter).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Appointment>, AppointmentError> {
        let found = self.inner.find_by_id(id).await?;
        self.inner
            .update_many(
                &AppointmentFilter::all()
                    .with_statuses([AppointmentStatus::Scheduled, AppointmentStatus::Postponed])
                    .scheduled_before(Utc::now()),
                &AppointmentPatch::status(AppointmentStatus::Overdue),
            )
            .await?;
        Ok(found)
    }

    async fn insert(&self, appointment: &Appointment) -> Result<Uuid, AppointmentError> {
        self.inner.insert(appointment).await
    }

    async fn update_one(&self, id: Uuid, patch: &AppointmentPatch) -> Result<u64, AppointmentError> {
        self.inner.update_one(id, patch).await
    }

    async fn update_many(&self, filter: &AppointmentFilter, patch: &AppointmentPatch) -> Result<u64, AppointmentError> {
        self.inner.update_many(filter, patch).await
    }
}

#[tokio::test]
async fn test_transition_racing_a_sweep_reports_stale_state() {
    let racing = Arc::new(SweepBetweenReadAndWrite { inner: InMemoryAppointmentStore::new() });
    let yesterday = Appointment::create("Ana", "1199", "dentista", Utc::now() - Duration::days(1), Utc::now());
    let id = racing.insert(&yesterday).await.unwrap();

    let service = AppointmentBookingService::new(racing.clone(), FixedOffset::east_opt(0).unwrap());
    let result = service.cancel_appointment(id).await;

    assert_matches!(result, Err(AppointmentError::StaleState));
    let stored = racing.inner.find_by_id(id).await.unwrap().unwrap();
    assert_eq!(stored.status, AppointmentStatus::Overdue);

    // a retry sees the reconciled status and goes through
    let retried = service.cancel_appointment(id).await.unwrap();
    assert_eq!(retried.status, AppointmentStatus::Cancelled);
}
