// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::error::AppError;

use crate::models::{
    AppointmentSearchQuery, CreateAppointmentRequest, PostponeAppointmentRequest, SweepReport,
    WeeklyViewQuery,
};
use crate::state::AppointmentState;

// ==============================================================================
// APPOINTMENT LIFECYCLE HANDLERS
// ==============================================================================

pub async fn create_appointment(
    State(state): State<Arc<AppointmentState>>,
    Json(request): Json<CreateAppointmentRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let appointment = state.booking.create_appointment(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "appointment": appointment,
            "message": "Appointment created successfully"
        })),
    ))
}

pub async fn get_appointment(
    State(state): State<Arc<AppointmentState>>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let appointment = state.booking.get_appointment(appointment_id).await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment
    })))
}

pub async fn cancel_appointment(
    State(state): State<Arc<AppointmentState>>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let appointment = state.booking.cancel_appointment(appointment_id).await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment cancelled"
    })))
}

pub async fn postpone_appointment(
    State(state): State<Arc<AppointmentState>>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<PostponeAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment = state
        .booking
        .postpone_appointment(appointment_id, request.new_time.as_deref())
        .await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment postponed"
    })))
}

pub async fn complete_appointment(
    State(state): State<Arc<AppointmentState>>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let appointment = state.booking.complete_appointment(appointment_id).await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment completed"
    })))
}

// ==============================================================================
// LISTING, SCHEDULE AND MAINTENANCE HANDLERS
// ==============================================================================

pub async fn search_appointments(
    State(state): State<Arc<AppointmentState>>,
    Query(query): Query<AppointmentSearchQuery>,
) -> Result<Json<Value>, AppError> {
    let appointments = state.search.search(query.q.as_deref(), Utc::now()).await?;

    Ok(Json(json!({
        "appointments": appointments,
        "total": appointments.len()
    })))
}

pub async fn get_weekly_view(
    State(state): State<Arc<AppointmentState>>,
    Query(query): Query<WeeklyViewQuery>,
) -> Result<Json<Value>, AppError> {
    let window_days = query.days.unwrap_or(state.default_window_days);
    let view = state.schedule.build_weekly_view(Utc::now(), window_days).await?;
    Ok(Json(json!(view)))
}

pub async fn run_overdue_sweep(
    State(state): State<Arc<AppointmentState>>,
) -> Result<Json<Value>, AppError> {
    let ran_at = Utc::now();
    let modified = state.sweep.run_overdue_sweep(ran_at).await?;
    Ok(Json(json!(SweepReport { ran_at, modified })))
}
