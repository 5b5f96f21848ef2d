// libs/appointment-cell/src/router.rs
use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post, patch},
};

use crate::handlers;
use crate::state::AppointmentState;

pub fn appointment_routes(state: Arc<AppointmentState>) -> Router {
    Router::new()
        .route("/", post(handlers::create_appointment).get(handlers::search_appointments))
        .route("/week", get(handlers::get_weekly_view))
        .route("/sweep", post(handlers::run_overdue_sweep))
        .route("/{appointment_id}", get(handlers::get_appointment))
        .route("/{appointment_id}/cancel", post(handlers::cancel_appointment))
        .route("/{appointment_id}/postpone", patch(handlers::postpone_appointment))
        .route("/{appointment_id}/complete", post(handlers::complete_appointment))
        .with_state(state)
}
