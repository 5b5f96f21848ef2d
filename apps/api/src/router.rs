use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use appointment_cell::{AppointmentState, appointment_routes};

pub fn create_router(state: Arc<AppointmentState>) -> Router {
    Router::new()
        .route("/", get(|| async { "Clinic queue API is running!" }))
        .nest("/appointments", appointment_routes(state))
}
