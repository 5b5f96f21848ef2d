// libs/appointment-cell/src/services/search.rs
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::models::{Appointment, AppointmentError};
use crate::services::lifecycle::AppointmentLifecycleService;
use crate::services::store::{AppointmentFilter, AppointmentStore};

pub struct AppointmentSearchService {
    store: Arc<dyn AppointmentStore>,
    lifecycle_service: AppointmentLifecycleService,
}

impl AppointmentSearchService {
    pub fn new(store: Arc<dyn AppointmentStore>) -> Self {
        Self {
            store,
            lifecycle_service: AppointmentLifecycleService::new(),
        }
    }

    /// Time-ordered appointments matching `query`; everything when it is blank.
    pub async fn search(
        &self,
        query: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let needle = normalize_query(query);
        debug!("Searching appointments for {:?}", needle);

        let mut appointments = self.store.find(&AppointmentFilter::all()).await?;
        for appointment in appointments.iter_mut() {
            self.lifecycle_service.reconcile(appointment, now);
        }

        Ok(match needle {
            Some(needle) => appointments
                .into_iter()
                .filter(|appointment| matches_query(appointment, &needle))
                .collect(),
            None => appointments,
        })
    }
}

/// Lowercased query, or `None` when it is blank. Surrounding spaces are part
/// of the needle.
pub fn normalize_query(query: Option<&str>) -> Option<String> {
    query
        .filter(|q| !q.trim().is_empty())
        .map(str::to_lowercase)
}

/// Unanchored, case-insensitive match over name, document, phone and type.
/// `needle` must already be lowercased.
pub fn matches_query(appointment: &Appointment, needle: &str) -> bool {
    [
        Some(appointment.client_name.as_str()),
        appointment.client_document.as_deref(),
        Some(appointment.phone.as_str()),
        Some(appointment.consultation_type.as_str()),
    ]
    .into_iter()
    .flatten()
    .any(|field| field.to_lowercase().contains(needle))
}
