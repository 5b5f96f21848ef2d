// libs/appointment-cell/src/services/booking.rs
use std::sync::Arc;

use chrono::{FixedOffset, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::{
    parse_timestamp, require_non_empty, Appointment, AppointmentError, CreateAppointmentRequest,
};
use crate::services::lifecycle::{AppointmentLifecycleService, Transition};
use crate::services::store::{AppointmentPatch, AppointmentStore};

/// Request-driven operations: look up, run the state machine, persist.
pub struct AppointmentBookingService {
    store: Arc<dyn AppointmentStore>,
    lifecycle_service: AppointmentLifecycleService,
    clinic_timezone: FixedOffset,
}

impl AppointmentBookingService {
    pub fn new(store: Arc<dyn AppointmentStore>, clinic_timezone: FixedOffset) -> Self {
        Self {
            store,
            lifecycle_service: AppointmentLifecycleService::new(),
            clinic_timezone,
        }
    }

    pub async fn create_appointment(
        &self,
        request: CreateAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        debug!("Creating appointment for {}", request.client_name);

        let client_name = require_non_empty(&request.client_name, "client_name")?;
        let phone = require_non_empty(&request.phone, "phone")?;
        let consultation_type = require_non_empty(&request.consultation_type, "consultation_type")?;
        let scheduled_at = parse_timestamp(
            request.scheduled_at.as_deref(),
            "scheduled_at",
            &self.clinic_timezone,
        )?;

        let mut appointment = Appointment::create(
            client_name,
            phone,
            consultation_type,
            scheduled_at,
            Utc::now(),
        )
        .with_document(request.client_document.map(|d| d.trim().to_string()));

        let id = self.store.insert(&appointment).await?;
        appointment.id = Some(id);

        info!("Appointment {} created for {}", id, appointment.scheduled_at);
        Ok(appointment)
    }

    /// Returns the stored record with read-time reconciliation applied.
    pub async fn get_appointment(&self, appointment_id: Uuid) -> Result<Appointment, AppointmentError> {
        let mut appointment = self
            .store
            .find_by_id(appointment_id)
            .await?
            .ok_or(AppointmentError::NotFound)?;

        self.lifecycle_service.reconcile(&mut appointment, Utc::now());
        Ok(appointment)
    }

    pub async fn cancel_appointment(&self, appointment_id: Uuid) -> Result<Appointment, AppointmentError> {
        self.transition(appointment_id, Transition::Cancel).await
    }

    pub async fn complete_appointment(&self, appointment_id: Uuid) -> Result<Appointment, AppointmentError> {
        self.transition(appointment_id, Transition::Complete).await
    }

    /// `new_time` is validated before the record is even read.
    pub async fn postpone_appointment(
        &self,
        appointment_id: Uuid,
        new_time: Option<&str>,
    ) -> Result<Appointment, AppointmentError> {
        let new_time = parse_timestamp(new_time, "new_time", &self.clinic_timezone)?;
        self.transition(appointment_id, Transition::Postpone { new_time }).await
    }

    async fn transition(
        &self,
        appointment_id: Uuid,
        transition: Transition,
    ) -> Result<Appointment, AppointmentError> {
        debug!("Applying {} to appointment {}", transition.operation(), appointment_id);

        let current = self
            .store
            .find_by_id(appointment_id)
            .await?
            .ok_or(AppointmentError::NotFound)?;

        let mut updated = current.clone();
        self.lifecycle_service.apply(&mut updated, transition)?;

        let patch = AppointmentPatch::transition(&current, &updated);
        let modified = self.store.update_one(appointment_id, &patch).await?;

        if modified == 0 {
            warn!(
                "Appointment {} left {} before {} could be written",
                appointment_id, current.status, transition.operation()
            );
            return Err(AppointmentError::StaleState);
        }

        info!(
            "Appointment {} moved {} -> {}",
            appointment_id, current.status, updated.status
        );
        Ok(updated)
    }
}
