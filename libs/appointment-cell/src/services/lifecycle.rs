// libs/appointment-cell/src/services/lifecycle.rs
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::models::{Appointment, AppointmentError, AppointmentOperation, AppointmentStatus};

/// Statuses the clock is allowed to turn into `overdue`.
pub const OVERDUE_CANDIDATES: [AppointmentStatus; 2] =
    [AppointmentStatus::Scheduled, AppointmentStatus::Postponed];

/// A user-triggered change, carrying whatever data the target state needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Cancel,
    Postpone { new_time: DateTime<Utc> },
    Complete,
}

impl Transition {
    pub fn operation(&self) -> AppointmentOperation {
        match self {
            Transition::Cancel => AppointmentOperation::Cancel,
            Transition::Postpone { .. } => AppointmentOperation::Postpone,
            Transition::Complete => AppointmentOperation::Complete,
        }
    }

    pub fn target_status(&self) -> AppointmentStatus {
        match self {
            Transition::Cancel => AppointmentStatus::Cancelled,
            Transition::Postpone { .. } => AppointmentStatus::Postponed,
            Transition::Complete => AppointmentStatus::Completed,
        }
    }
}

/// Pure transition rules. Knows nothing about storage.
#[derive(Debug, Clone, Copy, Default)]
pub struct AppointmentLifecycleService;

impl AppointmentLifecycleService {
    pub fn new() -> Self {
        Self
    }

    /// Operations allowed from `current_status`. Terminal states allow none.
    pub fn get_valid_operations(&self, current_status: &AppointmentStatus) -> Vec<AppointmentOperation> {
        match current_status {
            AppointmentStatus::Scheduled
            | AppointmentStatus::Postponed
            | AppointmentStatus::Overdue => vec![
                AppointmentOperation::Cancel,
                AppointmentOperation::Postpone,
                AppointmentOperation::Complete,
            ],
            AppointmentStatus::Completed | AppointmentStatus::Cancelled => vec![],
        }
    }

    pub fn validate_transition(
        &self,
        current_status: &AppointmentStatus,
        operation: AppointmentOperation,
    ) -> Result<(), AppointmentError> {
        debug!("Validating {} from {}", operation, current_status);

        if !self.get_valid_operations(current_status).contains(&operation) {
            warn!("Invalid status transition attempted: {} on {}", operation, current_status);
            return Err(AppointmentError::InvalidTransition {
                from: *current_status,
                operation,
            });
        }

        Ok(())
    }

    /// Applies `transition` in place. On error the appointment is untouched.
    pub fn apply(
        &self,
        appointment: &mut Appointment,
        transition: Transition,
    ) -> Result<(), AppointmentError> {
        self.validate_transition(&appointment.status, transition.operation())?;

        if let Transition::Postpone { new_time } = transition {
            appointment.scheduled_at = new_time;
        }
        appointment.status = transition.target_status();

        Ok(())
    }

    /// The one place that derives `overdue` from the clock.
    pub fn reconcile_status(
        &self,
        status: AppointmentStatus,
        scheduled_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> AppointmentStatus {
        if OVERDUE_CANDIDATES.contains(&status) && scheduled_at < now {
            AppointmentStatus::Overdue
        } else {
            status
        }
    }

    /// Read-time reconciliation for a transient copy. Returns whether it changed.
    pub fn reconcile(&self, appointment: &mut Appointment, now: DateTime<Utc>) -> bool {
        let reconciled = self.reconcile_status(appointment.status, appointment.scheduled_at, now);
        let changed = reconciled != appointment.status;
        appointment.status = reconciled;
        changed
    }
}
