// libs/appointment-cell/src/services/store.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::models::{Appointment, AppointmentError, AppointmentStatus};

/// Selection criteria understood by every store. Results are always ordered by
/// scheduled time ascending, ties kept in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppointmentFilter {
    pub statuses: Option<Vec<AppointmentStatus>>,
    /// Strictly before.
    pub scheduled_before: Option<DateTime<Utc>>,
    /// Inclusive lower bound.
    pub scheduled_from: Option<DateTime<Utc>>,
    /// Exclusive upper bound.
    pub scheduled_until: Option<DateTime<Utc>>,
}

impl AppointmentFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_statuses(mut self, statuses: impl IntoIterator<Item = AppointmentStatus>) -> Self {
        self.statuses = Some(statuses.into_iter().collect());
        self
    }

    pub fn scheduled_before(mut self, instant: DateTime<Utc>) -> Self {
        self.scheduled_before = Some(instant);
        self
    }

    pub fn scheduled_between(mut self, from: DateTime<Utc>, until: DateTime<Utc>) -> Self {
        self.scheduled_from = Some(from);
        self.scheduled_until = Some(until);
        self
    }

    pub fn matches(&self, appointment: &Appointment) -> bool {
        if let Some(statuses) = &self.statuses {
            if !statuses.contains(&appointment.status) {
                return false;
            }
        }
        if let Some(before) = self.scheduled_before {
            if appointment.scheduled_at >= before {
                return false;
            }
        }
        if let Some(from) = self.scheduled_from {
            if appointment.scheduled_at < from {
                return false;
            }
        }
        if let Some(until) = self.scheduled_until {
            if appointment.scheduled_at >= until {
                return false;
            }
        }
        true
    }
}

/// Field changes for an update. `created_at` is never patched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppointmentPatch {
    pub status: Option<AppointmentStatus>,
    pub scheduled_at: Option<DateTime<Utc>>,
    /// Only apply if the stored status still equals this.
    pub expected_status: Option<AppointmentStatus>,
}

impl AppointmentPatch {
    pub fn status(status: AppointmentStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Captures the result of a state-machine step on `before` -> `after`.
    pub fn transition(before: &Appointment, after: &Appointment) -> Self {
        Self {
            status: Some(after.status),
            scheduled_at: (before.scheduled_at != after.scheduled_at).then_some(after.scheduled_at),
            expected_status: Some(before.status),
        }
    }

    pub fn guard_holds(&self, appointment: &Appointment) -> bool {
        self.expected_status
            .map_or(true, |expected| expected == appointment.status)
    }

    pub fn apply_to(&self, appointment: &mut Appointment) {
        if let Some(status) = self.status {
            appointment.status = status;
        }
        if let Some(scheduled_at) = self.scheduled_at {
            appointment.scheduled_at = scheduled_at;
        }
    }

    /// JSON body for a PATCH against the document store.
    pub fn to_json(&self) -> Value {
        let mut body = Map::new();
        if let Some(status) = self.status {
            body.insert("status".to_string(), json!(status.as_str()));
        }
        if let Some(scheduled_at) = self.scheduled_at {
            body.insert("scheduled_at".to_string(), json!(scheduled_at.to_rfc3339()));
        }
        Value::Object(body)
    }
}

/// What the core needs from persistence. Implementations own their own
/// timeout and retry policy.
#[async_trait]
pub trait AppointmentStore: Send + Sync {
    async fn find(&self, filter: &AppointmentFilter) -> Result<Vec<Appointment>, AppointmentError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Appointment>, AppointmentError>;

    /// Persists a new record and returns the identity assigned to it.
    async fn insert(&self, appointment: &Appointment) -> Result<Uuid, AppointmentError>;

    /// `NotFound` if `id` is absent; `Ok(0)` if the patch guard did not hold.
    async fn update_one(&self, id: Uuid, patch: &AppointmentPatch) -> Result<u64, AppointmentError>;

    /// Applies `patch` to every record matching `filter`, atomically per record.
    async fn update_many(
        &self,
        filter: &AppointmentFilter,
        patch: &AppointmentPatch,
    ) -> Result<u64, AppointmentError>;
}
