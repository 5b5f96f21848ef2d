// libs/appointment-cell/src/models.rs
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use std::fmt;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

/// A consultation record. `id` stays `None` until the store assigns one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub client_name: String,
    pub phone: String,
    #[serde(default)]
    pub client_document: Option<String>,
    pub consultation_type: String,
    pub scheduled_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "status_or_default")]
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
}

impl Appointment {
    /// New appointments always start out `scheduled`.
    pub fn create(
        client_name: impl Into<String>,
        phone: impl Into<String>,
        consultation_type: impl Into<String>,
        scheduled_at: DateTime<Utc>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: None,
            client_name: client_name.into(),
            phone: phone.into(),
            client_document: None,
            consultation_type: consultation_type.into(),
            scheduled_at,
            status: AppointmentStatus::Scheduled,
            created_at,
        }
    }

    pub fn with_document(mut self, document: Option<String>) -> Self {
        self.client_document = document.filter(|d| !d.trim().is_empty());
        self
    }

    /// Calendar date of the scheduled time in the clinic's timezone.
    pub fn scheduled_date(&self, offset: &FixedOffset) -> NaiveDate {
        self.scheduled_at.with_timezone(offset).date_naive()
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    #[default]
    #[serde(alias = "waiting", alias = "marcado", alias = "aguardando")]
    Scheduled,

    #[serde(alias = "adiado")]
    Postponed,

    #[serde(alias = "atrasado")]
    Overdue,

    #[serde(alias = "finalizado")]
    Completed,

    #[serde(alias = "cancelado")]
    Cancelled,
}

impl AppointmentStatus {
    pub const ALL: [AppointmentStatus; 5] = [
        AppointmentStatus::Scheduled,
        AppointmentStatus::Postponed,
        AppointmentStatus::Overdue,
        AppointmentStatus::Completed,
        AppointmentStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "scheduled",
            AppointmentStatus::Postponed => "postponed",
            AppointmentStatus::Overdue => "overdue",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }

    /// Every label a stored row may carry for this status, canonical first.
    pub fn stored_labels(&self) -> &'static [&'static str] {
        match self {
            AppointmentStatus::Scheduled => &["scheduled", "waiting", "marcado", "aguardando"],
            AppointmentStatus::Postponed => &["postponed", "adiado"],
            AppointmentStatus::Overdue => &["overdue", "atrasado"],
            AppointmentStatus::Completed => &["completed", "finalizado"],
            AppointmentStatus::Cancelled => &["cancelled", "cancelado"],
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, AppointmentStatus::Completed | AppointmentStatus::Cancelled)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn status_or_default<'de, D>(deserializer: D) -> Result<AppointmentStatus, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<AppointmentStatus>::deserialize(deserializer)?.unwrap_or_default())
}

/// User-triggered operations the state machine knows about.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentOperation {
    Cancel,
    Postpone,
    Complete,
}

impl fmt::Display for AppointmentOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentOperation::Cancel => write!(f, "cancel"),
            AppointmentOperation::Postpone => write!(f, "postpone"),
            AppointmentOperation::Complete => write!(f, "complete"),
        }
    }
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

/// Missing text fields deserialize as empty strings so that they are reported
/// as validation errors rather than body rejections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateAppointmentRequest {
    #[serde(default)]
    pub client_name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub client_document: Option<String>,
    #[serde(default)]
    pub consultation_type: String,
    #[serde(default)]
    pub scheduled_at: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostponeAppointmentRequest {
    #[serde(default)]
    pub new_time: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppointmentSearchQuery {
    pub q: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WeeklyViewQuery {
    pub days: Option<u32>,
}

// ==============================================================================
// SCHEDULE VIEW MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DaySchedule {
    pub date: NaiveDate,
    pub is_today: bool,
    pub appointments: Vec<Appointment>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScheduleStats {
    /// Upcoming `scheduled` plus every `postponed`.
    pub scheduled: usize,
    pub overdue: usize,
    pub completed_this_week: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeeklyView {
    pub generated_at: DateTime<Utc>,
    pub today: NaiveDate,
    pub days: Vec<DaySchedule>,
    pub stats: ScheduleStats,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SweepReport {
    pub ran_at: DateTime<Utc>,
    pub modified: u64,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AppointmentError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Cannot {operation} an appointment that is {from}")]
    InvalidTransition {
        from: AppointmentStatus,
        operation: AppointmentOperation,
    },

    #[error("Appointment not found")]
    NotFound,

    #[error("Appointment changed while it was being updated; reload and retry")]
    StaleState,

    #[error("Persistence error: {0}")]
    Persistence(String),
}

impl From<AppointmentError> for shared_models::AppError {
    fn from(error: AppointmentError) -> Self {
        use shared_models::AppError;

        match error {
            AppointmentError::Validation(msg) => AppError::ValidationError(msg),
            AppointmentError::NotFound => AppError::NotFound(error.to_string()),
            AppointmentError::InvalidTransition { .. } | AppointmentError::StaleState => {
                AppError::Conflict(error.to_string())
            }
            AppointmentError::Persistence(msg) => AppError::Database(msg),
        }
    }
}

// ==============================================================================
// INPUT PARSING
// ==============================================================================

const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"];

/// Parses an RFC 3339 timestamp, or a naive local time read in `offset`.
pub fn parse_timestamp(
    raw: Option<&str>,
    field: &str,
    offset: &FixedOffset,
) -> Result<DateTime<Utc>, AppointmentError> {
    let raw = raw.map(str::trim).unwrap_or_default();
    if raw.is_empty() {
        return Err(AppointmentError::Validation(format!("{} is required", field)));
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .and_then(|naive| offset.from_local_datetime(&naive).single())
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| {
            AppointmentError::Validation(format!("{} is not a valid timestamp: '{}'", field, raw))
        })
}

pub fn require_non_empty(value: &str, field: &str) -> Result<String, AppointmentError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppointmentError::Validation(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}
