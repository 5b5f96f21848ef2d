// libs/appointment-cell/src/services/supabase_store.rs
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Method;
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::Value;
use tracing::{debug, error};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{Appointment, AppointmentError, AppointmentStatus};
use crate::services::store::{AppointmentFilter, AppointmentPatch, AppointmentStore};

const TABLE_PATH: &str = "/rest/v1/appointments";

/// `AppointmentStore` backed by the `appointments` table through PostgREST.
pub struct SupabaseAppointmentStore {
    supabase: Arc<SupabaseClient>,
    auth_token: String,
}

impl SupabaseAppointmentStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
            auth_token: config.store_token().to_string(),
        }
    }

    fn representation_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));
        headers
    }

    async fn patch_rows(&self, query: &str, patch: &AppointmentPatch) -> Result<Vec<Value>, AppointmentError> {
        let path = format!("{}?{}", TABLE_PATH, query);

        self.supabase.request_with_headers(
            Method::PATCH,
            &path,
            Some(&self.auth_token),
            Some(patch.to_json()),
            Some(Self::representation_headers()),
        ).await.map_err(|e| {
            error!("Appointment update failed: {}", e);
            AppointmentError::Persistence(e.to_string())
        })
    }
}

fn encode_instant(instant: DateTime<Utc>) -> String {
    urlencoding::encode(&instant.to_rfc3339_opts(SecondsFormat::Micros, true)).into_owned()
}

/// PostgREST `in.(...)` list covering canonical and legacy labels.
fn status_in_clause(statuses: &[AppointmentStatus]) -> String {
    let labels: Vec<&str> = statuses
        .iter()
        .flat_map(|status| status.stored_labels().iter().copied())
        .collect();
    format!("status=in.({})", labels.join(","))
}

/// Renders filter criteria as PostgREST query parameters.
pub fn filter_query(filter: &AppointmentFilter) -> Vec<String> {
    let mut query_parts = Vec::new();

    if let Some(statuses) = &filter.statuses {
        query_parts.push(status_in_clause(statuses));
    }
    if let Some(before) = filter.scheduled_before {
        query_parts.push(format!("scheduled_at=lt.{}", encode_instant(before)));
    }
    if let Some(from) = filter.scheduled_from {
        query_parts.push(format!("scheduled_at=gte.{}", encode_instant(from)));
    }
    if let Some(until) = filter.scheduled_until {
        query_parts.push(format!("scheduled_at=lt.{}", encode_instant(until)));
    }

    query_parts
}

fn parse_rows(rows: Vec<Value>) -> Result<Vec<Appointment>, AppointmentError> {
    rows.into_iter()
        .map(serde_json::from_value)
        .collect::<Result<Vec<Appointment>, _>>()
        .map_err(|e| AppointmentError::Persistence(format!("Failed to parse appointments: {}", e)))
}

#[async_trait]
impl AppointmentStore for SupabaseAppointmentStore {
    async fn find(&self, filter: &AppointmentFilter) -> Result<Vec<Appointment>, AppointmentError> {
        let mut query_parts = vec!["select=*".to_string()];
        query_parts.extend(filter_query(filter));
        query_parts.push("order=scheduled_at.asc,created_at.asc".to_string());

        let path = format!("{}?{}", TABLE_PATH, query_parts.join("&"));
        debug!("Fetching appointments: {}", path);

        let rows: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(&self.auth_token),
            None,
        ).await.map_err(|e| AppointmentError::Persistence(e.to_string()))?;

        parse_rows(rows)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Appointment>, AppointmentError> {
        let path = format!("{}?id=eq.{}", TABLE_PATH, id);

        let rows: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(&self.auth_token),
            None,
        ).await.map_err(|e| AppointmentError::Persistence(e.to_string()))?;

        Ok(parse_rows(rows)?.into_iter().next())
    }

    async fn insert(&self, appointment: &Appointment) -> Result<Uuid, AppointmentError> {
        let mut body = serde_json::to_value(appointment)
            .map_err(|e| AppointmentError::Persistence(e.to_string()))?;
        if let Some(object) = body.as_object_mut() {
            object.remove("id");
        }

        let rows: Vec<Value> = self.supabase.request_with_headers(
            Method::POST,
            TABLE_PATH,
            Some(&self.auth_token),
            Some(body),
            Some(Self::representation_headers()),
        ).await.map_err(|e| AppointmentError::Persistence(e.to_string()))?;

        parse_rows(rows)?
            .into_iter()
            .next()
            .and_then(|created| created.id)
            .ok_or_else(|| AppointmentError::Persistence("Insert returned no identity".to_string()))
    }

    async fn update_one(&self, id: Uuid, patch: &AppointmentPatch) -> Result<u64, AppointmentError> {
        let mut query = format!("id=eq.{}", id);
        if let Some(expected) = patch.expected_status {
            query.push('&');
            query.push_str(&status_in_clause(&[expected]));
        }

        let rows = self.patch_rows(&query, patch).await?;
        if !rows.is_empty() {
            return Ok(rows.len() as u64);
        }

        // nothing matched: either the id is unknown or the guard failed
        match self.find_by_id(id).await? {
            Some(_) => Ok(0),
            None => Err(AppointmentError::NotFound),
        }
    }

    async fn update_many(
        &self,
        filter: &AppointmentFilter,
        patch: &AppointmentPatch,
    ) -> Result<u64, AppointmentError> {
        let mut query_parts = filter_query(filter);
        if let Some(expected) = patch.expected_status {
            query_parts.push(status_in_clause(&[expected]));
        }

        let rows = self.patch_rows(&query_parts.join("&"), patch).await?;
        Ok(rows.len() as u64)
    }
}
