use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde_json::json;
use uuid::Uuid;

use shared_config::AppConfig;

pub struct TestConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_service_token: String,
    pub clinic_utc_offset: FixedOffset,
    pub schedule_window_days: u32,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
            supabase_service_token: "test-service-token".to_string(),
            clinic_utc_offset: Utc.fix(),
            schedule_window_days: 7,
        }
    }
}

impl TestConfig {
    /// Points the Supabase client at a mock server.
    pub fn with_supabase_url(url: &str) -> Self {
        Self {
            supabase_url: url.to_string(),
            ..Self::default()
        }
    }

    /// No Supabase settings, so cells fall back to in-memory storage.
    pub fn in_memory() -> Self {
        Self {
            supabase_url: String::new(),
            supabase_anon_key: String::new(),
            supabase_service_token: String::new(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            supabase_service_token: self.supabase_service_token.clone(),
            clinic_utc_offset: self.clinic_utc_offset,
            schedule_window_days: self.schedule_window_days,
            ..AppConfig::default()
        }
    }
}

pub struct MockSupabaseResponses;

impl MockSupabaseResponses {
    /// One row of the `appointments` table as PostgREST returns it.
    pub fn appointment_response(
        id: Uuid,
        client_name: &str,
        status: &str,
        scheduled_at: DateTime<Utc>,
    ) -> serde_json::Value {
        json!({
            "id": id,
            "client_name": client_name,
            "phone": "(11) 98765-4321",
            "client_document": null,
            "consultation_type": "clinico_geral",
            "scheduled_at": scheduled_at.to_rfc3339(),
            "status": status,
            "created_at": "2026-01-01T00:00:00Z"
        })
    }

    pub fn error_response(message: &str, code: &str) -> serde_json::Value {
        json!({
            "message": message,
            "code": code,
            "details": null,
            "hint": null
        })
    }
}
