#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

use appointment_cell::models::{Appointment, AppointmentStatus};
use appointment_cell::services::{AppointmentStore, InMemoryAppointmentStore};
use appointment_cell::AppointmentState;
use shared_utils::test_utils::TestConfig;

pub struct TestSetup {
    pub store: Arc<InMemoryAppointmentStore>,
    pub state: Arc<AppointmentState>,
}

impl TestSetup {
    pub fn new() -> Self {
        Self::with_config(TestConfig::in_memory())
    }

    pub fn with_config(config: TestConfig) -> Self {
        let store = Arc::new(InMemoryAppointmentStore::new());
        let state = Arc::new(AppointmentState::new(
            store.clone() as Arc<dyn AppointmentStore>,
            &config.to_app_config(),
        ));
        Self { store, state }
    }

    /// Inserts a record directly, bypassing the create validation.
    pub async fn seed(&self, client_name: &str, status: AppointmentStatus, scheduled_at: DateTime<Utc>) -> Uuid {
        let mut appointment = Appointment::create(client_name, "(11) 98765-4321", "clinico_geral", scheduled_at, fixed_created_at());
        appointment.status = status;
        self.store.insert(&appointment).await.expect("seed insert")
    }

    pub async fn stored(&self, id: Uuid) -> Appointment {
        self.store
            .find_by_id(id)
            .await
            .expect("lookup")
            .expect("appointment exists")
    }
}

pub fn fixed_created_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
}

pub fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}
