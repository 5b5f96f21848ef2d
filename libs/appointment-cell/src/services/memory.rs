// libs/appointment-cell/src/services/memory.rs
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::models::{Appointment, AppointmentError};
use crate::services::store::{AppointmentFilter, AppointmentPatch, AppointmentStore};

/// Process-local store. Vector order is insertion order, which is what breaks
/// ties between appointments booked for the same instant.
#[derive(Debug, Default)]
pub struct InMemoryAppointmentStore {
    documents: RwLock<Vec<Appointment>>,
    failing_writes: AtomicU32,
}

impl InMemoryAppointmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `count` write calls fail with a persistence error.
    pub fn fail_next_writes(&self, count: u32) {
        self.failing_writes.store(count, Ordering::SeqCst);
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }

    fn check_write_fault(&self) -> Result<(), AppointmentError> {
        let tripped = self
            .failing_writes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();

        if tripped {
            return Err(AppointmentError::Persistence("simulated write failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl AppointmentStore for InMemoryAppointmentStore {
    async fn find(&self, filter: &AppointmentFilter) -> Result<Vec<Appointment>, AppointmentError> {
        let documents = self.documents.read().await;
        let mut matched: Vec<Appointment> = documents
            .iter()
            .filter(|appointment| filter.matches(appointment))
            .cloned()
            .collect();

        // stable: equal times keep insertion order
        matched.sort_by_key(|appointment| appointment.scheduled_at);
        Ok(matched)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Appointment>, AppointmentError> {
        let documents = self.documents.read().await;
        Ok(documents.iter().find(|appointment| appointment.id == Some(id)).cloned())
    }

    async fn insert(&self, appointment: &Appointment) -> Result<Uuid, AppointmentError> {
        self.check_write_fault()?;

        let id = Uuid::new_v4();
        let mut stored = appointment.clone();
        stored.id = Some(id);

        self.documents.write().await.push(stored);
        debug!("Stored appointment {} in memory", id);
        Ok(id)
    }

    async fn update_one(&self, id: Uuid, patch: &AppointmentPatch) -> Result<u64, AppointmentError> {
        self.check_write_fault()?;

        let mut documents = self.documents.write().await;
        let appointment = documents
            .iter_mut()
            .find(|appointment| appointment.id == Some(id))
            .ok_or(AppointmentError::NotFound)?;

        if !patch.guard_holds(appointment) {
            return Ok(0);
        }

        patch.apply_to(appointment);
        Ok(1)
    }

    async fn update_many(
        &self,
        filter: &AppointmentFilter,
        patch: &AppointmentPatch,
    ) -> Result<u64, AppointmentError> {
        self.check_write_fault()?;

        let mut documents = self.documents.write().await;
        let mut modified = 0;
        for appointment in documents.iter_mut() {
            if filter.matches(appointment) && patch.guard_holds(appointment) {
                patch.apply_to(appointment);
                modified += 1;
            }
        }
        Ok(modified)
    }
}
