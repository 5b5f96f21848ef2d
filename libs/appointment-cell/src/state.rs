// libs/appointment-cell/src/state.rs
use std::sync::Arc;

use tracing::{info, warn};

use shared_config::{bound_window_days, AppConfig};

use crate::services::{
    AppointmentBookingService, AppointmentSearchService, AppointmentStore,
    InMemoryAppointmentStore, OverdueSweepService, ScheduleViewService, SupabaseAppointmentStore,
};

/// Everything the HTTP layer needs, wired around one injected store.
pub struct AppointmentState {
    pub booking: AppointmentBookingService,
    pub sweep: Arc<OverdueSweepService>,
    pub schedule: ScheduleViewService,
    pub search: AppointmentSearchService,
    pub default_window_days: u32,
}

impl AppointmentState {
    pub fn new(store: Arc<dyn AppointmentStore>, config: &AppConfig) -> Self {
        let clinic_timezone = config.clinic_timezone();
        let sweep = Arc::new(OverdueSweepService::new(Arc::clone(&store)));

        Self {
            booking: AppointmentBookingService::new(Arc::clone(&store), clinic_timezone),
            schedule: ScheduleViewService::new(Arc::clone(&store), Arc::clone(&sweep), clinic_timezone),
            search: AppointmentSearchService::new(store),
            sweep,
            default_window_days: bound_window_days(config.schedule_window_days),
        }
    }

    /// Supabase when configured, otherwise a process-local store.
    pub fn from_config(config: &AppConfig) -> Self {
        let store: Arc<dyn AppointmentStore> = if config.is_configured() {
            info!("Using Supabase appointment store at {}", config.supabase_url);
            Arc::new(SupabaseAppointmentStore::new(config))
        } else {
            warn!("Using in-memory appointment store; data is lost on restart");
            Arc::new(InMemoryAppointmentStore::new())
        };

        Self::new(store, config)
    }
}
