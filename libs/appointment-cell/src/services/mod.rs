pub mod booking;
pub mod lifecycle;
pub mod memory;
pub mod schedule;
pub mod search;
pub mod store;
pub mod supabase_store;
pub mod sweep;

pub use booking::AppointmentBookingService;
pub use lifecycle::{AppointmentLifecycleService, Transition};
pub use memory::InMemoryAppointmentStore;
pub use schedule::ScheduleViewService;
pub use search::AppointmentSearchService;
pub use store::{AppointmentFilter, AppointmentPatch, AppointmentStore};
pub use supabase_store::SupabaseAppointmentStore;
pub use sweep::{OverdueSweepService, OverdueSweepWorker};
