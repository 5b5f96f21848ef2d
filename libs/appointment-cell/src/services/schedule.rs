// libs/appointment-cell/src/services/schedule.rs
use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, Utc};
use tracing::{debug, warn};

use shared_config::{MAX_SCHEDULE_WINDOW_DAYS as MAX_WINDOW_DAYS, MIN_SCHEDULE_WINDOW_DAYS as MIN_WINDOW_DAYS};

use crate::models::{
    Appointment, AppointmentError, AppointmentStatus, DaySchedule, ScheduleStats, WeeklyView,
};
use crate::services::lifecycle::AppointmentLifecycleService;
use crate::services::store::{AppointmentFilter, AppointmentStore};
use crate::services::sweep::OverdueSweepService;

/// Builds the forward-looking day window shown on the dashboard.
pub struct ScheduleViewService {
    store: Arc<dyn AppointmentStore>,
    sweep: Arc<OverdueSweepService>,
    lifecycle_service: AppointmentLifecycleService,
    clinic_timezone: FixedOffset,
}

impl ScheduleViewService {
    pub fn new(
        store: Arc<dyn AppointmentStore>,
        sweep: Arc<OverdueSweepService>,
        clinic_timezone: FixedOffset,
    ) -> Self {
        Self {
            store,
            sweep,
            lifecycle_service: AppointmentLifecycleService::new(),
            clinic_timezone,
        }
    }

    pub async fn build_weekly_view(
        &self,
        now: DateTime<Utc>,
        window_days: u32,
    ) -> Result<WeeklyView, AppointmentError> {
        if !(MIN_WINDOW_DAYS..=MAX_WINDOW_DAYS).contains(&window_days) {
            return Err(AppointmentError::Validation(format!(
                "days must be between {} and {}",
                MIN_WINDOW_DAYS, MAX_WINDOW_DAYS
            )));
        }

        // Stats must not be staler than this request. If the write fails we
        // still serve, reconciling the copies we read instead.
        if let Err(e) = self.sweep.run_overdue_sweep(now).await {
            warn!("Serving schedule with read-time reconciliation only: {}", e);
        }

        let mut appointments = self.store.find(&AppointmentFilter::all()).await?;
        for appointment in appointments.iter_mut() {
            self.lifecycle_service.reconcile(appointment, now);
        }

        let today = now.with_timezone(&self.clinic_timezone).date_naive();
        debug!("Building {}-day schedule from {}", window_days, today);

        Ok(WeeklyView {
            generated_at: now,
            today,
            days: group_by_day(&appointments, today, window_days, &self.clinic_timezone),
            stats: compute_stats(&appointments, now, &self.clinic_timezone),
        })
    }
}

/// One group per day in `[today, today + window_days)`, each ordered by time.
pub fn group_by_day(
    appointments: &[Appointment],
    today: NaiveDate,
    window_days: u32,
    clinic_timezone: &FixedOffset,
) -> Vec<DaySchedule> {
    (0..window_days)
        .map(|offset| {
            let date = today + Duration::days(i64::from(offset));

            let mut day: Vec<Appointment> = appointments
                .iter()
                .filter(|appointment| appointment.scheduled_date(clinic_timezone) == date)
                .cloned()
                .collect();
            day.sort_by_key(|appointment| appointment.scheduled_at);

            DaySchedule {
                date,
                is_today: date == today,
                appointments: day,
            }
        })
        .collect()
}

pub fn start_of_week(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// Read-only counters over an already reconciled set.
pub fn compute_stats(
    appointments: &[Appointment],
    now: DateTime<Utc>,
    clinic_timezone: &FixedOffset,
) -> ScheduleStats {
    let monday = start_of_week(now.with_timezone(clinic_timezone).date_naive());

    appointments
        .iter()
        .fold(ScheduleStats::default(), |mut stats, appointment| {
            match appointment.status {
                AppointmentStatus::Scheduled if appointment.scheduled_at >= now => stats.scheduled += 1,
                AppointmentStatus::Postponed => stats.scheduled += 1,
                AppointmentStatus::Overdue => stats.overdue += 1,
                AppointmentStatus::Completed
                    if appointment.scheduled_date(clinic_timezone) >= monday =>
                {
                    stats.completed_this_week += 1
                }
                _ => {}
            }
            stats
        })
}
