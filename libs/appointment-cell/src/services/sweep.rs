// libs/appointment-cell/src/services/sweep.rs
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, error, info, instrument};

use crate::models::{AppointmentError, AppointmentStatus, SweepReport};
use crate::services::lifecycle::OVERDUE_CANDIDATES;
use crate::services::store::{AppointmentFilter, AppointmentPatch, AppointmentStore};

/// Moves every pending appointment whose time has passed to `overdue`.
pub struct OverdueSweepService {
    store: Arc<dyn AppointmentStore>,
}

impl OverdueSweepService {
    pub fn new(store: Arc<dyn AppointmentStore>) -> Self {
        Self { store }
    }

    pub fn overdue_filter(now: DateTime<Utc>) -> AppointmentFilter {
        AppointmentFilter::all()
            .with_statuses(OVERDUE_CANDIDATES)
            .scheduled_before(now)
    }

    /// One bulk update. Never touches scheduled time; idempotent for a fixed `now`.
    #[instrument(skip(self))]
    pub async fn run_overdue_sweep(&self, now: DateTime<Utc>) -> Result<u64, AppointmentError> {
        let filter = Self::overdue_filter(now);
        let patch = AppointmentPatch::status(AppointmentStatus::Overdue);

        match self.store.update_many(&filter, &patch).await {
            Ok(modified) => {
                if modified > 0 {
                    info!("Overdue sweep marked {} appointment(s) overdue", modified);
                } else {
                    debug!("Overdue sweep found nothing to update");
                }
                Ok(modified)
            }
            Err(e) => {
                error!("Overdue sweep failed: {}", e);
                Err(e)
            }
        }
    }
}

/// Periodic driver for `OverdueSweepService`.
pub struct OverdueSweepWorker {
    service: Arc<OverdueSweepService>,
    period: Duration,
    shutdown_tx: watch::Sender<bool>,
}

impl OverdueSweepWorker {
    pub fn new(service: Arc<OverdueSweepService>, period: Duration) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            service,
            period,
            shutdown_tx,
        }
    }

    /// Runs until `shutdown` is called. The first cycle runs immediately.
    pub async fn start(&self) {
        info!("Starting overdue sweep worker (every {}s)", self.period.as_secs());

        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            if *shutdown_rx.borrow() {
                break;
            }

            tokio::select! {
                _ = ticker.tick() => {
                    self.run_once().await;
                }
                _ = shutdown_rx.changed() => {
                    debug!("Overdue sweep worker received shutdown signal");
                }
            }
        }

        info!("Overdue sweep worker stopped");
    }

    /// A failed cycle is logged and skipped; the next tick retries.
    pub async fn run_once(&self) -> Option<SweepReport> {
        let ran_at = Utc::now();
        self.service
            .run_overdue_sweep(ran_at)
            .await
            .ok()
            .map(|modified| SweepReport { ran_at, modified })
    }

    pub fn shutdown(&self) {
        info!("Initiating shutdown for overdue sweep worker");
        self.shutdown_tx.send_replace(true);
    }
}
