use chrono::NaiveDate;
use chrono_tz::Tz;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{error, info, warn};

use super::executor::ProbeExecutor;
use super::types::Measurement;
use crate::clock;
use crate::config::PROBE_INTERVAL;
use crate::database::{RecordStore, StoreError};
use crate::retention::RetentionCleanup;

/// Probe scheduler - the single writer of the record store.
///
/// One loop, one tick at a time: the probe and its append finish before the
/// next tick is taken, and missed ticks are skipped rather than replayed.
pub struct ProbeScheduler {
    executor: ProbeExecutor,
    store: Arc<dyn RecordStore>,
    cleanup: RetentionCleanup,
    target: String,
    timezone: Tz,
    period: Duration,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl ProbeScheduler {
    /// Create a new scheduler probing `target` every [`PROBE_INTERVAL`]
    pub fn new(
        executor: ProbeExecutor,
        store: Arc<dyn RecordStore>,
        cleanup: RetentionCleanup,
        target: impl Into<String>,
        timezone: Tz,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Self {
            executor,
            store,
            cleanup,
            target: target.into(),
            timezone,
            period: PROBE_INTERVAL,
            shutdown_tx,
            shutdown_rx,
        }
    }

    /// Override the tick period
    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Spawn the loop on the current runtime
    pub fn spawn(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(self.start())
    }

    /// Run until [`shutdown`](Self::shutdown) is called.
    ///
    /// The first tick fires immediately.
    pub async fn start(self: Arc<Self>) {
        let mut timer = interval(self.period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut shutdown_rx = self.shutdown_rx.clone();
        let mut last_sweep: Option<NaiveDate> = None;

        info!(host = %self.target, "Starting probe scheduler with interval: {:?}", self.period);

        loop {
            if *shutdown_rx.borrow() {
                break;
            }

            tokio::select! {
                _ = timer.tick() => {
                    if let Err(e) = self.tick().await {
                        error!("Failed to store measurement, tick lost: {e}");
                    }
                    self.sweep_if_new_day(&mut last_sweep).await;
                }
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Probe scheduler shutting down");
    }

    /// Stop the loop after the tick in flight, if any
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Probe once and append the result
    pub async fn tick(&self) -> Result<Measurement, StoreError> {
        let measurement = self.executor.probe(&self.target).await;
        info!("Ping {}: {}", self.target, measurement.status_line());

        self.store.append(&measurement).await?;
        Ok(measurement)
    }

    async fn sweep_if_new_day(&self, last_sweep: &mut Option<NaiveDate>) {
        let today = clock::today_in(self.timezone);
        if *last_sweep == Some(today) {
            return;
        }

        match self.cleanup.cleanup_expired_at(today).await {
            Ok(_) => *last_sweep = Some(today),
            Err(e) => warn!("Retention cleanup failed: {e}"),
        }
    }
}
