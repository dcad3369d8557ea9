//! Retention of day partitions.
//!
//! Partitions older than the configured number of days are deleted in full.
//! The scheduler runs a sweep when it starts and on the first tick of every
//! new local day.

use chrono::NaiveDate;
use chrono_tz::Tz;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::clock;
use crate::database::{RecordStore, StoreError, SweepReport};

/// Retention policy for day partitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    /// Days of history to keep before today
    pub retention_days: u32,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self { retention_days: 30 }
    }
}

impl RetentionPolicy {
    pub fn new(retention_days: u32) -> Self {
        Self { retention_days }
    }
}

/// Cleanup manager for expired partitions
#[derive(Clone)]
pub struct RetentionCleanup {
    store: Arc<dyn RecordStore>,
    policy: RetentionPolicy,
    timezone: Tz,
}

impl RetentionCleanup {
    /// Create a new retention cleanup manager
    pub fn new(store: Arc<dyn RecordStore>, policy: RetentionPolicy, timezone: Tz) -> Self {
        Self { store, policy, timezone }
    }

    pub fn policy(&self) -> RetentionPolicy {
        self.policy
    }

    /// Sweep relative to the current local date
    pub async fn cleanup_expired(&self) -> Result<SweepReport, StoreError> {
        self.cleanup_expired_at(clock::today_in(self.timezone)).await
    }

    /// Sweep relative to an explicit `today`
    pub async fn cleanup_expired_at(&self, today: NaiveDate) -> Result<SweepReport, StoreError> {
        debug!(%today, days = self.policy.retention_days, "Starting retention cleanup");

        let report = self.store.sweep(today, self.policy.retention_days).await?;

        if !report.failed.is_empty() {
            warn!("Retention cleanup could not remove {} partition(s)", report.failed.len());
        }
        info!("Retention cleanup completed: {} partition(s) deleted", report.removed.len());

        Ok(report)
    }
}
