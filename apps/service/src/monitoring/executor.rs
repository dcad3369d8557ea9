use chrono_tz::Tz;
use std::sync::Arc;
use tracing::debug;

use super::checker::{Checker, MockChecker, PingChecker};
use super::types::Measurement;
use crate::clock;
use crate::config::ProbeConfig;

/// Probe executor - turns one check into a [`Measurement`]
///
/// Every failure mode of the checker collapses into a failed measurement
/// here, nothing propagates to the scheduler.
#[derive(Clone)]
pub struct ProbeExecutor {
    checker: Arc<dyn Checker>,
    timezone: Tz,
}

impl ProbeExecutor {
    /// Create an executor from the probe configuration
    pub fn new(config: &ProbeConfig, timezone: Tz) -> Self {
        let checker: Arc<dyn Checker> = if config.mock {
            Arc::new(MockChecker::new(config.mock_failure_probability))
        } else {
            Arc::new(PingChecker::new(config.timeout_seconds))
        };

        Self::with_checker(checker, timezone)
    }

    /// Create an executor around an arbitrary checker
    pub fn with_checker(checker: Arc<dyn Checker>, timezone: Tz) -> Self {
        Self { checker, timezone }
    }

    /// Probe `target` once. Timestamped on completion.
    pub async fn probe(&self, target: &str) -> Measurement {
        let outcome = self.checker.check(target).await;
        let timestamp = clock::now_in(self.timezone);

        match outcome {
            Ok(latency_ms) if latency_ms.is_finite() && latency_ms > 0.0 => {
                Measurement::success(timestamp, latency_ms)
            }
            Ok(latency_ms) => {
                Measurement::failure(timestamp, format!("Invalid latency reported: {latency_ms}"))
            }
            Err(e) => {
                debug!(host = target, "Probe failed: {e:#}");
                Measurement::failure(timestamp, format!("{e:#}"))
            }
        }
    }
}
