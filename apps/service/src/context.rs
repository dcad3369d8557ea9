use chrono_tz::Tz;
use std::sync::Arc;

use crate::clock;
use crate::config::Config;
use crate::database::{FileStore, RecordStore, StoreError};
use crate::monitoring::{ProbeExecutor, ProbeScheduler};
use crate::query::QueryService;
use crate::retention::{RetentionCleanup, RetentionPolicy};

/// Everything the process shares, built once at startup.
///
/// The scheduler and the query surface receive their collaborators from
/// here instead of reaching for globals.
#[derive(Clone)]
pub struct AppContext {
    config: Config,
    timezone: Tz,
    store: Arc<dyn RecordStore>,
    executor: ProbeExecutor,
}

impl AppContext {
    /// Resolve the timezone and open the store under `storage.data_dir`
    pub fn from_config(config: Config) -> Result<Self, StoreError> {
        let timezone = clock::resolve_timezone(&config.timezone);
        let store: Arc<dyn RecordStore> = Arc::new(FileStore::open(&config.storage.data_dir, timezone)?);
        Ok(Self::with_store(config, timezone, store))
    }

    /// Assemble a context around an already opened store
    pub fn with_store(config: Config, timezone: Tz, store: Arc<dyn RecordStore>) -> Self {
        let executor = ProbeExecutor::new(&config.probe, timezone);
        Self { config, timezone, store, executor }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn store(&self) -> Arc<dyn RecordStore> {
        Arc::clone(&self.store)
    }

    pub fn executor(&self) -> &ProbeExecutor {
        &self.executor
    }

    pub fn retention(&self) -> RetentionCleanup {
        RetentionCleanup::new(
            self.store(),
            RetentionPolicy::new(self.config.storage.retention_days),
            self.timezone,
        )
    }

    /// The single writer of the store
    pub fn scheduler(&self) -> Arc<ProbeScheduler> {
        Arc::new(ProbeScheduler::new(
            self.executor.clone(),
            self.store(),
            self.retention(),
            self.config.probe.target.clone(),
            self.timezone,
        ))
    }

    pub fn query(&self) -> QueryService {
        QueryService::new(self.store(), self.timezone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn config(data_dir: &std::path::Path, timezone: &str) -> Config {
        let mut config = Config::default();
        config.timezone = timezone.into();
        config.storage.data_dir = data_dir.to_path_buf();
        config.probe.mock = true;
        config
    }

    #[test]
    fn test_context_creates_data_dir() {
        let dir = tempdir().unwrap();
        let data_dir = dir.path().join("data");

        let context = AppContext::from_config(config(&data_dir, "Europe/Paris")).unwrap();
        assert!(data_dir.is_dir());
        assert_eq!(context.timezone(), Tz::Europe__Paris);
    }

    #[test]
    fn test_bad_timezone_falls_back_to_utc() {
        let dir = tempdir().unwrap();
        let context = AppContext::from_config(config(dir.path(), "Not/AZone")).unwrap();
        assert_eq!(context.timezone(), Tz::UTC);
    }

    #[tokio::test]
    async fn test_scheduler_writes_what_query_reads() {
        let dir = tempdir().unwrap();
        let context = AppContext::from_config(config(dir.path(), "UTC")).unwrap();

        let measurement = context.scheduler().tick().await.unwrap();
        let date = clock::local_date(&measurement.timestamp, context.timezone());

        assert_eq!(context.query().day(date).await, vec![measurement]);
        assert_eq!(context.retention().policy().retention_days, 30);
    }
}
