//! Read-only view of the record store for the dashboard layer.

use chrono::NaiveDate;
use chrono_tz::Tz;
use std::sync::Arc;
use tracing::error;

use crate::clock;
use crate::database::RecordStore;
use crate::monitoring::Measurement;
use crate::stats::{Stats, aggregate};

/// Query surface over the record store.
///
/// Never fails: a missing or unreadable partition is reported as an empty
/// day so the dashboard degrades instead of erroring out.
#[derive(Clone)]
pub struct QueryService {
    store: Arc<dyn RecordStore>,
    timezone: Tz,
}

impl QueryService {
    pub fn new(store: Arc<dyn RecordStore>, timezone: Tz) -> Self {
        Self { store, timezone }
    }

    /// Current calendar date in the configured timezone
    pub fn current_date(&self) -> NaiveDate {
        clock::today_in(self.timezone)
    }

    /// Today's measurements
    pub async fn today(&self) -> Vec<Measurement> {
        self.day(self.current_date()).await
    }

    /// Statistics over today's measurements
    pub async fn today_stats(&self) -> Stats {
        aggregate(&self.today().await)
    }

    /// Measurements of an arbitrary day
    pub async fn day(&self, date: NaiveDate) -> Vec<Measurement> {
        match self.store.read(date).await {
            Ok(records) => records,
            Err(e) => {
                error!(%date, "Failed to read partition, serving empty day: {e}");
                Vec::new()
            }
        }
    }

    /// Statistics over an arbitrary day
    pub async fn day_stats(&self, date: NaiveDate) -> Stats {
        aggregate(&self.day(date).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::FileStore;
    use tempfile::tempdir;

    fn service(root: &std::path::Path) -> (QueryService, Arc<FileStore>) {
        let store = Arc::new(FileStore::open(root, Tz::UTC).unwrap());
        (QueryService::new(store.clone(), Tz::UTC), store)
    }

    #[tokio::test]
    async fn test_empty_store_gives_empty_day_and_zero_stats() {
        let dir = tempdir().unwrap();
        let (query, _) = service(dir.path());

        assert!(query.today().await.is_empty());
        assert_eq!(query.today_stats().await, Stats::default());
    }

    #[tokio::test]
    async fn test_today_reads_current_partition() {
        let dir = tempdir().unwrap();
        let (query, store) = service(dir.path());

        let m = Measurement::success(clock::now_in(Tz::UTC), 12.0);
        store.append(&m).await.unwrap();

        let today = query.today().await;
        let stats = query.today_stats().await;
        // The append may land just before midnight and the read just after
        if query.current_date() == clock::local_date(&m.timestamp, Tz::UTC) {
            assert_eq!(today, vec![m]);
            assert_eq!(stats.total, 1);
            assert_eq!(stats.avg_response_time, Some(12.0));
        }
    }

    #[tokio::test]
    async fn test_corrupt_partition_degrades_to_empty() {
        let dir = tempdir().unwrap();
        let (query, store) = service(dir.path());
        let date = query.current_date();
        std::fs::write(store.partition_path(date), b"{{{").unwrap();

        assert!(query.day(date).await.is_empty());
        assert_eq!(query.day_stats(date).await.total, 0);
    }
}
