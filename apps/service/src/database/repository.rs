use async_trait::async_trait;
use chrono::{Days, NaiveDate, Utc};
use chrono_tz::Tz;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use super::error::StoreError;
use super::partition;
use crate::clock;
use crate::monitoring::types::Measurement;

/// Outcome of a retention sweep
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SweepReport {
    /// Partitions deleted by this run
    pub removed: Vec<NaiveDate>,
    /// Partitions that should have gone but could not be deleted
    pub failed: Vec<(NaiveDate, String)>,
}

/// Record store trait for abstracting partition storage
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Append to the partition of the measurement's local date
    async fn append(&self, measurement: &Measurement) -> Result<(), StoreError>;

    /// Measurements of `date` in append order, empty when there are none
    async fn read(&self, date: NaiveDate) -> Result<Vec<Measurement>, StoreError>;

    /// Dates that currently have a partition, oldest first
    async fn partitions(&self) -> Result<Vec<NaiveDate>, StoreError>;

    /// Delete every partition dated strictly before `today - retention_days`
    async fn sweep(&self, today: NaiveDate, retention_days: u32) -> Result<SweepReport, StoreError>;
}

/// One JSON file per day under a data directory.
///
/// Writes go to a sibling temp file which is then renamed over the
/// partition, so readers see the old or the new array and never a torn one.
/// Writers are serialized on `write_lock`, readers never take it.
pub struct FileStore {
    root: PathBuf,
    timezone: Tz,
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Open (and create if needed) a store rooted at `root`
    pub fn open(root: impl Into<PathBuf>, timezone: Tz) -> Result<Self, StoreError> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|e| StoreError::io(&root, e))?;
        Ok(Self { root, timezone, write_lock: Mutex::new(()) })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the partition file for `date`
    pub fn partition_path(&self, date: NaiveDate) -> PathBuf {
        self.root.join(partition::file_name(date))
    }

    async fn load(&self, path: &Path) -> Result<Vec<Measurement>, StoreError> {
        let raw = match fs::read(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io(path, e)),
        };

        serde_json::from_slice(&raw)
            .map_err(|source| StoreError::Corrupt { path: path.to_path_buf(), source })
    }

    /// Move an unreadable partition out of the way so the day can continue.
    ///
    /// Each quarantine gets its own `<name>.corrupt-<utc stamp>` file.
    async fn quarantine(&self, path: &Path) -> Result<(), StoreError> {
        let mut target = path.as_os_str().to_owned();
        target.push(format!(".corrupt-{}", Utc::now().format("%Y%m%dT%H%M%S%.9f")));
        let target = PathBuf::from(target);

        fs::rename(path, &target).await.map_err(|e| StoreError::io(path, e))?;
        warn!(path = %target.display(), "Moved corrupt partition aside");
        Ok(())
    }

    async fn write_atomic(&self, path: &Path, data: &[u8]) -> Result<(), StoreError> {
        let mut temp = path.as_os_str().to_owned();
        temp.push(".tmp");
        let temp = PathBuf::from(temp);

        let result = async {
            let mut file = fs::File::create(&temp).await?;
            file.write_all(data).await?;
            file.sync_all().await?;
            fs::rename(&temp, path).await?;
            Ok::<_, std::io::Error>(())
        }
        .await;

        if let Err(e) = result {
            let _ = fs::remove_file(&temp).await;
            return Err(StoreError::io(path, e));
        }

        // The rename is only durable once the directory entry is flushed
        if let Some(parent) = path.parent() {
            if let Err(e) = sync_dir(parent).await {
                warn!(path = %parent.display(), "Failed to sync data directory: {e}");
            }
        }

        Ok(())
    }
}

async fn sync_dir(dir: &Path) -> std::io::Result<()> {
    fs::File::open(dir).await?.sync_all().await
}

#[async_trait]
impl RecordStore for FileStore {
    async fn append(&self, measurement: &Measurement) -> Result<(), StoreError> {
        let date = clock::local_date(&measurement.timestamp, self.timezone);
        let path = self.partition_path(date);

        let _guard = self.write_lock.lock().await;

        let mut records = match self.load(&path).await {
            Ok(records) => records,
            Err(err @ StoreError::Corrupt { .. }) => {
                error!("{err}, starting a fresh partition");
                self.quarantine(&path).await?;
                Vec::new()
            }
            Err(err) => return Err(err),
        };

        records.push(measurement.clone());
        let data = serde_json::to_vec_pretty(&records)?;
        self.write_atomic(&path, &data).await?;

        debug!(%date, records = records.len(), "Appended measurement");
        Ok(())
    }

    async fn read(&self, date: NaiveDate) -> Result<Vec<Measurement>, StoreError> {
        let records = self.load(&self.partition_path(date)).await?;

        Ok(records
            .into_iter()
            .filter(|m| {
                if !m.is_consistent() {
                    warn!(%date, timestamp = %m.timestamp, "Skipping record whose success flag disagrees with its latency");
                }
                m.is_consistent()
            })
            .collect())
    }

    async fn partitions(&self) -> Result<Vec<NaiveDate>, StoreError> {
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io(&self.root, e)),
        };

        let mut dates = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| StoreError::io(&self.root, e))? {
            if let Some(date) = entry.file_name().to_str().and_then(partition::parse_file_name) {
                dates.push(date);
            }
        }

        dates.sort_unstable();
        Ok(dates)
    }

    async fn sweep(&self, today: NaiveDate, retention_days: u32) -> Result<SweepReport, StoreError> {
        let cutoff = today.checked_sub_days(Days::new(u64::from(retention_days))).unwrap_or(NaiveDate::MIN);

        let _guard = self.write_lock.lock().await;
        let mut report = SweepReport::default();

        for date in self.partitions().await?.into_iter().filter(|date| *date < cutoff) {
            let path = self.partition_path(date);
            match fs::remove_file(&path).await {
                Ok(()) => {
                    info!(path = %path.display(), "Cleaned up old file");
                    report.removed.push(date);
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    warn!(path = %path.display(), "Failed to remove old partition: {e}");
                    report.failed.push((date, e.to_string()));
                }
            }
        }

        Ok(report)
    }
}
