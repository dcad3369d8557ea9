//! Network reachability monitor.
//!
//! Probes one host on a fixed period, keeps the results as one JSON
//! partition per local calendar day and serves them back with derived
//! statistics.

pub mod clock;
pub mod config;
pub mod context;
pub mod database;
pub mod monitoring;
pub mod query;
pub mod retention;
pub mod shutdown;
pub mod stats;

pub use config::{Config, PROBE_INTERVAL};
pub use context::AppContext;
pub use database::{FileStore, RecordStore, StoreError};
pub use monitoring::{Measurement, ProbeExecutor, ProbeScheduler};
pub use query::QueryService;
pub use stats::{Stats, aggregate};
