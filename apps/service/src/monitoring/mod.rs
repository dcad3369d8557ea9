pub mod checker;
/// Probing engine - produces and schedules measurements
///
/// This module is responsible for:
/// - Probing the target host (system ping or synthetic mock)
/// - Collapsing every probe failure into a failed measurement
/// - Running the fixed-period tick loop that feeds the record store
pub mod executor;
pub mod scheduler;
pub mod types;

pub use executor::ProbeExecutor;
pub use scheduler::ProbeScheduler;
pub use types::Measurement;
