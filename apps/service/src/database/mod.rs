/// Storage of measurements
///
/// One append-only partition per calendar day, named after the date in the
/// configured timezone. The [`RecordStore`] trait is what the scheduler and
/// the query surface see; [`FileStore`] keeps each partition as a JSON file.
pub mod error;
pub mod partition;
pub mod repository;

pub use error::StoreError;
pub use repository::{FileStore, RecordStore, SweepReport};
