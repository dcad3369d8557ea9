mod tracing;

pub use crate::tracing::{init as init_tracing, init_with as init_tracing_with};
pub use ::tracing::level_filters::LevelFilter;
