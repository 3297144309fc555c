pub mod tracing;

pub use tracing::{init_logging, ObservabilityError};
