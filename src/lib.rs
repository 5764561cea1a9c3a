pub mod api;
pub mod error;
pub mod logging;
pub mod models;
pub mod services;

pub use error::AnalysisError;
pub use logging::{init_logging, startup_elapsed_ms};
