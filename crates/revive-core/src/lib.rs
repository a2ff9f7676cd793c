//! revive-core — configuration and logging shared by the Revive binaries.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{MonitorConfig, RestartBackend, WebAppConfig};
pub use error::{ConfigError, ConfigResult, LoggingError};
pub use logging::init_logging;
