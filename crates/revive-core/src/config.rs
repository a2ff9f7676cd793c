//! TOML configuration for the monitor and the demo web service.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Process-control mechanism used to restart the monitored service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RestartBackend {
    /// `systemctl restart <service>`.
    #[default]
    Systemd,
    /// `docker restart <container>`.
    Docker,
}

/// Monitor settings, read once per invocation and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Base URL of the monitored service, e.g. `http://127.0.0.1:8080`.
    pub app_url: String,
    #[serde(default = "default_health_endpoint")]
    pub health_endpoint: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    /// Poll attempts after a successful restart.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Fixed delay before each poll attempt, in seconds.
    #[serde(default = "default_retry_delay_seconds")]
    pub retry_delay_seconds: u64,
    pub service_name: String,
    /// Restart capability gate. When false the monitor never touches the
    /// service manager.
    #[serde(default = "default_true")]
    pub use_service_manager: bool,
    #[serde(default)]
    pub restart_backend: RestartBackend,
    /// Prefix the restart command with `sudo`.
    #[serde(default = "default_true")]
    pub use_sudo: bool,
    /// Empty means stderr.
    #[serde(default)]
    pub log_file: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Demo web service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebAppConfig {
    pub host: String,
    pub port: u16,
    pub log_file: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_health_endpoint() -> String {
    "/health".to_string()
}

fn default_timeout_seconds() -> u64 {
    5
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_seconds() -> u64 {
    5
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn read_toml<T: serde::de::DeserializeOwned>(path: &Path) -> ConfigResult<T> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

impl MonitorConfig {
    /// Load and validate a monitor config file.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let config: MonitorConfig = read_toml(path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.app_url.is_empty() {
            return Err(ConfigError::Invalid("app_url must not be empty".into()));
        }
        // The probe client speaks plain HTTP only.
        if !self.app_url.starts_with("http://") {
            return Err(ConfigError::Invalid(format!(
                "app_url must start with http://, got {}",
                self.app_url
            )));
        }
        if self.timeout_seconds < 1 {
            return Err(ConfigError::Invalid("timeout_seconds must be at least 1".into()));
        }
        if self.max_retries < 1 {
            return Err(ConfigError::Invalid("max_retries must be at least 1".into()));
        }
        if self.service_name.trim().is_empty() {
            return Err(ConfigError::Invalid("service_name must not be empty".into()));
        }
        Ok(())
    }

    /// Full probe URL: `app_url` followed by `health_endpoint`.
    pub fn health_url(&self) -> String {
        format!("{}{}", self.app_url, self.health_endpoint)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_seconds)
    }
}

impl WebAppConfig {
    /// Load and validate a web service config file.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let config: WebAppConfig = read_toml(path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.port == 0 {
            return Err(ConfigError::Invalid(format!("invalid port: {}", self.port)));
        }
        if self.host.is_empty() {
            return Err(ConfigError::Invalid("host must not be empty".into()));
        }
        if self.log_file.is_empty() {
            return Err(ConfigError::Invalid("log_file must not be empty".into()));
        }
        Ok(())
    }

    /// `host:port` listen address.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
