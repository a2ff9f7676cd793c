//! Service restart.
//!
//! `ServiceRestarter` is the narrow seam to the process-control mechanism
//! (systemd, docker, or a test double). `RestartExecutor` wraps a backend
//! with the configuration's restart gate and turns the outcome into a
//! logged `bool`.

use std::future::Future;

use tokio::process::Command;
use tracing::{debug, error, info, warn};

use revive_core::{MonitorConfig, RestartBackend};

use crate::error::RestartError;

/// Restarts a named service, returning the command's combined output.
pub trait ServiceRestarter {
    fn restart_service(
        &self,
        service: &str,
    ) -> impl Future<Output = Result<String, RestartError>> + Send;
}

/// Runs `[sudo] <program> <args...> <service>` and waits for it to exit.
///
/// No timeout is applied: the service manager bounds the call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRestarter {
    program: String,
    args: Vec<String>,
    use_sudo: bool,
}

impl CommandRestarter {
    pub fn new(program: impl Into<String>, args: Vec<String>, use_sudo: bool) -> Self {
        Self {
            program: program.into(),
            args,
            use_sudo,
        }
    }

    /// `systemctl restart <service>`.
    pub fn systemd(use_sudo: bool) -> Self {
        Self::new("systemctl", vec!["restart".to_string()], use_sudo)
    }

    /// `docker restart <container>`.
    pub fn docker(use_sudo: bool) -> Self {
        Self::new("docker", vec!["restart".to_string()], use_sudo)
    }

    pub fn from_config(config: &MonitorConfig) -> Self {
        match config.restart_backend {
            RestartBackend::Systemd => Self::systemd(config.use_sudo),
            RestartBackend::Docker => Self::docker(config.use_sudo),
        }
    }

    /// The full argv that `restart_service` would execute.
    pub fn command_line(&self, service: &str) -> Vec<String> {
        let mut argv = Vec::with_capacity(self.args.len() + 3);
        if self.use_sudo {
            argv.push("sudo".to_string());
        }
        argv.push(self.program.clone());
        argv.extend(self.args.iter().cloned());
        argv.push(service.to_string());
        argv
    }
}

impl ServiceRestarter for CommandRestarter {
    async fn restart_service(&self, service: &str) -> Result<String, RestartError> {
        let argv = self.command_line(service);
        let (program, args) = argv.split_first().ok_or_else(|| RestartError::Spawn {
            program: self.program.clone(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty command line"),
        })?;

        debug!(command = ?argv, "running restart command");

        let output = Command::new(program)
            .args(args)
            .output()
            .await
            .map_err(|source| RestartError::Spawn {
                program: program.clone(),
                source,
            })?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        if !output.status.success() {
            return Err(RestartError::Failed {
                code: output.status.code().unwrap_or(-1),
                output: combined,
            });
        }

        Ok(combined)
    }
}

/// Gatekeeper around a restart backend.
pub struct RestartExecutor<R> {
    restarter: R,
    service_name: String,
    enabled: bool,
}

impl<R: ServiceRestarter> RestartExecutor<R> {
    pub fn new(restarter: R, service_name: impl Into<String>, enabled: bool) -> Self {
        Self {
            restarter,
            service_name: service_name.into(),
            enabled,
        }
    }

    pub fn from_config(config: &MonitorConfig, restarter: R) -> Self {
        Self::new(restarter, config.service_name.clone(), config.use_service_manager)
    }

    pub fn restarter(&self) -> &R {
        &self.restarter
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Restart the service once. Returns `true` on a zero exit.
    pub async fn restart(&self) -> bool {
        warn!(service = %self.service_name, "attempting service restart");

        match self.try_restart().await {
            Ok(output) => {
                info!(
                    service = %self.service_name,
                    output = %output.trim(),
                    "service restarted"
                );
                true
            }
            Err(RestartError::Failed { code, output }) => {
                error!(
                    service = %self.service_name,
                    exit_code = code,
                    output = %output.trim(),
                    "restart command failed"
                );
                false
            }
            Err(e) => {
                error!(service = %self.service_name, error = %e, "service restart not performed");
                false
            }
        }
    }

    async fn try_restart(&self) -> Result<String, RestartError> {
        if !self.enabled {
            return Err(RestartError::Disabled(self.service_name.clone()));
        }
        self.restarter.restart_service(&self.service_name).await
    }
}
