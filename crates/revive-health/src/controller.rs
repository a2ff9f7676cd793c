//! Recovery controller: the check → restart → verify loop.
//!
//! ```text
//! initial probe ── healthy ──────────────────────────────► Healthy (0)
//!      │ unhealthy
//!      ▼
//!   restart ── fails ────────────────────────────────────► Unrecoverable (1)
//!      │ ok
//!      ▼
//!   attempt 1..=max_retries: sleep(retry_delay); probe
//!      ├─ healthy ───────────────────────────────────────► Recovered (0)
//!      └─ unhealthy on the last attempt ─────────────────► Unrecoverable (1)
//! ```
//!
//! The delay runs before every poll, including the first one after the
//! restart, so a restarted service always gets one full `retry_delay` to
//! come up. The delay is fixed; there is no backoff growth.

use std::process::ExitCode;
use std::time::Duration;

use tracing::{error, info, warn};

use revive_core::MonitorConfig;

use crate::probe::{HealthCheck, HealthProbe};
use crate::restart::{CommandRestarter, RestartExecutor, ServiceRestarter};

/// Result of one monitor run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The initial probe passed; nothing was restarted.
    Healthy,
    /// The service was restarted and came back within the poll budget.
    Recovered,
    /// The restart failed or the service never came back.
    Unrecoverable,
}

impl RunOutcome {
    /// Process exit status: 0 for healthy or recovered, 1 otherwise.
    pub fn exit_code(self) -> u8 {
        match self {
            RunOutcome::Healthy | RunOutcome::Recovered => 0,
            RunOutcome::Unrecoverable => 1,
        }
    }

    pub fn is_success(self) -> bool {
        self.exit_code() == 0
    }
}

impl From<RunOutcome> for ExitCode {
    fn from(outcome: RunOutcome) -> Self {
        ExitCode::from(outcome.exit_code())
    }
}

/// Drives one probe/restart/poll cycle.
pub struct RecoveryController<C, R> {
    checker: C,
    executor: RestartExecutor<R>,
    max_retries: u32,
    retry_delay: Duration,
}

impl RecoveryController<HealthProbe, CommandRestarter> {
    /// Wire the HTTP probe and the configured restart backend.
    pub fn from_config(config: &MonitorConfig) -> Self {
        Self::new(
            HealthProbe::from_config(config),
            RestartExecutor::from_config(config, CommandRestarter::from_config(config)),
            config.max_retries,
            config.retry_delay(),
        )
    }
}

impl<C: HealthCheck, R: ServiceRestarter> RecoveryController<C, R> {
    pub fn new(
        checker: C,
        executor: RestartExecutor<R>,
        max_retries: u32,
        retry_delay: Duration,
    ) -> Self {
        Self {
            checker,
            executor,
            max_retries,
            retry_delay,
        }
    }

    pub fn checker(&self) -> &C {
        &self.checker
    }

    pub fn executor(&self) -> &RestartExecutor<R> {
        &self.executor
    }

    /// Run the full cycle once.
    pub async fn run(&self) -> RunOutcome {
        if self.checker.check().await {
            info!("monitoring finished: service is running normally");
            return RunOutcome::Healthy;
        }

        warn!(
            service = %self.executor.service_name(),
            "service unavailable, restart required"
        );

        if !self.executor.restart().await {
            error!(service = %self.executor.service_name(), "failed to restart service");
            return RunOutcome::Unrecoverable;
        }

        if self.wait_for_recovery().await {
            info!(service = %self.executor.service_name(), "service recovered");
            RunOutcome::Recovered
        } else {
            error!(service = %self.executor.service_name(), "failed to recover service");
            RunOutcome::Unrecoverable
        }
    }

    /// Poll until healthy or the attempt budget is spent.
    async fn wait_for_recovery(&self) -> bool {
        info!(
            max_retries = self.max_retries,
            retry_delay = ?self.retry_delay,
            "waiting for service to start"
        );

        for attempt in 1..=self.max_retries {
            tokio::time::sleep(self.retry_delay).await;

            info!(attempt, total = self.max_retries, "checking service availability");

            if self.checker.check().await {
                info!(attempt, "service started");
                return true;
            }

            if attempt < self.max_retries {
                info!(attempt, total = self.max_retries, "service not available yet, waiting");
            }
        }

        error!(attempts = self.max_retries, "service did not start after restart");
        false
    }
}
