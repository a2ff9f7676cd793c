//! revive-health — health probing and self-healing for a single service.
//!
//! One invocation checks the service once and, if it is unhealthy,
//! restarts it and polls until it comes back or the attempt budget runs
//! out. Nothing runs in the background and nothing is retained between
//! invocations; an external scheduler (cron, a systemd timer) decides how
//! often to run.
//!
//! # Architecture
//!
//! ```text
//! RecoveryController
//!   ├── HealthCheck  (HealthProbe: HTTP GET + JSON status → bool)
//!   └── RestartExecutor
//!         └── ServiceRestarter  (CommandRestarter: systemctl / docker)
//! ```
//!
//! Probe and restart failures are logged where they happen and reported
//! upward as plain booleans; the controller only maps them onto a
//! `RunOutcome`.

pub mod controller;
pub mod error;
pub mod probe;
pub mod restart;

pub use controller::{RecoveryController, RunOutcome};
pub use error::{ProbeError, RestartError};
pub use probe::{HEALTHY_STATUS, HealthCheck, HealthProbe, ProbeResult};
pub use restart::{CommandRestarter, RestartExecutor, ServiceRestarter};

/// The production wiring: HTTP probe plus a command-line restart backend.
pub type Monitor = RecoveryController<HealthProbe, CommandRestarter>;
