//! Failure taxonomy for probes and restarts.
//!
//! These errors stay inside the component that detects them: the probe and
//! the restart executor log them and report a plain `bool` upward.

use std::time::Duration;

use thiserror::Error;

/// Why a health probe did not report healthy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    /// Connection refused, DNS failure, invalid URL, or a broken exchange.
    #[error("transport error: {0}")]
    Transport(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The endpoint answered with something other than 200.
    #[error("unexpected status code {0}")]
    BadStatus(u16),

    /// The body was not a JSON object with a string `status` field.
    #[error("malformed health response: {0}")]
    MalformedBody(String),

    /// The endpoint answered but reported a status other than `healthy`.
    #[error("service reported status {0:?}")]
    Degraded(String),
}

impl ProbeError {
    /// Whether the failure happened before any HTTP response arrived.
    pub fn is_transport(&self) -> bool {
        matches!(self, ProbeError::Transport(_) | ProbeError::Timeout(_))
    }
}

/// Why a restart attempt failed.
#[derive(Debug, Error)]
pub enum RestartError {
    /// The restart capability is switched off in the configuration.
    #[error("service restart is disabled for {0}")]
    Disabled(String),

    #[error("failed to execute {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The restart command ran and exited non-zero. `code` is -1 when the
    /// process was killed by a signal.
    #[error("restart command exited with code {code}: {output}")]
    Failed { code: i32, output: String },
}
