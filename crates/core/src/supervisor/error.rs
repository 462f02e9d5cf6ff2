//! Error types for supervisor operations.
//!
//! Every supervisor operation reports failure through [`SupervisorError`].
//! None of these conditions are fatal to the supervisor itself: a crashing
//! child or a missing binary is reported to the caller and the registry is
//! left in a consistent state.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while starting, stopping or probing a managed process.
#[derive(Error, Debug)]
pub enum SupervisorError {
    /// A live process is already registered under this name.
    #[error("{name} is already running")]
    AlreadyRunning { name: String },

    /// No process is registered under this name.
    #[error("{name} is not running")]
    NotRunning { name: String },

    /// The script or executable to launch does not exist.
    #[error("launch target for {name} does not exist: {}", path.display())]
    MissingLaunchTarget { name: String, path: PathBuf },

    /// The OS refused to spawn the process.
    #[error("failed to spawn {name}: {source}")]
    SpawnFailed {
        name: String,
        source: std::io::Error,
    },

    /// The process did not exit after the shutdown command and forced
    /// termination is disabled.
    #[error("{name} did not exit within {timeout:?} of the shutdown command")]
    GracefulStopTimeout { name: String, timeout: Duration },

    /// Forced termination could not be delivered, or the process survived it.
    #[error("failed to force-stop {name}: {reason}")]
    ForcedStopFailed { name: String, reason: String },

    /// The port probe did not connect within its timeout.
    #[error("port {port} did not answer within {timeout:?}")]
    ProbeTimeout { port: u16, timeout: Duration },

    /// The port probe was refused or failed outright.
    #[error("port {port} is not accepting connections: {source}")]
    ProbeFailed {
        port: u16,
        source: std::io::Error,
    },

    /// The process was started detached, so it has no console to write to.
    #[error("{name} has no console input (started detached)")]
    StdinUnavailable { name: String },

    /// Writing to the process console failed.
    #[error("failed to write to {name}: {source}")]
    ConsoleWrite {
        name: String,
        source: std::io::Error,
    },
}

impl SupervisorError {
    /// Short machine-friendly label for the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            SupervisorError::AlreadyRunning { .. } => "already_running",
            SupervisorError::NotRunning { .. } => "not_running",
            SupervisorError::MissingLaunchTarget { .. } => "missing_launch_target",
            SupervisorError::SpawnFailed { .. } => "spawn_failed",
            SupervisorError::GracefulStopTimeout { .. } => "graceful_stop_timeout",
            SupervisorError::ForcedStopFailed { .. } => "forced_stop_failed",
            SupervisorError::ProbeTimeout { .. } => "probe_timeout",
            SupervisorError::ProbeFailed { .. } => "probe_failed",
            SupervisorError::StdinUnavailable { .. } => "stdin_unavailable",
            SupervisorError::ConsoleWrite { .. } => "console_write",
        }
    }
}

/// Type alias for Result with SupervisorError.
pub type SupervisorResult<T> = Result<T, SupervisorError>;
