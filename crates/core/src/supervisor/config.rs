//! Supervisor tuning knobs.

use std::time::Duration;

/// Timeouts and limits used by the [`Supervisor`](super::Supervisor).
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    /// How long to wait for a piped child to exit after the shutdown command.
    pub graceful_timeout: Duration,

    /// How long to wait for exit after the terminate signal.
    pub forced_timeout: Duration,

    /// Connect timeout for the port liveness probe.
    pub probe_timeout: Duration,

    /// How long `start` collects output before reporting. Zero returns
    /// right after the spawn.
    pub startup_capture: Duration,

    /// Number of output lines kept per process.
    pub output_capacity: usize,

    /// Fall back to the terminate signal when the graceful stop times out.
    pub allow_forced_stop: bool,

    /// Kill children when the supervisor is dropped.
    pub kill_on_drop: bool,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            graceful_timeout: Duration::from_secs(5),
            forced_timeout: Duration::from_secs(5),
            probe_timeout: Duration::from_secs(1),
            startup_capture: Duration::from_millis(250),
            output_capacity: 500,
            allow_forced_stop: true,
            kill_on_drop: false,
        }
    }
}
