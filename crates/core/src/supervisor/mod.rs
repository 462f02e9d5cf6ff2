//! Process lifecycle supervision.
//!
//! This module owns every server process the panel starts:
//!
//! - `manager`: the [`Supervisor`] registry and its start/stop/status/list operations
//! - `record`: per-process records and output capture
//! - `signal`: forced termination behind the [`Signaller`] seam
//! - `probe`: TCP port liveness checks
//! - `config`: timeouts and limits
//! - `error`: error types

pub mod config;
pub mod error;
pub mod manager;
pub mod probe;
pub mod record;
pub mod signal;

pub use config::SupervisorConfig;
pub use error::{SupervisorError, SupervisorResult};
pub use manager::{StartReport, StopReport, Supervisor};
pub use probe::{port_is_listening, probe_port};
pub use record::OutputBuffer;
pub use signal::{OsSignaller, Signaller};
