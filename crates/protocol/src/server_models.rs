//! Runtime server state models.
//!
//! This module defines the structures used to describe managed server
//! processes and their observed liveness.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Role of a managed server in the deployment.
///
/// A deployment has exactly one proxy and any number of backends.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerKind {
    /// The front proxy that players connect to (BungeeCord).
    Proxy,

    /// A backend game server behind the proxy (Paper).
    Backend,
}

/// Lifecycle state of a managed name.
///
/// The normal progression is:
/// Absent -> Starting -> Running -> Stopping -> Absent
///
/// A process that exits on its own goes straight from Running to Absent,
/// which is only noticed at the next status check.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LifecycleState {
    /// No process is registered under this name.
    #[default]
    Absent,

    /// The process has been spawned and its startup output is being captured.
    Starting,

    /// The process is registered and was alive at the last check.
    Running,

    /// A stop request is in progress.
    Stopping,
}

impl LifecycleState {
    /// Whether a registry entry exists for this state.
    pub fn has_entry(self) -> bool {
        !matches!(self, LifecycleState::Absent)
    }
}

/// Point-in-time view of one managed name.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct ServerStatus {
    /// Name the process is registered under.
    pub name: String,

    /// Lifecycle state at the time of the check.
    pub state: LifecycleState,

    /// Combined liveness verdict (process alive and, when a port is
    /// configured, the port accepting connections).
    pub running: bool,

    /// OS process id, if a process is registered.
    pub pid: Option<u32>,

    /// When the current process was spawned.
    pub started_at: Option<DateTime<Utc>>,
}

impl ServerStatus {
    /// Status for a name that has no registry entry.
    pub fn absent(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: LifecycleState::Absent,
            running: false,
            pid: None,
            started_at: None,
        }
    }
}

/// Row shown by front-ends: static server definition merged with status.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct ServerView {
    pub name: String,
    pub kind: ServerKind,
    pub port: Option<u16>,
    pub status: ServerStatus,
}
