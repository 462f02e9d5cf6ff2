//! Inter-component communication protocol.
//!
//! This module defines the message types for asynchronous communication
//! between a front-end (TUI, CLI) and the Core (control service).
//!
//! The protocol follows an Operation/Event pattern:
//! - `Op`: Commands sent from the front-end to Core
//! - `Event`: Results and status updates sent from Core to the front-end
//!
//! Every operation runs in the background on the Core side, so the
//! front-end never blocks on a spawn, a graceful stop or a port probe.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use ts_rs::TS;

use crate::provision_models::MissingItem;
use crate::server_models::{LifecycleState, ServerView};

/// Operations sent from a front-end to the Core.
///
/// Uses tagged enum serialization:
/// ```json
/// {
///   "type": "startServer",
///   "payload": { "name": "Paper 1" }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum Op {
    /// Start one server.
    StartServer { name: String },

    /// Stop one server using its shutdown protocol.
    StopServer { name: String },

    /// Start every server; each one is attempted independently.
    StartAll,

    /// Stop every server; each one is attempted independently.
    StopAll,

    /// Write a console line to a running server.
    SendCommand { name: String, line: String },

    /// Probe every server and report a `StatusSnapshot`.
    RefreshStatus,

    /// Report missing jars and start scripts.
    CheckFiles,

    /// Write missing start scripts and download missing jars.
    ///
    /// Falls back to the saved version when `version` is `None`.
    Repair { version: Option<String> },

    /// Fetch the list of available backend versions.
    ListVersions,

    /// Rewrite a backend's start script with a new heap size.
    SetMaxRam { name: String, gigabytes: u32 },

    /// Persist a new backend count and rebuild the server layout.
    SetBackendCount { count: u32 },

    /// Stop every server and end the session.
    Shutdown,
}

/// Which bulk operation a `BulkCompleted` event reports on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub enum BulkAction {
    StartAll,
    StopAll,
    Repair,
}

/// Result of one operation on one name, as a success flag plus message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct OpOutcome {
    /// Server the outcome refers to.
    pub name: String,
    pub success: bool,
    pub message: String,
}

impl OpOutcome {
    pub fn ok(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            success: false,
            message: message.into(),
        }
    }

    /// Build an outcome from a result, using `ok_message` on success and the
    /// error's display text on failure.
    pub fn from_result<T, E: std::fmt::Display>(
        name: impl Into<String>,
        result: &Result<T, E>,
        ok_message: impl FnOnce(&T) -> String,
    ) -> Self {
        match result {
            Ok(value) => Self::ok(name, ok_message(value)),
            Err(e) => Self::failed(name, e.to_string()),
        }
    }
}

/// Events sent from the Core to a front-end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum Event {
    /// A name moved to a new lifecycle state.
    ServerStateChanged { name: String, state: LifecycleState },

    /// A line of output captured from a piped server.
    ServerOutput { name: String, line: String },

    /// A server process has exited, on its own or after a stop.
    ServerExited { name: String, exit_code: Option<i32> },

    /// Result of a single-server operation.
    OperationCompleted { outcome: OpOutcome },

    /// Per-name results of a bulk operation.
    BulkCompleted {
        action: BulkAction,
        outcomes: Vec<OpOutcome>,
    },

    /// Liveness of every server, in display order.
    StatusSnapshot { servers: Vec<ServerView> },

    /// Result of a `CheckFiles` operation.
    MissingFiles { items: Vec<MissingItem> },

    /// Available backend versions, newest first.
    VersionsLoaded { versions: Vec<String> },

    /// The server's `eula.txt` has not been accepted yet.
    EulaPending { name: String, path: PathBuf },

    /// Free-form progress message for the log panel.
    Log { message: String },

    /// All servers were stopped in response to `Op::Shutdown`.
    ShutdownComplete,
}
