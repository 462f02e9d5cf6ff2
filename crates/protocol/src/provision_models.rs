//! On-disk prerequisite models.
//!
//! Each server directory needs a server jar and a start script before it
//! can be launched. These types describe what is missing.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use ts_rs::TS;

/// Kind of prerequisite file.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, TS)]
#[serde(rename_all = "camelCase")]
pub enum MissingKind {
    /// The server jar (`paper.jar`, `BungeeCord.jar`).
    Jar,

    /// The start script (`start.sh` / `start.bat`).
    StartScript,
}

/// A prerequisite file that does not exist on disk.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct MissingItem {
    /// Server the file belongs to.
    pub server: String,

    /// What is missing.
    pub kind: MissingKind,

    /// Expected location.
    pub path: PathBuf,
}

impl std::fmt::Display for MissingItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let what = match self.kind {
            MissingKind::Jar => "server jar",
            MissingKind::StartScript => "start script",
        };
        write!(f, "{} is missing its {} ({})", self.server, what, self.path.display())
    }
}
