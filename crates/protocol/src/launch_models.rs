//! Launch and shutdown descriptors.
//!
//! A [`LaunchDescriptor`] is everything the supervisor needs to spawn a
//! process; a [`ShutdownProtocol`] is what it writes to a piped child to ask
//! it to exit on its own.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use ts_rs::TS;

/// How the child's standard streams are wired.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, TS)]
#[serde(rename_all = "camelCase")]
pub enum StdioMode {
    /// The supervisor owns stdin/stdout/stderr. Required for graceful stop
    /// and console command injection.
    #[default]
    Piped,

    /// The child gets its own console (or null streams). Only the OS
    /// handle is tracked, so stop always takes the forced path.
    Detached,
}

/// Ready-to-execute description of a managed process.
///
/// Platform-specific invocation (batch file vs shell script) is resolved
/// when the descriptor is built, not by the supervisor. The constructors
/// resolve relative paths against the current directory, so the script is
/// still found after the child changes into its working directory.
///
/// # Example
///
/// ```
/// use cc_protocol::launch_models::LaunchDescriptor;
///
/// let ld = LaunchDescriptor::for_script("servers/paper1/start.sh");
/// assert!(ld.target.is_absolute());
/// assert!(ld.working_dir().ends_with("servers/paper1"));
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct LaunchDescriptor {
    /// Script or executable that must exist before a spawn is attempted.
    pub target: PathBuf,

    /// Program actually executed. For a script this is usually an
    /// interpreter; for a binary it equals `target`.
    pub program: PathBuf,

    /// Arguments passed to `program`.
    #[serde(default)]
    pub args: Vec<String>,

    /// Working directory. Defaults to the directory containing `target`.
    #[serde(default)]
    pub cwd: Option<PathBuf>,

    /// Stream wiring for the child.
    #[serde(default)]
    pub stdio: StdioMode,
}

impl LaunchDescriptor {
    /// Descriptor that executes `target` directly.
    pub fn for_executable(target: impl Into<PathBuf>) -> Self {
        let target = absolute(target.into());
        Self {
            program: target.clone(),
            target,
            args: Vec::new(),
            cwd: None,
            stdio: StdioMode::Piped,
        }
    }

    /// Descriptor for a start script.
    ///
    /// `.bat`/`.cmd` files run through `cmd.exe /c` on Windows; everything
    /// else runs through `sh` so the script does not need its executable bit.
    pub fn for_script(script: impl Into<PathBuf>) -> Self {
        let script = absolute(script.into());
        let is_batch = script
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("bat") || e.eq_ignore_ascii_case("cmd"))
            .unwrap_or(false);

        let (program, args) = if cfg!(windows) && is_batch {
            (
                PathBuf::from("cmd.exe"),
                vec!["/c".to_string(), script.to_string_lossy().into_owned()],
            )
        } else {
            (
                PathBuf::from("sh"),
                vec![script.to_string_lossy().into_owned()],
            )
        };

        Self {
            target: script,
            program,
            args,
            cwd: None,
            stdio: StdioMode::Piped,
        }
    }

    /// Set the stdio mode.
    pub fn with_stdio(mut self, stdio: StdioMode) -> Self {
        self.stdio = stdio;
        self
    }

    /// Override the working directory.
    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Append an argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Effective working directory for the spawned process.
    pub fn working_dir(&self) -> &Path {
        match &self.cwd {
            Some(cwd) => cwd,
            None => match self.target.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent,
                _ => Path::new("."),
            },
        }
    }
}

/// `path` resolved against the current directory. Left as is if the
/// current directory cannot be determined.
fn absolute(path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        return path;
    }
    std::path::absolute(&path).unwrap_or(path)
}

/// Cooperative shutdown sequence written to a piped child's stdin.
///
/// Interactive servers need a console command to persist their state before
/// exiting, and launch scripts often end with a "press enter to continue"
/// prompt. The command is followed by `terminator_repeats` blank lines to
/// dismiss such prompts.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
#[serde(rename_all = "kebab-case")]
pub struct ShutdownProtocol {
    /// Console command, without trailing newline (e.g. "stop", "end").
    pub command: String,

    /// Number of blank lines sent after the command.
    #[serde(default = "default_terminator_repeats")]
    pub terminator_repeats: u32,
}

fn default_terminator_repeats() -> u32 {
    3
}

impl ShutdownProtocol {
    /// Protocol with the default number of terminator lines.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            terminator_repeats: default_terminator_repeats(),
        }
    }

    /// Override the number of terminator lines.
    pub fn with_terminators(mut self, repeats: u32) -> Self {
        self.terminator_repeats = repeats;
        self
    }

    /// Bytes written to the child's stdin.
    pub fn payload(&self) -> String {
        let mut payload = String::with_capacity(self.command.len() + 1 + self.terminator_repeats as usize);
        payload.push_str(&self.command);
        payload.push('\n');
        for _ in 0..self.terminator_repeats {
            payload.push('\n');
        }
        payload
    }
}

impl Default for ShutdownProtocol {
    fn default() -> Self {
        Self::new("stop")
    }
}
