//! Test fixtures: shell scripts standing in for game servers.

use cc_core::layout::ServerLayout;
use cc_core::supervisor::SupervisorConfig;
use cc_protocol::LaunchDescriptor;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Reads console lines and exits cleanly on `stop` or `end`.
#[allow(dead_code)]
pub const CONSOLE_SERVER: &str = r#"echo "booting"
while read line; do
  case "$line" in
    stop|end) echo "shutting down"; exit 0 ;;
    *) echo "> $line" ;;
  esac
done
"#;

/// Ignores its console and SIGTERM.
#[allow(dead_code)]
pub const STUBBORN_SERVER: &str = r#"trap '' TERM
while true; do sleep 1; done
"#;

/// Ignores its console but dies on SIGTERM.
#[allow(dead_code)]
pub const DEAF_SERVER: &str = r#"while true; do sleep 1; done
"#;

/// Exits on its own right away.
#[allow(dead_code)]
pub const CRASHING_SERVER: &str = r#"echo "crashing"
exit 3
"#;

/// Launcher that runs its workload as a separate process and waits for it,
/// like a start script without `exec`. The workload's pid lands in
/// `workload.pid`.
#[allow(dead_code)]
pub const WRAPPED_SERVER: &str = r#"sh -c 'echo $$ > workload.pid; exec sleep 60'
"#;

/// Write `body` as a `/bin/sh` script at `dir/file` and return its path.
#[allow(dead_code)]
pub fn write_script(dir: &Path, file: &str, body: &str) -> PathBuf {
    std::fs::create_dir_all(dir).expect("Failed to create script dir");
    let path = dir.join(file);
    std::fs::write(&path, format!("#!/bin/sh\n{body}")).expect("Failed to write script");
    path
}

/// Piped launch descriptor for a script written with [`write_script`].
#[allow(dead_code)]
pub fn script_launch(dir: &Path, file: &str, body: &str) -> LaunchDescriptor {
    LaunchDescriptor::for_script(write_script(dir, file, body))
}

/// Supervisor config with short timeouts and no startup window.
///
/// Children are killed when the supervisor is dropped so a failing test
/// never leaks processes.
#[allow(dead_code)]
pub fn fast_config() -> SupervisorConfig {
    SupervisorConfig {
        graceful_timeout: Duration::from_secs(3),
        forced_timeout: Duration::from_secs(3),
        probe_timeout: Duration::from_millis(300),
        startup_capture: Duration::ZERO,
        output_capacity: 100,
        allow_forced_stop: true,
        kill_on_drop: true,
    }
}

/// Create a layout under `root` whose start scripts run [`CONSOLE_SERVER`]
/// and whose jars are placeholder files.
#[allow(dead_code)]
pub fn scaffold_layout(root: &Path, backends: u32) -> ServerLayout {
    let layout = ServerLayout::build(root, backends);
    for def in layout.servers() {
        std::fs::create_dir_all(&def.dir).expect("Failed to create server dir");
        std::fs::write(&def.jar, b"jar").expect("Failed to write jar");
        let file = def.script.file_name().and_then(|n| n.to_str()).expect("script name");
        write_script(&def.dir, file, CONSOLE_SERVER);
    }
    layout
}

/// Poll `check` until it returns true or `timeout` elapses.
#[allow(dead_code)]
pub async fn eventually<F, Fut>(timeout: Duration, mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if check().await {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}

/// Read a pid written by a test script, waiting up to `timeout`.
#[allow(dead_code)]
pub async fn read_pid_file(path: &Path, timeout: Duration) -> Option<u32> {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        let pid = std::fs::read_to_string(path)
            .ok()
            .and_then(|content| content.trim().parse().ok());
        if pid.is_some() || tokio::time::Instant::now() >= deadline {
            return pid;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}

/// Whether `pid` is a running process. Zombies count as gone.
#[cfg(target_os = "linux")]
#[allow(dead_code)]
pub fn process_alive(pid: u32) -> bool {
    let Ok(stat) = std::fs::read_to_string(format!("/proc/{pid}/stat")) else {
        return false;
    };
    // The state letter follows the parenthesised command name.
    stat.rsplit(')')
        .next()
        .map(|rest| !rest.trim_start().starts_with('Z'))
        .unwrap_or(false)
}
