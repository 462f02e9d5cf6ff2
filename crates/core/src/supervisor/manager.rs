//! Process supervisor.
//!
//! The Supervisor owns every server process it starts. It keeps a registry
//! of live processes keyed by server name and provides operations for
//! starting, stopping, and querying them.

use super::config::SupervisorConfig;
use super::error::{SupervisorError, SupervisorResult};
use super::probe;
use super::record::{spawn_output_reader, ManagedProcess, OutputBuffer, Slot};
use super::signal::{OsSignaller, Signaller};
use cc_protocol::{Event, LaunchDescriptor, LifecycleState, ServerStatus, ShutdownProtocol, StdioMode};
use std::collections::HashMap;
use std::pin::Pin;
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tokio::time::timeout;
use tokio_stream::Stream;
use tracing::{debug, info, warn};

#[cfg(windows)]
const CREATE_NEW_CONSOLE: u32 = 0x0000_0010;

/// Result of a successful `start`.
#[derive(Debug, Clone)]
pub struct StartReport {
    pub pid: Option<u32>,
    /// Output collected during the startup window.
    pub startup_output: Vec<String>,
}

/// Result of a successful `stop`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopReport {
    /// True if the terminate signal was needed.
    pub forced: bool,
    pub exit_code: Option<i32>,
}

#[derive(Debug, Default)]
struct Registry {
    /// Every name ever registered or started, in first-seen order.
    known: Vec<String>,
    /// Names with a live (or not yet reaped) process.
    live: HashMap<String, Arc<Slot>>,
}

impl Registry {
    fn remember(&mut self, name: &str) {
        if !self.known.iter().any(|known| known == name) {
            self.known.push(name.to_string());
        }
    }

    fn forget(&mut self, name: &str) -> bool {
        if self.live.contains_key(name) {
            return false;
        }
        let before = self.known.len();
        self.known.retain(|known| known != name);
        self.known.len() != before
    }
}

/// Manages the lifecycle of named server processes.
///
/// Cloning is cheap; clones share the same registry.
#[derive(Debug, Clone)]
pub struct Supervisor {
    registry: Arc<Mutex<Registry>>,
    config: Arc<SupervisorConfig>,
    signaller: Arc<dyn Signaller>,
    events_tx: Option<UnboundedSender<Event>>,
}

impl Default for Supervisor {
    fn default() -> Self {
        Self::new(SupervisorConfig::default())
    }
}

impl Supervisor {
    /// Create a supervisor with the OS signaller and no event channel.
    pub fn new(config: SupervisorConfig) -> Self {
        Self {
            registry: Arc::new(Mutex::new(Registry::default())),
            config: Arc::new(config),
            signaller: Arc::new(OsSignaller),
            events_tx: None,
        }
    }

    /// Publish lifecycle and output events on `events_tx`.
    pub fn with_events(mut self, events_tx: UnboundedSender<Event>) -> Self {
        self.events_tx = Some(events_tx);
        self
    }

    /// Replace the signaller used for forced termination.
    pub fn with_signaller(mut self, signaller: Arc<dyn Signaller>) -> Self {
        self.signaller = signaller;
        self
    }

    pub fn config(&self) -> &SupervisorConfig {
        &self.config
    }

    /// Make `name` visible to [`list`](Self::list) without starting it.
    pub async fn register(&self, name: &str) {
        self.registry.lock().await.remember(name);
    }

    /// Remove `name` from [`list`](Self::list).
    ///
    /// Names with a live process are kept; returns whether `name` was removed.
    pub async fn unregister(&self, name: &str) -> bool {
        self.registry.lock().await.forget(name)
    }

    /// Every name [`list`](Self::list) reports, in registration order.
    pub async fn registered_names(&self) -> Vec<String> {
        self.registry.lock().await.known.clone()
    }

    /// Names currently holding a registry entry.
    pub async fn live_names(&self) -> Vec<String> {
        let registry = self.registry.lock().await;
        registry
            .known
            .iter()
            .filter(|name| registry.live.contains_key(name.as_str()))
            .cloned()
            .collect()
    }

    fn emit(&self, event: Event) {
        if let Some(tx) = &self.events_tx {
            let _ = tx.send(event);
        }
    }

    fn emit_state(&self, name: &str, state: LifecycleState) {
        self.emit(Event::ServerStateChanged {
            name: name.to_string(),
            state,
        });
    }

    async fn live_slot(&self, name: &str) -> Option<Arc<Slot>> {
        self.registry.lock().await.live.get(name).cloned()
    }

    /// Drop the entry for `name` if it still points at `slot`.
    async fn remove_slot(&self, name: &str, slot: &Arc<Slot>) {
        let mut registry = self.registry.lock().await;
        if registry
            .live
            .get(name)
            .is_some_and(|current| Arc::ptr_eq(current, slot))
        {
            registry.live.remove(name);
        }
    }

    /// Start the process described by `launch` under `name`.
    ///
    /// Succeeds once the OS has spawned the process. Output produced during
    /// the configured startup window is returned in the report.
    ///
    /// # Errors
    ///
    /// - [`SupervisorError::AlreadyRunning`] if `name` has a live process
    /// - [`SupervisorError::MissingLaunchTarget`] if the script does not exist
    /// - [`SupervisorError::SpawnFailed`] if the OS refuses the spawn
    ///
    /// On error the registry is unchanged.
    pub async fn start(&self, name: &str, launch: &LaunchDescriptor) -> SupervisorResult<StartReport> {
        let slot = {
            let mut registry = self.registry.lock().await;
            registry.remember(name);

            if let Some(existing) = registry.live.get(name).cloned() {
                // A busy slot means a stop is in flight: still ours.
                let exited = match existing.process.try_lock() {
                    Ok(mut process) => match process.child.try_wait() {
                        Ok(Some(status)) => Some(status.code()),
                        Ok(None) | Err(_) => None,
                    },
                    Err(_) => None,
                };

                match exited {
                    Some(exit_code) => {
                        existing.set_state(LifecycleState::Absent);
                        registry.live.remove(name);
                        debug!(server = %name, ?exit_code, "reaped exited process before restart");
                        self.emit(Event::ServerExited {
                            name: name.to_string(),
                            exit_code,
                        });
                    }
                    None => {
                        return Err(SupervisorError::AlreadyRunning {
                            name: name.to_string(),
                        })
                    }
                }
            }

            if !launch.target.exists() {
                return Err(SupervisorError::MissingLaunchTarget {
                    name: name.to_string(),
                    path: launch.target.clone(),
                });
            }

            let mut command = Command::new(&launch.program);
            command
                .args(&launch.args)
                .current_dir(launch.working_dir())
                .kill_on_drop(self.config.kill_on_drop);

            // The launcher leads its own group so the terminate signal also
            // reaches the server it runs.
            #[cfg(unix)]
            command.process_group(0);

            match launch.stdio {
                StdioMode::Piped => {
                    command
                        .stdin(Stdio::piped())
                        .stdout(Stdio::piped())
                        .stderr(Stdio::piped());
                }
                StdioMode::Detached => {
                    command
                        .stdin(Stdio::null())
                        .stdout(Stdio::null())
                        .stderr(Stdio::null());
                    #[cfg(windows)]
                    command.creation_flags(CREATE_NEW_CONSOLE);
                }
            }

            let mut child = command.spawn().map_err(|source| SupervisorError::SpawnFailed {
                name: name.to_string(),
                source,
            })?;

            let output = OutputBuffer::new(self.config.output_capacity);
            if let Some(stdout) = child.stdout.take() {
                spawn_output_reader(name.to_string(), stdout, output.clone(), self.events_tx.clone());
            }
            if let Some(stderr) = child.stderr.take() {
                spawn_output_reader(name.to_string(), stderr, output.clone(), self.events_tx.clone());
            }

            let stdin = child.stdin.take();
            let slot = Arc::new(Slot::new(ManagedProcess { child, stdin }, launch.stdio, output));
            registry.live.insert(name.to_string(), Arc::clone(&slot));
            slot
        };

        info!(server = %name, pid = ?slot.pid, target = %launch.target.display(), "started");
        self.emit_state(name, LifecycleState::Starting);

        if !self.config.startup_capture.is_zero() {
            tokio::time::sleep(self.config.startup_capture).await;
        }

        if slot.transition(LifecycleState::Starting, LifecycleState::Running) {
            self.emit_state(name, LifecycleState::Running);
        }

        Ok(StartReport {
            pid: slot.pid,
            startup_output: slot.output.snapshot(),
        })
    }

    /// Stop the process registered under `name`.
    ///
    /// Piped processes first receive the shutdown command on their console.
    /// If they do not exit within the graceful timeout (or have no console),
    /// the signaller is asked to terminate them. Concurrent stops for the
    /// same name are serialised; the second one reports `NotRunning`.
    ///
    /// A process that already exited on its own is reaped and reported as
    /// stopped.
    ///
    /// # Errors
    ///
    /// - [`SupervisorError::NotRunning`] if `name` has no entry
    /// - [`SupervisorError::GracefulStopTimeout`] if the process ignored the
    ///   shutdown command and forced stop is disabled
    /// - [`SupervisorError::ForcedStopFailed`] if the process survived the
    ///   terminate signal
    ///
    /// On error the entry stays registered as running.
    pub async fn stop(&self, name: &str, shutdown: &ShutdownProtocol) -> SupervisorResult<StopReport> {
        let not_running = || SupervisorError::NotRunning {
            name: name.to_string(),
        };

        let slot = self.live_slot(name).await.ok_or_else(not_running)?;
        let mut process = slot.process.lock().await;

        if slot.state() == LifecycleState::Absent {
            return Err(not_running());
        }

        slot.set_state(LifecycleState::Stopping);
        self.emit_state(name, LifecycleState::Stopping);

        match self.shut_down(name, &mut process, shutdown).await {
            Ok(report) => {
                slot.set_state(LifecycleState::Absent);
                drop(process);
                self.remove_slot(name, &slot).await;

                info!(server = %name, forced = report.forced, exit_code = ?report.exit_code, "stopped");
                self.emit_state(name, LifecycleState::Absent);
                self.emit(Event::ServerExited {
                    name: name.to_string(),
                    exit_code: report.exit_code,
                });
                Ok(report)
            }
            Err(e) => {
                slot.set_state(LifecycleState::Running);
                warn!(server = %name, error = %e, "stop failed");
                self.emit_state(name, LifecycleState::Running);
                Err(e)
            }
        }
    }

    async fn shut_down(
        &self,
        name: &str,
        process: &mut ManagedProcess,
        shutdown: &ShutdownProtocol,
    ) -> SupervisorResult<StopReport> {
        if let Ok(Some(status)) = process.child.try_wait() {
            debug!(server = %name, "process had already exited");
            return Ok(StopReport {
                forced: false,
                exit_code: status.code(),
            });
        }

        let forced_failed = |reason: String| SupervisorError::ForcedStopFailed {
            name: name.to_string(),
            reason,
        };

        match process.stdin.as_mut() {
            Some(stdin) => {
                let payload = shutdown.payload();
                let written = async {
                    stdin.write_all(payload.as_bytes()).await?;
                    stdin.flush().await
                }
                .await;
                if let Err(e) = written {
                    // A closed console is fine, the process may be on its way out.
                    debug!(server = %name, error = %e, "could not deliver shutdown command");
                }

                match timeout(self.config.graceful_timeout, process.child.wait()).await {
                    Ok(Ok(status)) => {
                        return Ok(StopReport {
                            forced: false,
                            exit_code: status.code(),
                        })
                    }
                    Ok(Err(e)) => return Err(forced_failed(format!("wait failed: {e}"))),
                    Err(_) => {
                        warn!(
                            server = %name,
                            timeout = ?self.config.graceful_timeout,
                            "no exit after shutdown command"
                        );
                    }
                }

                if !self.config.allow_forced_stop {
                    return Err(SupervisorError::GracefulStopTimeout {
                        name: name.to_string(),
                        timeout: self.config.graceful_timeout,
                    });
                }
            }
            None if !self.config.allow_forced_stop => {
                return Err(forced_failed(
                    "no console to send the shutdown command and forced stop is disabled".to_string(),
                ));
            }
            None => {}
        }

        self.signaller
            .terminate(name, &mut process.child)
            .map_err(|e| forced_failed(format!("terminate signal failed: {e}")))?;

        match timeout(self.config.forced_timeout, process.child.wait()).await {
            Ok(Ok(status)) => Ok(StopReport {
                forced: true,
                exit_code: status.code(),
            }),
            Ok(Err(e)) => Err(forced_failed(format!("wait failed: {e}"))),
            Err(_) => Err(forced_failed(format!(
                "still alive {:?} after the terminate signal",
                self.config.forced_timeout
            ))),
        }
    }

    /// Reap `name` if its process has exited and return the live slot otherwise.
    async fn observe(&self, name: &str) -> Option<Arc<Slot>> {
        let slot = self.live_slot(name).await?;

        // A held lock means a stop is in flight; trust the stored state.
        let exited = match slot.process.try_lock() {
            Ok(mut process) => match process.child.try_wait() {
                Ok(Some(status)) => Some(status.code()),
                Ok(None) => None,
                Err(e) => {
                    warn!(server = %name, error = %e, "could not query process");
                    None
                }
            },
            Err(_) => None,
        };

        if let Some(exit_code) = exited {
            slot.set_state(LifecycleState::Absent);
            self.remove_slot(name, &slot).await;
            info!(server = %name, ?exit_code, "process exited on its own");
            self.emit_state(name, LifecycleState::Absent);
            self.emit(Event::ServerExited {
                name: name.to_string(),
                exit_code,
            });
            return None;
        }

        (slot.state() != LifecycleState::Absent).then_some(slot)
    }

    /// Whether `name` is alive.
    ///
    /// With `port`, liveness additionally requires a listener on that port.
    /// A process found to have exited is removed from the registry.
    pub async fn status(&self, name: &str, port: Option<u16>) -> bool {
        if self.observe(name).await.is_none() {
            return false;
        }
        match port {
            Some(port) => probe::port_is_listening(port, self.config.probe_timeout).await,
            None => true,
        }
    }

    /// Full status record for `name`.
    pub async fn snapshot(&self, name: &str, port: Option<u16>) -> ServerStatus {
        let Some(slot) = self.observe(name).await else {
            return ServerStatus::absent(name);
        };
        let running = match port {
            Some(port) => probe::port_is_listening(port, self.config.probe_timeout).await,
            None => true,
        };
        slot.status(name, running)
    }

    /// Stream the last observed status of every known name.
    ///
    /// Names are yielded in registration order. Each call produces a fresh
    /// stream.
    pub fn list(&self) -> Pin<Box<dyn Stream<Item = ServerStatus> + Send + '_>> {
        Box::pin(async_stream::stream! {
            let names = self.registry.lock().await.known.clone();
            for name in names {
                yield self.snapshot(&name, None).await;
            }
        })
    }

    /// Write one line to the console of `name`.
    ///
    /// # Errors
    ///
    /// - [`SupervisorError::NotRunning`] if `name` has no live process
    /// - [`SupervisorError::StdinUnavailable`] if it was started detached
    /// - [`SupervisorError::ConsoleWrite`] if the write fails
    pub async fn send_command(&self, name: &str, line: &str) -> SupervisorResult<()> {
        let slot = self
            .observe(name)
            .await
            .ok_or_else(|| SupervisorError::NotRunning {
                name: name.to_string(),
            })?;
        if slot.stdio == StdioMode::Detached {
            return Err(SupervisorError::StdinUnavailable {
                name: name.to_string(),
            });
        }
        let mut process = slot.process.lock().await;

        let stdin = process
            .stdin
            .as_mut()
            .ok_or_else(|| SupervisorError::StdinUnavailable {
                name: name.to_string(),
            })?;

        let mut payload = line.trim_end_matches(['\r', '\n']).to_string();
        payload.push('\n');

        let written = async {
            stdin.write_all(payload.as_bytes()).await?;
            stdin.flush().await
        }
        .await;
        written.map_err(|source| SupervisorError::ConsoleWrite {
            name: name.to_string(),
            source,
        })?;

        debug!(server = %name, command = %line.trim_end(), "sent console command");
        Ok(())
    }

    /// Buffered output lines of `name`, oldest first.
    pub async fn recent_output(&self, name: &str) -> Option<Vec<String>> {
        self.live_slot(name).await.map(|slot| slot.output.snapshot())
    }

    /// Start several processes concurrently.
    ///
    /// Every entry is attempted; results come back in input order.
    pub async fn start_many(
        &self,
        launches: Vec<(String, LaunchDescriptor)>,
    ) -> Vec<(String, SupervisorResult<StartReport>)> {
        let mut set = JoinSet::new();
        for (index, (name, launch)) in launches.into_iter().enumerate() {
            let this = self.clone();
            set.spawn(async move {
                let result = this.start(&name, &launch).await;
                (index, name, result)
            });
        }
        collect_ordered(set).await
    }

    /// Stop several processes concurrently.
    ///
    /// Every entry is attempted; results come back in input order.
    pub async fn stop_many(
        &self,
        targets: Vec<(String, ShutdownProtocol)>,
    ) -> Vec<(String, SupervisorResult<StopReport>)> {
        let mut set = JoinSet::new();
        for (index, (name, shutdown)) in targets.into_iter().enumerate() {
            let this = self.clone();
            set.spawn(async move {
                let result = this.stop(&name, &shutdown).await;
                (index, name, result)
            });
        }
        collect_ordered(set).await
    }
}

async fn collect_ordered<T: Send + 'static>(
    mut set: JoinSet<(usize, String, SupervisorResult<T>)>,
) -> Vec<(String, SupervisorResult<T>)> {
    let mut results = Vec::with_capacity(set.len());
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok(entry) => results.push(entry),
            Err(e) => warn!(error = %e, "supervisor task panicked"),
        }
    }
    results.sort_by_key(|(index, _, _)| *index);
    results
        .into_iter()
        .map(|(_, name, result)| (name, result))
        .collect()
}
