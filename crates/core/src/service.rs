//! Control service.
//!
//! The ControlService is the bridge between a front-end and the Core. It
//! receives `Op`s over a channel, runs each one in its own task and reports
//! results as `Event`s, so the front-end never blocks on a spawn, a stop or
//! a download.

use crate::fetch::{ArtifactSource, FetchResult, PaperApiClient};
use crate::layout::{ServerDefinition, ServerLayout};
use crate::provision::{self, eula::EULA_FILE};
use crate::settings::SettingsStore;
use crate::supervisor::{StopReport, Supervisor, SupervisorConfig, SupervisorError};
use cc_protocol::{BulkAction, Event, Op, OpOutcome, ServerView};
use std::sync::Arc;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Channels of a service running in the background.
pub struct ServiceHandle {
    pub op_tx: UnboundedSender<Op>,
    pub event_rx: UnboundedReceiver<Event>,
    pub task: JoinHandle<()>,
}

/// Routes operations to the supervisor, provisioning and settings.
pub struct ControlService {
    supervisor: Supervisor,
    layout: RwLock<ServerLayout>,
    settings: SettingsStore,
    source: Arc<dyn ArtifactSource>,
    events_tx: UnboundedSender<Event>,
}

impl ControlService {
    /// Create a new ControlService.
    ///
    /// # Arguments
    ///
    /// * `supervisor` - Supervisor that owns the server processes
    /// * `layout` - Server layout for the configured backend count
    /// * `settings` - Persistent settings store
    /// * `source` - Where jars and version lists come from
    /// * `events_tx` - Channel for sending events to the front-end
    pub fn new(
        supervisor: Supervisor,
        layout: ServerLayout,
        settings: SettingsStore,
        source: Arc<dyn ArtifactSource>,
        events_tx: UnboundedSender<Event>,
    ) -> Self {
        Self {
            supervisor,
            layout: RwLock::new(layout),
            settings,
            source,
            events_tx,
        }
    }

    /// Build a service around a fresh supervisor and run it on a new task.
    ///
    /// Supervisor events and service events share one channel.
    pub fn spawn(
        layout: ServerLayout,
        settings: SettingsStore,
        config: SupervisorConfig,
        source: Arc<dyn ArtifactSource>,
    ) -> ServiceHandle {
        let (op_tx, op_rx) = unbounded_channel();
        let (events_tx, event_rx) = unbounded_channel();

        let supervisor = Supervisor::new(config).with_events(events_tx.clone());
        let service = Arc::new(Self::new(supervisor, layout, settings, source, events_tx));
        let task = tokio::spawn(service.run(op_rx));

        ServiceHandle { op_tx, event_rx, task }
    }

    /// [`ControlService::spawn`] with artifacts from the public PaperMC API.
    pub fn spawn_default(
        layout: ServerLayout,
        settings: SettingsStore,
        config: SupervisorConfig,
    ) -> FetchResult<ServiceHandle> {
        let source: Arc<dyn ArtifactSource> = Arc::new(PaperApiClient::new()?);
        Ok(Self::spawn(layout, settings, config, source))
    }

    pub fn supervisor(&self) -> &Supervisor {
        &self.supervisor
    }

    /// Copy of the current layout.
    pub async fn layout(&self) -> ServerLayout {
        self.layout.read().await.clone()
    }

    async fn definition(&self, name: &str) -> Option<ServerDefinition> {
        self.layout.read().await.get(name).cloned()
    }

    fn emit(&self, event: Event) {
        if self.events_tx.send(event).is_err() {
            debug!("event receiver dropped");
        }
    }

    fn emit_outcome(&self, outcome: OpOutcome) {
        self.emit(Event::OperationCompleted { outcome });
    }

    fn log(&self, message: impl Into<String>) {
        self.emit(Event::Log {
            message: message.into(),
        });
    }

    /// Register every server in the layout with the supervisor.
    ///
    /// Names that are no longer part of the layout are dropped once they have
    /// no running process.
    pub async fn register_layout(&self) {
        let layout = self.layout().await;
        for name in self.supervisor.registered_names().await {
            if layout.get(&name).is_none() && self.supervisor.unregister(&name).await {
                debug!(server = %name, "no longer in the layout");
            }
        }
        for def in layout.servers() {
            self.supervisor.register(&def.name).await;
        }
    }

    /// Process operations until `Op::Shutdown` or until the channel closes.
    ///
    /// Every operation other than `Shutdown` runs in its own task.
    pub async fn run(self: Arc<Self>, mut op_rx: UnboundedReceiver<Op>) {
        self.register_layout().await;

        while let Some(op) = op_rx.recv().await {
            if op == Op::Shutdown {
                self.handle(op).await;
                break;
            }

            let service = Arc::clone(&self);
            tokio::spawn(async move {
                service.handle(op).await;
            });
        }

        debug!("control service stopped");
    }

    /// Execute one operation and emit its events.
    pub async fn handle(&self, op: Op) {
        debug!(?op, "handling operation");

        match op {
            Op::StartServer { name } => self.start_server(&name).await,
            Op::StopServer { name } => self.stop_server(&name).await,
            Op::StartAll => self.start_all().await,
            Op::StopAll => self.stop_all().await,
            Op::SendCommand { name, line } => {
                let result = self.supervisor.send_command(&name, &line).await;
                self.emit_outcome(OpOutcome::from_result(&name, &result, |()| format!("sent: {line}")));
            }
            Op::RefreshStatus => {
                let servers = self.status_views().await;
                self.emit(Event::StatusSnapshot { servers });
            }
            Op::CheckFiles => self.check_files().await,
            Op::Repair { version } => self.repair(version).await,
            Op::ListVersions => match self.source.list_versions().await {
                Ok(versions) => self.emit(Event::VersionsLoaded { versions }),
                Err(e) => {
                    warn!(error = %e, "could not load version list");
                    self.emit_outcome(OpOutcome::failed("versions", e.to_string()));
                }
            },
            Op::SetMaxRam { name, gigabytes } => {
                let outcome = match self.definition(&name).await {
                    Some(def) => {
                        let result = provision::write_start_script(&def, gigabytes);
                        OpOutcome::from_result(&name, &result, |()| format!("max RAM set to {gigabytes} GB"))
                    }
                    None => unknown_server(&name),
                };
                self.emit_outcome(outcome);
            }
            Op::SetBackendCount { count } => self.set_backend_count(count).await,
            Op::Shutdown => self.shutdown().await,
        }
    }

    async fn start_server(&self, name: &str) {
        let Some(def) = self.definition(name).await else {
            self.emit_outcome(unknown_server(name));
            return;
        };

        let result = self.supervisor.start(&def.name, &def.launch_descriptor()).await;
        let started = result.is_ok();
        self.emit_outcome(OpOutcome::from_result(&def.name, &result, |report| match report.pid {
            Some(pid) => format!("started (pid {pid})"),
            None => "started".to_string(),
        }));

        if started {
            self.check_eula(&def);
        }
    }

    fn check_eula(&self, def: &ServerDefinition) {
        if provision::eula_pending(&def.dir) {
            info!(server = %def.name, "EULA not accepted yet");
            self.emit(Event::EulaPending {
                name: def.name.clone(),
                path: def.dir.join(EULA_FILE),
            });
        }
    }

    async fn stop_server(&self, name: &str) {
        let Some(def) = self.definition(name).await else {
            self.emit_outcome(unknown_server(name));
            return;
        };

        let result = self.supervisor.stop(&def.name, &def.shutdown).await;
        self.emit_outcome(OpOutcome::from_result(&def.name, &result, describe_stop));
    }

    async fn start_all(&self) {
        let layout = self.layout().await;
        let launches = layout
            .servers()
            .iter()
            .map(|def| (def.name.clone(), def.launch_descriptor()))
            .collect();

        let results = self.supervisor.start_many(launches).await;
        let mut outcomes = Vec::with_capacity(results.len());
        for (name, result) in results {
            if result.is_ok() {
                if let Some(def) = layout.get(&name) {
                    self.check_eula(def);
                }
            }
            outcomes.push(OpOutcome::from_result(&name, &result, |_| "started".to_string()));
        }

        self.emit(Event::BulkCompleted {
            action: BulkAction::StartAll,
            outcomes,
        });
    }

    async fn stop_all(&self) {
        let layout = self.layout().await;
        let targets = layout
            .servers()
            .iter()
            .map(|def| (def.name.clone(), def.shutdown.clone()))
            .collect();

        let outcomes = self
            .supervisor
            .stop_many(targets)
            .await
            .into_iter()
            .map(|(name, result)| match result {
                Err(SupervisorError::NotRunning { .. }) => OpOutcome::ok(name, "was not running"),
                result => OpOutcome::from_result(name, &result, describe_stop),
            })
            .collect();

        self.emit(Event::BulkCompleted {
            action: BulkAction::StopAll,
            outcomes,
        });
    }

    /// Status of every server in layout order, probing each one's port.
    pub async fn status_views(&self) -> Vec<ServerView> {
        let layout = self.layout().await;
        let mut views = Vec::with_capacity(layout.servers().len());
        for def in layout.servers() {
            let status = self.supervisor.snapshot(&def.name, Some(def.port)).await;
            views.push(ServerView {
                name: def.name.clone(),
                kind: def.kind,
                port: Some(def.port),
                status,
            });
        }
        views
    }

    async fn check_files(&self) {
        let layout = self.layout().await;
        if let Err(e) = provision::ensure_server_dirs(&layout) {
            self.emit_outcome(OpOutcome::failed("check", e.to_string()));
            return;
        }

        let items = provision::check_server_files(&layout);
        if items.is_empty() {
            self.log("All server files are present");
        }
        self.emit(Event::MissingFiles { items });
    }

    async fn repair(&self, version: Option<String>) {
        let version = version
            .filter(|v| !v.trim().is_empty())
            .or_else(|| self.settings.paper_version());
        let layout = self.layout().await;

        self.log("Repairing missing server files...");
        match provision::repair_missing(&layout, self.source.as_ref(), version.as_deref()).await {
            Ok(outcomes) => {
                if let Some(version) = &version {
                    if let Err(e) = self.settings.set_paper_version(version) {
                        warn!(error = %e, "could not save server version");
                    }
                }
                if outcomes.is_empty() {
                    self.log("Nothing to repair");
                }
                self.emit(Event::BulkCompleted {
                    action: BulkAction::Repair,
                    outcomes,
                });
            }
            Err(e) => {
                warn!(error = %e, "repair failed");
                self.emit_outcome(OpOutcome::failed("repair", e.to_string()));
            }
        }
    }

    async fn set_backend_count(&self, count: u32) {
        if let Err(e) = self.settings.set_backend_count(count) {
            self.emit_outcome(OpOutcome::failed("backends", e.to_string()));
            return;
        }

        {
            let mut layout = self.layout.write().await;
            *layout = ServerLayout::build(layout.base_dir().to_path_buf(), count);
        }
        self.register_layout().await;

        info!(count, "backend count updated");
        self.emit_outcome(OpOutcome::ok("backends", format!("backend count set to {count}")));
    }

    async fn shutdown(&self) {
        let layout = self.layout().await;
        let live = self.supervisor.live_names().await;
        let targets = live
            .into_iter()
            .map(|name| {
                let shutdown = layout
                    .get(&name)
                    .map(|def| def.shutdown.clone())
                    .unwrap_or_default();
                (name, shutdown)
            })
            .collect();

        for (name, result) in self.supervisor.stop_many(targets).await {
            if let Err(e) = result {
                warn!(server = %name, error = %e, "could not stop during shutdown");
            }
        }

        info!("all servers stopped");
        self.emit(Event::ShutdownComplete);
    }
}

fn unknown_server(name: &str) -> OpOutcome {
    OpOutcome::failed(name, format!("unknown server: {name}"))
}

fn describe_stop(report: &StopReport) -> String {
    if report.forced {
        "stopped (forced)".to_string()
    } else {
        "stopped".to_string()
    }
}
