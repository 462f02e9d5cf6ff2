//! Headless subcommands.

use cc_core::fetch::{ArtifactSource, PaperApiClient};
use cc_core::layout::ServerLayout;
use cc_core::provision::{self, MAX_RAM_GB, MIN_RAM_GB};
use cc_core::service::{ControlService, ServiceHandle};
use cc_core::settings::SettingsStore;
use cc_core::supervisor::{port_is_listening, SupervisorConfig};
use cc_protocol::{Event, LifecycleState, Op, OpOutcome, ServerView};
use color_eyre::eyre::{bail, eyre, Result};
use colored::Colorize;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

const POLL_INTERVAL: Duration = Duration::from_secs(3);
const PROBE_TIMEOUT: Duration = Duration::from_secs(1);

/// Start every server, report status changes, stop everything on Ctrl-C.
pub async fn run(layout: ServerLayout, settings: SettingsStore) -> Result<()> {
    let config = SupervisorConfig::default();
    let shutdown_wait = config.graceful_timeout + config.forced_timeout + Duration::from_secs(5);

    let ServiceHandle {
        op_tx,
        mut event_rx,
        task,
    } = ControlService::spawn_default(layout, settings, config)?;

    op_tx.send(Op::StartAll).map_err(|_| eyre!("control service stopped"))?;
    println!("Starting servers, press Ctrl-C to stop them.");

    let mut poll = tokio::time::interval(POLL_INTERVAL);
    poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last_seen: HashMap<String, (LifecycleState, bool)> = HashMap::new();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = poll.tick() => {
                if op_tx.send(Op::RefreshStatus).is_err() {
                    break;
                }
            }
            event = event_rx.recv() => match event {
                Some(Event::StatusSnapshot { servers }) => print_changes(&servers, &mut last_seen),
                Some(event) => print_event(&event),
                None => break,
            },
        }
    }

    println!("Stopping servers...");
    info!("shutdown requested");
    if op_tx.send(Op::Shutdown).is_ok() && !wait_for_shutdown(&mut event_rx, shutdown_wait).await {
        warn!("servers did not confirm shutdown in time");
    }
    let _ = tokio::time::timeout(Duration::from_secs(5), task).await;
    Ok(())
}

async fn wait_for_shutdown(event_rx: &mut UnboundedReceiver<Event>, wait: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + wait;
    loop {
        match tokio::time::timeout_at(deadline, event_rx.recv()).await {
            Ok(Some(Event::ShutdownComplete)) => return true,
            Ok(Some(event)) => print_event(&event),
            Ok(None) | Err(_) => return false,
        }
    }
}

/// Print the servers whose state or port verdict changed since last time.
fn print_changes(servers: &[ServerView], last_seen: &mut HashMap<String, (LifecycleState, bool)>) {
    for server in servers {
        let now = (server.status.state, server.status.running);
        if last_seen.insert(server.name.clone(), now) != Some(now) {
            println!("{:<12} {}", server.name, describe_status(now.0, now.1));
        }
    }
}

fn describe_status(state: LifecycleState, running: bool) -> colored::ColoredString {
    match (state, running) {
        (LifecycleState::Running, true) => "online".green(),
        (LifecycleState::Running, false) => "booting".yellow(),
        (LifecycleState::Starting, _) => "starting".yellow(),
        (LifecycleState::Stopping, _) => "stopping".magenta(),
        (LifecycleState::Absent, _) => "stopped".dimmed(),
    }
}

fn print_event(event: &Event) {
    match event {
        Event::OperationCompleted { outcome } => print_outcome(outcome),
        Event::BulkCompleted { outcomes, .. } => outcomes.iter().for_each(print_outcome),
        Event::ServerExited { name, exit_code } => {
            let code = exit_code.map(|c| format!(" with code {c}")).unwrap_or_default();
            println!("{} {name} exited{code}", "!".red().bold());
        }
        Event::EulaPending { name, path } => {
            println!(
                "{} {name}: accept the Minecraft EULA by setting eula=true in {}",
                "!".yellow().bold(),
                path.display()
            );
        }
        Event::Log { message } => println!("{message}"),
        // Console output goes to the log at debug level only.
        Event::ServerOutput { name, line } => tracing::debug!(server = %name, "{line}"),
        _ => {}
    }
}

fn print_outcome(outcome: &OpOutcome) {
    if outcome.success {
        println!("{} {}: {}", "ok".green().bold(), outcome.name, outcome.message);
    } else {
        println!("{} {}: {}", "failed".red().bold(), outcome.name, outcome.message);
    }
}

/// Probe every server's port once.
///
/// Servers started by another craftctl process are only visible this way.
pub async fn status(layout: &ServerLayout, json: bool) -> Result<()> {
    let mut rows = Vec::with_capacity(layout.servers().len());
    for def in layout.servers() {
        rows.push((def, port_is_listening(def.port, PROBE_TIMEOUT).await));
    }

    if json {
        let value: Vec<_> = rows
            .iter()
            .map(|(def, listening)| {
                serde_json::json!({
                    "name": def.name,
                    "kind": def.kind,
                    "port": def.port,
                    "listening": listening,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    for (def, listening) in rows {
        let state = if listening { "listening".green() } else { "down".dimmed() };
        println!("{:<12} {:>5}  {state}", def.name, def.port);
    }
    Ok(())
}

pub fn check(layout: &ServerLayout) -> Result<()> {
    provision::ensure_server_dirs(layout)?;
    let missing = provision::check_server_files(layout);

    if missing.is_empty() {
        println!("{}", "All server files are present.".green());
        return Ok(());
    }

    println!("{} file(s) missing:", missing.len());
    for item in &missing {
        println!("  {item}");
    }
    println!("Run `craftctl repair` to download and write them.");
    Ok(())
}

pub async fn repair(layout: &ServerLayout, settings: &SettingsStore, version: Option<String>) -> Result<()> {
    let version = version
        .filter(|v| !v.trim().is_empty())
        .or_else(|| settings.paper_version());
    let source = PaperApiClient::new()?;

    let outcomes = provision::repair_missing(layout, &source, version.as_deref()).await?;
    if let Some(version) = &version {
        settings.set_paper_version(version)?;
    }

    if outcomes.is_empty() {
        println!("Nothing to repair.");
        return Ok(());
    }
    outcomes.iter().for_each(print_outcome);

    let failed = outcomes.iter().filter(|o| !o.success).count();
    if failed > 0 {
        bail!("{failed} server(s) could not be repaired");
    }
    Ok(())
}

pub async fn versions(json: bool) -> Result<()> {
    let versions = PaperApiClient::new()?.list_versions().await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&versions)?);
    } else {
        versions.iter().for_each(|v| println!("{v}"));
    }
    Ok(())
}

pub fn set_count(settings: &SettingsStore, count: u32) -> Result<()> {
    settings.set_backend_count(count)?;
    println!("Backend server count set to {count}.");
    Ok(())
}

pub fn set_ram(layout: &ServerLayout, server: &str, gigabytes: u32) -> Result<()> {
    let Some(def) = layout.get(server) else {
        let names: Vec<_> = layout.servers().iter().map(|d| d.name.as_str()).collect();
        bail!("unknown server {server:?}; expected one of: {}", names.join(", "));
    };
    if !(MIN_RAM_GB..=MAX_RAM_GB).contains(&gigabytes) {
        bail!("max RAM must be between {MIN_RAM_GB} and {MAX_RAM_GB} GB");
    }

    provision::write_start_script(def, gigabytes)?;
    println!("{server}: max RAM set to {gigabytes} GB.");
    Ok(())
}
