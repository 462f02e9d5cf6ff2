//! # cc-tui
//!
//! Terminal user interface for craftctl.
//!
//! The UI talks to `cc-core` only through the `Op`/`Event` channels of a
//! spawned `ControlService`: it sends operations from key presses and slash
//! commands and redraws from the events it gets back.

pub mod app;
pub mod event;
pub mod event_handler;
pub mod logging;
pub mod tui;
pub mod widgets;

pub use app::App;
pub use logging::init_file_logging;
pub use tui::Tui;

use anyhow::Result;
use cc_core::layout::ServerLayout;
use cc_core::service::{ControlService, ServiceHandle};
use cc_core::settings::SettingsStore;
use cc_core::supervisor::SupervisorConfig;
use std::time::Duration;
use tracing::{info, warn};

/// Extra time on top of the stop timeouts before giving up on shutdown.
const SHUTDOWN_SLACK: Duration = Duration::from_secs(5);

/// Run the TUI until the user quits, then stop every server.
///
/// # Errors
///
/// Fails if the terminal cannot be set up or the HTTP client for
/// downloads cannot be built.
pub async fn run_app(layout: ServerLayout, settings: SettingsStore, config: SupervisorConfig) -> Result<()> {
    let shutdown_wait = config.graceful_timeout + config.forced_timeout + SHUTDOWN_SLACK;

    let ServiceHandle { op_tx, event_rx, task } =
        ControlService::spawn_default(layout.clone(), settings, config)?;
    info!(servers = layout.servers().len(), "starting TUI");

    let mut app = App::new(op_tx, event_rx).with_layout(&layout);
    let mut tui = Tui::init()?;
    let result = app.run(&mut tui).await;
    tui.restore()?;
    drop(tui);

    println!("Stopping servers...");
    if !app.shut_down(shutdown_wait).await {
        warn!("servers did not confirm shutdown in time");
        eprintln!("Some servers may still be running.");
    }
    if tokio::time::timeout(SHUTDOWN_SLACK, task).await.is_err() {
        warn!("control service did not stop");
    }

    result
}
