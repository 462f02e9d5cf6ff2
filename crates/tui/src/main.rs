//! Standalone TUI binary.
//!
//! Uses the settings file next to the executable; the backend count must
//! already be set (the `craftctl` binary prompts for it).

use anyhow::{bail, Result};
use cc_core::layout::ServerLayout;
use cc_core::settings::SettingsStore;
use cc_core::supervisor::SupervisorConfig;
use cc_tui::{init_file_logging, run_app};
use std::path::Path;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = SettingsStore::beside_executable();
    let Some(count) = settings.backend_count() else {
        bail!(
            "backend server count is not set in {}; run `craftctl` once to choose it",
            settings.path().display()
        );
    };

    let base_dir = settings.path().parent().unwrap_or(Path::new(".")).to_path_buf();
    let _log_guard = init_file_logging(&base_dir)?;

    run_app(ServerLayout::build(&base_dir, count), settings, SupervisorConfig::default()).await
}
