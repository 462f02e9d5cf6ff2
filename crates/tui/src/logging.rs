//! File logging for the TUI.
//!
//! The terminal belongs to the UI, so tracing output goes to a log file
//! through a non-blocking `tracing-appender` writer instead.

use anyhow::Result;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

pub const LOG_FILE: &str = "craftctl.log";

/// Used when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "craftctl=info,cc_core=info,cc_tui=info";

/// Send tracing output to `dir/craftctl.log`.
///
/// Keep the returned guard alive for the life of the program; dropping it
/// flushes and closes the file.
pub fn init_file_logging(dir: &Path) -> Result<WorkerGuard> {
    std::fs::create_dir_all(dir)?;
    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, LOG_FILE));

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(writer).with_ansi(false))
        .try_init()?;

    Ok(guard)
}
