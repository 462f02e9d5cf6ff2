//! craftctl - control panel for a BungeeCord proxy and its Paper servers.
//!
//! # Usage
//!
//! ```bash
//! # Interactive panel
//! craftctl
//!
//! # Start everything, print status changes, Ctrl-C stops everything
//! craftctl run
//!
//! # Provisioning
//! craftctl check
//! craftctl repair --version 1.20.4
//! craftctl versions
//!
//! # Settings
//! craftctl set-count 3
//! craftctl set-ram "Paper 1" 4
//! ```

mod commands;
mod prompt;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{eyre, Result};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use cc_core::layout::{ServerLayout, MAX_BACKENDS, MIN_BACKENDS};
use cc_core::settings::SettingsStore;

/// Used when `RUST_LOG` is not set.
const DEFAULT_LOG_FILTER: &str = "craftctl=info,cc_core=info";

#[derive(Parser)]
#[command(name = "craftctl")]
#[command(about = "Control panel for a BungeeCord proxy and its Paper servers", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Directory that holds `servers/` (defaults to the config file's directory)
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,

    /// Settings file (defaults to config.json next to the executable)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Number of backend servers for this run, overriding the settings file
    #[arg(long, global = true, value_parser = clap::value_parser!(u32).range(MIN_BACKENDS as i64..=MAX_BACKENDS as i64))]
    backends: Option<u32>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start every server and keep them running until Ctrl-C
    Run,

    /// Show which servers are listening on their ports
    Status {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// List missing server jars and start scripts
    Check,

    /// Download missing jars and write missing start scripts
    Repair {
        /// Paper version for backend jars (defaults to the last one used)
        #[arg(long)]
        version: Option<String>,
    },

    /// List available Paper versions, newest first
    Versions {
        /// Print JSON instead of one version per line
        #[arg(long)]
        json: bool,
    },

    /// Save the number of backend servers
    SetCount {
        count: u32,
    },

    /// Rewrite a server's start script with a new max heap
    SetRam {
        /// Server name, e.g. "Paper 1" or "BungeeCord"
        server: String,
        /// Max heap in gigabytes (1-64)
        gigabytes: u32,
    },
}

/// Where settings and servers live for this invocation.
struct Context {
    settings: SettingsStore,
    base_dir: PathBuf,
    backends: Option<u32>,
}

impl Context {
    fn from_cli(cli: &Cli) -> Self {
        let settings = match &cli.config {
            Some(path) => SettingsStore::new(path),
            None => SettingsStore::beside_executable(),
        };
        let base_dir = cli.base_dir.clone().unwrap_or_else(|| {
            settings
                .path()
                .parent()
                .filter(|dir| !dir.as_os_str().is_empty())
                .unwrap_or(Path::new("."))
                .to_path_buf()
        });

        Self {
            settings,
            base_dir,
            backends: cli.backends,
        }
    }

    /// Layout for the configured backend count, prompting if it was never set.
    fn layout(&self) -> Result<ServerLayout> {
        let count = match self.backends.or_else(|| self.settings.backend_count()) {
            Some(count) => count,
            None => {
                let count = prompt::ask_backend_count(std::io::stdin().lock(), std::io::stderr())?;
                self.settings.set_backend_count(count)?;
                count
            }
        };
        Ok(ServerLayout::build(&self.base_dir, count))
    }
}

fn init_stderr_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    let ctx = Context::from_cli(&cli);

    let Some(command) = cli.command else {
        // No subcommand: the interactive panel, logging to a file.
        let layout = ctx.layout()?;
        let _log_guard = cc_tui::init_file_logging(&ctx.base_dir).map_err(|e| eyre!(e))?;
        return cc_tui::run_app(layout, ctx.settings, Default::default())
            .await
            .map_err(|e| eyre!(e));
    };

    init_stderr_logging();

    match command {
        Commands::Run => commands::run(ctx.layout()?, ctx.settings).await,
        Commands::Status { json } => commands::status(&ctx.layout()?, json).await,
        Commands::Check => commands::check(&ctx.layout()?),
        Commands::Repair { version } => commands::repair(&ctx.layout()?, &ctx.settings, version).await,
        Commands::Versions { json } => commands::versions(json).await,
        Commands::SetCount { count } => commands::set_count(&ctx.settings, count),
        Commands::SetRam { server, gigabytes } => commands::set_ram(&ctx.layout()?, &server, gigabytes),
    }
}
