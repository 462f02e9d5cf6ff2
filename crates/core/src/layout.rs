//! On-disk server layout.
//!
//! The panel manages one proxy and `N` backends under `<base>/servers/`.
//! Every name, directory, port and shutdown command is derived here so the
//! rest of the crate never hardcodes them.

use cc_protocol::{LaunchDescriptor, ServerKind, ShutdownProtocol};
use std::path::{Path, PathBuf};

pub const PROXY_NAME: &str = "BungeeCord";
pub const PROXY_DIR: &str = "bungee";
pub const PROXY_JAR: &str = "BungeeCord.jar";
pub const PROXY_PORT: u16 = 25577;

pub const BACKEND_JAR: &str = "paper.jar";
pub const BACKEND_BASE_PORT: u16 = 25565;

pub const MIN_BACKENDS: u32 = 1;
pub const MAX_BACKENDS: u32 = 100;

/// File name of the start script on this platform.
pub fn script_file_name() -> &'static str {
    if cfg!(windows) {
        "start.bat"
    } else {
        "start.sh"
    }
}

/// Display name of backend `index` (1-based).
pub fn backend_name(index: u32) -> String {
    format!("Paper {index}")
}

/// Everything needed to provision, launch and stop one server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerDefinition {
    pub name: String,
    pub kind: ServerKind,
    pub dir: PathBuf,
    pub script: PathBuf,
    pub jar: PathBuf,
    pub port: u16,
    pub shutdown: ShutdownProtocol,
}

impl ServerDefinition {
    fn new(name: String, kind: ServerKind, dir: PathBuf, jar: &str, port: u16, command: &str) -> Self {
        Self {
            name,
            kind,
            script: dir.join(script_file_name()),
            jar: dir.join(jar),
            dir,
            port,
            shutdown: ShutdownProtocol::new(command),
        }
    }

    /// Piped launch descriptor for the start script.
    pub fn launch_descriptor(&self) -> LaunchDescriptor {
        LaunchDescriptor::for_script(&self.script).with_cwd(&self.dir)
    }

    pub fn is_proxy(&self) -> bool {
        self.kind == ServerKind::Proxy
    }
}

/// The proxy followed by backends `1..=N`.
#[derive(Debug, Clone)]
pub struct ServerLayout {
    base_dir: PathBuf,
    servers: Vec<ServerDefinition>,
}

impl ServerLayout {
    /// Build the layout under `base_dir`.
    ///
    /// Relative base directories are resolved against the current directory
    /// so script paths stay valid once the child changes directory.
    /// `backend_count` is clamped to the supported range.
    pub fn build(base_dir: impl AsRef<Path>, backend_count: u32) -> Self {
        let base_dir = absolute(base_dir.as_ref());
        let servers_root = base_dir.join("servers");
        let count = backend_count.clamp(MIN_BACKENDS, MAX_BACKENDS);

        let mut servers = Vec::with_capacity(count as usize + 1);
        servers.push(ServerDefinition::new(
            PROXY_NAME.to_string(),
            ServerKind::Proxy,
            servers_root.join(PROXY_DIR),
            PROXY_JAR,
            PROXY_PORT,
            "end",
        ));
        for index in 1..=count {
            servers.push(ServerDefinition::new(
                backend_name(index),
                ServerKind::Backend,
                servers_root.join(format!("paper{index}")),
                BACKEND_JAR,
                BACKEND_BASE_PORT + index as u16,
                "stop",
            ));
        }

        Self { base_dir, servers }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn servers(&self) -> &[ServerDefinition] {
        &self.servers
    }

    pub fn get(&self, name: &str) -> Option<&ServerDefinition> {
        self.servers.iter().find(|s| s.name == name)
    }

    pub fn backends(&self) -> impl Iterator<Item = &ServerDefinition> {
        self.servers.iter().filter(|s| s.kind == ServerKind::Backend)
    }

    pub fn proxy(&self) -> Option<&ServerDefinition> {
        self.servers.iter().find(|s| s.is_proxy())
    }

    pub fn backend_count(&self) -> usize {
        self.backends().count()
    }
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}
