//! Server directory preparation and repair.

use super::error::{ProvisionError, ProvisionResult};
use super::templates::render_start_script;
use crate::fetch::ArtifactSource;
use crate::layout::{ServerDefinition, ServerLayout};
use cc_protocol::{MissingItem, MissingKind, OpOutcome, ServerKind};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

pub const MIN_RAM_GB: u32 = 1;
pub const MAX_RAM_GB: u32 = 64;

const DEFAULT_BACKEND_HEAP: &str = "2G";
const DEFAULT_PROXY_HEAP: &str = "512M";

/// Create every server directory in `layout`.
pub fn ensure_server_dirs(layout: &ServerLayout) -> ProvisionResult<()> {
    for def in layout.servers() {
        fs::create_dir_all(&def.dir).map_err(|source| ProvisionError::DirectoryCreate {
            path: def.dir.clone(),
            source,
        })?;
    }
    Ok(())
}

/// Files each server needs but does not have, in layout order.
pub fn check_server_files(layout: &ServerLayout) -> Vec<MissingItem> {
    layout.servers().iter().flat_map(missing_for).collect()
}

fn missing_for(def: &ServerDefinition) -> Vec<MissingItem> {
    let mut missing = Vec::new();
    if !def.jar.exists() {
        missing.push(MissingItem {
            server: def.name.clone(),
            kind: MissingKind::Jar,
            path: def.jar.clone(),
        });
    }
    if !def.script.exists() {
        missing.push(MissingItem {
            server: def.name.clone(),
            kind: MissingKind::StartScript,
            path: def.script.clone(),
        });
    }
    missing
}

fn write_file(path: &Path, content: &[u8]) -> ProvisionResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| ProvisionError::DirectoryCreate {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, content).map_err(|source| ProvisionError::FileWrite {
        path: path.to_path_buf(),
        source,
    })
}

fn write_script(def: &ServerDefinition, heap: &str) -> ProvisionResult<()> {
    let content = render_start_script(def.kind, heap, &file_label(&def.jar), &def.dir)?;
    write_file(&def.script, content.as_bytes())?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&def.script, fs::Permissions::from_mode(0o755)).map_err(|source| {
            ProvisionError::FileWrite {
                path: def.script.clone(),
                source,
            }
        })?;
    }

    Ok(())
}

/// Write the default start script for `def`.
pub fn write_default_script(def: &ServerDefinition) -> ProvisionResult<()> {
    let heap = match def.kind {
        ServerKind::Proxy => DEFAULT_PROXY_HEAP,
        ServerKind::Backend => DEFAULT_BACKEND_HEAP,
    };
    write_script(def, heap)
}

/// Rewrite the start script of `def` with a `max_ram_gb` heap.
///
/// # Errors
///
/// [`ProvisionError::InvalidRam`] unless `max_ram_gb` is within 1..=64.
pub fn write_start_script(def: &ServerDefinition, max_ram_gb: u32) -> ProvisionResult<()> {
    if !(MIN_RAM_GB..=MAX_RAM_GB).contains(&max_ram_gb) {
        return Err(ProvisionError::InvalidRam { value: max_ram_gb });
    }
    write_script(def, &format!("{max_ram_gb}G"))?;
    info!(server = %def.name, max_ram_gb, "start script updated");
    Ok(())
}

/// Fill in every missing start script and jar.
///
/// Backend jars are downloaded for `version` at its latest build. Each
/// server is repaired independently; the returned outcomes have one entry
/// per server that needed work. Servers that were already complete are
/// skipped.
///
/// # Errors
///
/// - [`ProvisionError::NoVersion`] if a backend jar is missing and `version`
///   is empty
/// - [`ProvisionError::Fetch`] if the latest build cannot be resolved
pub async fn repair_missing(
    layout: &ServerLayout,
    source: &dyn ArtifactSource,
    version: Option<&str>,
) -> ProvisionResult<Vec<OpOutcome>> {
    let version = version.map(str::trim).filter(|v| !v.is_empty());

    let needs_backend_jar = layout.backends().any(|def| !def.jar.exists());
    let backend_build = match (needs_backend_jar, version) {
        (false, _) => None,
        (true, None) => return Err(ProvisionError::NoVersion),
        (true, Some(version)) => Some((version, source.resolve_latest(version).await?)),
    };

    let mut outcomes = Vec::new();
    for def in layout.servers() {
        let mut missing = missing_for(def);
        if missing.is_empty() {
            continue;
        }
        // Scripts before jars.
        missing.sort_by_key(|item| item.kind == MissingKind::Jar);

        let mut done = Vec::new();
        let mut failure = None;

        for item in &missing {
            let result = match item.kind {
                MissingKind::StartScript => write_default_script(def).map(|()| "start script".to_string()),
                MissingKind::Jar => {
                    let url = match (def.kind, backend_build) {
                        (ServerKind::Proxy, _) => source.proxy_jar_url(),
                        (ServerKind::Backend, Some((version, build))) => source.backend_jar_url(version, build),
                        (ServerKind::Backend, None) => {
                            failure = Some(ProvisionError::NoVersion.to_string());
                            break;
                        }
                    };
                    download_to(source, &url, &def.jar).await.map(|()| file_label(&def.jar))
                }
            };

            match result {
                Ok(what) => done.push(what),
                Err(e) => {
                    failure = Some(e.to_string());
                    break;
                }
            }
        }

        let outcome = match failure {
            None => {
                info!(server = %def.name, repaired = ?done, "repaired");
                OpOutcome::ok(&def.name, format!("restored {}", done.join(", ")))
            }
            Some(reason) => {
                warn!(server = %def.name, %reason, "repair failed");
                OpOutcome::failed(&def.name, reason)
            }
        };
        outcomes.push(outcome);
    }

    Ok(outcomes)
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

async fn download_to(source: &dyn ArtifactSource, url: &str, path: &Path) -> ProvisionResult<()> {
    let bytes = source.download(url).await?;
    write_file(path, &bytes)
}
