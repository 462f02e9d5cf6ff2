//! Embedded start script templates.
//!
//! Files under the repository's `templates/start/` directory are embedded
//! at compile time. Placeholders use `{{NAME}}` syntax:
//!
//! - `{{HEAP}}`: value for `-Xmx`, e.g. `2G`
//! - `{{JAR}}`: jar file name
//! - `{{SERVER_DIR}}`: absolute server directory (batch files only)

use super::error::{ProvisionError, ProvisionResult};
use cc_protocol::ServerKind;
use rust_embed::RustEmbed;
use std::path::Path;

/// Embedded template files from the `templates/` directory.
#[derive(RustEmbed)]
#[folder = "$CARGO_MANIFEST_DIR/../../templates"]
pub struct TemplateAssets;

/// Get template file content by path relative to `templates/`.
pub fn get_template(path: &str) -> Option<String> {
    TemplateAssets::get(path).map(|file| String::from_utf8_lossy(file.data.as_ref()).to_string())
}

/// Template path for a server kind on this platform.
pub fn start_template_path(kind: ServerKind) -> String {
    let stem = match kind {
        ServerKind::Proxy => "proxy",
        ServerKind::Backend => "backend",
    };
    let ext = if cfg!(windows) { "bat" } else { "sh" };
    format!("start/{stem}.{ext}")
}

/// Render the start script for one server.
pub fn render_start_script(kind: ServerKind, heap: &str, jar: &str, server_dir: &Path) -> ProvisionResult<String> {
    let path = start_template_path(kind);
    let template = get_template(&path).ok_or(ProvisionError::TemplateNotFound(path))?;

    Ok(template
        .replace("{{HEAP}}", heap)
        .replace("{{JAR}}", jar)
        .replace("{{SERVER_DIR}}", &server_dir.display().to_string()))
}
