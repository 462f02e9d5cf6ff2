//! EULA acceptance check.

use std::path::Path;

pub const EULA_FILE: &str = "eula.txt";

/// Whether the server in `dir` is waiting for its EULA to be accepted.
///
/// True when `eula.txt` exists and its `eula=` line is anything other than
/// `eula=true`. An unreadable file counts as pending; a missing file does
/// not (the server has not generated it yet).
pub fn eula_pending(dir: &Path) -> bool {
    let path = dir.join(EULA_FILE);
    if !path.exists() {
        return false;
    }

    match std::fs::read_to_string(&path) {
        Ok(content) => content
            .lines()
            .map(str::trim)
            .find(|line| line.to_ascii_lowercase().starts_with("eula="))
            .map_or(true, |line| !line.eq_ignore_ascii_case("eula=true")),
        Err(_) => true,
    }
}
