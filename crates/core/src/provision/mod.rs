//! Server directory provisioning.
//!
//! Creates the per-server directories, reports missing jars and start
//! scripts, repairs them from embedded templates and downloads, and checks
//! whether a server is still waiting for its EULA to be accepted.

pub mod error;
pub mod eula;
pub mod generator;
pub mod templates;

pub use error::{ProvisionError, ProvisionResult};
pub use eula::eula_pending;
pub use generator::{
    check_server_files, ensure_server_dirs, repair_missing, write_default_script, write_start_script,
    MAX_RAM_GB, MIN_RAM_GB,
};
