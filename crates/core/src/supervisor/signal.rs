//! Forced termination of managed processes.
//!
//! The supervisor never kills a child directly; it goes through a
//! [`Signaller`] so the forced path can be observed in tests.

use std::fmt::Debug;
use std::io;
use tokio::process::Child;

/// Delivers the forced-termination request to a child process.
pub trait Signaller: Send + Sync + Debug {
    /// Ask the OS to terminate `child`. `name` is the registry name.
    ///
    /// Returning `Ok` only means the request was delivered; the supervisor
    /// still waits for the process to exit.
    fn terminate(&self, name: &str, child: &mut Child) -> io::Result<()>;
}

/// Default signaller.
///
/// On Unix every child leads its own process group, and SIGTERM goes to the
/// whole group: a start script and the server it launched stop together.
/// Elsewhere it falls back to `TerminateProcess` through
/// [`Child::start_kill`].
#[derive(Debug, Default, Clone, Copy)]
pub struct OsSignaller;

impl Signaller for OsSignaller {
    fn terminate(&self, _name: &str, child: &mut Child) -> io::Result<()> {
        #[cfg(unix)]
        {
            use nix::errno::Errno;
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            let Some(pid) = child.id() else {
                // Already reaped.
                return Ok(());
            };
            let pgid = i32::try_from(pid).map_err(|_| io::Error::from(io::ErrorKind::InvalidInput))?;
            match kill(Pid::from_raw(-pgid), Signal::SIGTERM) {
                Ok(()) => Ok(()),
                // The group is gone but the leader is not reaped yet.
                Err(Errno::ESRCH) => Ok(()),
                Err(e) => Err(io::Error::from(e)),
            }
        }

        #[cfg(not(unix))]
        {
            child.start_kill()
        }
    }
}
