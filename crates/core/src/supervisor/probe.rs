//! TCP port liveness probe.
//!
//! A server process can be alive long before its listener is bound, so the
//! supervisor optionally confirms liveness by connecting to the server's
//! port on the loopback interface.

use super::error::{SupervisorError, SupervisorResult};
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;
use tokio::net::TcpStream;
use tracing::debug;

/// Connect to `127.0.0.1:port` within `timeout`.
///
/// Returns `Ok(())` when a connection is established (the port has a
/// listener). The connection is dropped immediately.
///
/// # Errors
///
/// - [`SupervisorError::ProbeTimeout`] if the connect does not finish in time
/// - [`SupervisorError::ProbeFailed`] if the connect is refused or fails
pub async fn probe_port(port: u16, timeout: Duration) -> SupervisorResult<()> {
    let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, port));

    match tokio::time::timeout(timeout, TcpStream::connect(addr)).await {
        Ok(Ok(_stream)) => {
            debug!(port, "port probe connected");
            Ok(())
        }
        Ok(Err(source)) => {
            debug!(port, error = %source, "port probe refused");
            Err(SupervisorError::ProbeFailed { port, source })
        }
        Err(_) => {
            debug!(port, ?timeout, "port probe timed out");
            Err(SupervisorError::ProbeTimeout { port, timeout })
        }
    }
}

/// Boolean form of [`probe_port`].
pub async fn port_is_listening(port: u16, timeout: Duration) -> bool {
    probe_port(port, timeout).await.is_ok()
}
