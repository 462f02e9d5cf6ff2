//! Managed process records.
//!
//! A record is created when `start` spawns a process and dropped when the
//! process is confirmed gone. The OS handle sits behind an async mutex that
//! serialises start/stop for one name; the lifecycle state sits behind a
//! plain mutex so status checks can read it while a stop is in progress.

use cc_protocol::{LifecycleState, ServerStatus, StdioMode};
use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, ChildStdin};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, trace};

use cc_protocol::Event;

/// Bounded buffer of the most recent output lines of one process.
#[derive(Debug, Clone)]
pub struct OutputBuffer {
    lines: Arc<Mutex<VecDeque<String>>>,
    capacity: usize,
}

impl OutputBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: Arc::new(Mutex::new(VecDeque::with_capacity(capacity.min(64)))),
            capacity,
        }
    }

    fn guard(&self) -> MutexGuard<'_, VecDeque<String>> {
        self.lines.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a line, evicting the oldest one when full.
    pub fn push(&self, line: String) {
        if self.capacity == 0 {
            return;
        }
        let mut lines = self.guard();
        while lines.len() >= self.capacity {
            lines.pop_front();
        }
        lines.push_back(line);
    }

    /// Copy of the buffered lines, oldest first.
    pub fn snapshot(&self) -> Vec<String> {
        self.guard().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.guard().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Exclusively owned OS handle of a running process.
#[derive(Debug)]
pub(crate) struct ManagedProcess {
    pub child: Child,
    /// Console input; `None` for detached children.
    pub stdin: Option<ChildStdin>,
}

/// Registry entry for one live name.
#[derive(Debug)]
pub(crate) struct Slot {
    pub pid: Option<u32>,
    pub started_at: DateTime<Utc>,
    pub stdio: StdioMode,
    pub output: OutputBuffer,
    pub process: tokio::sync::Mutex<ManagedProcess>,
    state: Mutex<LifecycleState>,
}

impl Slot {
    pub fn new(process: ManagedProcess, stdio: StdioMode, output: OutputBuffer) -> Self {
        Self {
            pid: process.child.id(),
            started_at: Utc::now(),
            stdio,
            output,
            process: tokio::sync::Mutex::new(process),
            state: Mutex::new(LifecycleState::Starting),
        }
    }

    pub fn state(&self) -> LifecycleState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_state(&self, state: LifecycleState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }

    /// Move from `from` to `to` only if the current state is `from`.
    pub fn transition(&self, from: LifecycleState, to: LifecycleState) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if *state == from {
            *state = to;
            true
        } else {
            false
        }
    }

    pub fn status(&self, name: &str, running: bool) -> ServerStatus {
        ServerStatus {
            name: name.to_string(),
            state: self.state(),
            running,
            pid: self.pid,
            started_at: Some(self.started_at),
        }
    }
}

/// Forward every line of `stream` into `buffer` and, if present, the event channel.
///
/// Lines are decoded lossily so a stray non-UTF-8 byte never stops the pipe
/// from being drained.
pub(crate) fn spawn_output_reader<R>(
    name: String,
    stream: R,
    buffer: OutputBuffer,
    events_tx: Option<UnboundedSender<Event>>,
) where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(stream);
        let mut raw = Vec::new();

        loop {
            raw.clear();
            match reader.read_until(b'\n', &mut raw).await {
                Ok(0) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&raw)
                        .trim_end_matches(['\r', '\n'])
                        .to_string();
                    trace!(server = %name, %line, "output");
                    buffer.push(line.clone());
                    if let Some(tx) = &events_tx {
                        let _ = tx.send(Event::ServerOutput {
                            name: name.clone(),
                            line,
                        });
                    }
                }
                Err(e) => {
                    debug!(server = %name, error = %e, "output stream closed with error");
                    break;
                }
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_buffer_evicts_oldest() {
        let buffer = OutputBuffer::new(2);
        buffer.push("one".to_string());
        buffer.push("two".to_string());
        buffer.push("three".to_string());

        assert_eq!(buffer.snapshot(), vec!["two".to_string(), "three".to_string()]);
    }

    #[test]
    fn test_output_buffer_zero_capacity_keeps_nothing() {
        let buffer = OutputBuffer::new(0);
        buffer.push("ignored".to_string());
        assert!(buffer.is_empty());
    }

    #[tokio::test]
    async fn test_output_reader_forwards_lines() {
        let buffer = OutputBuffer::new(10);
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let input: &'static [u8] = b"Done (3.2s)!\r\nbad \xff byte\n";

        spawn_output_reader("Paper 1".to_string(), input, buffer.clone(), Some(tx));

        let first = rx.recv().await.unwrap();
        assert!(matches!(
            first,
            Event::ServerOutput { ref name, ref line } if name == "Paper 1" && line == "Done (3.2s)!"
        ));
        let second = rx.recv().await.unwrap();
        assert!(matches!(second, Event::ServerOutput { ref line, .. } if line.starts_with("bad ")));
        assert_eq!(buffer.len(), 2);
    }
}
