//! Event handling for the TUI.
//!
//! - Core events update the server table and the log panel
//! - Key events drive the command line and the single-key shortcuts

use crate::widgets::command_composer::CommandComposer;
use crate::widgets::dashboard::state_label;
use crate::widgets::log_view::{push_line, LogLine};
use cc_protocol::{BulkAction, Event, LifecycleState, Op, OpOutcome, ServerView};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

/// Versions listed in the log before the rest are summarised.
const VERSIONS_SHOWN: usize = 15;

/// Apply an event from the core to the table and the log.
pub fn handle_core_event(servers: &mut Vec<ServerView>, logs: &mut Vec<LogLine>, event: Event) {
    match event {
        Event::ServerStateChanged { name, state } => {
            if let Some(server) = servers.iter_mut().find(|s| s.name == name) {
                server.status.state = state;
                if state == LifecycleState::Absent {
                    server.status.running = false;
                    server.status.pid = None;
                    server.status.started_at = None;
                }
            }
            push_line(logs, Some(&name), format!("{name}: {}", state_label(state)));
        }
        Event::ServerOutput { name, line } => {
            push_line(logs, Some(&name), format!("[{name}] {line}"));
        }
        Event::ServerExited { name, exit_code } => {
            if let Some(server) = servers.iter_mut().find(|s| s.name == name) {
                server.status = cc_protocol::ServerStatus::absent(&name);
            }
            let text = match exit_code {
                Some(code) => format!("{name} exited with code {code}"),
                None => format!("{name} exited"),
            };
            push_line(logs, Some(&name), text);
        }
        Event::OperationCompleted { outcome } => log_outcome(logs, &outcome),
        Event::BulkCompleted { action, outcomes } => {
            let succeeded = outcomes.iter().filter(|o| o.success).count();
            push_line(
                logs,
                None,
                format!("{} finished: {succeeded}/{} succeeded", bulk_label(action), outcomes.len()),
            );
            for outcome in &outcomes {
                log_outcome(logs, outcome);
            }
        }
        Event::StatusSnapshot { servers: snapshot } => *servers = snapshot,
        Event::MissingFiles { items } => {
            if !items.is_empty() {
                push_line(logs, None, format!("{} file(s) missing, run /repair to fix:", items.len()));
            }
            for item in items {
                push_line(logs, Some(&item.server), format!("  {item}"));
            }
        }
        Event::VersionsLoaded { versions } => {
            let shown = versions.iter().take(VERSIONS_SHOWN).cloned().collect::<Vec<_>>().join(", ");
            let text = if versions.len() > VERSIONS_SHOWN {
                format!("Versions: {shown} (+{} older)", versions.len() - VERSIONS_SHOWN)
            } else {
                format!("Versions: {shown}")
            };
            push_line(logs, None, text);
        }
        Event::EulaPending { name, path } => {
            push_line(
                logs,
                Some(&name),
                format!(
                    "{name}: the Minecraft EULA is not accepted. Set eula=true in {} and start again.",
                    path.display()
                ),
            );
        }
        Event::Log { message } => push_line(logs, None, message),
        Event::ShutdownComplete => push_line(logs, None, "All servers stopped"),
    }
}

fn log_outcome(logs: &mut Vec<LogLine>, outcome: &OpOutcome) {
    let mark = if outcome.success { "ok" } else { "FAILED" };
    push_line(
        logs,
        Some(&outcome.name),
        format!("{mark} {}: {}", outcome.name, outcome.message),
    );
}

fn bulk_label(action: BulkAction) -> &'static str {
    match action {
        BulkAction::StartAll => "Start all",
        BulkAction::StopAll => "Stop all",
        BulkAction::Repair => "Repair",
    }
}

/// Handle a key press.
///
/// The command line sees the key first; anything it does not consume is
/// tried against the shortcuts. Returns `true` if the application should
/// exit.
pub fn handle_keyboard_event(
    key_event: KeyEvent,
    composer: &mut CommandComposer,
    selected_index: &mut usize,
    servers: &[ServerView],
    logs: &mut Vec<LogLine>,
    op_tx: &UnboundedSender<Op>,
) -> bool {
    if key_event.kind != KeyEventKind::Press {
        return false;
    }

    if key_event.modifiers.contains(KeyModifiers::CONTROL) && key_event.code == KeyCode::Char('c') {
        return true;
    }

    if composer.handle_key_event(key_event).is_consumed() {
        return false;
    }

    let selected = servers.get(*selected_index).map(|s| s.name.clone());

    match key_event.code {
        KeyCode::Enter => submit_command(composer, selected.as_deref(), logs, op_tx),
        KeyCode::Char('q') => return true,
        KeyCode::Up => {
            *selected_index = selected_index.saturating_sub(1);
        }
        KeyCode::Down => {
            if *selected_index + 1 < servers.len() {
                *selected_index += 1;
            }
        }
        KeyCode::Char('s') => {
            if let Some(name) = selected {
                send(op_tx, Op::StartServer { name });
            }
        }
        KeyCode::Char('x') => {
            if let Some(name) = selected {
                send(op_tx, Op::StopServer { name });
            }
        }
        KeyCode::Char('S') => send(op_tx, Op::StartAll),
        KeyCode::Char('X') => send(op_tx, Op::StopAll),
        KeyCode::Char('r') => send(op_tx, Op::RefreshStatus),
        _ => {}
    }

    false
}

/// Parse the command line, send the resulting op and clear the input.
fn submit_command(
    composer: &mut CommandComposer,
    selected: Option<&str>,
    logs: &mut Vec<LogLine>,
    op_tx: &UnboundedSender<Op>,
) {
    match composer.parse_command(selected) {
        Ok(Some(op)) => {
            push_line(logs, None, format!("> {}", composer.input().trim()));
            send(op_tx, op);
        }
        Ok(None) => {}
        Err(message) => push_line(logs, None, format!("error: {message}")),
    }
    composer.clear();
}

fn send(op_tx: &UnboundedSender<Op>, op: Op) {
    if op_tx.send(op).is_err() {
        debug!("control service is gone, op dropped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cc_protocol::{MissingItem, MissingKind, ServerKind, ServerStatus};
    use std::path::PathBuf;
    use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

    fn servers() -> Vec<ServerView> {
        ["BungeeCord", "Paper 1", "Paper 2"]
            .iter()
            .enumerate()
            .map(|(i, name)| ServerView {
                name: name.to_string(),
                kind: if i == 0 { ServerKind::Proxy } else { ServerKind::Backend },
                port: Some(25565 + i as u16),
                status: ServerStatus::absent(*name),
            })
            .collect()
    }

    struct Keys {
        composer: CommandComposer,
        selected: usize,
        servers: Vec<ServerView>,
        logs: Vec<LogLine>,
        op_tx: UnboundedSender<Op>,
        op_rx: UnboundedReceiver<Op>,
    }

    impl Keys {
        fn new() -> Self {
            let (op_tx, op_rx) = unbounded_channel();
            Self {
                composer: CommandComposer::new(),
                selected: 0,
                servers: servers(),
                logs: Vec::new(),
                op_tx,
                op_rx,
            }
        }

        fn press(&mut self, code: KeyCode) -> bool {
            handle_keyboard_event(
                KeyEvent::from(code),
                &mut self.composer,
                &mut self.selected,
                &self.servers,
                &mut self.logs,
                &self.op_tx,
            )
        }

        fn type_str(&mut self, text: &str) {
            for c in text.chars() {
                self.press(KeyCode::Char(c));
            }
        }

        fn sent(&mut self) -> Vec<Op> {
            let mut ops = Vec::new();
            while let Ok(op) = self.op_rx.try_recv() {
                ops.push(op);
            }
            ops
        }
    }

    #[test]
    fn test_state_change_updates_row_and_log() {
        let mut servers = servers();
        let mut logs = Vec::new();

        handle_core_event(
            &mut servers,
            &mut logs,
            Event::ServerStateChanged {
                name: "Paper 1".into(),
                state: LifecycleState::Starting,
            },
        );

        assert_eq!(servers[1].status.state, LifecycleState::Starting);
        assert!(logs[0].text.ends_with("Paper 1: starting"));
        assert_eq!(logs[0].server.as_deref(), Some("Paper 1"));
    }

    #[test]
    fn test_exit_clears_row() {
        let mut servers = servers();
        servers[2].status.state = LifecycleState::Running;
        servers[2].status.pid = Some(7);
        let mut logs = Vec::new();

        handle_core_event(
            &mut servers,
            &mut logs,
            Event::ServerExited {
                name: "Paper 2".into(),
                exit_code: Some(1),
            },
        );

        assert_eq!(servers[2].status, ServerStatus::absent("Paper 2"));
        assert!(logs[0].text.ends_with("Paper 2 exited with code 1"));
    }

    #[test]
    fn test_snapshot_replaces_rows() {
        let mut servers = servers();
        let mut logs = Vec::new();
        let snapshot = servers[..1].to_vec();

        handle_core_event(&mut servers, &mut logs, Event::StatusSnapshot { servers: snapshot });

        assert_eq!(servers.len(), 1);
        assert!(logs.is_empty());
    }

    #[test]
    fn test_bulk_and_missing_files_are_logged() {
        let mut servers = servers();
        let mut logs = Vec::new();

        handle_core_event(
            &mut servers,
            &mut logs,
            Event::BulkCompleted {
                action: BulkAction::StopAll,
                outcomes: vec![OpOutcome::ok("Paper 1", "stopped"), OpOutcome::failed("Paper 2", "timed out")],
            },
        );
        handle_core_event(
            &mut servers,
            &mut logs,
            Event::MissingFiles {
                items: vec![MissingItem {
                    server: "BungeeCord".into(),
                    kind: MissingKind::Jar,
                    path: PathBuf::from("servers/bungee/BungeeCord.jar"),
                }],
            },
        );

        let texts: Vec<_> = logs.iter().map(|l| l.text.as_str()).collect();
        assert!(texts[0].ends_with("Stop all finished: 1/2 succeeded"));
        assert!(texts[1].ends_with("ok Paper 1: stopped"));
        assert!(texts[2].ends_with("FAILED Paper 2: timed out"));
        assert!(texts[3].contains("1 file(s) missing"));
        assert_eq!(logs[4].server.as_deref(), Some("BungeeCord"));
    }

    #[test]
    fn test_long_version_list_is_summarised() {
        let mut servers = servers();
        let mut logs = Vec::new();
        let versions = (0..20).map(|i| format!("1.{i}")).collect();

        handle_core_event(&mut servers, &mut logs, Event::VersionsLoaded { versions });

        assert!(logs[0].text.ends_with("(+5 older)"));
    }

    #[test]
    fn test_quit_keys() {
        let mut keys = Keys::new();
        assert!(keys.press(KeyCode::Char('q')));

        let mut keys = Keys::new();
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        keys.type_str("/cm");
        assert!(handle_keyboard_event(
            ctrl_c,
            &mut keys.composer,
            &mut keys.selected,
            &keys.servers,
            &mut keys.logs,
            &keys.op_tx,
        ));
    }

    #[test]
    fn test_navigation_is_bounded() {
        let mut keys = Keys::new();

        keys.press(KeyCode::Up);
        assert_eq!(keys.selected, 0);
        keys.press(KeyCode::Down);
        keys.press(KeyCode::Down);
        keys.press(KeyCode::Down);
        assert_eq!(keys.selected, 2);
    }

    #[test]
    fn test_shortcuts_send_ops_for_selection() {
        let mut keys = Keys::new();
        keys.press(KeyCode::Down);

        keys.press(KeyCode::Char('s'));
        keys.press(KeyCode::Char('x'));
        keys.press(KeyCode::Char('S'));
        keys.press(KeyCode::Char('X'));
        keys.press(KeyCode::Char('r'));

        assert_eq!(
            keys.sent(),
            vec![
                Op::StartServer { name: "Paper 1".into() },
                Op::StopServer { name: "Paper 1".into() },
                Op::StartAll,
                Op::StopAll,
                Op::RefreshStatus,
            ]
        );
    }

    #[test]
    fn test_typed_command_is_submitted() {
        let mut keys = Keys::new();

        keys.type_str("/cmd say hi");
        assert!(keys.sent().is_empty());
        keys.press(KeyCode::Enter);

        assert_eq!(
            keys.sent(),
            vec![Op::SendCommand {
                name: "BungeeCord".into(),
                line: "say hi".into()
            }]
        );
        assert!(keys.composer.is_empty());
        assert!(keys.logs[0].text.ends_with("> /cmd say hi"));
    }

    #[test]
    fn test_invalid_command_is_logged_not_sent() {
        let mut keys = Keys::new();

        keys.type_str("/ram big");
        keys.press(KeyCode::Enter);

        assert!(keys.sent().is_empty());
        assert!(keys.logs[0].text.contains("error: Invalid RAM amount"));
    }
}
