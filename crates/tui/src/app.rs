//! TUI application state and event loop.
//!
//! `App` holds what is on screen and runs a `tokio::select!` loop over core
//! events, terminal input and the status refresh interval. The interval is
//! owned by the loop, so polling stops as soon as the UI exits.

use anyhow::Result;
use cc_core::layout::ServerLayout;
use cc_protocol::{Event, Op, ServerStatus, ServerView};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout, Position, Rect},
    widgets::Clear,
    Frame,
};
use std::time::Duration;
use tokio::select;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::time::MissedTickBehavior;
use tokio_stream::StreamExt;
use tracing::debug;

use crate::event_handler;
use crate::tui::{Tui, TuiEvent};
use crate::widgets::dashboard::render_dashboard;
use crate::widgets::{CommandComposer, LogLine, LogView};

/// How often the server table is refreshed.
pub const REFRESH_INTERVAL: Duration = Duration::from_secs(3);

pub struct App {
    /// Rows of the server table, in layout order.
    pub servers: Vec<ServerView>,
    pub logs: Vec<LogLine>,
    pub selected_index: usize,
    pub composer: CommandComposer,
    pub log_view: LogView,
    /// Height of the log panel at the last draw, for paging.
    log_viewport: usize,
    pub op_tx: UnboundedSender<Op>,
    pub event_rx: UnboundedReceiver<Event>,
    pub refresh_interval: Duration,
    pub should_exit: bool,
}

impl App {
    pub fn new(op_tx: UnboundedSender<Op>, event_rx: UnboundedReceiver<Event>) -> Self {
        Self {
            servers: Vec::new(),
            logs: Vec::new(),
            selected_index: 0,
            composer: CommandComposer::new(),
            log_view: LogView::new(),
            log_viewport: 10,
            op_tx,
            event_rx,
            refresh_interval: REFRESH_INTERVAL,
            should_exit: false,
        }
    }

    /// Seed the table with every server in `layout`, all stopped, so it is
    /// populated before the first status snapshot arrives.
    pub fn with_layout(mut self, layout: &ServerLayout) -> Self {
        self.servers = layout
            .servers()
            .iter()
            .map(|def| ServerView {
                name: def.name.clone(),
                kind: def.kind,
                port: Some(def.port),
                status: ServerStatus::absent(&def.name),
            })
            .collect();
        self
    }

    /// Main event loop.
    pub async fn run(&mut self, tui: &mut Tui) -> Result<()> {
        let mut tui_events = tui.event_stream();
        let mut refresh = tokio::time::interval(self.refresh_interval);
        refresh.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tui.frame_requester().schedule_frame();

        while !self.should_exit {
            select! {
                Some(event) = self.event_rx.recv() => {
                    self.handle_core_event(event);
                    tui.frame_requester().schedule_frame();
                }
                Some(tui_event) = tui_events.next() => {
                    self.handle_tui_event(tui, tui_event)?;
                }
                _ = refresh.tick() => {
                    self.send(Op::RefreshStatus);
                }
            }
        }

        Ok(())
    }

    /// Ask the core to stop every server and wait for it to confirm.
    ///
    /// Events that arrive meanwhile are still applied. Returns `false` if
    /// `wait` elapsed or the core went away first.
    pub async fn shut_down(&mut self, wait: Duration) -> bool {
        self.send(Op::Shutdown);

        let deadline = tokio::time::Instant::now() + wait;
        loop {
            match tokio::time::timeout_at(deadline, self.event_rx.recv()).await {
                Ok(Some(Event::ShutdownComplete)) => return true,
                Ok(Some(event)) => self.handle_core_event(event),
                Ok(None) | Err(_) => return false,
            }
        }
    }

    fn send(&self, op: Op) {
        if self.op_tx.send(op).is_err() {
            debug!("control service is gone, op dropped");
        }
    }

    fn handle_core_event(&mut self, event: Event) {
        event_handler::handle_core_event(&mut self.servers, &mut self.logs, event);
        self.selected_index = self.selected_index.min(self.servers.len().saturating_sub(1));
    }

    fn handle_tui_event(&mut self, tui: &mut Tui, event: TuiEvent) -> Result<()> {
        match event {
            TuiEvent::Key(key_event) => {
                self.handle_key_event(key_event);
                tui.frame_requester().schedule_frame();
            }
            TuiEvent::Paste(text) => {
                self.composer.insert_str(&text);
                tui.frame_requester().schedule_frame();
            }
            TuiEvent::Draw => {
                tui.draw(|frame| self.render(frame))?;
            }
        }
        Ok(())
    }

    fn handle_key_event(&mut self, key_event: KeyEvent) {
        if key_event.kind == KeyEventKind::Press && self.handle_log_key(key_event.code) {
            return;
        }

        self.should_exit = event_handler::handle_keyboard_event(
            key_event,
            &mut self.composer,
            &mut self.selected_index,
            &self.servers,
            &mut self.logs,
            &self.op_tx,
        );
    }

    /// Log panel keys: paging, and `f` to toggle the selected-server filter.
    fn handle_log_key(&mut self, code: KeyCode) -> bool {
        let max = self.log_view.max_offset(&self.logs, self.log_viewport);
        let page = self.log_viewport.max(1);

        match code {
            KeyCode::PageUp => self.log_view.page_up(page, max),
            KeyCode::PageDown => self.log_view.page_down(page, max),
            KeyCode::Home => self.log_view.scroll_to_top(),
            KeyCode::End => self.log_view.scroll_to_bottom(),
            KeyCode::Char('f') if self.composer.is_empty() => {
                let filter = match self.log_view.only {
                    Some(_) => None,
                    None => self.servers.get(self.selected_index).map(|s| s.name.clone()),
                };
                self.log_view.set_filter(filter);
            }
            _ => return false,
        }
        true
    }

    fn render(&mut self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(self.servers.len().min(12) as u16 + 4),
                Constraint::Min(5),
                Constraint::Length(3),
            ])
            .split(frame.area());

        render_dashboard(frame, chunks[0], &self.servers, self.selected_index);

        self.log_viewport = chunks[1].height.saturating_sub(2) as usize;
        self.log_view.render(frame, chunks[1], &self.logs);

        self.render_command_line(frame, chunks[2]);
    }

    fn render_command_line(&self, frame: &mut Frame, area: Rect) {
        self.composer.render(area, frame.buffer_mut());

        if !self.composer.is_empty() {
            // Inside the border, after the "> " prompt.
            let x = area.x + 3 + self.composer.cursor_column() as u16;
            frame.set_cursor_position(Position::new(x.min(area.right().saturating_sub(2)), area.y + 1));
        }

        if self.composer.should_show_popup() {
            let rows = self.composer.suggestions().len() as u16;
            let height = (rows + 2).min(area.y);
            let popup = Rect {
                x: area.x,
                y: area.y - height,
                width: area.width.min(70),
                height,
            };
            frame.render_widget(Clear, popup);
            self.composer.render_popup(popup, frame.buffer_mut());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cc_protocol::LifecycleState;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;
    use tokio::sync::mpsc::unbounded_channel;

    fn app() -> (App, tokio::sync::mpsc::UnboundedReceiver<Op>, UnboundedSender<Event>) {
        let (op_tx, op_rx) = unbounded_channel();
        let (event_tx, event_rx) = unbounded_channel();
        let layout = ServerLayout::build("/srv/craft", 2);
        (App::new(op_tx, event_rx).with_layout(&layout), op_rx, event_tx)
    }

    fn draw(app: &mut App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|frame| app.render(frame)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[tokio::test]
    async fn test_app_renders_all_panels() {
        let (mut app, _op_rx, _event_tx) = app();

        let content = draw(&mut app);

        assert!(content.contains("Servers (0/3 online)"));
        assert!(content.contains("BungeeCord"));
        assert!(content.contains("Paper 2"));
        assert!(content.contains("Log"));
        assert!(content.contains("Command"));
    }

    #[tokio::test]
    async fn test_popup_is_drawn_while_typing() {
        let (mut app, _op_rx, _event_tx) = app();

        app.handle_key_event(KeyEvent::from(KeyCode::Char('/')));
        let content = draw(&mut app);

        assert!(content.contains("Commands"));
        assert!(content.contains("/startall"));
    }

    #[tokio::test]
    async fn test_app_quit_on_q() {
        let (mut app, _op_rx, _event_tx) = app();

        app.handle_key_event(KeyEvent::from(KeyCode::Char('q')));

        assert!(app.should_exit);
    }

    #[tokio::test]
    async fn test_snapshot_shrink_clamps_selection() {
        let (mut app, _op_rx, _event_tx) = app();
        app.handle_key_event(KeyEvent::from(KeyCode::Down));
        app.handle_key_event(KeyEvent::from(KeyCode::Down));
        assert_eq!(app.selected_index, 2);

        let snapshot = app.servers[..2].to_vec();
        app.handle_core_event(Event::StatusSnapshot { servers: snapshot });

        assert_eq!(app.selected_index, 1);
    }

    #[tokio::test]
    async fn test_filter_key_toggles_selected_server() {
        let (mut app, _op_rx, _event_tx) = app();
        app.handle_key_event(KeyEvent::from(KeyCode::Down));

        app.handle_key_event(KeyEvent::from(KeyCode::Char('f')));
        assert_eq!(app.log_view.only.as_deref(), Some("Paper 1"));

        app.handle_key_event(KeyEvent::from(KeyCode::Char('f')));
        assert_eq!(app.log_view.only, None);
    }

    #[tokio::test]
    async fn test_shut_down_waits_for_confirmation() {
        let (mut app, mut op_rx, event_tx) = app();

        let core = tokio::spawn(async move {
            assert_eq!(op_rx.recv().await, Some(Op::Shutdown));
            event_tx
                .send(Event::ServerStateChanged {
                    name: "Paper 1".into(),
                    state: LifecycleState::Stopping,
                })
                .unwrap();
            event_tx.send(Event::ShutdownComplete).unwrap();
        });

        assert!(app.shut_down(Duration::from_secs(5)).await);
        assert_eq!(app.servers[1].status.state, LifecycleState::Stopping);
        core.await.unwrap();
    }

    #[tokio::test]
    async fn test_shut_down_gives_up_when_core_is_gone() {
        let (mut app, op_rx, event_tx) = app();
        drop(op_rx);
        drop(event_tx);

        assert!(!app.shut_down(Duration::from_secs(5)).await);
    }
}
