//! Command line with slash command autocomplete.
//!
//! Typing `/` opens the command line; the popup lists matching commands and
//! Tab completes the highlighted one. Commands that act on one server use
//! the server selected in the table unless a name is given.

use crate::event::EventStatus;
use cc_protocol::Op;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

/// Available slash commands with their descriptions.
pub const COMMANDS: &[(&str, &str)] = &[
    ("/start [server]", "Start the selected or named server"),
    ("/stop [server]", "Stop the selected or named server"),
    ("/startall", "Start every server"),
    ("/stopall", "Stop every server"),
    ("/cmd <line>", "Send a console command to the selected server"),
    ("/refresh", "Refresh server status now"),
    ("/check", "List missing jars and start scripts"),
    ("/repair [version]", "Download and write missing files"),
    ("/versions", "List available server versions"),
    ("/ram <gb>", "Set max RAM of the selected server"),
    ("/count <n>", "Set the number of backend servers"),
];

#[derive(Debug, Clone, Default)]
pub struct CommandComposer {
    input: String,
    /// Byte offset of the cursor in `input`, always on a char boundary.
    cursor_pos: usize,
    show_popup: bool,
    /// Highlighted row in the popup.
    selected_index: usize,
}

impl CommandComposer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn is_empty(&self) -> bool {
        self.input.is_empty()
    }

    pub fn should_show_popup(&self) -> bool {
        self.show_popup
    }

    /// Cursor column in characters, for placing the terminal cursor.
    pub fn cursor_column(&self) -> usize {
        self.input[..self.cursor_pos].chars().count()
    }

    /// Commands whose name starts with the first word of the input.
    pub fn suggestions(&self) -> Vec<(&'static str, &'static str)> {
        if !self.input.starts_with('/') {
            return Vec::new();
        }

        let filter = self.input.split_whitespace().next().unwrap_or("/");
        COMMANDS
            .iter()
            .filter(|(cmd, _)| cmd.starts_with(filter))
            .copied()
            .collect()
    }

    pub fn selected_suggestion(&self) -> Option<(&'static str, &'static str)> {
        self.suggestions().get(self.selected_index).copied()
    }

    pub fn insert_char(&mut self, c: char) {
        self.input.insert(self.cursor_pos, c);
        self.cursor_pos += c.len_utf8();
        self.update_popup_state();
    }

    /// Insert pasted text, flattened to one line.
    pub fn insert_str(&mut self, text: &str) {
        for c in text.chars().filter(|c| !c.is_control()) {
            self.input.insert(self.cursor_pos, c);
            self.cursor_pos += c.len_utf8();
        }
        self.update_popup_state();
    }

    /// Backspace.
    pub fn delete_char(&mut self) {
        if let Some(c) = self.input[..self.cursor_pos].chars().next_back() {
            self.cursor_pos -= c.len_utf8();
            self.input.remove(self.cursor_pos);
            self.update_popup_state();
        }
    }

    pub fn clear(&mut self) {
        self.input.clear();
        self.cursor_pos = 0;
        self.show_popup = false;
        self.selected_index = 0;
    }

    pub fn move_cursor_left(&mut self) {
        if let Some(c) = self.input[..self.cursor_pos].chars().next_back() {
            self.cursor_pos -= c.len_utf8();
        }
    }

    pub fn move_cursor_right(&mut self) {
        if let Some(c) = self.input[self.cursor_pos..].chars().next() {
            self.cursor_pos += c.len_utf8();
        }
    }

    pub fn move_selection_up(&mut self) {
        self.selected_index = self.selected_index.saturating_sub(1);
    }

    pub fn move_selection_down(&mut self) {
        if self.selected_index + 1 < self.suggestions().len() {
            self.selected_index += 1;
        }
    }

    /// Replace the input with the highlighted command name (Tab).
    pub fn complete_with_selection(&mut self) {
        if let Some((cmd, _)) = self.selected_suggestion() {
            let cmd_name = cmd.split_whitespace().next().unwrap_or(cmd);
            self.input = format!("{cmd_name} ");
            self.cursor_pos = self.input.len();
            self.show_popup = false;
            self.selected_index = 0;
        }
    }

    fn update_popup_state(&mut self) {
        self.show_popup = self.input.starts_with('/') && !self.input.contains(' ');

        let suggestions = self.suggestions();
        if self.selected_index >= suggestions.len() {
            self.selected_index = suggestions.len().saturating_sub(1);
        }
    }

    /// Handle editing keys.
    ///
    /// While the input is empty only `/` is taken, so single-key shortcuts
    /// keep working. Enter is never consumed; the caller submits.
    pub fn handle_key_event(&mut self, key: KeyEvent) -> EventStatus {
        if self.input.is_empty() {
            if key.code == KeyCode::Char('/') {
                self.insert_char('/');
                return EventStatus::Consumed;
            }
            return EventStatus::NotConsumed;
        }

        match key.code {
            KeyCode::Char(c) => self.insert_char(c),
            KeyCode::Backspace => self.delete_char(),
            KeyCode::Left => self.move_cursor_left(),
            KeyCode::Right => self.move_cursor_right(),
            KeyCode::Esc => self.clear(),
            KeyCode::Tab if self.show_popup => self.complete_with_selection(),
            KeyCode::Up if self.show_popup => self.move_selection_up(),
            KeyCode::Down if self.show_popup => self.move_selection_down(),
            _ => return EventStatus::NotConsumed,
        }
        EventStatus::Consumed
    }

    pub fn render(&self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title("Command  [/] commands  [s/x] start/stop  [S/X] all  [q] quit");

        let inner = block.inner(area);
        block.render(area, buf);

        let paragraph = Paragraph::new(format!("> {}", self.input)).style(Style::default().fg(Color::Yellow));
        paragraph.render(inner, buf);
    }

    pub fn render_popup(&self, area: Rect, buf: &mut Buffer) {
        if !self.show_popup {
            return;
        }

        let suggestions = self.suggestions();
        if suggestions.is_empty() {
            return;
        }

        let block = Block::default()
            .borders(Borders::ALL)
            .title("Commands")
            .style(Style::default().bg(Color::Black));

        let inner = block.inner(area);
        block.render(area, buf);

        for (i, (cmd, desc)) in suggestions.iter().enumerate() {
            let y = inner.y + i as u16;
            if y >= inner.y + inner.height {
                break;
            }

            let style = if i == self.selected_index {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };

            let line = Line::from(vec![
                Span::styled(format!("{cmd:<20}"), style),
                Span::styled(desc.to_string(), style.fg(Color::Gray)),
            ]);
            buf.set_line(inner.x, y, &line, inner.width);
        }
    }

    /// Parse the input into an `Op`.
    ///
    /// `selected` is the server highlighted in the table.
    ///
    /// Returns `Ok(None)` for blank input and `Err` with a message for the
    /// log panel when the command is unknown or incomplete.
    pub fn parse_command(&self, selected: Option<&str>) -> Result<Option<Op>, String> {
        let input = self.input.trim();
        if input.is_empty() {
            return Ok(None);
        }

        if !input.starts_with('/') {
            return Err("Commands must start with '/'".to_string());
        }

        let (cmd, rest) = match input.split_once(char::is_whitespace) {
            Some((cmd, rest)) => (cmd, rest.trim()),
            None => (input, ""),
        };

        let target = || -> Result<String, String> {
            if rest.is_empty() {
                selected.map(str::to_string).ok_or_else(|| "No server selected".to_string())
            } else {
                Ok(rest.to_string())
            }
        };
        let selected_server = || selected.map(str::to_string).ok_or_else(|| "No server selected".to_string());

        let op = match cmd {
            "/start" => Op::StartServer { name: target()? },
            "/stop" => Op::StopServer { name: target()? },
            "/startall" => Op::StartAll,
            "/stopall" => Op::StopAll,
            "/cmd" => {
                if rest.is_empty() {
                    return Err("Missing console command".to_string());
                }
                Op::SendCommand {
                    name: selected_server()?,
                    line: rest.to_string(),
                }
            }
            "/refresh" => Op::RefreshStatus,
            "/check" => Op::CheckFiles,
            "/repair" => Op::Repair {
                version: (!rest.is_empty()).then(|| rest.to_string()),
            },
            "/versions" => Op::ListVersions,
            "/ram" => {
                let gigabytes = rest
                    .trim_end_matches(['G', 'g'])
                    .parse()
                    .map_err(|_| format!("Invalid RAM amount: {rest:?}"))?;
                Op::SetMaxRam {
                    name: selected_server()?,
                    gigabytes,
                }
            }
            "/count" => {
                let count = rest.parse().map_err(|_| format!("Invalid server count: {rest:?}"))?;
                Op::SetBackendCount { count }
            }
            _ => return Err(format!("Unknown command: {cmd}")),
        };

        Ok(Some(op))
    }
}
