//! Server table.
//!
//! One row per managed server: name, role, lifecycle state, pid, port and
//! uptime. The state column folds in the port probe, so a server whose
//! process is up but whose port is not accepting connections yet shows as
//! "booting".

use cc_protocol::{LifecycleState, ServerKind, ServerView};
use chrono::{DateTime, Utc};
use ratatui::layout::Constraint;
use ratatui::layout::Rect;
use ratatui::style::Color;
use ratatui::style::Modifier;
use ratatui::style::Style;
use ratatui::widgets::Block;
use ratatui::widgets::Borders;
use ratatui::widgets::Cell;
use ratatui::widgets::Row;
use ratatui::widgets::Table;
use ratatui::widgets::TableState;
use ratatui::Frame;

/// Renders the server table.
///
/// # Arguments
/// * `frame` - The frame to render into
/// * `area` - The area to render the table in
/// * `servers` - Rows to display, in layout order
/// * `selected` - Index of the highlighted row
pub fn render_dashboard(frame: &mut Frame, area: Rect, servers: &[ServerView], selected: usize) {
    let now = Utc::now();

    let rows: Vec<Row> = servers
        .iter()
        .map(|server| {
            let (label, color) = status_label(server);
            let pid = server.status.pid.map(|pid| pid.to_string()).unwrap_or_default();
            let port = server.port.map(|port| port.to_string()).unwrap_or_default();

            Row::new(vec![
                Cell::from(server.name.clone()),
                Cell::from(kind_label(server.kind)),
                Cell::from(label).style(Style::default().fg(color)),
                Cell::from(pid),
                Cell::from(port),
                Cell::from(format_uptime(server.status.started_at, now)),
            ])
        })
        .collect();

    let header = Row::new(vec![
        Cell::from("Name"),
        Cell::from("Kind"),
        Cell::from("State"),
        Cell::from("PID"),
        Cell::from("Port"),
        Cell::from("Uptime"),
    ])
    .style(Style::default().add_modifier(Modifier::BOLD).fg(Color::Cyan));

    let widths = [
        Constraint::Percentage(30),
        Constraint::Length(8),
        Constraint::Length(10),
        Constraint::Length(8),
        Constraint::Length(6),
        Constraint::Length(9),
    ];

    let online = servers.iter().filter(|s| s.status.running).count();
    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Servers ({online}/{} online)", servers.len()))
                .style(Style::default().fg(Color::White)),
        )
        .row_highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol(">> ");

    let mut table_state = TableState::default();
    if !servers.is_empty() {
        table_state.select(Some(selected.min(servers.len() - 1)));
    }

    frame.render_stateful_widget(table, area, &mut table_state);
}

pub fn kind_label(kind: ServerKind) -> &'static str {
    match kind {
        ServerKind::Proxy => "proxy",
        ServerKind::Backend => "backend",
    }
}

pub fn state_label(state: LifecycleState) -> &'static str {
    match state {
        LifecycleState::Absent => "stopped",
        LifecycleState::Starting => "starting",
        LifecycleState::Running => "running",
        LifecycleState::Stopping => "stopping",
    }
}

fn status_label(server: &ServerView) -> (&'static str, Color) {
    match server.status.state {
        LifecycleState::Absent => ("stopped", Color::DarkGray),
        LifecycleState::Starting => ("starting", Color::Yellow),
        LifecycleState::Stopping => ("stopping", Color::Magenta),
        LifecycleState::Running if server.status.running => ("online", Color::Green),
        LifecycleState::Running => ("booting", Color::Yellow),
    }
}

/// `1h05m`, `4m12s` or `9s`; empty when nothing is running.
pub fn format_uptime(started_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(started_at) = started_at else {
        return String::new();
    };

    let secs = (now - started_at).num_seconds().max(0);
    let (hours, minutes, seconds) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if hours > 0 {
        format!("{hours}h{minutes:02}m")
    } else if minutes > 0 {
        format!("{minutes}m{seconds:02}s")
    } else {
        format!("{seconds}s")
    }
}
