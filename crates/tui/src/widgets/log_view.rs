//! Scrollable log panel.
//!
//! Shows server console output and operation results. The view follows the
//! newest line until the user scrolls up, and can be narrowed to the lines
//! of one server.

use chrono::Local;
use ratatui::{
    layout::Rect,
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState},
    Frame,
};

/// Lines kept before the oldest are dropped.
pub const MAX_LOG_LINES: usize = 2000;

/// One line of the log panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    /// Server the line came from, if any.
    pub server: Option<String>,
    pub text: String,
}

/// Append a timestamped line, dropping the oldest past [`MAX_LOG_LINES`].
pub fn push_line(lines: &mut Vec<LogLine>, server: Option<&str>, text: impl AsRef<str>) {
    lines.push(LogLine {
        server: server.map(str::to_string),
        text: format!("{} {}", Local::now().format("%H:%M:%S"), text.as_ref()),
    });
    if lines.len() > MAX_LOG_LINES {
        let excess = lines.len() - MAX_LOG_LINES;
        lines.drain(..excess);
    }
}

#[derive(Debug, Clone)]
pub struct LogView {
    /// Lines scrolled from the top, used only when not following.
    pub scroll_offset: usize,
    /// Stick to the newest line.
    pub follow: bool,
    /// Only show lines from this server.
    pub only: Option<String>,
}

impl Default for LogView {
    fn default() -> Self {
        Self::new()
    }
}

impl LogView {
    pub fn new() -> Self {
        Self {
            scroll_offset: 0,
            follow: true,
            only: None,
        }
    }

    fn visible<'a>(&self, lines: &'a [LogLine]) -> Vec<&'a LogLine> {
        lines
            .iter()
            .filter(|line| match &self.only {
                Some(name) => line.server.as_deref() == Some(name.as_str()),
                None => true,
            })
            .collect()
    }

    /// Largest useful scroll offset for a viewport of `viewport` lines.
    pub fn max_offset(&self, lines: &[LogLine], viewport: usize) -> usize {
        self.visible(lines).len().saturating_sub(viewport)
    }

    fn effective_offset(&self, max: usize) -> usize {
        if self.follow {
            max
        } else {
            self.scroll_offset.min(max)
        }
    }

    /// Render the panel.
    ///
    /// # Arguments
    ///
    /// * `frame` - The ratatui frame to render to
    /// * `area` - The area to render within
    /// * `lines` - Every log line; the server filter is applied here
    pub fn render(&self, frame: &mut Frame, area: Rect, lines: &[LogLine]) {
        let title = match &self.only {
            Some(name) => format!("Log - {name}"),
            None => "Log".to_string(),
        };
        let title = if self.follow { title } else { format!("{title} (scrolled)") };
        let block = Block::default().borders(Borders::ALL).title(title);

        let visible = self.visible(lines);
        let viewport = area.height.saturating_sub(2) as usize;
        let max = visible.len().saturating_sub(viewport);
        let offset = self.effective_offset(max);

        let text = if visible.is_empty() {
            "Nothing logged yet.".to_string()
        } else {
            visible
                .iter()
                .map(|line| line.text.as_str())
                .collect::<Vec<_>>()
                .join("\n")
        };

        let paragraph = Paragraph::new(text)
            .block(block)
            .scroll((offset.min(u16::MAX as usize) as u16, 0));
        frame.render_widget(paragraph, area);

        if visible.len() > viewport {
            let mut scrollbar_state = ScrollbarState::default()
                .content_length(visible.len())
                .viewport_content_length(viewport)
                .position(offset);

            let scrollbar = Scrollbar::default()
                .orientation(ScrollbarOrientation::VerticalRight)
                .begin_symbol(Some("↑"))
                .end_symbol(Some("↓"));

            frame.render_stateful_widget(scrollbar, area, &mut scrollbar_state);
        }
    }

    /// Show only `server`'s lines, or everything for `None`.
    pub fn set_filter(&mut self, server: Option<String>) {
        self.only = server;
        self.scroll_to_bottom();
    }

    pub fn scroll_up(&mut self, max: usize) {
        self.page_up(1, max);
    }

    pub fn scroll_down(&mut self, max: usize) {
        self.page_down(1, max);
    }

    pub fn page_up(&mut self, page_size: usize, max: usize) {
        let current = self.effective_offset(max);
        self.follow = false;
        self.scroll_offset = current.saturating_sub(page_size);
    }

    /// Scrolling down to `max` resumes following.
    pub fn page_down(&mut self, page_size: usize, max: usize) {
        let next = (self.effective_offset(max) + page_size).min(max);
        self.scroll_offset = next;
        self.follow = next == max;
    }

    pub fn scroll_to_top(&mut self) {
        self.follow = false;
        self.scroll_offset = 0;
    }

    pub fn scroll_to_bottom(&mut self) {
        self.follow = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn lines(count: usize) -> Vec<LogLine> {
        (0..count)
            .map(|i| LogLine {
                server: Some(if i % 2 == 0 { "Paper 1" } else { "BungeeCord" }.to_string()),
                text: format!("Line {i}"),
            })
            .collect()
    }

    fn render(view: &LogView, lines: &[LogLine], height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(60, height)).unwrap();
        terminal
            .draw(|frame| view.render(frame, frame.area(), lines))
            .unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_renders_empty_state() {
        let content = render(&LogView::new(), &[], 10);
        assert!(content.contains("Nothing logged yet."));
        assert!(content.contains("Log"));
    }

    #[test]
    fn test_follow_shows_newest_lines() {
        let content = render(&LogView::new(), &lines(20), 7);

        assert!(content.contains("Line 19"));
        assert!(content.contains("Line 15"));
        assert!(!content.contains("Line 14"));
    }

    #[test]
    fn test_filter_limits_to_one_server() {
        let mut view = LogView::new();
        view.set_filter(Some("BungeeCord".to_string()));

        let content = render(&view, &lines(6), 10);

        assert!(content.contains("Log - BungeeCord"));
        assert!(content.contains("Line 5"));
        assert!(!content.contains("Line 4"));
    }

    #[test]
    fn test_scrolling_up_stops_following() {
        let mut view = LogView::new();
        let lines = lines(30);
        let max = view.max_offset(&lines, 5);
        assert_eq!(max, 25);

        view.scroll_up(max);
        assert!(!view.follow);
        assert_eq!(view.scroll_offset, 24);

        view.page_up(10, max);
        assert_eq!(view.scroll_offset, 14);

        let content = render(&view, &lines, 7);
        assert!(content.contains("(scrolled)"));
        assert!(content.contains("Line 14"));
        assert!(!content.contains("Line 13"));
    }

    #[test]
    fn test_scrolling_back_to_bottom_resumes_following() {
        let mut view = LogView::new();
        view.scroll_to_top();
        assert!(!view.follow);

        view.page_down(10, 15);
        assert!(!view.follow);
        view.page_down(10, 15);
        assert_eq!(view.scroll_offset, 15);
        assert!(view.follow);
    }

    #[test]
    fn test_push_line_caps_history() {
        let mut log = Vec::new();
        for i in 0..MAX_LOG_LINES + 5 {
            push_line(&mut log, None, format!("entry {i}"));
        }

        assert_eq!(log.len(), MAX_LOG_LINES);
        assert!(log[0].text.ends_with("entry 5"));
    }
}
