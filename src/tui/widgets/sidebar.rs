//! Sidebar widget for the TUI.
//!
//! Shows the connection settings (password masked), the connection status
//! and the commands that act on them.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

use crate::config::ConnectionConfig;

pub struct Sidebar<'a> {
    connection: &'a ConnectionConfig,
    connected: bool,
    pending_write: bool,
}

impl<'a> Sidebar<'a> {
    pub fn new(connection: &'a ConnectionConfig, connected: bool, pending_write: bool) -> Self {
        Self {
            connection,
            connected,
            pending_write,
        }
    }

    fn lines(&self) -> Vec<Line<'static>> {
        let section = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);
        let key = Style::default().fg(Color::Gray);
        let command = Style::default().fg(Color::Cyan);

        let mut lines = vec![Line::from(Span::styled("PostgreSQL", section))];
        for (label, value) in self.fields() {
            let value = if value.is_empty() { "(not set)".to_string() } else { value };
            lines.push(Line::from(vec![
                Span::styled(format!("{label:<9}"), key),
                Span::raw(value),
            ]));
        }

        lines.push(Line::from(""));
        let (status, color) = if self.connected {
            ("● connected", Color::Green)
        } else if self.connection.missing_fields().is_empty() {
            ("○ not connected", Color::Gray)
        } else {
            ("○ details missing", Color::Red)
        };
        lines.push(Line::from(Span::styled(status, Style::default().fg(color))));

        if self.pending_write {
            lines.push(Line::from(Span::styled(
                "! statement awaiting /confirm",
                Style::default().fg(Color::Yellow),
            )));
        }

        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("Commands", section)));
        for (name, description) in [
            ("/set", "edit a field"),
            ("/refresh", "refresh connection"),
            ("/clear", "clear history"),
            ("/help", "all commands"),
        ] {
            lines.push(Line::from(vec![
                Span::styled(format!("{name:<9}"), command),
                Span::styled(description, key),
            ]));
        }

        lines
    }

    fn fields(&self) -> [(&'static str, String); 5] {
        let c = self.connection;
        let password = if c.password.is_empty() {
            String::new()
        } else {
            "********".to_string()
        };
        [
            ("host", c.host.clone()),
            ("port", c.port.clone()),
            ("user", c.user.clone()),
            ("password", password),
            ("database", c.database.clone()),
        ]
    }
}

impl Widget for Sidebar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(" Connection ");

        Paragraph::new(self.lines())
            .block(block)
            .wrap(Wrap { trim: true })
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(sidebar: &Sidebar<'_>) -> String {
        sidebar
            .lines()
            .iter()
            .map(|l| l.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_password_is_masked() {
        let config = ConnectionConfig::new("db.internal", "5432", "app", "hunter2", "shop");
        let rendered = text(&Sidebar::new(&config, true, false));

        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("password ********"));
        assert!(rendered.contains("db.internal"));
        assert!(rendered.contains("connected"));
    }

    #[test]
    fn test_missing_details_and_pending_write() {
        let config = ConnectionConfig::default();
        let rendered = text(&Sidebar::new(&config, false, true));

        assert!(rendered.contains("user     (not set)"));
        assert!(rendered.contains("details missing"));
        assert!(rendered.contains("/confirm"));
    }
}
