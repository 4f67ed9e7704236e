//! Header bar: application name, spinner and connection info.

use super::spinner::Spinner;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::Span,
    widgets::Widget,
};

pub struct Header<'a> {
    connection_info: &'a str,
    spinner: Option<&'a Spinner>,
    connected: bool,
}

impl<'a> Header<'a> {
    pub fn new(connection_info: &'a str, spinner: Option<&'a Spinner>, connected: bool) -> Self {
        Self {
            connection_info,
            spinner,
            connected,
        }
    }
}

impl Widget for Header<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let style = Style::default()
            .bg(Color::Blue)
            .fg(Color::White)
            .add_modifier(Modifier::BOLD);

        for x in area.left()..area.right() {
            buf[(x, area.y)].set_style(style);
        }

        let title = format!(" pgchat v{}", env!("CARGO_PKG_VERSION"));
        buf.set_span(area.x, area.y, &Span::styled(title, style), area.width);

        if let Some(spinner) = self.spinner {
            let text = spinner.display();
            let width = text.chars().count() as u16;
            let x = area.x + area.width.saturating_sub(width) / 2;
            buf.set_string(x, area.y, &text, style.fg(Color::Yellow));
        }

        let dot = if self.connected { "●" } else { "○" };
        let right = format!(" {dot} [db: {}] ", self.connection_info);
        let width = right.chars().count() as u16;
        if width < area.width {
            let dot_color = if self.connected { Color::Green } else { Color::Gray };
            let x = area.right().saturating_sub(width);
            buf.set_string(x, area.y, &right, style);
            buf.set_string(x + 1, area.y, dot, style.fg(dot_color));
        }
    }
}
