//! Input widget for the TUI.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use crate::app::mask_secret;

/// Shown while the input line is empty.
pub const PLACEHOLDER: &str = "Ask or command anything (e.g. SELECT, UPDATE, DELETE...)";

/// Characters to skip so the cursor stays visible.
pub fn scroll_offset(cursor: usize, available_width: usize) -> usize {
    cursor.saturating_sub(available_width)
}

/// Input bar widget.
pub struct InputBar<'a> {
    text: &'a str,
    cursor: usize,
    busy: bool,
}

impl<'a> InputBar<'a> {
    pub fn new(text: &'a str, cursor: usize, busy: bool) -> Self {
        Self { text, cursor, busy }
    }
}

impl Widget for InputBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border_color = if self.busy { Color::DarkGray } else { Color::Cyan };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border_color))
            .title(" Input ");

        let prompt = Span::styled(
            "> ",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        );

        let line = if self.text.is_empty() {
            Line::from(vec![
                prompt,
                Span::styled(PLACEHOLDER, Style::default().fg(Color::DarkGray)),
            ])
        } else {
            // Borders (2), prompt (2) and the cursor cell (1).
            let available = usize::from(area.width.saturating_sub(5));
            let skip = scroll_offset(self.cursor, available);
            let visible: String = mask_secret(self.text).chars().skip(skip).collect();
            Line::from(vec![prompt, Span::raw(visible)])
        };

        Paragraph::new(line).block(block).render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scroll_offset() {
        assert_eq!(scroll_offset(5, 20), 0);
        assert_eq!(scroll_offset(20, 20), 0);
        assert_eq!(scroll_offset(25, 20), 5);
        assert_eq!(scroll_offset(5, 0), 5);
    }

    #[test]
    fn test_password_is_masked_while_typing() {
        let area = Rect::new(0, 0, 80, 3);
        let mut buf = Buffer::empty(area);
        let text = "/set password hunter2";
        InputBar::new(text, text.chars().count(), false).render(area, &mut buf);

        let row: String = (0..area.width).map(|x| buf[(x, 1)].symbol().to_string()).collect();
        assert!(row.contains("/set password *******"));
        assert!(!row.contains("hunter2"));
    }

    #[test]
    fn test_placeholder_when_empty() {
        let area = Rect::new(0, 0, 80, 3);
        let mut buf = Buffer::empty(area);
        InputBar::new("", 0, false).render(area, &mut buf);

        let row: String = (0..area.width).map(|x| buf[(x, 1)].symbol().to_string()).collect();
        assert!(row.contains("Ask or command anything"));
    }
}
