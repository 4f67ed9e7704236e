//! Chat panel widget for the TUI.
//!
//! Renders the session log, newest at the bottom, scrolled by lines.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

use crate::session::{ChatMessage, ChatRole};

/// Chat panel widget.
pub struct ChatPanel<'a> {
    messages: &'a [ChatMessage],
    /// Lines scrolled up from the bottom.
    scroll: usize,
}

impl<'a> ChatPanel<'a> {
    pub fn new(messages: &'a [ChatMessage], scroll: usize) -> Self {
        Self { messages, scroll }
    }

    fn lines(&self) -> Vec<Line<'a>> {
        let mut lines = Vec::new();
        for message in self.messages {
            let label_style = match message.role() {
                ChatRole::User => Style::default().fg(Color::Cyan),
                ChatRole::Assistant => Style::default().fg(Color::Green),
            }
            .add_modifier(Modifier::BOLD);

            lines.push(Line::from(Span::styled(message.role().label(), label_style)));
            lines.extend(message.text().lines().map(|l| Line::from(format!("  {l}"))));
            lines.push(Line::from(""));
        }
        lines
    }
}

/// Rough number of rendered rows for `lines` at the given width.
fn wrapped_height(lines: &[Line<'_>], width: u16) -> usize {
    let width = usize::from(width.max(1));
    lines
        .iter()
        .map(|line| line.width().max(1).div_ceil(width))
        .sum()
}

impl Widget for ChatPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(" Chat ");

        let lines = self.lines();
        let inner = block.inner(area);
        let total = wrapped_height(&lines, inner.width);
        let visible = usize::from(inner.height);
        let max_offset = total.saturating_sub(visible);
        let top = max_offset.saturating_sub(self.scroll.min(max_offset));

        Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: false })
            .scroll((u16::try_from(top).unwrap_or(u16::MAX), 0))
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_label_each_message() {
        let messages = vec![
            ChatMessage::assistant("Hello!"),
            ChatMessage::user("How many users?"),
            ChatMessage::assistant("There are\n3 users."),
        ];
        let panel = ChatPanel::new(&messages, 0);
        let lines = panel.lines();

        let text: Vec<String> = lines.iter().map(|l| l.to_string()).collect();
        assert_eq!(text[0], "pgchat");
        assert_eq!(text[3], "You");
        assert!(text.contains(&"  3 users.".to_string()));
    }

    #[test]
    fn test_wrapped_height() {
        let lines = vec![Line::from("a".repeat(25)), Line::from("")];
        assert_eq!(wrapped_height(&lines, 10), 4);
    }

    #[test]
    fn test_render_shows_latest_message() {
        let messages: Vec<ChatMessage> = (0..20)
            .map(|i| ChatMessage::user(format!("question {i}")))
            .collect();
        let area = Rect::new(0, 0, 40, 8);
        let mut buf = Buffer::empty(area);

        ChatPanel::new(&messages, 0).render(area, &mut buf);

        let screen: String = (0..area.height)
            .map(|y| {
                (0..area.width)
                    .map(|x| buf[(x, y)].symbol().to_string())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n");
        assert!(screen.contains("question 19"));
        assert!(!screen.contains("question 0 "));
    }
}
