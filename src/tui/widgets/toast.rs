//! Notice widgets: a one-line toast and a dismissible panel for longer text.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
};

use crate::tui::app::{Notice, NoticeKind};

fn color(kind: NoticeKind) -> Color {
    match kind {
        NoticeKind::Info => Color::Green,
        NoticeKind::Warning => Color::Yellow,
        NoticeKind::Error => Color::Red,
    }
}

/// Short notice in the bottom-right corner.
pub struct Toast<'a> {
    notice: &'a Notice,
}

impl<'a> Toast<'a> {
    pub fn new(notice: &'a Notice) -> Self {
        Self { notice }
    }

    /// Bottom-right corner, above the input bar. Grows to fit the text.
    pub fn area(screen: Rect, text: &str) -> Rect {
        let max_width = screen.width.saturating_sub(4);
        let width = (text.chars().count() as u16 + 4).clamp(20.min(max_width), max_width);
        let height = 3;
        let x = screen.width.saturating_sub(width + 2);
        let y = screen.height.saturating_sub(height + 4);
        Rect::new(x, y, width, height)
    }
}

impl Widget for Toast<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Clear.render(area, buf);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(color(self.notice.kind)))
            .style(Style::default().bg(Color::Black));

        let max = usize::from(block.inner(area).width);
        let text: String = if self.notice.text.chars().count() > max {
            let mut cut: String = self.notice.text.chars().take(max.saturating_sub(1)).collect();
            cut.push('…');
            cut
        } else {
            self.notice.text.clone()
        };

        Paragraph::new(Line::from(Span::styled(
            text,
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )))
        .block(block)
        .render(area, buf);
    }
}

/// Centered panel for multi-line notices such as /help and /config.
pub struct NoticePanel<'a> {
    notice: &'a Notice,
}

impl<'a> NoticePanel<'a> {
    pub fn new(notice: &'a Notice) -> Self {
        Self { notice }
    }

    pub fn area(parent: Rect, text: &str) -> Rect {
        let longest = text.lines().map(|l| l.chars().count()).max().unwrap_or(0) as u16;
        let width = (longest + 4).min(parent.width.saturating_sub(4));
        let height = (text.lines().count() as u16 + 2).min(parent.height.saturating_sub(2));
        let x = parent.x + parent.width.saturating_sub(width) / 2;
        let y = parent.y + parent.height.saturating_sub(height) / 2;
        Rect::new(x, y, width, height)
    }
}

impl Widget for NoticePanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Clear.render(area, buf);

        let accent = color(self.notice.kind);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(accent))
            .title(" press any key ")
            .title_style(Style::default().fg(accent).add_modifier(Modifier::BOLD));

        let lines: Vec<Line> = self.notice.text.lines().map(Line::from).collect();
        Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: false })
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toast_area_stays_on_screen() {
        let screen = Rect::new(0, 0, 80, 24);
        let area = Toast::area(screen, "Database connection refreshed.");
        assert!(area.right() <= screen.right());
        assert_eq!(area.height, 3);

        let long = "x".repeat(200);
        assert_eq!(Toast::area(screen, &long).width, 76);
    }

    #[test]
    fn test_panel_area_fits_text() {
        let parent = Rect::new(0, 0, 100, 40);
        let area = NoticePanel::area(parent, "host: a\nport: 5432\nuser: b");
        assert_eq!(area.height, 5);
        assert_eq!(area.width, 14);
    }
}
