//! UI rendering for the TUI.
//!
//! Defines the layout and renders all UI components.

use super::app::App;
use super::widgets::{chat, header, input, sidebar, toast};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    Frame,
};

/// Renders the entire UI.
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Header
            Constraint::Min(3),    // Chat + sidebar
            Constraint::Length(3), // Input
        ])
        .split(area);

    let content_layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(72), Constraint::Percentage(28)])
        .split(main_layout[1]);

    let connection_info = app.connection.display_string();
    frame.render_widget(
        header::Header::new(&connection_info, app.spinner.as_ref(), app.connected),
        main_layout[0],
    );
    frame.render_widget(
        chat::ChatPanel::new(&app.messages, app.chat_scroll),
        content_layout[0],
    );
    frame.render_widget(
        sidebar::Sidebar::new(&app.connection, app.connected, app.pending_write),
        content_layout[1],
    );
    render_input(frame, main_layout[2], app);

    if let Some(notice) = &app.notice {
        if notice.is_panel() {
            frame.render_widget(
                toast::NoticePanel::new(notice),
                toast::NoticePanel::area(area, &notice.text),
            );
        } else {
            frame.render_widget(toast::Toast::new(notice), toast::Toast::area(area, &notice.text));
        }
    }
}

fn render_input(frame: &mut Frame, area: Rect, app: &App) {
    let busy = app.is_processing();
    frame.render_widget(
        input::InputBar::new(&app.input.text, app.input.cursor, busy),
        area,
    );

    if !busy {
        // Border (1) and prompt "> " (2).
        let available = usize::from(area.width.saturating_sub(5));
        let column = app.input.cursor - input::scroll_offset(app.input.cursor, available);
        let cursor_x = area.x + 3 + u16::try_from(column).unwrap_or(0);
        frame.set_cursor_position((cursor_x, area.y + 1));
    }
}
