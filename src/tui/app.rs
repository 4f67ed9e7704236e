//! Application state for the TUI.
//!
//! Holds what the screen shows: the latest session snapshot, the input line,
//! the spinner and any notice. Key handling lives here; talking to the
//! orchestrator does not.

use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::history::InputHistory;
use super::widgets::spinner::Spinner;
use super::worker::WorkerUpdate;
use crate::app::InputResult;
use crate::config::ConnectionConfig;
use crate::session::{ChatMessage, Session};

/// How long one-line notices stay on screen.
const TOAST_DURATION: Duration = Duration::from_secs(4);

/// Input state for text editing. The cursor counts characters, not bytes.
#[derive(Debug, Default)]
pub struct InputState {
    pub text: String,
    pub cursor: usize,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    fn byte_index(&self, cursor: usize) -> usize {
        self.text
            .char_indices()
            .nth(cursor)
            .map(|(i, _)| i)
            .unwrap_or(self.text.len())
    }

    fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn insert(&mut self, c: char) {
        let at = self.byte_index(self.cursor);
        self.text.insert(at, c);
        self.cursor += 1;
    }

    /// Deletes the character before the cursor.
    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let at = self.byte_index(self.cursor);
            self.text.remove(at);
        }
    }

    /// Deletes the character under the cursor.
    pub fn delete(&mut self) {
        if self.cursor < self.char_len() {
            let at = self.byte_index(self.cursor);
            self.text.remove(at);
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.char_len());
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.char_len();
    }

    /// Replaces the text and puts the cursor at the end.
    pub fn set(&mut self, text: &str) {
        self.text = text.to_string();
        self.cursor = self.char_len();
    }

    /// Clears the input and returns the previous text.
    pub fn take(&mut self) -> String {
        self.cursor = 0;
        std::mem::take(&mut self.text)
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// How a notice should be styled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Warning,
    Error,
}

/// Output that is shown but not part of the conversation.
#[derive(Debug, Clone)]
pub struct Notice {
    pub text: String,
    pub kind: NoticeKind,
    /// One-line notices expire; multi-line ones stay until a key is pressed.
    pub expires_at: Option<Instant>,
}

impl Notice {
    fn new(text: impl Into<String>, kind: NoticeKind) -> Self {
        let text = text.into();
        let expires_at = (!text.contains('\n')).then(|| Instant::now() + TOAST_DURATION);
        Self {
            text,
            kind,
            expires_at,
        }
    }

    /// True for notices shown as a dismissible panel.
    pub fn is_panel(&self) -> bool {
        self.expires_at.is_none()
    }
}

/// Main application state.
pub struct App {
    pub running: bool,
    pub input: InputState,
    pub history: InputHistory,
    /// Snapshot of the session log.
    pub messages: Vec<ChatMessage>,
    /// Chat scroll offset (lines from bottom).
    pub chat_scroll: usize,
    /// Set while a request is with the worker.
    pub spinner: Option<Spinner>,
    pub notice: Option<Notice>,
    pub connection: ConnectionConfig,
    pub connected: bool,
    pub pending_write: bool,
}

impl App {
    pub fn new(connection: ConnectionConfig) -> Self {
        Self {
            running: true,
            input: InputState::new(),
            history: InputHistory::new(),
            messages: Session::new().render().cloned().collect(),
            chat_scroll: 0,
            spinner: None,
            notice: None,
            connection,
            connected: false,
            pending_write: false,
        }
    }

    pub fn is_processing(&self) -> bool {
        self.spinner.is_some()
    }

    /// Handles a key press. Returns the input line to submit, if any.
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<String> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        if ctrl && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('q')) {
            self.running = false;
            return None;
        }

        if self.notice.as_ref().is_some_and(Notice::is_panel) {
            self.notice = None;
            return None;
        }

        match key.code {
            KeyCode::Enter => return self.submit(),
            KeyCode::Esc => {
                self.input.take();
            }
            KeyCode::Char('u') if ctrl => {
                self.input.take();
            }
            KeyCode::Char(c) => self.input.insert(c),
            KeyCode::Backspace => self.input.backspace(),
            KeyCode::Delete => self.input.delete(),
            KeyCode::Left => self.input.move_left(),
            KeyCode::Right => self.input.move_right(),
            KeyCode::Home => self.input.move_home(),
            KeyCode::End => self.input.move_end(),
            KeyCode::Up => {
                if let Some(entry) = self.history.older(&self.input.text) {
                    let entry = entry.to_string();
                    self.input.set(&entry);
                }
            }
            KeyCode::Down => {
                if let Some(entry) = self.history.newer() {
                    let entry = entry.to_string();
                    self.input.set(&entry);
                }
            }
            KeyCode::PageUp => self.chat_scroll = self.chat_scroll.saturating_add(10),
            KeyCode::PageDown => self.chat_scroll = self.chat_scroll.saturating_sub(10),
            _ => {}
        }
        None
    }

    fn submit(&mut self) -> Option<String> {
        if self.input.text.trim().is_empty() {
            return None;
        }
        if self.is_processing() {
            self.notify("Still thinking. Please wait for the current answer.", NoticeKind::Warning);
            return None;
        }

        let text = self.input.take();
        self.history.push(&text);
        self.spinner = Some(Spinner::thinking());
        Some(text)
    }

    /// Applies the worker's reply to a submitted input.
    pub fn apply_update(&mut self, update: WorkerUpdate) {
        self.spinner = None;
        self.messages = update.messages;
        self.connection = update.connection;
        self.connected = update.connected;
        self.pending_write = update.pending_write;
        self.chat_scroll = 0;

        match update.result {
            Ok(InputResult::None) | Ok(InputResult::Replied(_)) => {}
            Ok(InputResult::ConfirmationRequired(_)) => {
                self.notify("Type /confirm to run the statement or /cancel to discard it.", NoticeKind::Warning)
            }
            Ok(InputResult::Notice(text)) => self.notify(text, NoticeKind::Info),
            Ok(InputResult::Failed(text)) | Ok(InputResult::Halted(text)) => {
                self.notify(text, NoticeKind::Error)
            }
            Ok(InputResult::Exit) => self.running = false,
            Err(e) => self.notify(format!("{}: {}", e.category(), e), NoticeKind::Error),
        }
    }

    pub fn notify(&mut self, text: impl Into<String>, kind: NoticeKind) {
        self.notice = Some(Notice::new(text, kind));
    }

    /// Drops a one-line notice once its time is up.
    pub fn clear_expired_notice(&mut self) {
        let expired = self
            .notice
            .as_ref()
            .and_then(|n| n.expires_at)
            .is_some_and(|at| Instant::now() >= at);
        if expired {
            self.notice = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ChatError;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
    }

    fn update(result: crate::error::Result<InputResult>, messages: Vec<ChatMessage>) -> WorkerUpdate {
        WorkerUpdate {
            result,
            messages,
            connection: ConnectionConfig::default(),
            connected: true,
            pending_write: false,
        }
    }

    #[test]
    fn test_input_handles_multibyte_chars() {
        let mut input = InputState::new();
        for c in "héllo".chars() {
            input.insert(c);
        }
        input.move_left();
        input.backspace();
        assert_eq!(input.text, "hélo");
        assert_eq!(input.cursor, 3);

        input.move_home();
        input.delete();
        assert_eq!(input.text, "élo");
    }

    #[test]
    fn test_new_app_shows_greeting() {
        let app = App::new(ConnectionConfig::default());
        assert_eq!(app.messages.len(), 1);
        assert!(!app.is_processing());
    }

    #[test]
    fn test_submit_starts_spinner_and_records_history() {
        let mut app = App::new(ConnectionConfig::default());
        type_text(&mut app, "How many users?");

        let submitted = app.handle_key(key(KeyCode::Enter));

        assert_eq!(submitted.as_deref(), Some("How many users?"));
        assert!(app.is_processing());
        assert!(app.input.is_empty());
        assert_eq!(app.history.len(), 1);
    }

    #[test]
    fn test_blank_and_busy_submissions_are_ignored() {
        let mut app = App::new(ConnectionConfig::default());
        type_text(&mut app, "   ");
        assert_eq!(app.handle_key(key(KeyCode::Enter)), None);

        app.input.take();
        type_text(&mut app, "first");
        app.handle_key(key(KeyCode::Enter));
        type_text(&mut app, "second");
        assert_eq!(app.handle_key(key(KeyCode::Enter)), None);
        assert_eq!(app.input.text, "second");
        assert_eq!(app.notice.as_ref().map(|n| n.kind), Some(NoticeKind::Warning));
    }

    #[test]
    fn test_apply_update_replaces_snapshot() {
        let mut app = App::new(ConnectionConfig::default());
        app.spinner = Some(Spinner::thinking());

        app.apply_update(update(
            Ok(InputResult::Replied("3".to_string())),
            vec![ChatMessage::assistant("hi"), ChatMessage::user("q"), ChatMessage::assistant("3")],
        ));

        assert!(!app.is_processing());
        assert_eq!(app.messages.len(), 3);
        assert!(app.connected);
        assert!(app.notice.is_none());
    }

    #[test]
    fn test_failures_become_error_notices() {
        let mut app = App::new(ConnectionConfig::default());

        app.apply_update(update(Ok(InputResult::Halted("missing: user".to_string())), vec![]));
        assert_eq!(app.notice.as_ref().map(|n| n.kind), Some(NoticeKind::Error));

        app.apply_update(update(Err(ChatError::internal("boom")), vec![]));
        let notice = app.notice.as_ref().unwrap();
        assert!(notice.text.starts_with("Internal Error"));
    }

    #[test]
    fn test_multiline_notice_is_dismissed_by_key() {
        let mut app = App::new(ConnectionConfig::default());
        app.apply_update(update(Ok(InputResult::Notice("a\nb".to_string())), vec![]));
        assert!(app.notice.as_ref().unwrap().is_panel());

        app.handle_key(key(KeyCode::Char('x')));
        assert!(app.notice.is_none());
        assert!(app.input.is_empty());
    }

    #[test]
    fn test_exit_and_ctrl_c() {
        let mut app = App::new(ConnectionConfig::default());
        app.apply_update(update(Ok(InputResult::Exit), vec![]));
        assert!(!app.running);

        let mut app = App::new(ConnectionConfig::default());
        app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(!app.running);
    }
}
