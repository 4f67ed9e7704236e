//! Input history for the TUI.
//!
//! Recalls earlier inputs with the arrow keys. Lives only as long as the
//! session.

use std::collections::VecDeque;

use crate::app::redact_input;

const MAX_ENTRIES: usize = 100;

/// Previously submitted inputs, oldest first.
#[derive(Debug, Default)]
pub struct InputHistory {
    entries: VecDeque<String>,
    /// Index into `entries` while browsing, `None` at the draft.
    cursor: Option<usize>,
    /// What the user was typing before browsing started.
    draft: String,
}

impl InputHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an input. Blank inputs, repeats of the last entry and
    /// `/set password` lines are skipped.
    pub fn push(&mut self, entry: &str) {
        let entry = entry.trim();
        self.cursor = None;
        self.draft.clear();

        if entry.is_empty() || self.entries.back().map(String::as_str) == Some(entry) {
            return;
        }
        if redact_input(entry) != entry {
            return;
        }

        self.entries.push_back(entry.to_string());
        if self.entries.len() > MAX_ENTRIES {
            self.entries.pop_front();
        }
    }

    /// Steps to an older entry. Returns `None` when there is nothing older.
    pub fn older(&mut self, current: &str) -> Option<&str> {
        let next = match self.cursor {
            None if !self.entries.is_empty() => {
                self.draft = current.to_string();
                self.entries.len() - 1
            }
            Some(i) if i > 0 => i - 1,
            _ => return None,
        };
        self.cursor = Some(next);
        self.entries.get(next).map(String::as_str)
    }

    /// Steps to a newer entry, ending at the saved draft.
    pub fn newer(&mut self) -> Option<&str> {
        match self.cursor {
            None => None,
            Some(i) if i + 1 < self.entries.len() => {
                self.cursor = Some(i + 1);
                self.entries.get(i + 1).map(String::as_str)
            }
            Some(_) => {
                self.cursor = None;
                Some(self.draft.as_str())
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_skips_blank_and_repeats() {
        let mut history = InputHistory::new();
        history.push("show users");
        history.push("show users");
        history.push("   ");
        history.push("/refresh");
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_browse_and_return_to_draft() {
        let mut history = InputHistory::new();
        history.push("first");
        history.push("second");

        assert_eq!(history.older("typing"), Some("second"));
        assert_eq!(history.older("second"), Some("first"));
        assert_eq!(history.older("first"), None);
        assert_eq!(history.newer(), Some("second"));
        assert_eq!(history.newer(), Some("typing"));
        assert_eq!(history.newer(), None);
    }

    #[test]
    fn test_password_lines_are_not_kept() {
        let mut history = InputHistory::new();
        history.push("/set user app");
        history.push("/set password hunter2");
        history.push("/set password ");

        assert_eq!(history.len(), 2);
        assert_eq!(history.older(""), Some("/set password"));
        assert_eq!(history.older(""), Some("/set user app"));
    }

    #[test]
    fn test_bounded() {
        let mut history = InputHistory::new();
        for i in 0..(MAX_ENTRIES + 5) {
            history.push(&format!("q{i}"));
        }
        assert_eq!(history.len(), MAX_ENTRIES);
        assert_eq!(history.older(""), Some("q104"));
    }
}
