//! TUI widgets for pgchat.

pub mod chat;
pub mod header;
pub mod input;
pub mod sidebar;
pub mod spinner;
pub mod toast;
