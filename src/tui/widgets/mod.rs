//! TUI widgets for sqlchat.

pub mod banner;
pub mod chat;
pub mod header;
pub mod input;
pub mod sidebar;
pub mod spinner;
