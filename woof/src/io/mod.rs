//! Side-effecting helpers: files, child processes, notifications.

pub mod config;
pub mod drain;
pub mod launcher;
pub mod notify;
pub mod process;
pub mod prompt;
pub mod tasks;
