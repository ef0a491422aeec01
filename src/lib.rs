//! Terminal host for the AI usage monitor.
//!
//! Wires the refresh controller from `aimon_core` to a command line, a
//! status-line feed and a ratatui popup.

pub mod config;
pub mod feed;
pub mod ui;
