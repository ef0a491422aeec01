//! Core library for aimon.
//!
//! Polls an external data source for per-tool AI usage snapshots (Claude,
//! Codex, Gemini), keeps the latest known-good snapshot, and derives the
//! values a status-bar indicator and its detail popup display.

pub mod config;
pub mod usage;
