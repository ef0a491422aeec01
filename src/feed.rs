//! Plain-text indicator output for shell prompts and status bars.

use std::io::Write;
use std::time::Duration;

use aimon_core::config::SettingsStore;
use aimon_core::usage::{ControllerState, PanelIndicator, PopupView, StateReceiver};
use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{debug, warn};

/// Countdowns are re-rendered at least this often while watching
const REDRAW_INTERVAL: Duration = Duration::from_secs(30);

/// One-line indicator text: `{name} {label} {countdown}`
pub fn indicator_line(indicator: &PanelIndicator) -> String {
    [
        indicator.tool_name,
        indicator.label.as_str(),
        indicator.countdown.as_str(),
    ]
    .iter()
    .filter(|part| !part.is_empty())
    .copied()
    .collect::<Vec<_>>()
    .join(" ")
}

/// Output format for the feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// [`indicator_line`]
    #[default]
    Text,
    /// `{"indicator": .., "popup": ..}` as one JSON object per line
    Json,
}

fn render(state: &ControllerState, settings: &SettingsStore, format: Format) -> Result<String> {
    let settings = settings.snapshot();
    let now = Utc::now();
    let indicator = PanelIndicator::build(state, &settings, now);
    match format {
        Format::Text => Ok(indicator_line(&indicator)),
        Format::Json => {
            let popup = PopupView::build(state, &settings, now);
            let value = serde_json::json!({ "indicator": indicator, "popup": popup });
            serde_json::to_string(&value).context("Failed to serialize usage view")
        }
    }
}

/// Wait for the first refresh to settle and return the indicator line
pub async fn status(
    mut rx: StateReceiver,
    settings: &SettingsStore,
    format: Format,
) -> Result<String> {
    let state = rx
        .wait_for(|s| !s.is_loading)
        .await
        .context("Refresh controller stopped before usage was loaded")?
        .clone();

    if let Some(ref err) = state.last_error {
        warn!("Usage refresh failed: {}", err.message);
    }
    render(&state, settings, format)
}

/// Write the indicator line every time it changes, until the controller
/// stops or Ctrl-C is pressed
pub async fn watch<W: Write>(
    mut rx: StateReceiver,
    settings: &SettingsStore,
    format: Format,
    out: &mut W,
) -> Result<()> {
    let mut settings_rx = settings.subscribe();
    let mut redraw = tokio::time::interval(REDRAW_INTERVAL);
    let mut last = String::new();

    loop {
        let state = rx.borrow_and_update().clone();
        let line = render(&state, settings, format)?;
        if line != last {
            writeln!(out, "{}", line).context("Failed to write indicator line")?;
            out.flush().context("Failed to flush output")?;
            last = line;
        }

        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    debug!("Refresh controller stopped, ending watch");
                    return Ok(());
                }
            }
            _ = settings_rx.recv() => {}
            _ = redraw.tick() => {}
            _ = tokio::signal::ctrl_c() => return Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aimon_core::config::Settings;
    use aimon_core::usage::{FetchError, RefreshController, ToolId, UsageSource};
    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    struct Fixed(&'static str);

    /// Forwards each written line to a channel
    struct LineSender {
        tx: tokio::sync::mpsc::UnboundedSender<String>,
        buf: Vec<u8>,
    }

    impl Write for LineSender {
        fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
            self.buf.extend_from_slice(data);
            while let Some(pos) = self.buf.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = self.buf.drain(..=pos).collect();
                let line = String::from_utf8_lossy(&line[..pos]).into_owned();
                let _ = self.tx.send(line);
            }
            Ok(data.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[async_trait]
    impl UsageSource for Fixed {
        async fn fetch(&self) -> Result<String, FetchError> {
            Ok(self.0.to_string())
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_indicator_line_loading() {
        let state = ControllerState::new(60);
        let indicator = PanelIndicator::build(&state, &Settings::default(), now());
        assert_eq!(indicator_line(&indicator), "Claude Code ...");
    }

    #[test]
    fn test_indicator_line_with_countdown() {
        let mut state = ControllerState::new(60);
        state.is_loading = false;
        let claude = state.snapshot.get_mut(ToolId::Claude);
        claude.installed = true;
        claude.figures = aimon_core::usage::UsageFigures::Windowed {
            five_hour_pct: Some(41.6),
            five_hour_reset: Some("2026-03-01T14:15:00Z".to_string()),
            seven_day_pct: None,
            seven_day_reset: None,
        };

        let indicator = PanelIndicator::build(&state, &Settings::default(), now());
        assert_eq!(indicator_line(&indicator), "Claude Code 42% in 2h 15m");
    }

    #[tokio::test]
    async fn test_status_waits_for_first_refresh() {
        let settings = SettingsStore::shared(Settings::default());
        let source = Arc::new(Fixed(
            r#"{"codex":{"installed":true,"five_hour_pct":12}}"#,
        ));
        let mut handle = RefreshController::new(source, settings.clone()).spawn();

        let line = status(handle.subscribe(), &settings, Format::Text).await.unwrap();
        assert_eq!(line, "OpenAI Codex 12%");
        handle.teardown().await;
    }

    #[tokio::test]
    async fn test_status_json() {
        let settings = SettingsStore::shared(Settings::default());
        let source = Arc::new(Fixed(
            r#"{"claude":{"installed":true,"five_hour_pct":95}}"#,
        ));
        let mut handle = RefreshController::new(source, settings.clone()).spawn();

        let json = status(handle.subscribe(), &settings, Format::Json).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["indicator"]["tool"], "claude");
        assert_eq!(value["indicator"]["label"], "95%");
        assert_eq!(value["indicator"]["tier"], "critical");
        assert_eq!(value["indicator"]["show_ring"], true);

        let sections = value["popup"]["sections"].as_array().unwrap();
        assert_eq!(sections[0]["tool"], "claude");
        assert_eq!(sections[0]["bars"][0]["label"], "5h");
        assert_eq!(sections[0]["bars"][0]["percent"], 95.0);
        handle.teardown().await;
    }

    #[tokio::test]
    async fn test_status_after_teardown_reports_settled_state() {
        let settings = SettingsStore::shared(Settings::default());
        let mut handle = RefreshController::new(Arc::new(Fixed("")), settings.clone()).spawn();
        let rx = handle.subscribe();
        handle.teardown().await;

        // Teardown publishes a settled state before closing
        let line = status(rx, &settings, Format::Text).await.unwrap();
        assert_eq!(line, "Claude Code !");
    }

    #[tokio::test]
    async fn test_watch_prints_changes_until_controller_stops() {
        let settings = SettingsStore::shared(Settings::default());
        let source = Arc::new(Fixed(r#"{"claude":{"installed":true,"five_hour_pct":5}}"#));
        let mut handle = RefreshController::new(source, settings.clone()).spawn();
        status(handle.subscribe(), &settings, Format::Text).await.unwrap();

        let (tx, mut lines) = tokio::sync::mpsc::unbounded_channel();
        let watcher = {
            let rx = handle.subscribe();
            let settings = settings.clone();
            tokio::spawn(async move {
                let mut out = LineSender { tx, buf: Vec::new() };
                watch(rx, &settings, Format::Text, &mut out).await
            })
        };

        // The watcher has rendered the current state before teardown
        assert_eq!(lines.recv().await.as_deref(), Some("Claude Code 5%"));
        handle.teardown().await;
        watcher.await.unwrap().unwrap();

        let mut rest = Vec::new();
        while let Some(line) = lines.recv().await {
            rest.push(line);
        }
        assert_eq!(rest, vec!["Claude Code !"]);
    }
}
