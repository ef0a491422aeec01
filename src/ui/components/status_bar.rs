use aimon_core::config::Settings;
use aimon_core::usage::{ControllerPhase, ControllerState, DisplayMode};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use unicode_width::UnicodeWidthStr;

/// Status bar widget
pub struct StatusBar;

impl StatusBar {
    /// Render the status bar
    pub fn render(frame: &mut Frame, area: Rect, state: &ControllerState, settings: &Settings) {
        let mut spans = Self::hint_spans(state);

        // Right-align the refresh summary
        let summary = Self::summary(state, settings);
        let used: usize = spans.iter().map(|s| s.content.width()).sum();
        let padding = (area.width as usize).saturating_sub(used + summary.width());
        if padding > 0 {
            spans.push(Span::raw(" ".repeat(padding)));
            spans.push(Span::styled(summary, Style::default().fg(Color::DarkGray)));
        }

        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn hint_spans(state: &ControllerState) -> Vec<Span<'static>> {
        if let Some(ref err) = state.last_error {
            return vec![Span::styled(
                format!(" ! {} ", err.message),
                Style::default().fg(Color::Red),
            )];
        }

        let mut spans = Vec::new();
        for (key, action) in [
            ("r", "Refresh"),
            ("t", "Tool"),
            ("m", "Mode"),
            ("i", "Interval"),
            ("1-3", "Show"),
            ("?", "Help"),
            ("q", "Quit"),
        ] {
            spans.push(Span::styled(
                format!(" {}", key),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ));
            spans.push(Span::styled(
                format!(":{}", action),
                Style::default().fg(Color::DarkGray),
            ));
        }
        spans
    }

    /// "Mode: Ring only | every 60s" or "fetching..."
    fn summary(state: &ControllerState, settings: &Settings) -> String {
        let mode = DisplayMode::from_setting(settings.panel_display_mode);
        let activity = match state.phase {
            ControllerPhase::Fetching => "fetching...".to_string(),
            ControllerPhase::Idle => format!("every {}s", state.refresh_interval_secs),
            ControllerPhase::Disabled => "stopped".to_string(),
        };
        format!("{} | {} ", mode.display_name(), activity)
    }
}
