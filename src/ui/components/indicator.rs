//! Compact indicator header: ring, percentage and reset countdown.

use aimon_core::usage::{ColorTier, ControllerState, PanelIndicator, APP_TITLE};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
    Frame,
};

/// Ring glyphs from empty to full
const RING_GLYPHS: [&str; 5] = ["○", "◔", "◑", "◕", "●"];

/// Terminal colour for a usage tier
pub fn tier_color(tier: ColorTier) -> Color {
    let (r, g, b) = tier.rgb();
    Color::Rgb(r, g, b)
}

/// Indicator header widget
pub struct IndicatorBar;

impl IndicatorBar {
    /// Render the indicator header
    pub fn render(frame: &mut Frame, area: Rect, indicator: &PanelIndicator, state: &ControllerState) {
        if area.height < 3 || area.width < 10 {
            return;
        }

        let block = Block::default()
            .title(Self::build_title(state))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::Gray));

        let paragraph = Paragraph::new(Self::build_line(indicator)).block(block);
        frame.render_widget(paragraph, area);
    }

    /// Build the block title with optional timestamp
    fn build_title(state: &ControllerState) -> String {
        if let Some(fetched_at) = state.fetched_at {
            let local = fetched_at.with_timezone(&chrono::Local);
            format!(" {} ({}) ", APP_TITLE, local.format("%H:%M"))
        } else {
            format!(" {} ", APP_TITLE)
        }
    }

    /// " ◕ 73%  OpenAI Codex  in 1h 30m"
    fn build_line(indicator: &PanelIndicator) -> Line<'static> {
        let color = if indicator.usable && !indicator.loading {
            tier_color(indicator.tier)
        } else {
            Color::DarkGray
        };
        let mut spans = vec![Span::raw(" ")];

        if indicator.show_ring {
            spans.push(Span::styled(
                format!("{} ", Self::ring_glyph(indicator.percent)),
                Style::default().fg(color),
            ));
        }
        if indicator.show_label {
            spans.push(Span::styled(
                format!("{} ", indicator.label),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ));
        }

        spans.push(Span::styled(
            format!(" {}", indicator.tool_name),
            Style::default().fg(Color::White),
        ));

        if let Some(message) = indicator.message {
            spans.push(Span::styled(
                format!("  {}", message),
                Style::default().fg(Color::Red),
            ));
        } else if !indicator.countdown.is_empty() {
            spans.push(Span::styled(
                format!("  {}", indicator.countdown),
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::DIM),
            ));
        }

        Line::from(spans)
    }

    /// Ring glyph for a clamped percentage
    fn ring_glyph(percent: f64) -> &'static str {
        let step = (percent / 25.0).round().clamp(0.0, 4.0) as usize;
        RING_GLYPHS[step]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aimon_core::config::Settings;
    use chrono::{TimeZone, Utc};

    fn line_text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_ring_glyph() {
        assert_eq!(IndicatorBar::ring_glyph(0.0), "○");
        assert_eq!(IndicatorBar::ring_glyph(10.0), "○");
        assert_eq!(IndicatorBar::ring_glyph(50.0), "◑");
        assert_eq!(IndicatorBar::ring_glyph(80.0), "◕");
        assert_eq!(IndicatorBar::ring_glyph(100.0), "●");
    }

    #[test]
    fn test_tier_color() {
        assert_eq!(tier_color(ColorTier::Critical), Color::Rgb(0xef, 0x44, 0x44));
        assert_eq!(tier_color(ColorTier::Low), Color::Rgb(0x22, 0xc5, 0x5e));
    }

    #[test]
    fn test_title_without_fetch() {
        let state = ControllerState::new(60);
        assert_eq!(IndicatorBar::build_title(&state), " AI Usage Monitor ");
    }

    #[test]
    fn test_line_respects_display_mode() {
        let mut state = ControllerState::new(60);
        state.is_loading = false;
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();

        let text_only = Settings {
            panel_display_mode: 2,
            ..Settings::default()
        };
        let indicator = PanelIndicator::build(&state, &text_only, now);
        assert_eq!(
            line_text(&IndicatorBar::build_line(&indicator)),
            " !  Claude Code  No AI tools detected"
        );

        let ring_only = Settings {
            panel_display_mode: 1,
            ..Settings::default()
        };
        let indicator = PanelIndicator::build(&state, &ring_only, now);
        assert!(line_text(&IndicatorBar::build_line(&indicator)).starts_with(" ○  Claude Code"));
    }
}
