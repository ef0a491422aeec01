//! Per-tool sections of the popup with usage bars.

use aimon_core::usage::{PopupView, ToolSection, UsageBarView};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use super::indicator::tier_color;

/// Labels longer than this are cut (Gemini model names)
const MAX_LABEL_WIDTH: usize = 16;

/// Tool sections widget
pub struct ToolPanel;

impl ToolPanel {
    /// Render every visible section, or the popup message when there is none
    pub fn render(frame: &mut Frame, area: Rect, popup: &PopupView) {
        if let Some(message) = popup.message {
            let line = Line::from(Span::styled(message, Style::default().fg(Color::DarkGray)));
            let paragraph = Paragraph::new(vec![Line::from(""), line]).alignment(Alignment::Center);
            frame.render_widget(paragraph, area);
            return;
        }

        let mut constraints: Vec<Constraint> = popup
            .sections
            .iter()
            .map(|s| Constraint::Length(Self::height(s)))
            .collect();
        constraints.push(Constraint::Min(0));

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(area);

        for (section, row) in popup.sections.iter().zip(rows.iter()) {
            Self::render_section(frame, *row, section);
        }
    }

    /// Calculate the height needed for a section
    pub fn height(section: &ToolSection) -> u16 {
        let content_rows = section.error.is_some() as usize
            + section.note.is_some() as usize
            + section.bars.len();
        // 2 (top/bottom border) + at least one content row
        content_rows.max(1) as u16 + 2
    }

    fn render_section(frame: &mut Frame, area: Rect, section: &ToolSection) {
        if area.height < 3 || area.width < 10 {
            return;
        }

        let mut title = vec![Span::styled(
            format!(" {} ", section.title),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )];
        if let Some(ref plan) = section.plan {
            title.push(Span::styled(
                format!("{} ", plan),
                Style::default().fg(Color::DarkGray),
            ));
        }

        let block = Block::default()
            .title(Line::from(title))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::Gray));

        let inner = block.inner(area);
        frame.render_widget(block, area);

        let mut lines = Vec::new();
        if let Some(ref err) = section.error {
            lines.push(Self::error_line(err, section.fail_reason.as_deref()));
        }
        if let Some(note) = section.note {
            lines.push(Line::from(Span::styled(
                format!(" {}", note),
                Style::default().fg(Color::DarkGray),
            )));
        }

        let label_width = section
            .bars
            .iter()
            .map(|b| b.label.width().min(MAX_LABEL_WIDTH))
            .max()
            .unwrap_or(0);
        let countdown_width = section
            .bars
            .iter()
            .map(|b| b.countdown.width())
            .max()
            .unwrap_or(0);
        lines.extend(
            section
                .bars
                .iter()
                .map(|bar| Self::render_bar_line(bar, inner.width, label_width, countdown_width)),
        );

        if lines.is_empty() {
            lines.push(Line::from(Span::styled(
                " No usage data",
                Style::default().fg(Color::DarkGray),
            )));
        }

        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
    }

    /// Render a single bar with uniform width across the section:
    /// " 5h ████████░░░░░  79%  in 2h 10m"
    fn render_bar_line(
        bar: &UsageBarView,
        width: u16,
        label_width: usize,
        countdown_width: usize,
    ) -> Line<'static> {
        let label = Self::fit_label(&bar.label, label_width);
        let percent_str = format!("{:>3}%", bar.percent.round() as i64);

        let countdown_col = if countdown_width > 0 {
            countdown_width + 2
        } else {
            0
        };
        // " label ████░░░░ 100%  countdown"
        let fixed_width = 1 + label_width + 1 + 1 + 4 + countdown_col;
        let bar_width = if width as usize > fixed_width + 4 {
            width as usize - fixed_width
        } else {
            4
        };

        let filled = Self::filled_cells(bar.percent, bar_width);
        let empty = bar_width.saturating_sub(filled);
        let color = tier_color(bar.tier);

        let mut spans = vec![
            Span::styled(
                format!(" {} ", label),
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::DIM),
            ),
            Span::styled("█".repeat(filled), Style::default().fg(color)),
            Span::styled(
                "░".repeat(empty),
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::DIM),
            ),
            Span::styled(format!(" {}", percent_str), Style::default().fg(color)),
        ];

        if countdown_width > 0 {
            spans.push(Span::styled(
                format!("  {}", bar.countdown),
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::DIM),
            ));
        }

        Line::from(spans)
    }

    /// " Error: Rate limited (3 attempts) [rate_limited]"
    fn error_line(error: &str, fail_reason: Option<&str>) -> Line<'static> {
        let mut spans = vec![Span::styled(
            format!(" Error: {}", error),
            Style::default().fg(Color::Red),
        )];
        if let Some(reason) = fail_reason {
            spans.push(Span::styled(
                format!(" [{}]", reason),
                Style::default()
                    .fg(Color::Red)
                    .add_modifier(Modifier::DIM),
            ));
        }
        Line::from(spans)
    }

    fn filled_cells(percent: f64, bar_width: usize) -> usize {
        ((percent / 100.0) * bar_width as f64).round() as usize
    }

    /// Pad or cut a label to exactly `width` columns
    fn fit_label(label: &str, width: usize) -> String {
        let mut out = String::new();
        let mut used = 0;
        for ch in label.chars() {
            let w = ch.to_string().width();
            if used + w > width {
                break;
            }
            out.push(ch);
            used += w;
        }
        out.push_str(&" ".repeat(width - used));
        out
    }
}
