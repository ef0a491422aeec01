//! View models for the compact indicator and the detail popup.
//!
//! These are plain data derived from [`ControllerState`] and [`Settings`];
//! whatever draws them only maps fields to widgets.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::controller::ControllerState;
use super::presentation::{clamp_percent, format_countdown, ColorTier};
use super::resolver::resolve_tool;
use super::types::{Snapshot, ToolId, ToolUsageRecord};
use crate::config::Settings;

/// Title used for the indicator and popup header
pub const APP_TITLE: &str = "AI Usage Monitor";

/// What the compact indicator shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayMode {
    /// Ring and percentage
    #[default]
    RingAndText,
    /// Ring only
    RingOnly,
    /// Percentage only
    TextOnly,
}

impl DisplayMode {
    /// Map the stored integer; unknown values fall back to ring and text
    pub fn from_setting(value: i64) -> Self {
        match value {
            1 => DisplayMode::RingOnly,
            2 => DisplayMode::TextOnly,
            _ => DisplayMode::RingAndText,
        }
    }

    /// Integer stored in settings
    pub fn as_setting(&self) -> i64 {
        match self {
            DisplayMode::RingAndText => 0,
            DisplayMode::RingOnly => 1,
            DisplayMode::TextOnly => 2,
        }
    }

    /// Get the next mode in cycle
    pub fn next(self) -> Self {
        match self {
            DisplayMode::RingAndText => DisplayMode::RingOnly,
            DisplayMode::RingOnly => DisplayMode::TextOnly,
            DisplayMode::TextOnly => DisplayMode::RingAndText,
        }
    }

    /// Get display name for the mode
    pub fn display_name(&self) -> &'static str {
        match self {
            DisplayMode::RingAndText => "Ring and percentage",
            DisplayMode::RingOnly => "Ring only",
            DisplayMode::TextOnly => "Percentage only",
        }
    }
}

/// Message shown when no tool has anything to display
pub fn unavailable_message(snapshot: &Snapshot) -> &'static str {
    if snapshot.any_installed() {
        "All tools hidden in settings"
    } else {
        "No AI tools detected"
    }
}

/// Compact status-bar indicator
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PanelIndicator {
    /// Tool whose numbers are shown
    pub tool: ToolId,
    /// Its display name
    pub tool_name: &'static str,
    /// "..." while loading, "!" when no tool is usable, else "NN%"
    pub label: String,
    /// Clamped percentage driving the ring
    pub percent: f64,
    pub tier: ColorTier,
    /// Countdown to the primary window reset
    pub countdown: String,
    pub show_ring: bool,
    pub show_label: bool,
    pub loading: bool,
    /// False when the indicator is in its error state
    pub usable: bool,
    /// Generic explanation for the error state
    pub message: Option<&'static str>,
    /// Tooltip / accessible summary
    pub accessible_name: String,
}

impl PanelIndicator {
    /// Derive the indicator from controller state and settings
    pub fn build(state: &ControllerState, settings: &Settings, now: DateTime<Utc>) -> Self {
        let resolved = resolve_tool(&state.snapshot, &settings.panel_tool);
        let window = resolved.record.primary_window();
        let loading = state.is_loading;

        let percent = if resolved.usable {
            clamp_percent(window.percent.unwrap_or(0.0))
        } else {
            0.0
        };
        let countdown = format_countdown(window.reset, now);

        let label = if loading {
            "...".to_string()
        } else if !resolved.usable {
            "!".to_string()
        } else {
            format!("{}%", percent.round() as i64)
        };

        let tool_name = resolved.tool.display_name();
        let mut accessible_name = APP_TITLE.to_string();
        if !loading {
            if countdown.is_empty() {
                accessible_name.push_str(&format!("\n{}", tool_name));
            } else {
                accessible_name.push_str(&format!("\n{} · {} until reset", tool_name, countdown));
            }
        }

        let mode = DisplayMode::from_setting(settings.panel_display_mode);
        Self {
            tool: resolved.tool,
            tool_name,
            label,
            percent,
            tier: ColorTier::for_percent(percent),
            countdown,
            show_ring: mode != DisplayMode::TextOnly,
            show_label: mode != DisplayMode::RingOnly,
            loading,
            usable: resolved.usable,
            message: (!loading && !resolved.usable)
                .then(|| unavailable_message(&state.snapshot)),
            accessible_name,
        }
    }
}

/// One usage bar in a popup section
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageBarView {
    /// "5h", "7d", or a model name
    pub label: String,
    /// Clamped percentage
    pub percent: f64,
    pub tier: ColorTier,
    /// Countdown to reset; empty when unknown
    pub countdown: String,
}

/// Popup block for one tool
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolSection {
    pub tool: ToolId,
    /// Upper-cased display name
    pub title: String,
    /// Subscription plan reported by the tool, if any
    pub plan: Option<String>,
    /// Error reported for this tool, with attempt count when known
    pub error: Option<String>,
    /// Machine-readable failure category accompanying `error`
    pub fail_reason: Option<String>,
    /// Informational line ("Gemini CLI not detected")
    pub note: Option<&'static str>,
    pub bars: Vec<UsageBarView>,
}

impl ToolSection {
    fn build(tool: ToolId, record: &ToolUsageRecord, now: DateTime<Utc>) -> Self {
        let error = record.error().map(|e| match record.retry_count {
            Some(n) if n > 0 => format!("{} ({} attempts)", e, n),
            _ => e.to_string(),
        });

        let fail_reason = error
            .as_ref()
            .and(record.fail_reason.as_deref())
            .filter(|r| !r.is_empty())
            .map(str::to_string);
        let note = (tool == ToolId::Gemini && !record.installed).then_some("Gemini CLI not detected");

        let bars = if error.is_some() || !record.installed {
            Vec::new()
        } else {
            record
                .windows()
                .into_iter()
                .map(|w| {
                    let percent = clamp_percent(w.percent.unwrap_or(0.0));
                    UsageBarView {
                        label: w.label.to_string(),
                        percent,
                        tier: ColorTier::for_percent(percent),
                        countdown: format_countdown(w.reset, now),
                    }
                })
                .collect()
        };

        Self {
            tool,
            title: tool.display_name().to_uppercase(),
            plan: record.plan_type.clone().filter(|p| !p.is_empty()),
            error,
            fail_reason,
            note,
            bars,
        }
    }
}

/// Detail popup contents
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PopupView {
    pub sections: Vec<ToolSection>,
    /// Shown instead of sections when none are visible
    pub message: Option<&'static str>,
}

impl PopupView {
    /// Derive the popup from controller state and settings
    pub fn build(state: &ControllerState, settings: &Settings, now: DateTime<Utc>) -> Self {
        let snapshot = &state.snapshot;
        let sections: Vec<ToolSection> = ToolId::ALL
            .into_iter()
            .filter(|tool| match tool {
                ToolId::Claude => settings.show_claude && snapshot.claude.installed,
                ToolId::Codex => settings.show_codex && snapshot.codex.installed,
                ToolId::Gemini => settings.show_gemini,
            })
            .map(|tool| ToolSection::build(tool, snapshot.get(tool), now))
            .collect();

        let message = if !sections.is_empty() {
            None
        } else if state.is_loading {
            Some("Loading...")
        } else {
            Some(unavailable_message(snapshot))
        };

        Self { sections, message }
    }
}
