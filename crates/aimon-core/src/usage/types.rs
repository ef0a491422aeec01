//! Per-tool usage data carried in a snapshot.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// One of the monitored AI CLIs.
///
/// Declaration order is the fallback order used by the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolId {
    Claude,
    Codex,
    Gemini,
}

impl ToolId {
    /// All tools in fallback order
    pub const ALL: [ToolId; 3] = [ToolId::Claude, ToolId::Codex, ToolId::Gemini];

    /// Key used in payloads and settings
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolId::Claude => "claude",
            ToolId::Codex => "codex",
            ToolId::Gemini => "gemini",
        }
    }

    /// Human-readable name
    pub fn display_name(&self) -> &'static str {
        match self {
            ToolId::Claude => "Claude Code",
            ToolId::Codex => "OpenAI Codex",
            ToolId::Gemini => "Gemini CLI",
        }
    }

    /// Get the next tool in cycle
    pub fn next(self) -> Self {
        match self {
            ToolId::Claude => ToolId::Codex,
            ToolId::Codex => ToolId::Gemini,
            ToolId::Gemini => ToolId::Claude,
        }
    }
}

impl fmt::Display for ToolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not a known tool id
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown tool: {0}")]
pub struct UnknownTool(pub String);

impl FromStr for ToolId {
    type Err = UnknownTool;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "claude" => Ok(ToolId::Claude),
            "codex" => Ok(ToolId::Codex),
            "gemini" => Ok(ToolId::Gemini),
            other => Err(UnknownTool(other.to_string())),
        }
    }
}

/// Tool-specific usage figures.
///
/// Claude and Codex report a rolling five-hour and seven-day window; Gemini
/// reports a single quota for its most-used model.
#[derive(Debug, Clone, PartialEq)]
pub enum UsageFigures {
    Windowed {
        five_hour_pct: Option<f64>,
        five_hour_reset: Option<String>,
        seven_day_pct: Option<f64>,
        seven_day_reset: Option<String>,
    },
    Quota {
        used_pct: Option<f64>,
        reset_time: Option<String>,
    },
}

impl UsageFigures {
    /// Empty figures of the shape the given tool reports
    pub fn empty_for(tool: ToolId) -> Self {
        match tool {
            ToolId::Claude | ToolId::Codex => UsageFigures::Windowed {
                five_hour_pct: None,
                five_hour_reset: None,
                seven_day_pct: None,
                seven_day_reset: None,
            },
            ToolId::Gemini => UsageFigures::Quota {
                used_pct: None,
                reset_time: None,
            },
        }
    }
}

/// A single quota window as displayed in a usage bar
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UsageWindow<'a> {
    /// Short label ("5h", "7d", or a model name)
    pub label: &'a str,
    /// Raw percentage as reported; may be outside 0..=100
    pub percent: Option<f64>,
    /// ISO-8601 reset timestamp
    pub reset: Option<&'a str>,
}

/// Usage data for one tool as reported by the data source.
///
/// Percentages are stored exactly as received. Clamping happens only when a
/// value is presented.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolUsageRecord {
    /// Whether the tool's data source is present
    pub installed: bool,
    /// Failure reported by the data source for this tool
    pub error: Option<String>,
    /// Attempts made before `error` was reported
    pub retry_count: Option<u32>,
    /// Explicit "nothing recorded yet" flag (Codex)
    pub has_data: Option<bool>,
    /// Machine-readable failure category (e.g. "auth_required")
    pub fail_reason: Option<String>,
    /// Subscription plan (Codex)
    pub plan_type: Option<String>,
    /// Model label (Codex, Gemini)
    pub model: Option<String>,
    /// Usage figures
    pub figures: UsageFigures,
}

impl ToolUsageRecord {
    /// A record for a tool that was not reported at all
    pub fn not_installed(tool: ToolId) -> Self {
        Self {
            installed: false,
            error: None,
            retry_count: None,
            has_data: None,
            fail_reason: None,
            plan_type: None,
            model: None,
            figures: UsageFigures::empty_for(tool),
        }
    }

    /// Error message, if one is set and non-empty
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref().filter(|e| !e.is_empty())
    }

    /// The window that drives the compact indicator
    pub fn primary_window(&self) -> UsageWindow<'_> {
        match &self.figures {
            UsageFigures::Windowed {
                five_hour_pct,
                five_hour_reset,
                ..
            } => UsageWindow {
                label: "5h",
                percent: *five_hour_pct,
                reset: five_hour_reset.as_deref(),
            },
            UsageFigures::Quota {
                used_pct,
                reset_time,
            } => UsageWindow {
                label: self.quota_label(),
                percent: *used_pct,
                reset: reset_time.as_deref(),
            },
        }
    }

    /// All windows that carry a percentage, in display order
    pub fn windows(&self) -> Vec<UsageWindow<'_>> {
        match &self.figures {
            UsageFigures::Windowed {
                five_hour_pct,
                five_hour_reset,
                seven_day_pct,
                seven_day_reset,
            } => {
                let mut windows = Vec::with_capacity(2);
                if five_hour_pct.is_some() {
                    windows.push(UsageWindow {
                        label: "5h",
                        percent: *five_hour_pct,
                        reset: five_hour_reset.as_deref(),
                    });
                }
                if seven_day_pct.is_some() {
                    windows.push(UsageWindow {
                        label: "7d",
                        percent: *seven_day_pct,
                        reset: seven_day_reset.as_deref(),
                    });
                }
                windows
            }
            UsageFigures::Quota {
                used_pct,
                reset_time,
            } => match used_pct {
                Some(_) => vec![UsageWindow {
                    label: self.quota_label(),
                    percent: *used_pct,
                    reset: reset_time.as_deref(),
                }],
                None => Vec::new(),
            },
        }
    }

    fn quota_label(&self) -> &str {
        self.model
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or("Gemini quota")
    }
}

/// Usage records for every tool; always total over [`ToolId::ALL`].
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub claude: ToolUsageRecord,
    pub codex: ToolUsageRecord,
    pub gemini: ToolUsageRecord,
}

impl Snapshot {
    /// Record for the given tool
    pub fn get(&self, tool: ToolId) -> &ToolUsageRecord {
        match tool {
            ToolId::Claude => &self.claude,
            ToolId::Codex => &self.codex,
            ToolId::Gemini => &self.gemini,
        }
    }

    /// Mutable record for the given tool
    pub fn get_mut(&mut self, tool: ToolId) -> &mut ToolUsageRecord {
        match tool {
            ToolId::Claude => &mut self.claude,
            ToolId::Codex => &mut self.codex,
            ToolId::Gemini => &mut self.gemini,
        }
    }

    /// Whether any tool reports an installed data source
    pub fn any_installed(&self) -> bool {
        ToolId::ALL.iter().any(|t| self.get(*t).installed)
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            claude: ToolUsageRecord::not_installed(ToolId::Claude),
            codex: ToolUsageRecord::not_installed(ToolId::Codex),
            gemini: ToolUsageRecord::not_installed(ToolId::Gemini),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_id_round_trips_through_str() {
        for tool in ToolId::ALL {
            assert_eq!(tool.as_str().parse::<ToolId>(), Ok(tool));
        }
        assert!("copilot".parse::<ToolId>().is_err());
        assert!("Claude".parse::<ToolId>().is_err());
    }

    #[test]
    fn test_tool_id_next_cycles() {
        assert_eq!(ToolId::Claude.next(), ToolId::Codex);
        assert_eq!(ToolId::Codex.next(), ToolId::Gemini);
        assert_eq!(ToolId::Gemini.next(), ToolId::Claude);
    }

    #[test]
    fn test_default_snapshot_is_not_installed() {
        let snapshot = Snapshot::default();
        assert!(!snapshot.any_installed());
        assert!(matches!(
            snapshot.gemini.figures,
            UsageFigures::Quota { .. }
        ));
        assert!(matches!(
            snapshot.codex.figures,
            UsageFigures::Windowed { .. }
        ));
    }

    #[test]
    fn test_windows_skip_missing_percentages() {
        let mut record = ToolUsageRecord::not_installed(ToolId::Claude);
        record.figures = UsageFigures::Windowed {
            five_hour_pct: Some(42.0),
            five_hour_reset: Some("2026-01-01T00:00:00Z".to_string()),
            seven_day_pct: None,
            seven_day_reset: None,
        };
        let windows = record.windows();
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].label, "5h");
        assert_eq!(windows[0].reset, Some("2026-01-01T00:00:00Z"));
    }

    #[test]
    fn test_quota_label_prefers_model() {
        let mut record = ToolUsageRecord::not_installed(ToolId::Gemini);
        record.figures = UsageFigures::Quota {
            used_pct: Some(10.0),
            reset_time: None,
        };
        assert_eq!(record.primary_window().label, "Gemini quota");

        record.model = Some("gemini-2.5-pro".to_string());
        assert_eq!(record.windows()[0].label, "gemini-2.5-pro");
    }

    #[test]
    fn test_empty_error_is_not_an_error() {
        let mut record = ToolUsageRecord::not_installed(ToolId::Codex);
        record.error = Some(String::new());
        assert_eq!(record.error(), None);
        record.error = Some("Rate limited".to_string());
        assert_eq!(record.error(), Some("Rate limited"));
    }
}
