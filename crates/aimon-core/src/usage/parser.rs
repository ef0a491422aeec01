//! Turn data-source output into a [`Snapshot`].
//!
//! Expected payload (every key optional):
//! ```text
//! {
//!   "claude": {"installed": true, "five_hour_pct": 42, "five_hour_reset": "2026-03-01T17:00:00+00:00",
//!              "seven_day_pct": 10, "seven_day_reset": "..."},
//!   "codex":  {"installed": true, "has_data": false},
//!   "gemini": {"installed": true, "used_pct": 7, "reset_time": "...", "model": "gemini-2.5-pro"}
//! }
//! ```
//! Anything that parses as JSON is accepted; fields of an unexpected type are
//! treated as absent.

use serde_json::{Map, Value};
use thiserror::Error;

use super::types::{Snapshot, ToolId, ToolUsageRecord, UsageFigures};

/// Payload could not be parsed as JSON
#[derive(Debug, Error)]
#[error("malformed usage payload: {0}")]
pub struct ParseError(#[from] pub serde_json::Error);

/// Result of parsing a payload
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    /// Blank payload; keep the previous snapshot
    NoUpdate,
    /// A complete replacement snapshot
    Snapshot(Snapshot),
}

/// Parse raw data-source output.
pub fn parse_snapshot(raw: &str) -> Result<ParseOutcome, ParseError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(ParseOutcome::NoUpdate);
    }

    let value: Value = serde_json::from_str(raw)?;
    let Some(root) = value.as_object() else {
        return Ok(ParseOutcome::Snapshot(Snapshot::default()));
    };

    let mut snapshot = Snapshot::default();
    for tool in ToolId::ALL {
        if let Some(obj) = root.get(tool.as_str()).and_then(Value::as_object) {
            *snapshot.get_mut(tool) = parse_record(tool, obj);
        }
    }
    Ok(ParseOutcome::Snapshot(snapshot))
}

fn parse_record(tool: ToolId, obj: &Map<String, Value>) -> ToolUsageRecord {
    let figures = match tool {
        ToolId::Claude | ToolId::Codex => UsageFigures::Windowed {
            five_hour_pct: number(obj, "five_hour_pct"),
            five_hour_reset: string(obj, "five_hour_reset"),
            seven_day_pct: number(obj, "seven_day_pct"),
            seven_day_reset: string(obj, "seven_day_reset"),
        },
        ToolId::Gemini => UsageFigures::Quota {
            used_pct: number(obj, "used_pct"),
            reset_time: string(obj, "reset_time"),
        },
    };

    ToolUsageRecord {
        installed: boolean(obj, "installed").unwrap_or(false),
        error: error_message(obj.get("error")),
        retry_count: number(obj, "retry_count")
            .filter(|n| *n >= 0.0)
            .map(|n| n.min(u32::MAX as f64) as u32),
        has_data: boolean(obj, "has_data"),
        fail_reason: string(obj, "fail_reason"),
        plan_type: string(obj, "plan_type"),
        model: string(obj, "model"),
        figures,
    }
}

/// Numbers and numeric strings; anything else is absent
fn number(obj: &Map<String, Value>, key: &str) -> Option<f64> {
    match obj.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}

fn string(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key)?
        .as_str()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn boolean(obj: &Map<String, Value>, key: &str) -> Option<bool> {
    obj.get(key)?.as_bool()
}

/// Any non-null, non-empty value marks the tool as failed
fn error_message(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(raw: &str) -> Snapshot {
        match parse_snapshot(raw).expect("should parse") {
            ParseOutcome::Snapshot(s) => s,
            ParseOutcome::NoUpdate => panic!("expected a snapshot"),
        }
    }

    #[test]
    fn test_blank_payload_is_no_update() {
        assert_eq!(parse_snapshot("").unwrap(), ParseOutcome::NoUpdate);
        assert_eq!(parse_snapshot("  \n\t ").unwrap(), ParseOutcome::NoUpdate);
    }

    #[test]
    fn test_malformed_payload_is_error() {
        assert!(parse_snapshot("{\"claude\":").is_err());
        assert!(parse_snapshot("Traceback (most recent call last):").is_err());
    }

    #[test]
    fn test_only_gemini_present() {
        let snapshot = parse(r#"{"gemini":{"installed":true,"used_pct":12,"reset_time":"2026-03-02T00:00:00Z","model":"gemini-2.5-pro"}}"#);
        assert_eq!(snapshot.claude, ToolUsageRecord::not_installed(ToolId::Claude));
        assert_eq!(snapshot.codex, ToolUsageRecord::not_installed(ToolId::Codex));
        assert!(snapshot.gemini.installed);
        assert_eq!(
            snapshot.gemini.figures,
            UsageFigures::Quota {
                used_pct: Some(12.0),
                reset_time: Some("2026-03-02T00:00:00Z".to_string()),
            }
        );
        assert_eq!(snapshot.gemini.model.as_deref(), Some("gemini-2.5-pro"));
    }

    #[test]
    fn test_full_claude_record() {
        let snapshot = parse(
            r#"{"claude":{"installed":true,"five_hour_pct":95,"five_hour_reset":"2026-03-01T17:00:00+00:00","seven_day_pct":null,"seven_day_reset":null}}"#,
        );
        assert_eq!(
            snapshot.claude.figures,
            UsageFigures::Windowed {
                five_hour_pct: Some(95.0),
                five_hour_reset: Some("2026-03-01T17:00:00+00:00".to_string()),
                seven_day_pct: None,
                seven_day_reset: None,
            }
        );
    }

    #[test]
    fn test_percentages_are_not_clamped() {
        let snapshot = parse(r#"{"codex":{"installed":true,"five_hour_pct":130.5,"seven_day_pct":-2}}"#);
        let windows = snapshot.codex.windows();
        assert_eq!(windows[0].percent, Some(130.5));
        assert_eq!(windows[1].percent, Some(-2.0));
    }

    #[test]
    fn test_odd_shapes_are_coerced() {
        let snapshot = parse(
            r#"{"claude":{"installed":"yes","five_hour_pct":"41","seven_day_pct":{"x":1},"five_hour_reset":7},
                "codex":[1,2,3],
                "gemini":{"installed":true,"used_pct":"lots","retry_count":-1}}"#,
        );
        assert!(!snapshot.claude.installed);
        assert_eq!(snapshot.claude.primary_window().percent, Some(41.0));
        assert_eq!(snapshot.claude.primary_window().reset, None);
        assert_eq!(snapshot.claude.windows().len(), 1);
        assert_eq!(snapshot.codex, ToolUsageRecord::not_installed(ToolId::Codex));
        assert_eq!(snapshot.gemini.primary_window().percent, None);
        assert_eq!(snapshot.gemini.retry_count, None);
    }

    #[test]
    fn test_non_object_root_yields_defaults() {
        assert_eq!(parse("[]"), Snapshot::default());
        assert_eq!(parse("42"), Snapshot::default());
        assert_eq!(parse("null"), Snapshot::default());
    }

    #[test]
    fn test_error_fields() {
        let snapshot = parse(
            r#"{"gemini":{"installed":true,"authenticated":false,"retry_count":3,"fail_reason":"auth_failed","error":"Refresh token expired","http_code":401},
                "claude":{"installed":true,"error":""},
                "codex":{"installed":true,"has_data":false,"error":{"code":1}}}"#,
        );
        assert_eq!(snapshot.gemini.error(), Some("Refresh token expired"));
        assert_eq!(snapshot.gemini.retry_count, Some(3));
        assert_eq!(snapshot.gemini.fail_reason.as_deref(), Some("auth_failed"));
        assert_eq!(snapshot.claude.error(), None);
        assert_eq!(snapshot.codex.has_data, Some(false));
        assert_eq!(snapshot.codex.error(), Some(r#"{"code":1}"#));
    }
}
