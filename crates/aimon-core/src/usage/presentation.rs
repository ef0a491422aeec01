//! Pure mappings from raw usage numbers to displayed values.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;

const MS_PER_HOUR: i64 = 3_600_000;
const MS_PER_MINUTE: i64 = 60_000;

/// Clamp a percentage into `0..=100`; non-finite input becomes 0.
pub fn clamp_percent(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    value.clamp(0.0, 100.0)
}

/// Usage severity band. Each lower bound is inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorTier {
    /// Below 40%
    Low,
    /// 40% up to 70%
    Medium,
    /// 70% up to 90%
    High,
    /// 90% and above
    Critical,
}

impl ColorTier {
    /// Tier for an already-clamped percentage
    pub fn for_percent(pct: f64) -> Self {
        if pct >= 90.0 {
            ColorTier::Critical
        } else if pct >= 70.0 {
            ColorTier::High
        } else if pct >= 40.0 {
            ColorTier::Medium
        } else {
            ColorTier::Low
        }
    }

    /// Display colour as `#rrggbb`
    pub fn hex(&self) -> &'static str {
        match self {
            ColorTier::Critical => "#ef4444",
            ColorTier::High => "#f97316",
            ColorTier::Medium => "#eab308",
            ColorTier::Low => "#22c55e",
        }
    }

    /// Display colour as an RGB triple
    pub fn rgb(&self) -> (u8, u8, u8) {
        match self {
            ColorTier::Critical => (0xef, 0x44, 0x44),
            ColorTier::High => (0xf9, 0x73, 0x16),
            ColorTier::Medium => (0xea, 0xb3, 0x08),
            ColorTier::Low => (0x22, 0xc5, 0x5e),
        }
    }
}

/// Coarse human countdown until `reset`: `"soon"`, `"in 5m"`, `"in 1h 30m"`,
/// `"in 1d 6h"`. Absent or unparseable timestamps yield an empty string.
pub fn format_countdown(reset: Option<&str>, now: DateTime<Utc>) -> String {
    let Some(reset) = reset.and_then(parse_timestamp) else {
        return String::new();
    };

    let diff = (reset - now).num_milliseconds();
    if diff <= 0 {
        return "soon".to_string();
    }

    let hours = diff / MS_PER_HOUR;
    let minutes = (diff % MS_PER_HOUR) / MS_PER_MINUTE;
    if hours >= 24 {
        format!("in {}d {}h", hours / 24, hours % 24)
    } else if hours > 0 {
        format!("in {}h {}m", hours, minutes)
    } else {
        format!("in {}m", minutes)
    }
}

/// Parse an ISO-8601 timestamp. Timestamps without an offset are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn iso(dt: DateTime<Utc>) -> String {
        dt.to_rfc3339()
    }

    #[test]
    fn test_clamp_non_finite_is_zero() {
        assert_eq!(clamp_percent(f64::NAN), 0.0);
        assert_eq!(clamp_percent(f64::INFINITY), 0.0);
        assert_eq!(clamp_percent(f64::NEG_INFINITY), 0.0);
    }

    #[test]
    fn test_clamp_bounds_and_identity() {
        assert_eq!(clamp_percent(-5.0), 0.0);
        assert_eq!(clamp_percent(140.0), 100.0);
        for v in [0.0, 0.5, 39.999, 72.0, 100.0] {
            assert_eq!(clamp_percent(v), v);
        }
    }

    #[test]
    fn test_color_tier_boundaries() {
        assert_eq!(ColorTier::for_percent(100.0), ColorTier::Critical);
        assert_eq!(ColorTier::for_percent(90.0), ColorTier::Critical);
        assert_eq!(ColorTier::for_percent(89.999), ColorTier::High);
        assert_eq!(ColorTier::for_percent(70.0), ColorTier::High);
        assert_eq!(ColorTier::for_percent(69.999), ColorTier::Medium);
        assert_eq!(ColorTier::for_percent(40.0), ColorTier::Medium);
        assert_eq!(ColorTier::for_percent(39.999), ColorTier::Low);
        assert_eq!(ColorTier::for_percent(0.0), ColorTier::Low);
    }

    #[test]
    fn test_tier_colors() {
        assert_eq!(ColorTier::Critical.hex(), "#ef4444");
        assert_eq!(ColorTier::Low.hex(), "#22c55e");
        assert_eq!(ColorTier::High.rgb(), (0xf9, 0x73, 0x16));
    }

    #[test]
    fn test_countdown_absent_is_empty() {
        assert_eq!(format_countdown(None, now()), "");
        assert_eq!(format_countdown(Some(""), now()), "");
        assert_eq!(format_countdown(Some("not a date"), now()), "");
    }

    #[test]
    fn test_countdown_past_is_soon() {
        let reset = iso(now() - Duration::seconds(1));
        assert_eq!(format_countdown(Some(&reset), now()), "soon");
        let reset = iso(now());
        assert_eq!(format_countdown(Some(&reset), now()), "soon");
    }

    #[test]
    fn test_countdown_minutes_hours_days() {
        let cases = [
            (Duration::minutes(5), "in 5m"),
            (Duration::seconds(59), "in 0m"),
            (Duration::minutes(90), "in 1h 30m"),
            (Duration::hours(30), "in 1d 6h"),
            (Duration::hours(24), "in 1d 0h"),
            (Duration::days(6) + Duration::minutes(59), "in 6d 0h"),
        ];
        for (offset, expected) in cases {
            let reset = iso(now() + offset);
            assert_eq!(format_countdown(Some(&reset), now()), expected, "{offset:?}");
        }
    }

    #[test]
    fn test_countdown_accepts_offsets_and_naive_times() {
        assert_eq!(
            format_countdown(Some("2026-03-01T13:30:00+00:00"), now()),
            "in 1h 30m"
        );
        assert_eq!(
            format_countdown(Some("2026-03-01T21:30:00+09:00"), now()),
            "in 30m"
        );
        assert_eq!(
            format_countdown(Some("2026-03-01T12:10:00.250"), now()),
            "in 10m"
        );
    }
}
