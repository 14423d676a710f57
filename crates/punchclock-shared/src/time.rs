//! Timestamp and duration formatting shared by the model and the wire format.
//!
//! All instants are unix seconds (`i64`) so they can be stored as SQLite
//! integers without conversion.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::{ModelError, Result};

/// Longest duration a user may enter: 9999 hours.
pub const MAX_DURATION_SECONDS: i64 = 9_999 * 3600;

/// Current unix time in seconds.
pub fn now() -> i64 {
    Utc::now().timestamp()
}

/// Parse an ISO-8601 / RFC-3339 timestamp into unix seconds.
pub fn parse_iso8601(value: &str) -> Result<i64> {
    let parsed = DateTime::parse_from_rfc3339(value.trim())?;
    Ok(parsed.timestamp())
}

/// Format unix seconds as an RFC-3339 UTC timestamp (`2014-03-07T09:15:00Z`).
///
/// Out-of-range inputs format as an empty string.
pub fn format_iso8601(timestamp: i64) -> String {
    DateTime::<Utc>::from_timestamp(timestamp, 0)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_default()
}

/// Format a number of seconds as `HH:MM:SS`. The sign is ignored.
pub fn format_duration_hhmmss(seconds: i64) -> String {
    let total = seconds.unsigned_abs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;
    format!("{hours:02}:{minutes:02}:{secs:02}")
}

/// Parse a user-entered duration into seconds.
///
/// Accepted forms:
/// - clock notation: `HH:MM:SS` or `HH:MM`
/// - a whole number of minutes: `90`
/// - decimal hours: `1.5` or `1,5`
/// - unit tokens: `1h 30m`, `45 min`, `20s`
///
/// Anything longer than [`MAX_DURATION_SECONDS`] is rejected.
pub fn parse_duration_string(value: &str) -> Result<i64> {
    parse_unbounded(value.trim())
        .filter(|seconds| *seconds <= MAX_DURATION_SECONDS)
        .ok_or_else(|| ModelError::Duration(value.to_string()))
}

fn parse_unbounded(trimmed: &str) -> Option<i64> {
    if trimmed.is_empty() {
        return None;
    }

    if trimmed.contains(':') {
        return parse_clock(trimmed);
    }

    if let Ok(minutes) = trimmed.parse::<u32>() {
        return Some(i64::from(minutes) * 60);
    }

    if let Ok(hours) = trimmed.replace(',', ".").parse::<f64>() {
        let seconds = (hours * 3600.0).round();
        if seconds.is_finite() && seconds >= 0.0 && seconds <= MAX_DURATION_SECONDS as f64 {
            return Some(seconds as i64);
        }
        return None;
    }

    parse_units(trimmed)
}

fn parse_clock(value: &str) -> Option<i64> {
    let parts = value
        .split(':')
        .map(|part| part.trim().parse::<u32>().ok().map(i64::from))
        .collect::<Option<Vec<i64>>>()?;

    match parts.as_slice() {
        [h, m] if *m < 60 => Some(h * 3600 + m * 60),
        [h, m, s] if *m < 60 && *s < 60 => Some(h * 3600 + m * 60 + s),
        _ => None,
    }
}

fn parse_units(value: &str) -> Option<i64> {
    let mut total = 0i64;
    let mut digits = String::new();
    let mut unit = String::new();
    let mut matched = false;

    let mut flush = |digits: &mut String, unit: &mut String| -> Option<()> {
        let amount: i64 = digits.parse().ok()?;
        let multiplier = match unit.to_ascii_lowercase().as_str() {
            "h" | "hr" | "hrs" | "hour" | "hours" => 3600,
            "m" | "min" | "mins" | "minute" | "minutes" => 60,
            "s" | "sec" | "secs" | "second" | "seconds" => 1,
            _ => return None,
        };
        total = amount.checked_mul(multiplier)?.checked_add(total)?;
        matched = true;
        digits.clear();
        unit.clear();
        Some(())
    };

    for c in value.chars() {
        if c.is_ascii_digit() {
            if !unit.is_empty() {
                flush(&mut digits, &mut unit)?;
            }
            digits.push(c);
        } else if c.is_alphabetic() {
            if digits.is_empty() {
                return None;
            }
            unit.push(c);
        } else if !c.is_whitespace() {
            return None;
        }
    }

    if !digits.is_empty() || !unit.is_empty() {
        flush(&mut digits, &mut unit)?;
    }

    matched.then_some(total)
}
