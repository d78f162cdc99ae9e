//! Parsing of the platform's human-formatted numbers and dates
//!
//! Every parser returns `None` instead of failing so callers can fall back
//! to a field default.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde_json::Value;

/// Parses a count such as `"1.2K"`, `"3M"`, `"1,234"` or `"57 claps"`
///
/// # Examples
///
/// ```
/// use byline::extract::numbers::parse_count;
///
/// assert_eq!(parse_count("1.2K"), Some(1200));
/// assert_eq!(parse_count("1,234"), Some(1234));
/// assert_eq!(parse_count("n/a"), None);
/// ```
pub fn parse_count(text: &str) -> Option<u64> {
    let cleaned: String = text.trim().chars().filter(|c| *c != ',').collect();
    let number_end = cleaned
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(cleaned.len());
    let (number, rest) = cleaned.split_at(number_end);

    let value: f64 = number.parse().ok()?;
    let multiplier = match rest.trim_start().chars().next() {
        Some('k') | Some('K') => 1_000.0,
        Some('m') | Some('M') => 1_000_000.0,
        Some('b') | Some('B') => 1_000_000_000.0,
        _ => 1.0,
    };

    let scaled = (value * multiplier).round();
    (scaled.is_finite() && scaled >= 0.0).then_some(scaled as u64)
}

/// Parses a reading time such as `"4 min read"`, `"4.5"` or `"PT4M"`
pub fn parse_read_time(text: &str) -> Option<f64> {
    let trimmed = text.trim();

    // ISO 8601 durations as used by `timeRequired`
    if let Some(duration) = trimmed.strip_prefix("PT") {
        let minutes = duration.strip_suffix('M')?;
        return minutes.parse::<f64>().ok().filter(|m| *m >= 0.0);
    }

    let number_end = trimmed
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(trimmed.len());
    trimmed[..number_end]
        .parse::<f64>()
        .ok()
        .filter(|m| m.is_finite() && *m >= 0.0)
}

/// Parses a timestamp from an RFC 3339 string, a plain date, or epoch millis
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let trimmed = text.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed.with_timezone(&Utc));
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .map(|naive| Utc.from_utc_datetime(&naive));
    }

    trimmed.parse::<i64>().ok().and_then(timestamp_from_millis)
}

/// Reads a timestamp out of a JSON value (string or epoch millis)
pub fn timestamp_from_value(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_timestamp(s),
        Value::Number(n) => n.as_i64().and_then(timestamp_from_millis),
        _ => None,
    }
}

/// Reads a count out of a JSON value (number or abbreviated string)
pub fn count_from_value(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64)),
        Value::String(s) => parse_count(s),
        _ => None,
    }
}

fn timestamp_from_millis(millis: i64) -> Option<DateTime<Utc>> {
    // Epoch values below this are seconds, not millis
    if millis.abs() < 100_000_000_000 {
        return DateTime::from_timestamp(millis, 0);
    }
    DateTime::from_timestamp_millis(millis)
}
