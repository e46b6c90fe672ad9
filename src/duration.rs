//! Duration parsing utilities for human-readable durations like "24h", "500ms".

use std::time::Duration;

use anyhow::{Context, Result};
use serde::{de, Deserialize, Deserializer};

/// Parse a duration string like "1d", "24h", "30m", "60s", "500ms".
///
/// Supported units:
/// - `d` - days (24 hours)
/// - `h` - hours
/// - `m` - minutes
/// - `s` - seconds
/// - `ms` - milliseconds
///
/// The input is case-insensitive and whitespace is trimmed.
///
/// # Examples
///
/// ```
/// use clawkeeper::duration::parse_duration;
/// use std::time::Duration;
///
/// assert_eq!(parse_duration("24h").unwrap(), Duration::from_secs(24 * 60 * 60));
/// assert_eq!(parse_duration("30m").unwrap(), Duration::from_secs(30 * 60));
/// assert_eq!(parse_duration("100ms").unwrap(), Duration::from_millis(100));
/// ```
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim().to_lowercase();
    // "ms" must be checked before "m" and "s".
    let (num, unit) = if s.ends_with("ms") {
        (s.trim_end_matches("ms"), "ms")
    } else if s.ends_with('d') {
        (s.trim_end_matches('d'), "d")
    } else if s.ends_with('h') {
        (s.trim_end_matches('h'), "h")
    } else if s.ends_with('m') {
        (s.trim_end_matches('m'), "m")
    } else if s.ends_with('s') {
        (s.trim_end_matches('s'), "s")
    } else {
        anyhow::bail!("Duration must end with d, h, m, s, or ms");
    };

    let num: u64 = num.parse().with_context(|| "Invalid number in duration")?;

    let millis = match unit {
        "d" => num
            .checked_mul(24 * 60 * 60 * 1000)
            .context("Duration is too large")?,
        "h" => num
            .checked_mul(60 * 60 * 1000)
            .context("Duration is too large")?,
        "m" => num.checked_mul(60 * 1000).context("Duration is too large")?,
        "s" => num.checked_mul(1000).context("Duration is too large")?,
        "ms" => num,
        _ => unreachable!(),
    };

    Ok(Duration::from_millis(millis))
}

/// Format a duration to a human-readable string.
///
/// Uses the largest unit that divides the duration evenly, falling back to
/// seconds (or milliseconds for sub-second durations).
///
/// # Examples
///
/// ```
/// use clawkeeper::duration::format_duration;
/// use std::time::Duration;
///
/// assert_eq!(format_duration(Duration::from_secs(24 * 60 * 60)), "1d");
/// assert_eq!(format_duration(Duration::from_secs(30 * 60)), "30m");
/// assert_eq!(format_duration(Duration::from_millis(250)), "250ms");
/// ```
pub fn format_duration(d: Duration) -> String {
    const SECS_PER_DAY: u64 = 24 * 60 * 60;
    const SECS_PER_HOUR: u64 = 60 * 60;
    const SECS_PER_MINUTE: u64 = 60;

    let millis = d.as_millis() as u64;
    if millis % 1000 != 0 {
        return format!("{millis}ms");
    }

    let secs = millis / 1000;
    if secs >= SECS_PER_DAY && secs % SECS_PER_DAY == 0 {
        format!("{}d", secs / SECS_PER_DAY)
    } else if secs >= SECS_PER_HOUR && secs % SECS_PER_HOUR == 0 {
        format!("{}h", secs / SECS_PER_HOUR)
    } else if secs >= SECS_PER_MINUTE && secs % SECS_PER_MINUTE == 0 {
        format!("{}m", secs / SECS_PER_MINUTE)
    } else {
        format!("{secs}s")
    }
}

/// Serde deserializer for duration strings.
///
/// Use with `#[serde(deserialize_with = "deserialize_duration")]`.
pub fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse_duration(&s).map_err(de::Error::custom)
}
