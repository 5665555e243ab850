//! Duration text used by the timesheet table.

use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Result, TimesheetError};

static DURATION_TOKEN_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+(?:\.\d+)?)\s*(ms|h|m|s)").expect("invalid duration regex"));

/// Renders `XhYmZs`, dropping leading zero units (`7h30m0s`, `30m0s`, `45s`, `0s`).
pub fn format_canonical(duration: Duration) -> String {
    let total = duration.as_secs();
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{hours}h{minutes}m{seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m{seconds}s")
    } else {
        format!("{seconds}s")
    }
}

/// Renders decimal hours with a decimal comma, e.g. `7,50`.
pub fn format_decimal(duration: Duration, negate: bool) -> String {
    let hours = duration.as_secs() as f64 / 3600.0;
    let text = format!("{hours:.2}").replace('.', ",");
    if negate && duration.as_secs() > 0 {
        format!("-{text}")
    } else {
        text
    }
}

/// Parses canonical text, unit tokens or a bare (possibly negated,
/// decimal-comma) number of hours. Results are rounded to whole seconds.
pub fn parse(input: &str) -> Result<Duration> {
    let normalized = input.trim().to_lowercase().replace(',', ".");
    let magnitude = normalized.strip_prefix('-').unwrap_or(&normalized).trim();
    if magnitude.is_empty() {
        return Err(invalid(input));
    }

    if let Ok(hours) = magnitude.parse::<f64>() {
        if !hours.is_finite() || hours < 0.0 {
            return Err(invalid(input));
        }
        return Ok(whole_seconds(hours * 3600.0));
    }

    let mut seconds = 0f64;
    let mut consumed = 0usize;
    for capture in DURATION_TOKEN_REGEX.captures_iter(magnitude) {
        let value = capture[1].parse::<f64>().map_err(|_| invalid(input))?;
        seconds += match &capture[2] {
            "h" => value * 3600.0,
            "m" => value * 60.0,
            "s" => value,
            _ => value / 1000.0,
        };
        consumed += capture[0].chars().filter(|c| !c.is_whitespace()).count();
    }
    let expected = magnitude.chars().filter(|c| !c.is_whitespace()).count();
    if consumed == 0 || consumed != expected {
        return Err(invalid(input));
    }
    Ok(whole_seconds(seconds))
}

fn whole_seconds(seconds: f64) -> Duration {
    Duration::from_secs(seconds.round() as u64)
}

fn invalid(input: &str) -> TimesheetError {
    TimesheetError::Table(format!("invalid duration '{input}'"))
}
