use std::time::Duration;

use anyhow::{bail, Context, Result};

/// Suffix to nanoseconds multiplier
const UNITS: &[(&str, f64)] = &[
    ("ns", 1.0),
    ("µs", 1_000.0),
    ("us", 1_000.0),
    ("ms", 1_000_000.0),
    ("s", 1_000_000_000.0),
    ("m", 60_000_000_000.0),
    ("h", 3_600_000_000_000.0),
];

/// Parse duration strings like "10s", "500ms", "1m30s", "1.5h" or "0".
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim();
    if s == "0" {
        return Ok(Duration::ZERO);
    }
    if s.is_empty() {
        bail!("Empty duration");
    }

    let is_number = |c: char| c.is_ascii_digit() || c == '.';
    let mut rest = s;
    let mut nanos = 0.0;

    while !rest.is_empty() {
        let number_len = rest.find(|c: char| !is_number(c)).unwrap_or(rest.len());
        if number_len == 0 {
            bail!("Unknown duration format: {}", s);
        }
        let value: f64 = rest[..number_len]
            .parse()
            .with_context(|| format!("Unknown duration format: {}", s))?;
        rest = &rest[number_len..];

        let unit_len = rest.find(is_number).unwrap_or(rest.len());
        let unit = &rest[..unit_len];
        if unit.is_empty() {
            bail!("Missing unit in duration: {}", s);
        }
        let Some((_, multiplier)) = UNITS.iter().find(|(suffix, _)| *suffix == unit) else {
            bail!("Unknown unit \"{}\" in duration: {}", unit, s);
        };
        nanos += value * multiplier;
        rest = &rest[unit_len..];
    }

    let nanos = nanos.round();
    if !nanos.is_finite() || nanos >= u64::MAX as f64 {
        bail!("Duration out of range: {}", s);
    }
    Ok(Duration::from_nanos(nanos as u64))
}

/// Clap value parser for duration flags.
pub fn parse_duration_arg(s: &str) -> std::result::Result<Duration, String> {
    parse_duration(s).map_err(|e| e.to_string())
}

/// Format a duration for display, e.g. "10s", "1m30s", "250ms".
pub fn format_duration(d: Duration) -> String {
    let nanos = d.as_nanos();
    if nanos == 0 {
        return "0s".to_string();
    }
    if nanos < 1_000 {
        return format!("{}ns", nanos);
    }
    if nanos < 1_000_000 {
        return format!("{}µs", nanos as f64 / 1_000.0);
    }
    if nanos < 1_000_000_000 {
        return format!("{}ms", nanos as f64 / 1_000_000.0);
    }

    let whole = d.as_secs();
    let hours = whole / 3600;
    let minutes = whole / 60 % 60;
    let seconds = (whole % 60) as f64 + f64::from(d.subsec_nanos()) / 1e9;

    if hours > 0 {
        format!("{}h{}m{}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m{}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}
