//! Go-style duration strings, as used by `collector.timeout`.
//!
//! A duration is a sequence of decimal numbers, each with an optional
//! fraction and a unit suffix, e.g. `"20s"`, `"1m30s"`, `"1.5h"`,
//! `"250ms"`. The segments are summed. Valid units are `h`, `m`, `s`,
//! `ms`, `us` (or `µs` / `μs`) and `ns`. A bare `"0"` is zero.

use std::fmt::Write;
use std::time::Duration;

use anyhow::{anyhow, bail, Result};

const NANOS_PER_SEC: u128 = 1_000_000_000;

// Fraction digits past nanosecond precision of the smallest unit are dropped.
const MAX_FRACTION_DIGITS: usize = 18;

fn unit_nanos(unit: &str) -> Option<u128> {
    Some(match unit {
        "ns" => 1,
        "us" | "µs" | "μs" => 1_000,
        "ms" => 1_000_000,
        "s" => NANOS_PER_SEC,
        "m" => 60 * NANOS_PER_SEC,
        "h" => 3_600 * NANOS_PER_SEC,
        _ => return None,
    })
}

/// Parse a duration such as `"20s"` or `"1h15m"`. Negative values are rejected.
pub fn parse_duration(s: &str) -> Result<Duration> {
    let input = s.trim();
    if input == "0" {
        return Ok(Duration::ZERO);
    }
    if input.starts_with('-') {
        bail!("Negative duration: {:?}", input);
    }

    let mut rest = input.strip_prefix('+').unwrap_or(input);
    if rest.is_empty() {
        bail!("Empty duration");
    }

    let mut total: u128 = 0;
    while !rest.is_empty() {
        let split = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let (number, tail) = rest.split_at(split);

        let split = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        let (unit, tail) = tail.split_at(split);

        if unit.is_empty() {
            bail!("Missing unit in duration {:?}", input);
        }
        let scale = unit_nanos(unit)
            .ok_or_else(|| anyhow!("Unknown unit {:?} in duration {:?}", unit, input))?;

        total = segment_nanos(number, scale)
            .and_then(|n| total.checked_add(n))
            .ok_or_else(|| anyhow!("Invalid duration {:?}", input))?;
        rest = tail;
    }

    let nanos = u64::try_from(total).map_err(|_| anyhow!("Duration overflow: {:?}", input))?;
    Ok(Duration::from_nanos(nanos))
}

/// `number` (`"1"`, `"1.5"`, `".5"`, `"2."`) times `scale` nanoseconds.
fn segment_nanos(number: &str, scale: u128) -> Option<u128> {
    let (whole, fraction) = number.split_once('.').unwrap_or((number, ""));
    if whole.is_empty() && fraction.is_empty() {
        return None;
    }
    if !whole.bytes().chain(fraction.bytes()).all(|b| b.is_ascii_digit()) {
        return None;
    }

    let whole: u128 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let mut nanos = whole.checked_mul(scale)?;

    let fraction = &fraction[..fraction.len().min(MAX_FRACTION_DIGITS)];
    if !fraction.is_empty() {
        let digits: u128 = fraction.parse().ok()?;
        let divisor = 10u128.pow(fraction.len() as u32);
        nanos = nanos.checked_add(digits.checked_mul(scale)? / divisor)?;
    }
    Some(nanos)
}

/// Format a duration the way Go prints one: `"20s"`, `"1m30s"`, `"250ms"`.
pub fn format_duration(d: Duration) -> String {
    let nanos = d.as_nanos();
    if nanos == 0 {
        return "0s".to_string();
    }

    if nanos < NANOS_PER_SEC {
        let (unit, scale) = match nanos {
            n if n < 1_000 => ("ns", 1),
            n if n < 1_000_000 => ("µs", 1_000),
            _ => ("ms", 1_000_000),
        };
        return format!("{}{}", decimal(nanos, scale), unit);
    }

    let secs = d.as_secs();
    let (hours, minutes) = (secs / 3_600, secs % 3_600 / 60);
    let seconds = u128::from(secs % 60) * NANOS_PER_SEC + u128::from(d.subsec_nanos());

    let mut out = String::new();
    if hours > 0 {
        let _ = write!(out, "{}h", hours);
    }
    if hours > 0 || minutes > 0 {
        let _ = write!(out, "{}m", minutes);
    }
    let _ = write!(out, "{}s", decimal(seconds, NANOS_PER_SEC));
    out
}

/// `value / scale` with trailing fraction zeros trimmed.
fn decimal(value: u128, scale: u128) -> String {
    let (whole, fraction) = (value / scale, value % scale);
    if fraction == 0 {
        return whole.to_string();
    }
    let width = scale.ilog10() as usize;
    let fraction = format!("{:0width$}", fraction, width = width);
    format!("{}.{}", whole, fraction.trim_end_matches('0'))
}
