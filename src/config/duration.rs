// src/config/duration.rs

use std::time::Duration;

/// Unit suffix -> milliseconds.
const UNITS: [(&str, u64); 4] = [("ms", 1), ("s", 1_000), ("m", 60_000), ("h", 3_600_000)];

/// Parse a timeout such as `"250ms"`, `"3s"`, `"2m"`, `"1h"` or a compound
/// value like `"1m30s"`.
///
/// Every number needs a unit, except a bare `"0"`. Zero is accepted and
/// means "no timeout" to the executor. Values that do not fit in `u64`
/// milliseconds are rejected.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let text = s.trim();
    if text.is_empty() {
        return Err("empty duration string".to_string());
    }
    if text == "0" {
        return Ok(Duration::ZERO);
    }

    let mut total_ms: u64 = 0;
    let mut rest = text;
    while !rest.is_empty() {
        let digits = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        if digits == 0 {
            return Err(format!("duration '{text}': expected a number at '{rest}'"));
        }
        let (number, tail) = rest.split_at(digits);

        let unit_end = tail.find(|c: char| c.is_ascii_digit()).unwrap_or(tail.len());
        let (unit, tail) = tail.split_at(unit_end);
        let unit = unit.trim();
        if unit.is_empty() {
            return Err(format!("duration '{text}' is missing a unit suffix"));
        }

        let scale = unit_scale(unit)?;
        let value: u64 = number.parse().map_err(|_| out_of_range(text))?;
        let segment = value.checked_mul(scale).ok_or_else(|| out_of_range(text))?;
        total_ms = total_ms
            .checked_add(segment)
            .ok_or_else(|| out_of_range(text))?;

        rest = tail;
    }

    Ok(Duration::from_millis(total_ms))
}

fn unit_scale(unit: &str) -> Result<u64, String> {
    let unit = unit.to_ascii_lowercase();
    UNITS
        .iter()
        .find(|(suffix, _)| *suffix == unit)
        .map(|(_, scale)| *scale)
        .ok_or_else(|| format!("unsupported duration unit '{unit}'; expected ms, s, m, or h"))
}

fn out_of_range(text: &str) -> String {
    format!("duration '{text}' out of range")
}
