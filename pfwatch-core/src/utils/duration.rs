// src/utils/duration.rs
use std::time::Duration;

/// Parse a disable duration: `"300"`, `"5 minutes"`, `"5m"`. Case-insensitive.
/// Zero-length durations are rejected.
pub fn parse_disable_duration(input: &str) -> Option<Duration> {
    parse_seconds(input).filter(|d| !d.is_zero())
}

fn parse_seconds(input: &str) -> Option<Duration> {
    let value = input.trim().to_lowercase();
    if value.is_empty() {
        return None;
    }

    if let Ok(seconds) = value.parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }

    let parts: Vec<&str> = value.split_whitespace().collect();
    if parts.len() == 2 {
        if let Ok(amount) = parts[0].parse::<u64>() {
            return unit_seconds(parts[1]).and_then(|m| amount.checked_mul(m)).map(Duration::from_secs);
        }
    }

    let split = value.find(|c: char| !c.is_ascii_digit()).unwrap_or(value.len());
    let (number, unit) = value.split_at(split);
    if number.is_empty() || unit.is_empty() {
        return None;
    }
    let amount = number.parse::<u64>().ok()?;
    let multiplier = unit_seconds(unit)?;
    amount.checked_mul(multiplier).map(Duration::from_secs)
}

fn unit_seconds(unit: &str) -> Option<u64> {
    match unit {
        "s" | "sec" | "secs" | "second" | "seconds" => Some(1),
        "m" | "min" | "mins" | "minute" | "minutes" => Some(60),
        "h" | "hr" | "hrs" | "hour" | "hours" => Some(3600),
        "d" | "day" | "days" => Some(86_400),
        _ => None,
    }
}

/// Largest whole unit: `2h`, `5m`, `30s`.
pub fn format_duration(value: Duration) -> String {
    let secs = value.as_secs();
    if secs >= 86_400 {
        format!("{}d", secs / 86_400)
    } else if secs >= 3600 {
        format!("{}h", secs / 3600)
    } else if secs >= 60 {
        format!("{}m", secs / 60)
    } else {
        format!("{}s", secs)
    }
}
