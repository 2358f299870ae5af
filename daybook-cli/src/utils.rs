//! Argument parsing helpers.

use anyhow::{Result, anyhow};
use chrono::NaiveDate;
use daybook_core::task::Priority;

pub fn parse_date_arg(s: &str) -> Result<NaiveDate> {
    daybook_core::date::parse_date_key(s)
        .ok_or_else(|| anyhow!("Invalid date '{s}'. Expected YYYY-MM-DD"))
}

pub fn parse_priority(s: &str) -> Result<Priority> {
    match s {
        "low" => Ok(Priority::Low),
        "medium" => Ok(Priority::Medium),
        "high" => Ok(Priority::High),
        other => Err(anyhow!(
            "Unknown priority '{other}'. Expected low, medium or high"
        )),
    }
}

/// Parse "HH:MM" (or bare "HH") into hour and minutes.
pub fn parse_time_arg(s: &str) -> Result<(u32, u32)> {
    let (hour, minutes) = match s.split_once(':') {
        Some((h, m)) => (h, m),
        None => (s, "0"),
    };
    let hour: u32 = hour
        .parse()
        .map_err(|_| anyhow!("Invalid time '{s}'. Expected HH:MM"))?;
    let minutes: u32 = minutes
        .parse()
        .map_err(|_| anyhow!("Invalid time '{s}'. Expected HH:MM"))?;
    if hour > 23 || minutes > 59 {
        return Err(anyhow!("Invalid time '{s}'. Expected HH:MM"));
    }
    Ok((hour, minutes))
}

/// Parse a comma-separated weekday list: names ("mon,wed") or numbers
/// ("1,3"), 0 being Sunday.
pub fn parse_weekdays(s: &str) -> Result<Vec<u8>> {
    s.split(',')
        .map(|part| {
            let part = part.trim().to_lowercase();
            let day = match part.as_str() {
                "sun" | "sunday" => 0,
                "mon" | "monday" => 1,
                "tue" | "tuesday" => 2,
                "wed" | "wednesday" => 3,
                "thu" | "thursday" => 4,
                "fri" | "friday" => 5,
                "sat" | "saturday" => 6,
                other => other
                    .parse::<u8>()
                    .ok()
                    .filter(|d| *d <= 6)
                    .ok_or_else(|| anyhow!("Unknown weekday '{other}'"))?,
            };
            Ok(day)
        })
        .collect()
}
