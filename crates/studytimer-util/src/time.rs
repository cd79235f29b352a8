//! Time utilities for studytimer
//!
//! Goal durations are entered as `HH:MM` (hours 0-99, minutes 0-59) and
//! counted down in whole seconds. The countdown is displayed as `HH:MM:SS`,
//! or `MM:SS` once the hour field is zero.

use chrono::{DateTime, Utc};
use std::fmt;
use std::time::Duration;

/// Period of the countdown tick
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

const SECONDS_PER_HOUR: u64 = 3600;
const SECONDS_PER_MINUTE: u64 = 60;

/// Current wall-clock time, used for record timestamps
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// A validated goal target duration (`HH:MM`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GoalDuration {
    hours: u8,
    minutes: u8,
}

impl GoalDuration {
    pub fn new(hours: u8, minutes: u8) -> Option<Self> {
        if hours < 100 && minutes < 60 {
            Some(Self { hours, minutes })
        } else {
            None
        }
    }

    /// Parse `H:MM` or `HH:MM`. Hours are one or two digits, minutes exactly two.
    pub fn parse(s: &str) -> Result<Self, String> {
        let (hours, minutes) = s
            .split_once(':')
            .ok_or_else(|| "Expected HH:MM format".to_string())?;

        if hours.is_empty() || hours.len() > 2 || !hours.bytes().all(|b| b.is_ascii_digit()) {
            return Err("Hours must be one or two digits".into());
        }
        if minutes.len() != 2 || !minutes.bytes().all(|b| b.is_ascii_digit()) {
            return Err("Minutes must be two digits".into());
        }

        let hours: u8 = hours.parse().map_err(|_| "Invalid hour".to_string())?;
        let minutes: u8 = minutes.parse().map_err(|_| "Invalid minute".to_string())?;

        Self::new(hours, minutes).ok_or_else(|| "Minute must be 0-59".to_string())
    }

    pub fn hours(&self) -> u8 {
        self.hours
    }

    pub fn minutes(&self) -> u8 {
        self.minutes
    }

    pub fn total_seconds(&self) -> u64 {
        self.hours as u64 * SECONDS_PER_HOUR + self.minutes as u64 * SECONDS_PER_MINUTE
    }
}

impl fmt::Display for GoalDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hours, self.minutes)
    }
}

/// Total seconds for a goal's target duration text.
///
/// Malformed input counts as zero seconds.
pub fn parse_goal_time(s: &str) -> u64 {
    GoalDuration::parse(s)
        .map(|d| d.total_seconds())
        .unwrap_or(0)
}

/// Format remaining seconds as `HH:MM:SS`, or `MM:SS` when under an hour
pub fn format_countdown(secs: u64) -> String {
    let h = secs / SECONDS_PER_HOUR;
    let m = (secs % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE;
    let s = secs % SECONDS_PER_MINUTE;
    if h > 0 {
        format!("{:02}:{:02}:{:02}", h, m, s)
    } else {
        format!("{:02}:{:02}", m, s)
    }
}

/// Inverse of [`format_countdown`]
pub fn parse_countdown(s: &str) -> Option<u64> {
    let parts: Vec<u64> = s
        .split(':')
        .map(|p| p.parse::<u64>().ok())
        .collect::<Option<Vec<_>>>()?;

    match parts.as_slice() {
        [m, s] if *m < 60 && *s < 60 => Some(m * SECONDS_PER_MINUTE + s),
        [h, m, s] if *m < 60 && *s < 60 => {
            Some(h * SECONDS_PER_HOUR + m * SECONDS_PER_MINUTE + s)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_goal_time_valid() {
        assert_eq!(parse_goal_time("00:02"), 120);
        assert_eq!(parse_goal_time("1:30"), 5400);
        assert_eq!(parse_goal_time("99:59"), 99 * 3600 + 59 * 60);
        assert_eq!(parse_goal_time("00:00"), 0);
    }

    #[test]
    fn test_parse_goal_time_every_valid_input() {
        for h in 0..=99u64 {
            for m in 0..=59u64 {
                let text = format!("{:02}:{:02}", h, m);
                assert_eq!(parse_goal_time(&text), h * 3600 + m * 60, "{}", text);
            }
        }
    }

    #[test]
    fn test_parse_goal_time_malformed_is_zero() {
        for bad in ["", "abc", "12", "12:5", "12:60", "100:00", "1:2:3", "-1:30", "aa:bb", " 1:30", "1:30 "] {
            assert_eq!(parse_goal_time(bad), 0, "{:?}", bad);
        }
    }

    #[test]
    fn test_goal_duration_display() {
        let d = GoalDuration::parse("7:05").unwrap();
        assert_eq!(d.to_string(), "07:05");
        assert_eq!(d.hours(), 7);
        assert_eq!(d.minutes(), 5);
        assert!(GoalDuration::new(100, 0).is_none());
    }

    #[test]
    fn test_format_countdown() {
        assert_eq!(format_countdown(0), "00:00");
        assert_eq!(format_countdown(59), "00:59");
        assert_eq!(format_countdown(125), "02:05");
        assert_eq!(format_countdown(3600), "01:00:00");
        assert_eq!(format_countdown(99 * 3600 + 59 * 60), "99:59:00");
    }

    #[test]
    fn test_format_round_trips_with_goal_time() {
        for h in 0..=99u64 {
            for m in 0..=59u64 {
                let secs = parse_goal_time(&format!("{}:{:02}", h, m));
                let shown = format_countdown(secs);
                assert_eq!(shown.split(':').count(), if h == 0 { 2 } else { 3 });
                assert_eq!(parse_countdown(&shown), Some(secs));
            }
        }
    }

    #[test]
    fn test_parse_countdown_rejects_garbage() {
        assert_eq!(parse_countdown("xx"), None);
        assert_eq!(parse_countdown("01:60"), None);
        assert_eq!(parse_countdown("1:2:3:4"), None);
    }
}
