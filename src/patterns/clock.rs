//! Time-of-day windows
//!
//! All windows look at the wall-clock hour of the timestamp in its own offset.

use chrono::{DateTime, FixedOffset, Timelike};

/// 22:00 to 06:00
pub fn is_nocturnal(dt: &DateTime<FixedOffset>) -> bool {
    dt.hour() >= 22 || dt.hour() < 6
}

/// 02:00 to 08:00
pub fn is_dawn_window(dt: &DateTime<FixedOffset>) -> bool {
    (2..8).contains(&dt.hour())
}

/// 02:00 to 06:00, where the overnight nadir is searched
pub fn is_pre_dawn(dt: &DateTime<FixedOffset>) -> bool {
    (2..6).contains(&dt.hour())
}

/// 06:00 to 08:00, where the morning peak is searched
pub fn is_early_morning(dt: &DateTime<FixedOffset>) -> bool {
    (6..8).contains(&dt.hour())
}

/// 06:00 through the 22:00 hour, inclusive
pub fn is_awake(dt: &DateTime<FixedOffset>) -> bool {
    (6..=22).contains(&dt.hour())
}

/// Truncate to the start of the clock hour, keeping the offset
pub fn truncate_to_hour(dt: &DateTime<FixedOffset>) -> DateTime<FixedOffset> {
    dt.with_minute(0)
        .and_then(|d| d.with_second(0))
        .and_then(|d| d.with_nanosecond(0))
        .unwrap_or(*dt)
}
