//! Small utility helpers for timestamp handling and human-readable formatting.

pub mod config;

use chrono::{Local, NaiveDateTime};

/// Timestamp layout used for the persisted cache refresh markers.
pub const REFRESH_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// What: Format a local timestamp in the persisted refresh-marker layout.
///
/// Inputs:
/// - `ts`: Naive local timestamp.
///
/// Output:
/// - String such as `2024-05-01 13:37`.
#[must_use]
pub fn format_refresh_time(ts: NaiveDateTime) -> String {
    ts.format(REFRESH_TIME_FORMAT).to_string()
}

/// What: Parse a persisted refresh marker.
///
/// Inputs:
/// - `raw`: Value read from the settings store.
///
/// Output:
/// - `Some(NaiveDateTime)` when `raw` matches `YYYY-MM-DD HH:MM`, `None` otherwise.
#[must_use]
pub fn parse_refresh_time(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw.trim(), REFRESH_TIME_FORMAT).ok()
}

/// Current local wall-clock time truncated to whole minutes.
#[must_use]
pub fn now_minutes() -> NaiveDateTime {
    let now = Local::now().naive_local();
    parse_refresh_time(&format_refresh_time(now)).unwrap_or(now)
}

/// What: Format bytes into human-readable string with appropriate unit.
///
/// Inputs:
/// - `value`: Number of bytes to format.
///
/// Output:
/// - Returns a formatted string like "1.5 MiB" or "1024 B".
///
/// Details:
/// - Uses binary units (KiB, MiB, GiB, etc.) and shows integer for bytes < 1024, otherwise 1 decimal place.
#[must_use]
pub fn format_bytes(value: u64) -> String {
    const UNITS: [&str; 6] = ["B", "KiB", "MiB", "GiB", "TiB", "PiB"];
    #[allow(clippy::cast_precision_loss)]
    let mut size = value as f64;
    let mut unit_index = 0usize;
    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }
    if unit_index == 0 {
        format!("{value} {}", UNITS[unit_index])
    } else {
        format!("{size:.1} {}", UNITS[unit_index])
    }
}
