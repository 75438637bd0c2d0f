//! Shared helpers.

use chrono::{Local, TimeZone};

/// Render a nanosecond epoch timestamp as
/// `YYYY-MM-DD HH:MM:SS.NNNNNNNNN` in local time.
pub fn format_ns_timestamp(ts: i64) -> String {
    let datetime = Local.timestamp_nanos(ts);
    format!(
        "{}.{:09}",
        datetime.format("%Y-%m-%d %H:%M:%S"),
        ts.rem_euclid(1_000_000_000)
    )
}
