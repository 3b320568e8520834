//! Wall-clock helpers. Audit timestamps are rendered in UTC+7.

use chrono::{DateTime, FixedOffset, Utc};

const UTC7_OFFSET_SECS: i32 = 7 * 3600;

/// Current time in UTC+7.
#[must_use]
pub fn now_utc7() -> DateTime<FixedOffset> {
    to_utc7(Utc::now())
}

/// Convert a UTC instant to UTC+7.
#[must_use]
pub fn to_utc7(at: DateTime<Utc>) -> DateTime<FixedOffset> {
    FixedOffset::east_opt(UTC7_OFFSET_SECS)
        .map_or_else(|| at.fixed_offset(), |tz| at.with_timezone(&tz))
}

/// `YYYY-MM-DD HH:MM:SS`.
#[must_use]
pub fn format_date_action(at: &DateTime<FixedOffset>) -> String {
    at.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// `YYYY-MM-DD HH:MM:SS.ffffff +07:00`.
#[must_use]
pub fn format_version(at: &DateTime<FixedOffset>) -> String {
    at.format("%Y-%m-%d %H:%M:%S%.6f %:z").to_string()
}
