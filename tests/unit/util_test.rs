//! Tests for utility functions

use chrono::{TimeZone, Utc};
use mine_search::util::{format_date_action, now_utc7, to_utc7, LogFormat};

#[test]
fn test_utc7_offset() {
    let now = now_utc7();
    assert_eq!(now.offset().local_minus_utc(), 7 * 3600);
}

#[test]
fn test_date_action_crosses_midnight() {
    let utc = Utc.with_ymd_and_hms(2024, 3, 31, 18, 30, 5).unwrap();
    assert_eq!(format_date_action(&to_utc7(utc)), "2024-04-01 01:30:05");
}

#[test]
fn test_log_format_default_is_pretty() {
    assert_eq!(LogFormat::default(), LogFormat::Pretty);
}

#[test]
fn test_init_tracing_is_idempotent() {
    mine_search::util::init_tracing_with(LogFormat::Json);
    mine_search::util::init_tracing();
    tracing::info!(target: "mine_search", "subscriber installed");
}
