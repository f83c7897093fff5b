//! Calendar-day arithmetic anchored to the process-wide business timezone.
//!
//! A *date key* is the calendar day an occurrence represents, as seen from the
//! configured IANA zone. It is distinct from the absolute UTC due timestamp,
//! which is always the last millisecond of that local day.

use crate::error::CoreError;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use std::str::FromStr;

/// A calendar day in the business timezone. Renders as `YYYY-MM-DD`.
pub type DateKey = NaiveDate;

/// Format used for persisted and displayed date keys.
pub const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

/// Validate IANA timezone name
pub fn validate_timezone(timezone: &str) -> Result<Tz, CoreError> {
    Tz::from_str(timezone)
        .map_err(|_| CoreError::InvalidTimezone(timezone.to_string()))
}

/// Parse a strict `YYYY-MM-DD` date key.
pub fn parse_date_key(value: &str) -> Result<DateKey, CoreError> {
    NaiveDate::parse_from_str(value.trim(), DATE_KEY_FORMAT)
        .map_err(|_| CoreError::InvalidDateKey(value.to_string()))
}

/// The calendar day `instant` falls on in `tz`.
pub fn date_key_in_zone(instant: DateTime<Utc>, tz: &Tz) -> DateKey {
    instant.with_timezone(tz).date_naive()
}

/// The UTC instant of 23:59:59.999 local time on `key` in `tz`.
///
/// Ambiguous local times resolve to the later of the two instants. If the
/// local time falls in a DST gap, the last instant before the gap is used.
pub fn end_of_day_utc(key: DateKey, tz: &Tz) -> DateTime<Utc> {
    let last_moment = NaiveTime::from_hms_milli_opt(23, 59, 59, 999)
        .expect("23:59:59.999 is a valid time of day");
    let mut local = key.and_time(last_moment);

    // Gaps never exceed a couple of hours in the tz database.
    for _ in 0..4 {
        if let Some(resolved) = tz.from_local_datetime(&local).latest() {
            return resolved.with_timezone(&Utc);
        }
        local -= Duration::minutes(30);
    }

    // Unreachable for real zones; treat the wall clock as UTC.
    Utc.from_utc_datetime(&key.and_time(last_moment))
}

/// Format datetime with timezone-aware display
pub fn format_with_timezone(datetime: DateTime<Utc>, tz: &Tz, format: &str) -> String {
    datetime.with_timezone(tz).format(format).to_string()
}
