use anyhow::{anyhow, Result};
use cadence_core::timezone::{date_key_in_zone, end_of_day_utc, parse_date_key, DateKey};
use chrono::{DateTime, Utc};
use chrono_english::{parse_date_string, Dialect};
use chrono_tz::Tz;

/// Parse a user supplied date in the business timezone.
///
/// Plain `YYYY-MM-DD` days resolve to the end of that day; anything else goes
/// through natural-language parsing relative to now.
pub fn parse_due_date(date_str: &str, tz: &Tz) -> Result<DateTime<Utc>> {
    if let Ok(key) = parse_date_key(date_str.trim()) {
        return Ok(end_of_day_utc(key, tz));
    }

    let now = Utc::now().with_timezone(tz).fixed_offset();
    parse_date_string(date_str, now, Dialect::Us)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|e| anyhow!("Failed to parse date '{}': {}", date_str, e))
}

/// Like [`parse_due_date`] but reduced to the calendar day.
pub fn parse_day(date_str: &str, tz: &Tz) -> Result<DateKey> {
    Ok(date_key_in_zone(parse_due_date(date_str, tz)?, tz))
}
