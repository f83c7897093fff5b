//! Occurrence scheduling: turning a pattern and interval into the next
//! calendar day an instance is due.

use chrono::{DateTime, Days, Months, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::error::CoreError;
use crate::timezone::{date_key_in_zone, DateKey};

/// Forward steps allowed when catching a schedule up to a floor date.
pub const MAX_FORWARD_STEPS: usize = 400;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RecurrencePattern {
    Daily,
    Weekly,
    Biweekly,
    Monthly,
    Quarterly,
    Yearly,
}

impl RecurrencePattern {
    pub fn as_str(self) -> &'static str {
        match self {
            RecurrencePattern::Daily => "daily",
            RecurrencePattern::Weekly => "weekly",
            RecurrencePattern::Biweekly => "biweekly",
            RecurrencePattern::Monthly => "monthly",
            RecurrencePattern::Quarterly => "quarterly",
            RecurrencePattern::Yearly => "yearly",
        }
    }
}

impl fmt::Display for RecurrencePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid recurrence pattern: {0}")]
pub struct ParseRecurrencePatternError(String);

impl FromStr for RecurrencePattern {
    type Err = ParseRecurrencePatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" => Ok(RecurrencePattern::Daily),
            "weekly" => Ok(RecurrencePattern::Weekly),
            "biweekly" | "fortnightly" => Ok(RecurrencePattern::Biweekly),
            "monthly" => Ok(RecurrencePattern::Monthly),
            "quarterly" => Ok(RecurrencePattern::Quarterly),
            "yearly" | "annually" => Ok(RecurrencePattern::Yearly),
            _ => Err(ParseRecurrencePatternError(s.to_string())),
        }
    }
}

/// A pattern paired with its (always positive) interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecurrenceRule {
    pub pattern: RecurrencePattern,
    pub interval: u32,
}

impl RecurrenceRule {
    /// Intervals below one are treated as one.
    pub fn new(pattern: RecurrencePattern, interval: i64) -> Self {
        Self {
            pattern,
            interval: interval.clamp(1, i64::from(u32::MAX)) as u32,
        }
    }

    /// Build a rule from raw stored values. Missing or unrecognised patterns
    /// degrade to daily with an interval of one.
    pub fn resolve(pattern: Option<&str>, interval: Option<i64>) -> Self {
        match pattern.map(str::parse::<RecurrencePattern>) {
            Some(Ok(pattern)) => Self::new(pattern, interval.unwrap_or(1)),
            Some(Err(err)) => {
                tracing::warn!(error = %err, "Unrecognised recurrence pattern, falling back to daily");
                Self::new(RecurrencePattern::Daily, 1)
            }
            None => {
                tracing::warn!("Recurring task has no pattern, falling back to daily");
                Self::new(RecurrencePattern::Daily, 1)
            }
        }
    }

    /// The occurrence one step after `key`.
    ///
    /// Month-based patterns clamp the day of month to the target month's last
    /// day. Results past the representable calendar saturate at its end.
    pub fn advance(&self, key: DateKey) -> DateKey {
        let n = u64::from(self.interval);
        let next = match self.pattern {
            RecurrencePattern::Daily => key.checked_add_days(Days::new(n)),
            RecurrencePattern::Weekly => key.checked_add_days(Days::new(n * 7)),
            RecurrencePattern::Biweekly => key.checked_add_days(Days::new(n * 14)),
            RecurrencePattern::Monthly => add_months_clamped(key, n),
            RecurrencePattern::Quarterly => add_months_clamped(key, n * 3),
            RecurrencePattern::Yearly => add_months_clamped(key, n * 12),
        };
        next.unwrap_or(NaiveDate::MAX)
    }

    /// First occurrence strictly after `start` that is on or after `floor`.
    ///
    /// Fails with [`CoreError::SchedulingDrift`] if `max_steps` advances are
    /// not enough, which only happens with corrupt anchors or intervals.
    pub fn next_on_or_after(
        &self,
        start: DateKey,
        floor: DateKey,
        max_steps: usize,
    ) -> Result<DateKey, CoreError> {
        let mut key = self.advance(start);
        let mut steps = 1;
        while key < floor {
            if steps >= max_steps || key == NaiveDate::MAX {
                return Err(CoreError::SchedulingDrift {
                    start,
                    floor,
                    steps,
                });
            }
            key = self.advance(key);
            steps += 1;
        }
        Ok(key)
    }

    /// The next `count` occurrences after `start`.
    pub fn preview(&self, start: DateKey, count: usize) -> Vec<DateKey> {
        std::iter::successors(Some(self.advance(start)), |key| {
            (*key != NaiveDate::MAX).then(|| self.advance(*key))
        })
        .take(count)
        .collect()
    }
}

fn add_months_clamped(key: DateKey, months: u64) -> Option<DateKey> {
    let months = u32::try_from(months).ok()?;
    key.checked_add_months(Months::new(months))
}

/// The date key of the occurrence following `base`, as seen in `tz`.
pub fn next_instance_date_key(
    pattern: RecurrencePattern,
    interval: i64,
    base: DateTime<Utc>,
    tz: &Tz,
) -> DateKey {
    RecurrenceRule::new(pattern, interval).advance(date_key_in_zone(base, tz))
}
