//! Recurrence rule definitions.
//!
//! A rule describes how a chore repeats. It carries no expansion logic;
//! see `crate::recurrence` for turning a rule into concrete dates.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{ChoresError, ChoresResult};

/// Short weekday labels indexed Sunday-first (0 = Sunday).
pub const DAY_LABELS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

const MONDAY: u8 = 1;

/// How often a chore repeats.
///
/// Serialized flat, e.g. `{"frequency":"weekly","interval":2,"daysOfWeek":[1,3]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurrenceRule {
    #[serde(flatten)]
    pub frequency: Frequency,
    /// Every N days/weeks/months, at least 1
    pub interval: u32,
    /// Last possible occurrence (inclusive)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "frequency", rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly {
        /// 0 = Sunday … 6 = Saturday
        #[serde(rename = "daysOfWeek")]
        days_of_week: BTreeSet<u8>,
    },
    Monthly {
        /// Calendar day 1..=31; months without that day are skipped
        #[serde(rename = "dayOfMonth")]
        day_of_month: u8,
    },
}

/// The frequency tag without its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrequencyKind {
    Daily,
    Weekly,
    Monthly,
}

impl FromStr for FrequencyKind {
    type Err = ChoresError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "daily" => Ok(FrequencyKind::Daily),
            "weekly" => Ok(FrequencyKind::Weekly),
            "monthly" => Ok(FrequencyKind::Monthly),
            other => Err(ChoresError::Validation(format!(
                "Unknown frequency '{}'. Expected daily, weekly or monthly",
                other
            ))),
        }
    }
}

impl Frequency {
    pub fn kind(&self) -> FrequencyKind {
        match self {
            Frequency::Daily => FrequencyKind::Daily,
            Frequency::Weekly { .. } => FrequencyKind::Weekly,
            Frequency::Monthly { .. } => FrequencyKind::Monthly,
        }
    }
}

impl Default for RecurrenceRule {
    /// Weekly on Mondays
    fn default() -> Self {
        RecurrenceRule {
            frequency: Frequency::Weekly {
                days_of_week: BTreeSet::from([MONDAY]),
            },
            interval: 1,
            end_date: None,
        }
    }
}

impl RecurrenceRule {
    pub fn daily(interval: u32) -> Self {
        RecurrenceRule {
            frequency: Frequency::Daily,
            interval,
            end_date: None,
        }
    }

    pub fn weekly(interval: u32, days: impl IntoIterator<Item = u8>) -> Self {
        RecurrenceRule {
            frequency: Frequency::Weekly {
                days_of_week: days.into_iter().collect(),
            },
            interval,
            end_date: None,
        }
    }

    pub fn monthly(interval: u32, day_of_month: u8) -> Self {
        RecurrenceRule {
            frequency: Frequency::Monthly { day_of_month },
            interval,
            end_date: None,
        }
    }

    pub fn until(mut self, end_date: NaiveDate) -> Self {
        self.end_date = Some(end_date);
        self
    }

    pub fn validate(&self) -> ChoresResult<()> {
        if self.interval == 0 {
            return Err(ChoresError::Validation(
                "Recurrence interval must be at least 1".into(),
            ));
        }

        match &self.frequency {
            Frequency::Daily => Ok(()),
            Frequency::Weekly { days_of_week } => {
                if days_of_week.is_empty() {
                    return Err(ChoresError::Validation(
                        "Weekly recurrence needs at least one day".into(),
                    ));
                }
                if let Some(day) = days_of_week.iter().find(|d| **d > 6) {
                    return Err(ChoresError::Validation(format!(
                        "Day of week {} is out of range 0-6",
                        day
                    )));
                }
                Ok(())
            }
            Frequency::Monthly { day_of_month } => {
                if !(1..=31).contains(day_of_month) {
                    return Err(ChoresError::Validation(format!(
                        "Day of month {} is out of range 1-31",
                        day_of_month
                    )));
                }
                Ok(())
            }
        }
    }

    /// Switch to another frequency, resetting its parameters but keeping the interval.
    pub fn with_frequency_kind(&self, kind: FrequencyKind) -> Self {
        let frequency = match kind {
            FrequencyKind::Daily => Frequency::Daily,
            FrequencyKind::Weekly => Frequency::Weekly {
                days_of_week: BTreeSet::from([MONDAY]),
            },
            FrequencyKind::Monthly => Frequency::Monthly { day_of_month: 1 },
        };

        RecurrenceRule {
            frequency,
            interval: self.interval,
            end_date: self.end_date,
        }
    }

    /// Add or remove a weekday from a weekly rule.
    ///
    /// Removing the last selected day is refused.
    pub fn toggle_day(&mut self, day: u8) -> ChoresResult<()> {
        if day > 6 {
            return Err(ChoresError::Validation(format!(
                "Day of week {} is out of range 0-6",
                day
            )));
        }

        let Frequency::Weekly { days_of_week } = &mut self.frequency else {
            return Err(ChoresError::Validation(
                "Only weekly rules have days of the week".into(),
            ));
        };

        if days_of_week.contains(&day) {
            if days_of_week.len() == 1 {
                return Err(ChoresError::Validation(
                    "At least one day must stay selected".into(),
                ));
            }
            days_of_week.remove(&day);
        } else {
            days_of_week.insert(day);
        }

        Ok(())
    }
}

/// Parse a weekday name or number ("mon", "Monday", "1") into 0..=6, Sunday-first.
pub fn parse_weekday(input: &str) -> ChoresResult<u8> {
    let lower = input.trim().to_lowercase();

    if let Ok(n) = lower.parse::<u8>() {
        if n <= 6 {
            return Ok(n);
        }
    }

    DAY_LABELS
        .iter()
        .position(|label| lower.starts_with(&label.to_lowercase()))
        .map(|i| i as u8)
        .ok_or_else(|| ChoresError::Validation(format!("Unknown weekday '{}'", input)))
}

/// Human-readable summary, or "One-time" when there is no rule.
pub fn describe(rule: Option<&RecurrenceRule>) -> String {
    match rule {
        Some(rule) => rule.to_string(),
        None => "One-time".to_string(),
    }
}

impl fmt::Display for RecurrenceRule {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let n = self.interval;

        match &self.frequency {
            Frequency::Daily if n == 1 => write!(f, "Daily")?,
            Frequency::Daily => write!(f, "Every {} days", n)?,
            Frequency::Weekly { days_of_week } => {
                let days = days_of_week
                    .iter()
                    .filter_map(|d| DAY_LABELS.get(*d as usize))
                    .copied()
                    .collect::<Vec<_>>()
                    .join(", ");
                if n == 1 {
                    write!(f, "Weekly on {}", days)?;
                } else {
                    write!(f, "Every {} weeks on {}", n, days)?;
                }
            }
            Frequency::Monthly { day_of_month } if n == 1 => {
                write!(f, "Monthly on day {}", day_of_month)?
            }
            Frequency::Monthly { day_of_month } => {
                write!(f, "Every {} months on day {}", n, day_of_month)?
            }
        }

        if let Some(end) = self.end_date {
            write!(f, " until {}", end.format("%Y-%m-%d"))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_zero_interval() {
        let rule = RecurrenceRule::daily(0);
        assert!(matches!(rule.validate(), Err(ChoresError::Validation(_))));
    }

    #[test]
    fn test_validate_rejects_empty_weekly_days() {
        let rule = RecurrenceRule::weekly(1, []);
        assert!(rule.validate().is_err());
    }

    #[test]
    fn test_validate_accepts_large_interval() {
        assert!(RecurrenceRule::daily(365).validate().is_ok());
    }

    #[test]
    fn test_validate_monthly_day_bounds() {
        assert!(RecurrenceRule::monthly(1, 31).validate().is_ok());
        assert!(RecurrenceRule::monthly(1, 0).validate().is_err());
        assert!(RecurrenceRule::monthly(1, 32).validate().is_err());
    }

    #[test]
    fn test_toggle_day_refuses_to_remove_last_day() {
        let mut rule = RecurrenceRule::default();
        assert!(rule.toggle_day(MONDAY).is_err());
        assert_eq!(rule, RecurrenceRule::default());

        rule.toggle_day(3).unwrap();
        rule.toggle_day(MONDAY).unwrap();
        assert_eq!(
            rule.frequency,
            Frequency::Weekly {
                days_of_week: BTreeSet::from([3])
            }
        );
    }

    #[test]
    fn test_with_frequency_kind_resets_parameters() {
        let rule = RecurrenceRule::weekly(3, [2, 4]);

        let monthly = rule.with_frequency_kind(FrequencyKind::Monthly);
        assert_eq!(monthly.frequency, Frequency::Monthly { day_of_month: 1 });
        assert_eq!(monthly.interval, 3);

        let weekly = monthly.with_frequency_kind(FrequencyKind::Weekly);
        assert_eq!(
            weekly.frequency,
            Frequency::Weekly {
                days_of_week: BTreeSet::from([MONDAY])
            }
        );
    }

    #[test]
    fn test_summaries() {
        assert_eq!(describe(None), "One-time");
        assert_eq!(RecurrenceRule::daily(1).to_string(), "Daily");
        assert_eq!(RecurrenceRule::daily(3).to_string(), "Every 3 days");
        assert_eq!(
            RecurrenceRule::weekly(1, [3, 1]).to_string(),
            "Weekly on Mon, Wed"
        );
        assert_eq!(
            RecurrenceRule::weekly(2, [1]).to_string(),
            "Every 2 weeks on Mon"
        );
        assert_eq!(
            RecurrenceRule::monthly(1, 15).to_string(),
            "Monthly on day 15"
        );
        let until = NaiveDate::from_ymd_opt(2025, 6, 30).unwrap();
        assert_eq!(
            RecurrenceRule::monthly(3, 1).until(until).to_string(),
            "Every 3 months on day 1 until 2025-06-30"
        );
    }

    #[test]
    fn test_parse_weekday() {
        assert_eq!(parse_weekday("mon").unwrap(), 1);
        assert_eq!(parse_weekday("Sunday").unwrap(), 0);
        assert_eq!(parse_weekday("6").unwrap(), 6);
        assert!(parse_weekday("funday").is_err());
        assert!(parse_weekday("7").is_err());
    }

    #[test]
    fn test_serializes_flat_camel_case_shape() {
        let rule = RecurrenceRule::weekly(2, [1, 3]);
        let json = serde_json::to_value(&rule).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "frequency": "weekly",
                "daysOfWeek": [1, 3],
                "interval": 2,
            })
        );

        let parsed: RecurrenceRule = serde_json::from_value(serde_json::json!({
            "frequency": "monthly",
            "interval": 1,
            "dayOfMonth": 31,
            "endDate": "2025-12-31",
        }))
        .unwrap();
        assert_eq!(
            parsed,
            RecurrenceRule::monthly(1, 31).until(NaiveDate::from_ymd_opt(2025, 12, 31).unwrap())
        );
    }
}
