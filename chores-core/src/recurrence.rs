//! RRULE expansion for recurring chores.
//!
//! Each frequency contributes its own RRULE parts; the `rrule` crate then
//! generates the concrete dates. All-day chores are expanded at midnight UTC,
//! so only the date part of each occurrence is meaningful.

use chrono::{DateTime, Datelike, Days, Duration, Months, NaiveDate, NaiveTime, Utc};
use rrule::RRuleSet;
use tracing::debug;

use crate::error::{ChoresError, ChoresResult};
use crate::model::{Chore, Frequency, RecurrenceRule};

/// RRULE weekday codes indexed Sunday-first, matching `RecurrenceRule` day numbers.
const RRULE_WEEKDAYS: [&str; 7] = ["SU", "MO", "TU", "WE", "TH", "FR", "SA"];

/// Occurrences fetched per query; longer ranges are paged.
const MAX_OCCURRENCES: u16 = u16::MAX;

impl Frequency {
    /// RRULE parts for this frequency (FREQ plus any BY* filter).
    fn rrule_parts(&self) -> Vec<String> {
        match self {
            Frequency::Daily => vec!["FREQ=DAILY".to_string()],
            Frequency::Weekly { days_of_week } => {
                let mut parts = vec!["FREQ=WEEKLY".to_string()];
                let days: Vec<&str> = days_of_week
                    .iter()
                    .filter_map(|d| RRULE_WEEKDAYS.get(*d as usize))
                    .copied()
                    .collect();
                if !days.is_empty() {
                    parts.push(format!("BYDAY={}", days.join(",")));
                }
                parts
            }
            // BYMONTHDAY skips months that are too short rather than clamping
            Frequency::Monthly { day_of_month } => vec![
                "FREQ=MONTHLY".to_string(),
                format!("BYMONTHDAY={}", day_of_month),
            ],
        }
    }
}

/// Build an iCalendar-format DTSTART + RRULE string for the rrule crate parser.
fn build_rrule_string(start: NaiveDate, rule: &RecurrenceRule) -> String {
    let mut parts = rule.frequency.rrule_parts();
    parts.push(format!("INTERVAL={}", rule.interval));

    format!(
        "DTSTART:{}T000000Z\nRRULE:{}",
        start.format("%Y%m%d"),
        parts.join(";")
    )
}

fn midnight_utc(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// Dates on which `chore` occurs within `[range_start, range_end]` (inclusive), ascending.
///
/// Never yields dates before the chore's start date or after the rule's end date.
pub fn occurrence_dates(
    chore: &Chore,
    range_start: NaiveDate,
    range_end: NaiveDate,
) -> ChoresResult<Vec<NaiveDate>> {
    let Some(rule) = &chore.recurrence else {
        let in_range = chore.start_date >= range_start && chore.start_date <= range_end;
        return Ok(if in_range {
            vec![chore.start_date]
        } else {
            Vec::new()
        });
    };

    rule.validate()?;

    let from = range_start.max(chore.start_date);
    let to = match rule.end_date {
        Some(end) => range_end.min(end),
        None => range_end,
    };

    if from > to {
        return Ok(Vec::new());
    }

    // rrule stores the interval as u16
    if u16::try_from(rule.interval).is_err() {
        return Ok(sparse_occurrences(chore.start_date, rule, from, to));
    }

    let rrule_str = build_rrule_string(chore.start_date, rule);

    let rrule_set: RRuleSet = rrule_str.parse().map_err(|e| {
        ChoresError::Validation(format!(
            "Failed to parse recurrence for chore '{}': {}",
            chore.id, e
        ))
    })?;

    // Widen by a second on each side so the boundaries are inclusive.
    let tz: rrule::Tz = Utc.into();
    let mut after = (midnight_utc(from) - Duration::seconds(1)).with_timezone(&tz);
    let before = (midnight_utc(to) + Duration::seconds(1)).with_timezone(&tz);

    let mut dates = Vec::new();
    loop {
        let result = rrule_set.clone().after(after).before(before).all(MAX_OCCURRENCES);
        let page_full = result.dates.len() == usize::from(MAX_OCCURRENCES);
        let last = result.dates.last().cloned();
        dates.extend(result.dates.iter().map(|dt| dt.date_naive()));

        match (result.limited, last) {
            (false, _) => break,
            (true, Some(last)) if page_full => {
                debug!(chore = %chore.id, count = dates.len(), "paging recurrence expansion");
                after = last + Duration::seconds(1);
            }
            // The iterator gave up without filling a page
            _ => {
                return Err(ChoresError::Validation(format!(
                    "Recurrence for chore '{}' could not be fully expanded",
                    chore.id
                )));
            }
        }
    }

    Ok(dates)
}

/// Expansion for intervals too large for the rrule crate.
///
/// Periods (days, weeks starting Monday, or months) are laid out from the
/// start date directly. Only a handful fit inside any representable date range.
fn sparse_occurrences(
    start: NaiveDate,
    rule: &RecurrenceRule,
    from: NaiveDate,
    to: NaiveDate,
) -> Vec<NaiveDate> {
    let interval = u64::from(rule.interval);
    let week_start = start.checked_sub_days(Days::new(u64::from(
        start.weekday().num_days_from_monday(),
    )));
    let month_start = start.with_day(1);

    let mut dates = Vec::new();
    for period in 0u64.. {
        let Some(offset) = period.checked_mul(interval) else {
            break;
        };

        let period_start = match &rule.frequency {
            Frequency::Daily => start.checked_add_days(Days::new(offset)),
            Frequency::Weekly { .. } => offset
                .checked_mul(7)
                .and_then(|days| week_start?.checked_add_days(Days::new(days))),
            Frequency::Monthly { .. } => u32::try_from(offset)
                .ok()
                .and_then(|months| month_start?.checked_add_months(Months::new(months))),
        };
        let Some(period_start) = period_start.filter(|d| *d <= to) else {
            break;
        };

        let candidates: Vec<NaiveDate> = match &rule.frequency {
            Frequency::Daily => vec![period_start],
            Frequency::Weekly { days_of_week } => days_of_week
                .iter()
                .filter_map(|d| {
                    let from_monday = u64::from((d + 6) % 7);
                    period_start.checked_add_days(Days::new(from_monday))
                })
                .collect(),
            Frequency::Monthly { day_of_month } => period_start
                .with_day(u32::from(*day_of_month))
                .into_iter()
                .collect(),
        };

        dates.extend(
            candidates
                .into_iter()
                .filter(|d| *d >= start && *d >= from && *d <= to),
        );
    }

    dates.sort();
    dates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NewChore;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn chore_with(rule: Option<RecurrenceRule>, start: NaiveDate) -> Chore {
        NewChore {
            recurrence: rule,
            ..NewChore::one_time("Test chore", start)
        }
        .with_id("c1".into())
    }

    #[test]
    fn test_build_rrule_string_weekly() {
        let rule = RecurrenceRule::weekly(2, [3, 1]);
        assert_eq!(
            build_rrule_string(date(2024, 1, 1), &rule),
            "DTSTART:20240101T000000Z\nRRULE:FREQ=WEEKLY;BYDAY=MO,WE;INTERVAL=2"
        );
    }

    #[test]
    fn test_build_rrule_string_monthly() {
        let rule = RecurrenceRule::monthly(3, 31);
        assert_eq!(
            build_rrule_string(date(2024, 1, 15), &rule),
            "DTSTART:20240115T000000Z\nRRULE:FREQ=MONTHLY;BYMONTHDAY=31;INTERVAL=3"
        );
    }

    #[test]
    fn test_daily_every_third_day() {
        let chore = chore_with(Some(RecurrenceRule::daily(3)), date(2024, 1, 1));
        let dates = occurrence_dates(&chore, date(2024, 1, 1), date(2024, 1, 10)).unwrap();
        assert_eq!(
            dates,
            vec![date(2024, 1, 1), date(2024, 1, 4), date(2024, 1, 7), date(2024, 1, 10)]
        );
    }

    #[test]
    fn test_never_before_start_date() {
        let chore = chore_with(Some(RecurrenceRule::daily(1)), date(2024, 3, 10));
        let dates = occurrence_dates(&chore, date(2024, 3, 1), date(2024, 3, 12)).unwrap();
        assert_eq!(
            dates,
            vec![date(2024, 3, 10), date(2024, 3, 11), date(2024, 3, 12)]
        );
    }

    #[test]
    fn test_end_date_is_inclusive() {
        let rule = RecurrenceRule::daily(1).until(date(2024, 5, 3));
        let chore = chore_with(Some(rule), date(2024, 5, 1));
        let dates = occurrence_dates(&chore, date(2024, 4, 1), date(2024, 6, 1)).unwrap();
        assert_eq!(dates, vec![date(2024, 5, 1), date(2024, 5, 2), date(2024, 5, 3)]);
    }

    #[test]
    fn test_end_date_before_start_yields_nothing() {
        let rule = RecurrenceRule::daily(1).until(date(2024, 4, 30));
        let chore = chore_with(Some(rule), date(2024, 5, 1));
        let dates = occurrence_dates(&chore, date(2024, 4, 1), date(2024, 6, 1)).unwrap();
        assert!(dates.is_empty());
    }

    #[test]
    fn test_monthly_day_31_skips_short_months() {
        let chore = chore_with(Some(RecurrenceRule::monthly(1, 31)), date(2025, 1, 1));
        let dates = occurrence_dates(&chore, date(2025, 1, 1), date(2025, 5, 31)).unwrap();
        assert_eq!(
            dates,
            vec![date(2025, 1, 31), date(2025, 3, 31), date(2025, 5, 31)]
        );
    }

    #[test]
    fn test_monthly_interval_counts_from_start_month() {
        let chore = chore_with(Some(RecurrenceRule::monthly(2, 15)), date(2025, 1, 1));
        let dates = occurrence_dates(&chore, date(2025, 1, 1), date(2025, 7, 31)).unwrap();
        assert_eq!(
            dates,
            vec![date(2025, 1, 15), date(2025, 3, 15), date(2025, 5, 15), date(2025, 7, 15)]
        );
    }

    #[test]
    fn test_one_time_inside_and_outside_range() {
        let chore = chore_with(None, date(2025, 2, 28));
        assert_eq!(
            occurrence_dates(&chore, date(2025, 2, 1), date(2025, 2, 28)).unwrap(),
            vec![date(2025, 2, 28)]
        );
        assert!(
            occurrence_dates(&chore, date(2025, 3, 1), date(2025, 3, 31))
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn test_interval_beyond_u16_keeps_start_date() {
        let chore = chore_with(Some(RecurrenceRule::daily(70_000)), date(2024, 1, 1));
        let dates = occurrence_dates(&chore, date(2024, 1, 1), date(2024, 1, 31)).unwrap();
        assert_eq!(dates, vec![date(2024, 1, 1)]);

        let second = date(2024, 1, 1) + Days::new(70_000);
        let dates = occurrence_dates(&chore, date(2024, 2, 1), second).unwrap();
        assert_eq!(dates, vec![second]);
    }

    #[test]
    fn test_interval_beyond_u16_weekly_and_monthly() {
        // Wednesday start: Monday of the first week is before the start
        let weekly = RecurrenceRule::weekly(100_000, [1, 3, 5]);
        let chore = chore_with(Some(weekly), date(2024, 1, 3));
        let dates = occurrence_dates(&chore, date(2024, 1, 1), date(2024, 12, 31)).unwrap();
        assert_eq!(dates, vec![date(2024, 1, 3), date(2024, 1, 5)]);

        let chore = chore_with(Some(RecurrenceRule::monthly(70_000, 31)), date(2025, 1, 1));
        let dates = occurrence_dates(&chore, date(2025, 1, 1), date(2025, 12, 31)).unwrap();
        assert_eq!(dates, vec![date(2025, 1, 31)]);

        let chore = chore_with(Some(RecurrenceRule::monthly(70_000, 15)), date(2025, 1, 20));
        let dates = occurrence_dates(&chore, date(2025, 1, 1), date(2025, 12, 31)).unwrap();
        assert!(dates.is_empty());
    }

    #[test]
    fn test_long_range_is_not_capped() {
        let chore = chore_with(Some(RecurrenceRule::daily(1)), date(2000, 1, 1));
        let dates = occurrence_dates(&chore, date(2000, 1, 1), date(2200, 1, 1)).unwrap();

        assert_eq!(dates.len(), 73_050);
        assert_eq!(dates.first(), Some(&date(2000, 1, 1)));
        assert_eq!(dates.last(), Some(&date(2200, 1, 1)));
        assert!(dates.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn test_reversed_range_is_empty() {
        let chore = chore_with(Some(RecurrenceRule::daily(1)), date(2025, 1, 1));
        let dates = occurrence_dates(&chore, date(2025, 2, 10), date(2025, 2, 1)).unwrap();
        assert!(dates.is_empty());
    }
}
