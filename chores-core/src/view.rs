//! Calendar view ranges.
//!
//! Calendar grids start on Sunday.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::ChoresError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalendarView {
    #[default]
    Month,
    Week,
    Day,
}

impl CalendarView {
    /// Inclusive date range shown for `anchor` in this view.
    pub fn range_for(&self, anchor: NaiveDate) -> (NaiveDate, NaiveDate) {
        match self {
            CalendarView::Month => {
                let first = anchor.with_day(1).unwrap_or(anchor);
                let last = last_day_of_month(anchor);
                (week_start(first), week_end(last))
            }
            CalendarView::Week => (week_start(anchor), week_end(anchor)),
            CalendarView::Day => (anchor, anchor),
        }
    }
}

fn week_start(date: NaiveDate) -> NaiveDate {
    date - Days::new(date.weekday().num_days_from_sunday() as u64)
}

fn week_end(date: NaiveDate) -> NaiveDate {
    week_start(date) + Days::new(6)
}

fn last_day_of_month(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };

    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|d| d.pred_opt())
        .unwrap_or(date)
}

impl FromStr for CalendarView {
    type Err = ChoresError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "month" => Ok(CalendarView::Month),
            "week" => Ok(CalendarView::Week),
            "day" => Ok(CalendarView::Day),
            other => Err(ChoresError::Validation(format!(
                "Unknown view '{}'. Expected month, week or day",
                other
            ))),
        }
    }
}

impl fmt::Display for CalendarView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalendarView::Month => write!(f, "month"),
            CalendarView::Week => write!(f, "week"),
            CalendarView::Day => write!(f, "day"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_month_range_covers_full_grid() {
        // June 2024: the 1st is a Saturday, the 30th a Sunday
        let (start, end) = CalendarView::Month.range_for(date(2024, 6, 17));
        assert_eq!(start, date(2024, 5, 26));
        assert_eq!(end, date(2024, 7, 6));
    }

    #[test]
    fn test_month_range_in_december() {
        let (start, end) = CalendarView::Month.range_for(date(2024, 12, 25));
        assert_eq!(start, date(2024, 12, 1));
        assert_eq!(end, date(2025, 1, 4));
    }

    #[test]
    fn test_week_range_is_sunday_to_saturday() {
        let (start, end) = CalendarView::Week.range_for(date(2024, 6, 19));
        assert_eq!(start, date(2024, 6, 16));
        assert_eq!(end, date(2024, 6, 22));

        let (start, _) = CalendarView::Week.range_for(date(2024, 6, 16));
        assert_eq!(start, date(2024, 6, 16));
    }

    #[test]
    fn test_day_range_is_single_day() {
        assert_eq!(
            CalendarView::Day.range_for(date(2024, 2, 29)),
            (date(2024, 2, 29), date(2024, 2, 29))
        );
    }

    #[test]
    fn test_parse_view() {
        assert_eq!("Week".parse::<CalendarView>().unwrap(), CalendarView::Week);
        assert!("year".parse::<CalendarView>().is_err());
    }
}
