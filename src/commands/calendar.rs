use anyhow::Result;
use chores_core::config::ChoresConfig;
use chores_core::gateway::Gateway;
use chores_core::view::CalendarView;
use chores_core::{ChoreCalendarEvent, SyncStore};
use chrono::{Local, NaiveDate};
use owo_colors::OwoColorize;

use crate::render::{Render, date_label};
use crate::utils::dates::{parse_date, parse_optional_date};

/// The inclusive range to show: `--from/--to` when given, otherwise the
/// view's range around `--date` (today by default).
pub fn resolve_range(
    config: &ChoresConfig,
    view: Option<&str>,
    date: Option<&str>,
    from: Option<&str>,
    to: Option<&str>,
) -> Result<(NaiveDate, NaiveDate)> {
    if let (Some(from), Some(to)) = (from, to) {
        let (from, to) = (parse_date(from)?, parse_date(to)?);
        if from > to {
            anyhow::bail!("--from ({}) is after --to ({})", from, to);
        }
        return Ok((from, to));
    }

    let view = match view {
        Some(view) => view.parse::<CalendarView>()?,
        None => config.default_view,
    };
    let anchor = parse_optional_date(date)?.unwrap_or_else(|| Local::now().date_naive());

    Ok(view.range_for(anchor))
}

pub fn run<G: Gateway>(
    store: &SyncStore<G>,
    (start, end): (NaiveDate, NaiveDate),
    json: bool,
) -> Result<()> {
    let mut events = store.events_in_range(start, end);
    events.sort_by(|a, b| a.occurrence_date.cmp(&b.occurrence_date));

    if json {
        println!("{}", serde_json::to_string_pretty(&events)?);
        return Ok(());
    }

    println!(
        "{}",
        format!("{} → {}", start.format("%a %b %-d"), end.format("%a %b %-d")).dimmed()
    );

    if events.is_empty() {
        println!("{}", "No chores in this range".dimmed());
        return Ok(());
    }

    print_by_day(&events, Local::now().date_naive());

    Ok(())
}

fn print_by_day(events: &[ChoreCalendarEvent], today: NaiveDate) {
    let mut current: Option<NaiveDate> = None;

    for event in events {
        if current != Some(event.occurrence_date) {
            println!();
            let label = date_label(event.occurrence_date, today);
            if event.occurrence_date == today {
                println!("{}", label.bold().cyan());
            } else {
                println!("{}", label.bold());
            }
            current = Some(event.occurrence_date);
        }

        println!("  {}", event.render());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_explicit_range_wins_over_view() {
        let config = ChoresConfig::default();
        let range = resolve_range(
            &config,
            Some("day"),
            None,
            Some("2024-01-10"),
            Some("2024-01-20"),
        )
        .unwrap();

        assert_eq!(range, (date(2024, 1, 10), date(2024, 1, 20)));
    }

    #[test]
    fn test_reversed_explicit_range_is_an_error() {
        let config = ChoresConfig::default();
        assert!(
            resolve_range(&config, None, None, Some("2024-01-20"), Some("2024-01-10")).is_err()
        );
    }

    #[test]
    fn test_view_range_around_date() {
        let config = ChoresConfig::default();

        // Wednesday 2024-01-10 → Sunday 7th through Saturday 13th
        let week = resolve_range(&config, Some("week"), Some("2024-01-10"), None, None).unwrap();
        assert_eq!(week, (date(2024, 1, 7), date(2024, 1, 13)));

        let month = resolve_range(&config, None, Some("2024-01-10"), None, None).unwrap();
        assert_eq!(month, (date(2023, 12, 31), date(2024, 2, 3)));
    }
}
