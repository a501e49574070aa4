//! Occurrence expansion: chores + completions → calendar events for a date range.

use std::collections::HashMap;

use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;
use tracing::warn;

use crate::model::{Chore, CompletionRecord, OccurrenceKey, TeamMember};
use crate::recurrence::occurrence_dates;

/// One dated occurrence of a chore, ready for display.
///
/// Derived on every range query and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoreCalendarEvent {
    /// `choreId::YYYY-MM-DD`
    pub id: String,
    pub chore_id: String,
    pub occurrence_date: NaiveDate,
    pub title: String,
    /// Midnight of the occurrence date
    pub start: NaiveDateTime,
    /// Midnight of the following day (exclusive, all-day)
    pub end: NaiveDateTime,
    pub assignee: Option<TeamMember>,
    pub is_completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_by_id: Option<String>,
}

/// Expand every chore into its occurrences within `[range_start, range_end]` (inclusive).
///
/// Events are grouped by chore in input order, ascending by date within each chore.
/// A reversed range produces no events. A chore whose rule cannot be expanded is
/// skipped rather than failing the whole calendar.
pub fn expand_chores(
    chores: &[Chore],
    members: &[TeamMember],
    completions: &[CompletionRecord],
    range_start: NaiveDate,
    range_end: NaiveDate,
) -> Vec<ChoreCalendarEvent> {
    let completion_by_key: HashMap<OccurrenceKey, &CompletionRecord> =
        completions.iter().map(|c| (c.key(), c)).collect();

    let member_by_id: HashMap<&str, &TeamMember> =
        members.iter().map(|m| (m.id.as_str(), m)).collect();

    let mut events = Vec::new();

    for chore in chores {
        let dates = match occurrence_dates(chore, range_start, range_end) {
            Ok(dates) => dates,
            Err(e) => {
                warn!(chore = %chore.id, "skipping chore: {}", e);
                continue;
            }
        };

        let assignee = chore
            .assignee_id
            .as_deref()
            .and_then(|id| member_by_id.get(id))
            .map(|m| (*m).clone());

        for date in dates {
            let key = OccurrenceKey::new(&chore.id, date);
            let completion = completion_by_key.get(&key);
            let start = date.and_time(NaiveTime::MIN);

            events.push(ChoreCalendarEvent {
                id: key.to_string(),
                chore_id: chore.id.clone(),
                occurrence_date: date,
                title: chore.title.clone(),
                start,
                end: start + Days::new(1),
                assignee: assignee.clone(),
                is_completed: completion.is_some(),
                completed_by_id: completion.map(|c| c.completed_by_id.clone()),
            });
        }
    }

    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NewChore, NewCompletion, RecurrenceRule};
    use chrono::{TimeZone, Utc};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn member(id: &str) -> TeamMember {
        TeamMember {
            id: id.to_string(),
            name: format!("Member {}", id),
            color: "#3B82F6".to_string(),
        }
    }

    fn completion(id: &str, chore_id: &str, on: NaiveDate, by: &str) -> CompletionRecord {
        NewCompletion {
            chore_id: chore_id.to_string(),
            occurrence_date: on,
            completed_at: Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
            completed_by_id: by.to_string(),
        }
        .with_id(id.to_string())
    }

    fn dates_for(events: &[ChoreCalendarEvent], chore_id: &str) -> Vec<NaiveDate> {
        events
            .iter()
            .filter(|e| e.chore_id == chore_id)
            .map(|e| e.occurrence_date)
            .collect()
    }

    #[test]
    fn test_weekly_interval_two_is_anchored_on_start_week() {
        // 2024-01-01 is a Monday
        let chore = NewChore::recurring("Trash", date(2024, 1, 1), RecurrenceRule::weekly(2, [1, 3]))
            .with_id("trash".into());

        let events = expand_chores(&[chore], &[], &[], date(2024, 1, 1), date(2024, 1, 28));

        assert_eq!(
            dates_for(&events, "trash"),
            vec![date(2024, 1, 1), date(2024, 1, 3), date(2024, 1, 15), date(2024, 1, 17)]
        );
    }

    #[test]
    fn test_monthly_day_31_skip_policy() {
        let chore = NewChore::recurring("Audit", date(2024, 1, 1), RecurrenceRule::monthly(1, 31))
            .with_id("audit".into());

        // April has 30 days, February 29 in 2024, March 31
        let april = expand_chores(&[chore.clone()], &[], &[], date(2024, 4, 1), date(2024, 4, 30));
        let february = expand_chores(&[chore.clone()], &[], &[], date(2024, 2, 1), date(2024, 2, 29));
        let march = expand_chores(&[chore], &[], &[], date(2024, 3, 1), date(2024, 3, 31));

        assert!(april.is_empty());
        assert!(february.is_empty());
        assert_eq!(dates_for(&march, "audit"), vec![date(2024, 3, 31)]);
    }

    #[test]
    fn test_one_time_chore_range_boundary() {
        let on_end = NewChore::one_time("Inventory", date(2024, 6, 30)).with_id("a".into());
        let after_end = NewChore::one_time("Inventory", date(2024, 7, 1)).with_id("b".into());

        let events = expand_chores(
            &[on_end, after_end],
            &[],
            &[],
            date(2024, 6, 1),
            date(2024, 6, 30),
        );

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].chore_id, "a");
        assert_eq!(events[0].id, "a::2024-06-30");
    }

    #[test]
    fn test_completion_and_assignee_resolution() {
        let chore = NewChore::recurring("Dishes", date(2024, 6, 3), RecurrenceRule::daily(1))
            .assigned_to("m1")
            .with_id("dishes".into());
        let completions = vec![completion("r1", "dishes", date(2024, 6, 4), "m2")];

        let events = expand_chores(
            &[chore],
            &[member("m1"), member("m2")],
            &completions,
            date(2024, 6, 3),
            date(2024, 6, 5),
        );

        assert_eq!(events.len(), 3);
        assert!(events.iter().all(|e| e.assignee == Some(member("m1"))));

        let done: Vec<_> = events.iter().filter(|e| e.is_completed).collect();
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].occurrence_date, date(2024, 6, 4));
        assert_eq!(done[0].completed_by_id.as_deref(), Some("m2"));
        assert_eq!(events[0].completed_by_id, None);
    }

    #[test]
    fn test_dangling_assignee_resolves_to_none() {
        let chore = NewChore::one_time("Fridge", date(2024, 6, 3))
            .assigned_to("gone")
            .with_id("fridge".into());

        let events = expand_chores(&[chore], &[member("m1")], &[], date(2024, 6, 1), date(2024, 6, 30));

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].assignee, None);
    }

    #[test]
    fn test_completion_for_other_chore_does_not_match() {
        let chore = NewChore::one_time("Fridge", date(2024, 6, 3)).with_id("fridge".into());
        let completions = vec![completion("r1", "other", date(2024, 6, 3), "m1")];

        let events = expand_chores(&[chore], &[], &completions, date(2024, 6, 1), date(2024, 6, 30));

        assert!(!events[0].is_completed);
    }

    #[test]
    fn test_event_spans_the_whole_day() {
        let chore = NewChore::one_time("Fridge", date(2024, 6, 3)).with_id("fridge".into());
        let events = expand_chores(&[chore], &[], &[], date(2024, 6, 3), date(2024, 6, 3));

        assert_eq!(events[0].start, date(2024, 6, 3).and_hms_opt(0, 0, 0).unwrap());
        assert_eq!(events[0].end, date(2024, 6, 4).and_hms_opt(0, 0, 0).unwrap());
    }

    #[test]
    fn test_expansion_is_deterministic() {
        let chores = vec![
            NewChore::recurring("A", date(2024, 1, 1), RecurrenceRule::weekly(1, [0, 6]))
                .with_id("a".into()),
            NewChore::recurring("B", date(2024, 1, 5), RecurrenceRule::daily(2)).with_id("b".into()),
        ];

        let first = expand_chores(&chores, &[], &[], date(2024, 1, 1), date(2024, 2, 29));
        let second = expand_chores(&chores, &[], &[], date(2024, 1, 1), date(2024, 2, 29));

        assert_eq!(first, second);
        for id in ["a", "b"] {
            let dates = dates_for(&first, id);
            assert!(dates.windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn test_huge_interval_still_yields_start_date() {
        let chore = NewChore::recurring("Rare", date(2024, 1, 1), RecurrenceRule::daily(70_000))
            .with_id("rare".into());

        let events = expand_chores(&[chore], &[], &[], date(2024, 1, 1), date(2024, 1, 31));

        assert_eq!(dates_for(&events, "rare"), vec![date(2024, 1, 1)]);
    }

    #[test]
    fn test_invalid_rule_is_skipped_not_fatal() {
        let broken = NewChore::recurring("Broken", date(2024, 1, 1), RecurrenceRule::daily(0))
            .with_id("broken".into());
        let fine = NewChore::one_time("Fine", date(2024, 1, 2)).with_id("fine".into());

        let events = expand_chores(&[broken, fine], &[], &[], date(2024, 1, 1), date(2024, 1, 31));

        assert_eq!(dates_for(&events, "fine"), vec![date(2024, 1, 2)]);
    }
}
