//! Reconciliation and dedup rules.
//!
//! Pure functions over whole collections, shared by the local mutation
//! success path and the realtime merge. Every function returns a new
//! collection; nothing is edited in place.

use crate::error::{ChoresError, ChoresResult};
use crate::gateway::{ChangeEvent, ChangeKind};
use crate::model::{Chore, CompletionRecord, OccurrenceKey, TeamMember};

/// Entities with a surrogate id.
pub trait Identified: Clone {
    fn id(&self) -> &str;
}

impl Identified for TeamMember {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Identified for Chore {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Identified for CompletionRecord {
    fn id(&self) -> &str {
        &self.id
    }
}

pub fn contains_id<T: Identified>(list: &[T], id: &str) -> bool {
    list.iter().any(|item| item.id() == id)
}

pub fn appended<T: Identified>(list: &[T], item: T) -> Vec<T> {
    let mut next = list.to_vec();
    next.push(item);
    next
}

/// Append `row` unless an entry with the same id is already present.
pub fn append_if_absent<T: Identified>(list: &[T], row: T) -> Option<Vec<T>> {
    if contains_id(list, row.id()) {
        return None;
    }
    Some(appended(list, row))
}

pub fn remove_by_id<T: Identified>(list: &[T], id: &str) -> Vec<T> {
    list.iter().filter(|item| item.id() != id).cloned().collect()
}

/// Replace the entry with the same id as `canonical`, keeping its position.
pub fn replace_by_id<T: Identified>(list: &[T], canonical: T) -> Vec<T> {
    list.iter()
        .map(|item| {
            if item.id() == canonical.id() {
                canonical.clone()
            } else {
                item.clone()
            }
        })
        .collect()
}

/// Swap an optimistic entry for the gateway-confirmed one.
///
/// - temp entry present: replaced in place by `confirmed`
/// - `confirmed` already present (its push echo won the race): temp entry dropped
/// - temp entry gone (rolled back or refetched away): list unchanged
pub fn swap_confirmed<T: Identified>(list: &[T], temp_id: &str, confirmed: T) -> Vec<T> {
    if contains_id(list, confirmed.id()) {
        return remove_by_id(list, temp_id);
    }
    list.iter()
        .map(|item| {
            if item.id() == temp_id {
                confirmed.clone()
            } else {
                item.clone()
            }
        })
        .collect()
}

pub fn find_by_key<'a>(
    completions: &'a [CompletionRecord],
    key: &OccurrenceKey,
) -> Option<&'a CompletionRecord> {
    completions.iter().find(|c| c.matches(key))
}

/// Clear the assignee on every chore assigned to `member_id`.
pub fn unassign(chores: &[Chore], member_id: &str) -> Vec<Chore> {
    chores
        .iter()
        .map(|c| {
            if c.assignee_id.as_deref() == Some(member_id) {
                Chore {
                    assignee_id: None,
                    ..c.clone()
                }
            } else {
                c.clone()
            }
        })
        .collect()
}

/// Outcome of folding a pushed change into a collection.
#[derive(Debug, Clone, PartialEq)]
pub enum Merge<T> {
    Replace(Vec<T>),
    Unchanged,
    /// The event carries too little to apply; reload the collection
    Refetch,
}

fn decode(event: &ChangeEvent) -> ChoresResult<CompletionRecord> {
    serde_json::from_value(event.payload.clone())
        .map_err(|e| ChoresError::Decode(format!("{} {:?}: {}", event.collection, event.kind, e)))
}

/// Fold a pushed completion change into the current completions.
///
/// Inserts are appended only if their id is new, which keeps a locally created
/// completion from being doubled by its own echo.
pub fn merge_completion(
    completions: &[CompletionRecord],
    event: &ChangeEvent,
) -> ChoresResult<Merge<CompletionRecord>> {
    let merged = match event.kind {
        ChangeKind::Insert => append_if_absent(completions, decode(event)?),
        ChangeKind::Update => {
            let row = decode(event)?;
            if contains_id(completions, &row.id) {
                Some(replace_by_id(completions, row))
            } else {
                Some(appended(completions, row))
            }
        }
        ChangeKind::Delete => {
            let id = event
                .row_id()
                .ok_or_else(|| ChoresError::Decode("delete event without id".into()))?;
            contains_id(completions, id).then(|| remove_by_id(completions, id))
        }
        ChangeKind::Any => return Ok(Merge::Refetch),
    };

    Ok(match merged {
        Some(next) => Merge::Replace(next),
        None => Merge::Unchanged,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::Collection;
    use crate::model::NewCompletion;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn record(id: &str, day: u32) -> CompletionRecord {
        NewCompletion {
            chore_id: "c1".to_string(),
            occurrence_date: NaiveDate::from_ymd_opt(2024, 6, day).unwrap(),
            completed_at: Utc.with_ymd_and_hms(2024, 6, day, 9, 0, 0).unwrap(),
            completed_by_id: "m1".to_string(),
        }
        .with_id(id.to_string())
    }

    fn insert_event(row: &CompletionRecord) -> ChangeEvent {
        ChangeEvent::new(
            Collection::Completions,
            ChangeKind::Insert,
            serde_json::to_value(row).unwrap(),
        )
    }

    #[test]
    fn test_swap_confirmed_preserves_position() {
        let list = vec![record("a", 1), record("tmp-1", 2), record("b", 3)];
        let swapped = swap_confirmed(&list, "tmp-1", record("S", 2));

        let ids: Vec<_> = swapped.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "S", "b"]);
    }

    #[test]
    fn test_swap_after_echo_drops_temp_entry() {
        // echo of S was merged before the insert call returned
        let list = vec![record("tmp-1", 2), record("S", 2)];
        let swapped = swap_confirmed(&list, "tmp-1", record("S", 2));

        assert_eq!(swapped, vec![record("S", 2)]);
    }

    #[test]
    fn test_swap_without_temp_entry_is_noop() {
        let list = vec![record("a", 1)];
        assert_eq!(swap_confirmed(&list, "tmp-1", record("S", 2)), list);
    }

    #[test]
    fn test_push_insert_of_known_id_is_ignored() {
        let list = vec![record("S", 2)];
        let merged = merge_completion(&list, &insert_event(&record("S", 2))).unwrap();
        assert_eq!(merged, Merge::Unchanged);
    }

    #[test]
    fn test_push_insert_of_new_id_is_appended() {
        let list = vec![record("a", 1)];
        let merged = merge_completion(&list, &insert_event(&record("b", 2))).unwrap();
        assert_eq!(merged, Merge::Replace(vec![record("a", 1), record("b", 2)]));
    }

    #[test]
    fn test_push_delete_by_id() {
        let list = vec![record("a", 1), record("b", 2)];
        let event = ChangeEvent::new(
            Collection::Completions,
            ChangeKind::Delete,
            serde_json::json!({ "id": "a" }),
        );

        assert_eq!(
            merge_completion(&list, &event).unwrap(),
            Merge::Replace(vec![record("b", 2)])
        );
        assert_eq!(
            merge_completion(&[record("b", 2)], &event).unwrap(),
            Merge::Unchanged
        );
    }

    #[test]
    fn test_push_update_replaces_in_place_or_appends() {
        let list = vec![record("a", 1), record("b", 2)];
        let mut edited = record("a", 1);
        edited.completed_by_id = "m2".to_string();
        let event = ChangeEvent::new(
            Collection::Completions,
            ChangeKind::Update,
            serde_json::to_value(&edited).unwrap(),
        );

        assert_eq!(
            merge_completion(&list, &event).unwrap(),
            Merge::Replace(vec![edited.clone(), record("b", 2)])
        );
        assert_eq!(
            merge_completion(&[record("b", 2)], &event).unwrap(),
            Merge::Replace(vec![record("b", 2), edited])
        );
    }

    #[test]
    fn test_unspecified_change_asks_for_refetch() {
        let event = ChangeEvent::new(Collection::Completions, ChangeKind::Any, serde_json::json!({}));
        assert_eq!(
            merge_completion(&[record("a", 1)], &event).unwrap(),
            Merge::Refetch
        );
    }

    #[test]
    fn test_undecodable_insert_is_an_error() {
        let event = ChangeEvent::new(
            Collection::Completions,
            ChangeKind::Insert,
            serde_json::json!({ "id": "x" }),
        );
        assert!(matches!(
            merge_completion(&[], &event),
            Err(ChoresError::Decode(_))
        ));
    }

    #[test]
    fn test_unassign_only_touches_matching_chores() {
        let day = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let chores = vec![
            crate::model::NewChore::one_time("A", day)
                .assigned_to("m1")
                .with_id("a".into()),
            crate::model::NewChore::one_time("B", day)
                .assigned_to("m2")
                .with_id("b".into()),
        ];

        let next = unassign(&chores, "m1");
        assert_eq!(next[0].assignee_id, None);
        assert_eq!(next[1].assignee_id.as_deref(), Some("m2"));
    }
}
