//! Completion history log.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::model::{Chore, CompletionRecord, TeamMember};

const DELETED_CHORE: &str = "(deleted chore)";
const UNKNOWN_MEMBER: &str = "Unknown";

/// Optional filters for the history log; `None` means "all".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryFilter {
    pub member_id: Option<String>,
    pub chore_id: Option<String>,
}

/// A completion with its chore title and member name resolved for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub completion_id: String,
    pub chore_id: String,
    pub chore_title: String,
    pub occurrence_date: NaiveDate,
    pub completed_at: DateTime<Utc>,
    pub completed_by: String,
    pub completed_by_color: Option<String>,
}

impl HistoryFilter {
    pub fn is_empty(&self) -> bool {
        self.member_id.is_none() && self.chore_id.is_none()
    }

    /// Matching completions, most recently completed first.
    pub fn apply(&self, completions: &[CompletionRecord]) -> Vec<CompletionRecord> {
        let mut filtered: Vec<CompletionRecord> = completions
            .iter()
            .filter(|c| {
                self.member_id
                    .as_ref()
                    .is_none_or(|id| &c.completed_by_id == id)
            })
            .filter(|c| self.chore_id.as_ref().is_none_or(|id| &c.chore_id == id))
            .cloned()
            .collect();

        filtered.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
        filtered
    }
}

pub fn history_entries(
    completions: &[CompletionRecord],
    chores: &[Chore],
    members: &[TeamMember],
    filter: &HistoryFilter,
) -> Vec<HistoryEntry> {
    let chore_by_id: HashMap<&str, &Chore> = chores.iter().map(|c| (c.id.as_str(), c)).collect();
    let member_by_id: HashMap<&str, &TeamMember> =
        members.iter().map(|m| (m.id.as_str(), m)).collect();

    filter
        .apply(completions)
        .into_iter()
        .map(|c| {
            let member = member_by_id.get(c.completed_by_id.as_str());
            HistoryEntry {
                chore_title: chore_by_id
                    .get(c.chore_id.as_str())
                    .map(|chore| chore.title.clone())
                    .unwrap_or_else(|| DELETED_CHORE.to_string()),
                completed_by: member
                    .map(|m| m.name.clone())
                    .unwrap_or_else(|| UNKNOWN_MEMBER.to_string()),
                completed_by_color: member.map(|m| m.color.clone()),
                completion_id: c.id,
                chore_id: c.chore_id,
                occurrence_date: c.occurrence_date,
                completed_at: c.completed_at,
            }
        })
        .collect()
}
