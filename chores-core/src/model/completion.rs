use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Marks one occurrence of a chore as done.
///
/// `(chore_id, occurrence_date)` is the business key; `id` is a surrogate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionRecord {
    pub id: String,
    pub chore_id: String,
    /// Which occurrence was completed (not when)
    pub occurrence_date: NaiveDate,
    pub completed_at: DateTime<Utc>,
    pub completed_by_id: String,
}

/// A completion as submitted for creation; the gateway assigns the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCompletion {
    pub chore_id: String,
    pub occurrence_date: NaiveDate,
    pub completed_at: DateTime<Utc>,
    pub completed_by_id: String,
}

/// Identifies one occurrence of one chore. Displays as `choreId::YYYY-MM-DD`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OccurrenceKey {
    pub chore_id: String,
    pub occurrence_date: NaiveDate,
}

impl OccurrenceKey {
    pub fn new(chore_id: &str, occurrence_date: NaiveDate) -> Self {
        OccurrenceKey {
            chore_id: chore_id.to_string(),
            occurrence_date,
        }
    }
}

impl fmt::Display for OccurrenceKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}::{}",
            self.chore_id,
            self.occurrence_date.format("%Y-%m-%d")
        )
    }
}

impl NewCompletion {
    /// Completion stamped with the current time.
    pub fn now(chore_id: &str, occurrence_date: NaiveDate, completed_by_id: &str) -> Self {
        NewCompletion {
            chore_id: chore_id.to_string(),
            occurrence_date,
            completed_at: Utc::now(),
            completed_by_id: completed_by_id.to_string(),
        }
    }

    pub fn key(&self) -> OccurrenceKey {
        OccurrenceKey::new(&self.chore_id, self.occurrence_date)
    }

    pub fn with_id(self, id: String) -> CompletionRecord {
        CompletionRecord {
            id,
            chore_id: self.chore_id,
            occurrence_date: self.occurrence_date,
            completed_at: self.completed_at,
            completed_by_id: self.completed_by_id,
        }
    }
}

impl CompletionRecord {
    pub fn key(&self) -> OccurrenceKey {
        OccurrenceKey::new(&self.chore_id, self.occurrence_date)
    }

    pub fn matches(&self, key: &OccurrenceKey) -> bool {
        self.chore_id == key.chore_id && self.occurrence_date == key.occurrence_date
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_occurrence_key_format() {
        let key = OccurrenceKey::new("abc", NaiveDate::from_ymd_opt(2025, 2, 7).unwrap());
        assert_eq!(key.to_string(), "abc::2025-02-07");
    }

    #[test]
    fn test_decodes_camel_case_row() {
        let record: CompletionRecord = serde_json::from_value(serde_json::json!({
            "id": "r1",
            "choreId": "c1",
            "occurrenceDate": "2025-02-07",
            "completedAt": "2025-02-07T09:30:00Z",
            "completedById": "m1",
        }))
        .unwrap();

        assert_eq!(
            record.key(),
            OccurrenceKey::new("c1", NaiveDate::from_ymd_opt(2025, 2, 7).unwrap())
        );
    }
}
