use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{ChoresError, ChoresResult};
use crate::model::rule::RecurrenceRule;

/// A recurring (or one-time) shared task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chore {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// May point at a member that no longer exists; rendered as unassigned
    pub assignee_id: Option<String>,
    /// First possible occurrence
    pub start_date: NaiveDate,
    /// None means a one-time chore
    pub recurrence: Option<RecurrenceRule>,
}

/// A chore as submitted for creation; the gateway assigns the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewChore {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub assignee_id: Option<String>,
    pub start_date: NaiveDate,
    pub recurrence: Option<RecurrenceRule>,
}

/// Partial update for a chore. Outer `None` leaves a field untouched;
/// `Some(None)` on nullable fields clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChorePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<Option<RecurrenceRule>>,
}

fn validate_title(title: &str) -> ChoresResult<()> {
    if title.trim().is_empty() {
        return Err(ChoresError::Validation("Chore title cannot be empty".into()));
    }
    Ok(())
}

impl NewChore {
    pub fn one_time(title: &str, start_date: NaiveDate) -> Self {
        NewChore {
            title: title.trim().to_string(),
            description: None,
            assignee_id: None,
            start_date,
            recurrence: None,
        }
    }

    pub fn recurring(title: &str, start_date: NaiveDate, rule: RecurrenceRule) -> Self {
        NewChore {
            recurrence: Some(rule),
            ..NewChore::one_time(title, start_date)
        }
    }

    pub fn assigned_to(mut self, member_id: &str) -> Self {
        self.assignee_id = Some(member_id.to_string());
        self
    }

    pub fn validate(&self) -> ChoresResult<()> {
        validate_title(&self.title)?;
        if let Some(rule) = &self.recurrence {
            rule.validate()?;
        }
        Ok(())
    }

    pub fn with_id(self, id: String) -> Chore {
        Chore {
            id,
            title: self.title,
            description: self.description,
            assignee_id: self.assignee_id,
            start_date: self.start_date,
            recurrence: self.recurrence,
        }
    }
}

impl ChorePatch {
    pub fn assign(member_id: Option<&str>) -> Self {
        ChorePatch {
            assignee_id: Some(member_id.map(String::from)),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == ChorePatch::default()
    }

    pub fn validate(&self) -> ChoresResult<()> {
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        if let Some(Some(rule)) = &self.recurrence {
            rule.validate()?;
        }
        Ok(())
    }
}

impl Chore {
    /// Merge a partial update into a copy of this chore.
    pub fn apply_patch(&self, patch: &ChorePatch) -> Chore {
        let mut chore = self.clone();

        if let Some(title) = &patch.title {
            chore.title = title.trim().to_string();
        }
        if let Some(description) = &patch.description {
            chore.description = description.clone();
        }
        if let Some(assignee_id) = &patch.assignee_id {
            chore.assignee_id = assignee_id.clone();
        }
        if let Some(start_date) = patch.start_date {
            chore.start_date = start_date;
        }
        if let Some(recurrence) = &patch.recurrence {
            chore.recurrence = recurrence.clone();
        }

        chore
    }

    pub fn is_recurring(&self) -> bool {
        self.recurrence.is_some()
    }
}

impl fmt::Display for Chore {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.title)
    }
}
