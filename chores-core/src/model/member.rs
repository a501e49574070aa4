use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ChoresError, ChoresResult};

/// A person chores can be assigned to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMember {
    pub id: String,
    pub name: String,
    /// Hex color used for this member's calendar entries
    pub color: String,
}

/// A member as submitted for creation; the gateway assigns the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMember {
    pub name: String,
    pub color: String,
}

impl NewMember {
    pub fn new(name: &str, color: &str) -> Self {
        NewMember {
            name: name.trim().to_string(),
            color: color.to_string(),
        }
    }

    pub fn validate(&self) -> ChoresResult<()> {
        if self.name.trim().is_empty() {
            return Err(ChoresError::Validation(
                "Member name cannot be empty".into(),
            ));
        }
        Ok(())
    }

    pub fn with_id(self, id: String) -> TeamMember {
        TeamMember {
            id,
            name: self.name,
            color: self.color,
        }
    }
}

impl fmt::Display for TeamMember {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
