//! Chore tracking data model.
//!
//! Members, chores and completions are the three persisted collections.
//! Calendar events are derived from them (see `crate::expand`) and never stored.

mod chore;
mod completion;
mod member;
pub mod rule;

pub use chore::{Chore, ChorePatch, NewChore};
pub use completion::{CompletionRecord, NewCompletion, OccurrenceKey};
pub use member::{NewMember, TeamMember};
pub use rule::{Frequency, FrequencyKind, RecurrenceRule};
