use std::fmt;

use super::state::Saved;

/// The store operations that write through the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    AddMember,
    RemoveMember,
    AddChore,
    UpdateChore,
    RemoveChore,
    RecordCompletion,
    RemoveCompletion,
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MutationKind::AddMember => "add member",
            MutationKind::RemoveMember => "remove member",
            MutationKind::AddChore => "add chore",
            MutationKind::UpdateChore => "update chore",
            MutationKind::RemoveChore => "remove chore",
            MutationKind::RecordCompletion => "record completion",
            MutationKind::RemoveCompletion => "remove completion",
        };
        write!(f, "{}", label)
    }
}

/// An optimistic change waiting on its gateway call.
///
/// Carries the collections it touched as they were before it was applied, so
/// a failure can put them back.
#[derive(Debug)]
pub(crate) struct PendingMutation {
    pub kind: MutationKind,
    /// Temp id, id or business key of the affected entity
    pub key: String,
    pub snapshot: Saved,
}

impl PendingMutation {
    pub fn new(kind: MutationKind, key: &str, snapshot: Saved) -> Self {
        PendingMutation {
            kind,
            key: key.to_string(),
            snapshot,
        }
    }
}

/// How a store mutation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    /// The gateway accepted the write
    Committed,
    /// Nothing to do (e.g. the occurrence was already completed)
    Unchanged,
    /// The gateway rejected the write and the optimistic change was undone
    RolledBack,
    /// Input failed validation; nothing was sent
    Rejected,
}

impl MutationOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, MutationOutcome::Committed)
    }
}
