use std::sync::Arc;

use crate::gateway::Collection;
use crate::model::{Chore, CompletionRecord, TeamMember};

/// Read-only view of the store at one version.
///
/// Collections are shared with the store; a later mutation swaps in new
/// vectors and never edits these.
#[derive(Debug, Clone)]
pub struct StoreSnapshot {
    pub members: Arc<Vec<TeamMember>>,
    pub chores: Arc<Vec<Chore>>,
    pub completions: Arc<Vec<CompletionRecord>>,
    pub is_loading: bool,
    pub error: Option<String>,
    pub version: u64,
}

impl StoreSnapshot {
    pub fn member(&self, id: &str) -> Option<&TeamMember> {
        self.members.iter().find(|m| m.id == id)
    }

    pub fn chore(&self, id: &str) -> Option<&Chore> {
        self.chores.iter().find(|c| c.id == id)
    }
}

/// Collections captured before an optimistic change.
#[derive(Debug, Default)]
pub(crate) struct Saved {
    members: Option<Arc<Vec<TeamMember>>>,
    chores: Option<Arc<Vec<Chore>>>,
    completions: Option<Arc<Vec<CompletionRecord>>>,
}

#[derive(Debug)]
pub(crate) struct StoreState {
    pub members: Arc<Vec<TeamMember>>,
    pub chores: Arc<Vec<Chore>>,
    pub completions: Arc<Vec<CompletionRecord>>,
    pub is_loading: bool,
    pub error: Option<String>,
    pub version: u64,
}

impl Default for StoreState {
    fn default() -> Self {
        StoreState {
            members: Arc::default(),
            chores: Arc::default(),
            completions: Arc::default(),
            is_loading: true,
            error: None,
            version: 0,
        }
    }
}

impl StoreState {
    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            members: Arc::clone(&self.members),
            chores: Arc::clone(&self.chores),
            completions: Arc::clone(&self.completions),
            is_loading: self.is_loading,
            error: self.error.clone(),
            version: self.version,
        }
    }

    pub fn save(&self, collections: &[Collection]) -> Saved {
        let mut saved = Saved::default();
        for collection in collections {
            match collection {
                Collection::Members => saved.members = Some(Arc::clone(&self.members)),
                Collection::Chores => saved.chores = Some(Arc::clone(&self.chores)),
                Collection::Completions => {
                    saved.completions = Some(Arc::clone(&self.completions))
                }
            }
        }
        saved
    }

    /// Put back every collection in `saved`, leaving the others as they are.
    pub fn restore(&mut self, saved: Saved) {
        if let Some(members) = saved.members {
            self.members = members;
        }
        if let Some(chores) = saved.chores {
            self.chores = chores;
        }
        if let Some(completions) = saved.completions {
            self.completions = completions;
        }
    }

    pub fn bump(&mut self) -> u64 {
        self.version += 1;
        self.version
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NewMember;

    #[test]
    fn test_restore_only_touches_saved_collections() {
        let mut state = StoreState::default();
        let saved = state.save(&[Collection::Members]);

        state.members = Arc::new(vec![NewMember::new("Ada", "#3B82F6").with_id("m1".into())]);
        state.chores = Arc::new(Vec::new());
        let chores_after = Arc::clone(&state.chores);

        state.restore(saved);

        assert!(state.members.is_empty());
        assert!(Arc::ptr_eq(&state.chores, &chores_after));
    }

    #[test]
    fn test_new_state_is_loading() {
        let state = StoreState::default();
        assert!(state.snapshot().is_loading);
        assert_eq!(state.snapshot().version, 0);
    }
}
