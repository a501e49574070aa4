//! Optimistic client cache over a `Gateway`.
//!
//! Every mutation is applied locally first, then sent to the gateway, then
//! either confirmed (temp ids swapped for real ones) or rolled back to the
//! collections as they were just before it. Changes pushed by the gateway are
//! merged in by background tasks, one per collection.

mod pending;
pub mod reconcile;
mod state;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::NaiveDate;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::ChoresError;
use crate::expand::{ChoreCalendarEvent, expand_chores};
use crate::gateway::{ChangeEvent, Collection, Gateway, Subscription};
use crate::model::{
    Chore, ChorePatch, CompletionRecord, NewChore, NewCompletion, NewMember, OccurrenceKey,
    TeamMember,
};

pub use crate::error::StoreError;
pub use pending::{MutationKind, MutationOutcome};
pub use state::StoreSnapshot;

use pending::PendingMutation;
use reconcile::Merge;
use state::StoreState;

const TEMP_ID_PREFIX: &str = "tmp-";

/// Whether `id` was assigned locally and not yet confirmed by the gateway.
pub fn is_temp_id(id: &str) -> bool {
    id.starts_with(TEMP_ID_PREFIX)
}

fn temp_id() -> String {
    format!("{}{}", TEMP_ID_PREFIX, uuid::Uuid::new_v4())
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

struct Inner<G> {
    gateway: G,
    state: Mutex<StoreState>,
    changes: watch::Sender<u64>,
    listeners: Mutex<Vec<JoinHandle<()>>>,
}

impl<G> Drop for Inner<G> {
    fn drop(&mut self) {
        let listeners = self
            .listeners
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        for handle in listeners.drain(..) {
            handle.abort();
        }
    }
}

/// Shared handle to the store. Clones refer to the same state.
pub struct SyncStore<G> {
    inner: Arc<Inner<G>>,
}

impl<G> Clone for SyncStore<G> {
    fn clone(&self) -> Self {
        SyncStore {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<G: Gateway> SyncStore<G> {
    pub fn new(gateway: G) -> Self {
        let (changes, _) = watch::channel(0);

        SyncStore {
            inner: Arc::new(Inner {
                gateway,
                state: Mutex::new(StoreState::default()),
                changes,
                listeners: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn gateway(&self) -> &G {
        &self.inner.gateway
    }

    // READS:

    pub fn snapshot(&self) -> StoreSnapshot {
        self.state().snapshot()
    }

    pub fn members(&self) -> Arc<Vec<TeamMember>> {
        Arc::clone(&self.state().members)
    }

    pub fn chores(&self) -> Arc<Vec<Chore>> {
        Arc::clone(&self.state().chores)
    }

    pub fn completions(&self) -> Arc<Vec<CompletionRecord>> {
        Arc::clone(&self.state().completions)
    }

    pub fn is_loading(&self) -> bool {
        self.state().is_loading
    }

    pub fn error(&self) -> Option<String> {
        self.state().error.clone()
    }

    /// Ticks with the new version after every state transition.
    pub fn changes(&self) -> watch::Receiver<u64> {
        self.inner.changes.subscribe()
    }

    pub fn dismiss_error(&self) {
        let state = self.state();
        if state.error.is_some() {
            self.publish_with(state, |state| state.error = None);
        }
    }

    /// Calendar events for `[start, end]` over the current collections.
    pub fn events_in_range(&self, start: NaiveDate, end: NaiveDate) -> Vec<ChoreCalendarEvent> {
        let snapshot = self.snapshot();
        expand_chores(
            &snapshot.chores,
            &snapshot.members,
            &snapshot.completions,
            start,
            end,
        )
    }

    // STATE TRANSITIONS:

    fn state(&self) -> MutexGuard<'_, StoreState> {
        lock(&self.inner.state)
    }

    fn publish_with(
        &self,
        mut state: MutexGuard<'_, StoreState>,
        apply: impl FnOnce(&mut StoreState),
    ) {
        apply(&mut *state);
        let version = state.bump();
        drop(state);
        self.inner.changes.send_replace(version);
    }

    fn update(&self, apply: impl FnOnce(&mut StoreState)) {
        self.publish_with(self.state(), apply)
    }

    /// Snapshot the `touched` collections, then apply the optimistic change.
    fn begin(
        &self,
        kind: MutationKind,
        key: &str,
        touched: &[Collection],
        apply: impl FnOnce(&mut StoreState),
    ) -> PendingMutation {
        let state = self.state();
        let snapshot = state.save(touched);
        self.publish_with(state, apply);
        debug!(%kind, key, "applied optimistically");
        PendingMutation::new(kind, key, snapshot)
    }

    fn confirm(
        &self,
        pending: PendingMutation,
        apply: impl FnOnce(&mut StoreState),
    ) -> MutationOutcome {
        self.update(apply);
        debug!(kind = %pending.kind, key = %pending.key, "confirmed");
        MutationOutcome::Committed
    }

    fn rollback(&self, pending: PendingMutation, source: ChoresError) -> MutationOutcome {
        let error = StoreError::Mutation {
            kind: pending.kind,
            source,
        };
        warn!(key = %pending.key, "rolling back: {}", error);

        let snapshot = pending.snapshot;
        self.update(|state| {
            state.restore(snapshot);
            state.error = Some(error.to_string());
        });
        MutationOutcome::RolledBack
    }

    fn reject(&self, kind: MutationKind, source: ChoresError) -> MutationOutcome {
        let error = StoreError::Mutation { kind, source };
        debug!("rejected: {}", error);
        self.update(|state| state.error = Some(error.to_string()));
        MutationOutcome::Rejected
    }

    // INITIALIZATION:

    /// Load all three collections, then start listening for pushed changes.
    ///
    /// Returns whether the load succeeded; on failure the store is left empty
    /// with its error set.
    pub async fn initialize(&self) -> bool {
        let gateway = &self.inner.gateway;
        let loaded = tokio::try_join!(
            gateway.fetch_members(),
            gateway.fetch_chores(),
            gateway.fetch_completions(),
        );

        match loaded {
            Ok((members, chores, completions)) => {
                info!(
                    members = members.len(),
                    chores = chores.len(),
                    completions = completions.len(),
                    "loaded"
                );
                self.update(|state| {
                    state.members = Arc::new(members);
                    state.chores = Arc::new(chores);
                    state.completions = Arc::new(completions);
                    state.is_loading = false;
                    state.error = None;
                });
                self.listen();
                true
            }
            Err(source) => {
                let error = StoreError::Fetch(source);
                warn!("{}", error);
                self.update(|state| {
                    state.members = Arc::default();
                    state.chores = Arc::default();
                    state.completions = Arc::default();
                    state.is_loading = false;
                    state.error = Some(error.to_string());
                });
                false
            }
        }
    }

    fn listen(&self) {
        let mut listeners = lock(&self.inner.listeners);
        if !listeners.is_empty() {
            return;
        }

        for collection in Collection::ALL {
            match self.inner.gateway.subscribe(collection) {
                Ok(subscription) => listeners.push(self.spawn_listener(subscription)),
                Err(e) => warn!(%collection, "could not subscribe: {}", e),
            }
        }
    }

    fn spawn_listener(&self, mut subscription: Subscription) -> JoinHandle<()> {
        let store = Arc::downgrade(&self.inner);

        tokio::spawn(async move {
            while let Some(event) = subscription.next().await {
                let Some(inner) = store.upgrade() else {
                    break;
                };
                SyncStore { inner }.apply_remote_change(event).await;
            }
            debug!(collection = %subscription.collection(), "subscription closed");
        })
    }

    // REMOTE MERGE:

    async fn apply_remote_change(&self, event: ChangeEvent) {
        debug!(collection = %event.collection, kind = ?event.kind, "remote change");

        match event.collection {
            Collection::Members | Collection::Chores => self.refetch(event.collection).await,
            Collection::Completions => {
                if self.merge_completion(&event) {
                    self.refetch(Collection::Completions).await;
                }
            }
        }
    }

    /// Fold a completion change into the state. Returns whether a refetch is needed.
    fn merge_completion(&self, event: &ChangeEvent) -> bool {
        let state = self.state();
        let merged = reconcile::merge_completion(&state.completions, event);
        match merged {
            Ok(Merge::Replace(next)) => {
                self.publish_with(state, |state| state.completions = Arc::new(next));
                false
            }
            Ok(Merge::Unchanged) => false,
            Ok(Merge::Refetch) => true,
            Err(e) => {
                warn!("ignoring pushed completion: {}", e);
                false
            }
        }
    }

    async fn refetch(&self, collection: Collection) {
        let gateway = &self.inner.gateway;
        let result = match collection {
            Collection::Members => gateway
                .fetch_members()
                .await
                .map(|rows| self.update(|state| state.members = Arc::new(rows))),
            Collection::Chores => gateway
                .fetch_chores()
                .await
                .map(|rows| self.update(|state| state.chores = Arc::new(rows))),
            Collection::Completions => gateway
                .fetch_completions()
                .await
                .map(|rows| self.update(|state| state.completions = Arc::new(rows))),
        };

        if let Err(e) = result {
            warn!(%collection, "refetch failed, keeping current data: {}", e);
        }
    }

    // MEMBERS:

    pub async fn add_member(&self, member: NewMember) -> MutationOutcome {
        let kind = MutationKind::AddMember;
        if let Err(e) = member.validate() {
            return self.reject(kind, e);
        }

        let temp = temp_id();
        let optimistic = member.clone().with_id(temp.clone());
        let pending = self.begin(kind, &temp, &[Collection::Members], |state| {
            state.members = Arc::new(reconcile::appended(&state.members, optimistic));
        });

        match self.inner.gateway.insert_member(member).await {
            Ok(created) => self.confirm(pending, |state| {
                state.members = Arc::new(reconcile::swap_confirmed(&state.members, &temp, created));
            }),
            Err(e) => self.rollback(pending, e),
        }
    }

    /// Remove a member and unassign their chores.
    pub async fn remove_member(&self, id: &str) -> MutationOutcome {
        let pending = self.begin(
            MutationKind::RemoveMember,
            id,
            &[Collection::Members, Collection::Chores],
            |state| {
                state.members = Arc::new(reconcile::remove_by_id(&state.members, id));
                state.chores = Arc::new(reconcile::unassign(&state.chores, id));
            },
        );

        match self.inner.gateway.delete_member(id).await {
            Ok(()) => self.confirm(pending, |_| {}),
            Err(e) => self.rollback(pending, e),
        }
    }

    // CHORES:

    pub async fn add_chore(&self, chore: NewChore) -> MutationOutcome {
        let kind = MutationKind::AddChore;
        if let Err(e) = chore.validate() {
            return self.reject(kind, e);
        }

        let temp = temp_id();
        let optimistic = chore.clone().with_id(temp.clone());
        let pending = self.begin(kind, &temp, &[Collection::Chores], |state| {
            state.chores = Arc::new(reconcile::appended(&state.chores, optimistic));
        });

        match self.inner.gateway.insert_chore(chore).await {
            Ok(created) => self.confirm(pending, |state| {
                state.chores = Arc::new(reconcile::swap_confirmed(&state.chores, &temp, created));
            }),
            Err(e) => self.rollback(pending, e),
        }
    }

    pub async fn update_chore(&self, id: &str, patch: ChorePatch) -> MutationOutcome {
        let kind = MutationKind::UpdateChore;
        if patch.is_empty() {
            return MutationOutcome::Unchanged;
        }
        if let Err(e) = patch.validate() {
            return self.reject(kind, e);
        }

        let pending = {
            let state = self.state();
            let current = state.chores.iter().find(|c| c.id == id).cloned();
            let Some(current) = current else {
                drop(state);
                return self.reject(kind, ChoresError::NotFound(format!("chore {}", id)));
            };

            let snapshot = state.save(&[Collection::Chores]);
            let patched = current.apply_patch(&patch);
            self.publish_with(state, |state| {
                state.chores = Arc::new(reconcile::replace_by_id(&state.chores, patched));
            });
            debug!(%kind, key = id, "applied optimistically");
            PendingMutation::new(kind, id, snapshot)
        };

        match self.inner.gateway.update_chore(id, patch).await {
            Ok(canonical) => self.confirm(pending, |state| {
                state.chores = Arc::new(reconcile::replace_by_id(&state.chores, canonical));
            }),
            Err(e) => self.rollback(pending, e),
        }
    }

    /// Remove a chore together with its completions.
    pub async fn remove_chore(&self, id: &str) -> MutationOutcome {
        let pending = self.begin(
            MutationKind::RemoveChore,
            id,
            &[Collection::Chores, Collection::Completions],
            |state| {
                state.chores = Arc::new(reconcile::remove_by_id(&state.chores, id));
                state.completions = Arc::new(
                    state
                        .completions
                        .iter()
                        .filter(|c| c.chore_id != id)
                        .cloned()
                        .collect(),
                );
            },
        );

        match self.inner.gateway.delete_chore(id).await {
            Ok(()) => self.confirm(pending, |_| {}),
            Err(e) => self.rollback(pending, e),
        }
    }

    // COMPLETIONS:

    /// Mark one occurrence done. Already-completed occurrences are left alone.
    pub async fn record_completion(&self, completion: NewCompletion) -> MutationOutcome {
        let kind = MutationKind::RecordCompletion;
        if completion.chore_id.is_empty() || completion.completed_by_id.is_empty() {
            return self.reject(
                kind,
                ChoresError::Validation("A completion needs a chore and a member".into()),
            );
        }

        let key = completion.key();
        let temp = temp_id();
        let pending = {
            let state = self.state();
            if reconcile::find_by_key(&state.completions, &key).is_some() {
                debug!(%key, "already completed");
                return MutationOutcome::Unchanged;
            }

            let snapshot = state.save(&[Collection::Completions]);
            let optimistic = completion.clone().with_id(temp.clone());
            self.publish_with(state, |state| {
                state.completions = Arc::new(reconcile::appended(&state.completions, optimistic));
            });
            debug!(%kind, %key, "applied optimistically");
            PendingMutation::new(kind, &key.to_string(), snapshot)
        };

        match self.inner.gateway.insert_completion(completion).await {
            Ok(created) => self.confirm(pending, |state| {
                state.completions =
                    Arc::new(reconcile::swap_confirmed(&state.completions, &temp, created));
            }),
            Err(e) => self.rollback(pending, e),
        }
    }

    /// Un-mark one occurrence. Does nothing if it is not completed.
    pub async fn remove_completion(
        &self,
        chore_id: &str,
        occurrence_date: NaiveDate,
    ) -> MutationOutcome {
        let kind = MutationKind::RemoveCompletion;
        let key = OccurrenceKey::new(chore_id, occurrence_date);

        let pending = {
            let state = self.state();
            let record_id = reconcile::find_by_key(&state.completions, &key).map(|c| c.id.clone());
            let Some(record_id) = record_id else {
                debug!(%key, "not completed");
                return MutationOutcome::Unchanged;
            };

            let snapshot = state.save(&[Collection::Completions]);
            self.publish_with(state, |state| {
                state.completions = Arc::new(reconcile::remove_by_id(&state.completions, &record_id));
            });
            debug!(%kind, %key, "applied optimistically");
            PendingMutation::new(kind, &key.to_string(), snapshot)
        };

        match self
            .inner
            .gateway
            .delete_completion(chore_id, occurrence_date)
            .await
        {
            Ok(()) => self.confirm(pending, |_| {}),
            Err(e) => self.rollback(pending, e),
        }
    }
}
