//! In-process gateway.
//!
//! Behaves like the hosted database: assigns ids, cascades deletes and pushes
//! every change (including the caller's own writes) to subscribers. It also
//! lets tests inject failures, hold writes in flight, and simulate writes made
//! by another client.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};

use crate::error::{ChoresError, ChoresResult};
use crate::gateway::{ChangeEvent, ChangeKind, Collection, Gateway, Subscription};
use crate::model::{
    Chore, ChorePatch, CompletionRecord, NewChore, NewCompletion, NewMember, OccurrenceKey,
    TeamMember,
};

/// Everything the gateway stores.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub members: Vec<TeamMember>,
    #[serde(default)]
    pub chores: Vec<Chore>,
    #[serde(default)]
    pub completions: Vec<CompletionRecord>,
}

/// Gateway calls that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatewayOp {
    FetchMembers,
    InsertMember,
    DeleteMember,
    FetchChores,
    InsertChore,
    UpdateChore,
    DeleteChore,
    FetchCompletions,
    InsertCompletion,
    DeleteCompletion,
}

pub struct MemoryGateway {
    data: Mutex<Dataset>,
    subscribers: Mutex<HashMap<Collection, Vec<mpsc::UnboundedSender<ChangeEvent>>>>,
    failures: Mutex<HashSet<GatewayOp>>,
    writes_paused: watch::Sender<bool>,
    confirmations_held: watch::Sender<bool>,
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Default for MemoryGateway {
    fn default() -> Self {
        Self::with_dataset(Dataset::default())
    }
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dataset(dataset: Dataset) -> Self {
        let (writes_paused, _) = watch::channel(false);
        let (confirmations_held, _) = watch::channel(false);

        MemoryGateway {
            data: Mutex::new(dataset),
            subscribers: Mutex::new(HashMap::new()),
            failures: Mutex::new(HashSet::new()),
            writes_paused,
            confirmations_held,
        }
    }

    /// Copy of everything currently stored.
    pub fn dataset(&self) -> Dataset {
        lock(&self.data).clone()
    }

    /// Replace everything stored and tell every subscriber to reload.
    pub fn replace_dataset(&self, dataset: Dataset) {
        *lock(&self.data) = dataset;
        for collection in Collection::ALL {
            self.notify(collection, ChangeKind::Any, &serde_json::Value::Null);
        }
    }

    // TEST CONTROLS:

    /// Make the next call of `op` fail.
    pub fn fail_next(&self, op: GatewayOp) {
        lock(&self.failures).insert(op);
    }

    /// Hold every write until `resume_writes` is called.
    pub fn pause_writes(&self) {
        self.writes_paused.send_replace(true);
    }

    pub fn resume_writes(&self) {
        self.writes_paused.send_replace(false);
    }

    /// Apply and broadcast writes but hold back their responses until
    /// `release_confirmations`, so pushed echoes arrive first.
    pub fn hold_confirmations(&self) {
        self.confirmations_held.send_replace(true);
    }

    pub fn release_confirmations(&self) {
        self.confirmations_held.send_replace(false);
    }

    fn take_failure(&self, op: GatewayOp) -> ChoresResult<()> {
        if lock(&self.failures).remove(&op) {
            return Err(ChoresError::Gateway(format!("{:?} rejected", op)));
        }
        Ok(())
    }

    async fn before_write(&self, op: GatewayOp) -> ChoresResult<()> {
        let mut paused = self.writes_paused.subscribe();
        let _ = paused.wait_for(|p| !*p).await;
        self.take_failure(op)
    }

    async fn before_confirm(&self) {
        let mut held = self.confirmations_held.subscribe();
        let _ = held.wait_for(|h| !*h).await;
    }

    // PUSH NOTIFICATIONS:

    fn notify<T: Serialize>(&self, collection: Collection, kind: ChangeKind, row: &T) {
        let payload = match serde_json::to_value(row) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(%collection, "could not encode change payload: {}", e);
                return;
            }
        };

        let event = ChangeEvent::new(collection, kind, payload);
        let mut subscribers = lock(&self.subscribers);

        if let Some(senders) = subscribers.get_mut(&collection) {
            senders.retain(|tx| tx.send(event.clone()).is_ok());
        }
    }

    // WRITES (shared by the trait impl and the remote_* helpers):

    fn write_member(&self, member: NewMember) -> TeamMember {
        let created = member.with_id(new_id());
        lock(&self.data).members.push(created.clone());
        self.notify(Collection::Members, ChangeKind::Insert, &created);
        created
    }

    fn erase_member(&self, id: &str) {
        let (removed, unassigned) = {
            let mut data = lock(&self.data);
            let before = data.members.len();
            data.members.retain(|m| m.id != id);
            let removed = data.members.len() != before;

            let mut unassigned = Vec::new();
            for chore in data.chores.iter_mut() {
                if chore.assignee_id.as_deref() == Some(id) {
                    chore.assignee_id = None;
                    unassigned.push(chore.clone());
                }
            }
            (removed, unassigned)
        };

        if removed {
            self.notify(
                Collection::Members,
                ChangeKind::Delete,
                &serde_json::json!({ "id": id }),
            );
        }
        for chore in &unassigned {
            self.notify(Collection::Chores, ChangeKind::Update, chore);
        }
    }

    fn write_chore(&self, chore: NewChore) -> Chore {
        let created = chore.with_id(new_id());
        lock(&self.data).chores.push(created.clone());
        self.notify(Collection::Chores, ChangeKind::Insert, &created);
        created
    }

    fn patch_chore(&self, id: &str, patch: &ChorePatch) -> ChoresResult<Chore> {
        let updated = {
            let mut data = lock(&self.data);
            let chore = data
                .chores
                .iter_mut()
                .find(|c| c.id == id)
                .ok_or_else(|| ChoresError::NotFound(format!("chore {}", id)))?;
            *chore = chore.apply_patch(patch);
            chore.clone()
        };

        self.notify(Collection::Chores, ChangeKind::Update, &updated);
        Ok(updated)
    }

    fn erase_chore(&self, id: &str) {
        let (removed, cascaded) = {
            let mut data = lock(&self.data);
            let before = data.chores.len();
            data.chores.retain(|c| c.id != id);
            let removed = data.chores.len() != before;

            let (cascaded, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut data.completions)
                .into_iter()
                .partition(|c| c.chore_id == id);
            data.completions = kept;
            (removed, cascaded)
        };

        for completion in &cascaded {
            self.notify(Collection::Completions, ChangeKind::Delete, completion);
        }
        if removed {
            self.notify(
                Collection::Chores,
                ChangeKind::Delete,
                &serde_json::json!({ "id": id }),
            );
        }
    }

    fn write_completion(&self, completion: NewCompletion) -> ChoresResult<CompletionRecord> {
        let key = completion.key();
        let created = {
            let mut data = lock(&self.data);
            if data.completions.iter().any(|c| c.matches(&key)) {
                return Err(ChoresError::Gateway(format!(
                    "duplicate completion for {}",
                    key
                )));
            }
            let created = completion.with_id(new_id());
            data.completions.push(created.clone());
            created
        };

        self.notify(Collection::Completions, ChangeKind::Insert, &created);
        Ok(created)
    }

    fn erase_completion(&self, key: &OccurrenceKey) {
        let removed: Vec<CompletionRecord> = {
            let mut data = lock(&self.data);
            let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut data.completions)
                .into_iter()
                .partition(|c| c.matches(key));
            data.completions = kept;
            removed
        };

        for completion in &removed {
            self.notify(Collection::Completions, ChangeKind::Delete, completion);
        }
    }

    // ANOTHER CLIENT'S WRITES (no failures, never paused):

    pub fn remote_insert_member(&self, member: NewMember) -> TeamMember {
        self.write_member(member)
    }

    pub fn remote_delete_member(&self, id: &str) {
        self.erase_member(id)
    }

    pub fn remote_insert_chore(&self, chore: NewChore) -> Chore {
        self.write_chore(chore)
    }

    pub fn remote_update_chore(&self, id: &str, patch: &ChorePatch) -> ChoresResult<Chore> {
        self.patch_chore(id, patch)
    }

    pub fn remote_delete_chore(&self, id: &str) {
        self.erase_chore(id)
    }

    pub fn remote_insert_completion(
        &self,
        completion: NewCompletion,
    ) -> ChoresResult<CompletionRecord> {
        self.write_completion(completion)
    }

    pub fn remote_delete_completion(&self, chore_id: &str, occurrence_date: NaiveDate) {
        self.erase_completion(&OccurrenceKey::new(chore_id, occurrence_date))
    }
}

impl Gateway for MemoryGateway {
    async fn fetch_members(&self) -> ChoresResult<Vec<TeamMember>> {
        self.take_failure(GatewayOp::FetchMembers)?;
        Ok(lock(&self.data).members.clone())
    }

    async fn insert_member(&self, member: NewMember) -> ChoresResult<TeamMember> {
        self.before_write(GatewayOp::InsertMember).await?;
        let created = self.write_member(member);
        self.before_confirm().await;
        Ok(created)
    }

    async fn delete_member(&self, id: &str) -> ChoresResult<()> {
        self.before_write(GatewayOp::DeleteMember).await?;
        self.erase_member(id);
        self.before_confirm().await;
        Ok(())
    }

    async fn fetch_chores(&self) -> ChoresResult<Vec<Chore>> {
        self.take_failure(GatewayOp::FetchChores)?;
        Ok(lock(&self.data).chores.clone())
    }

    async fn insert_chore(&self, chore: NewChore) -> ChoresResult<Chore> {
        self.before_write(GatewayOp::InsertChore).await?;
        let created = self.write_chore(chore);
        self.before_confirm().await;
        Ok(created)
    }

    async fn update_chore(&self, id: &str, patch: ChorePatch) -> ChoresResult<Chore> {
        self.before_write(GatewayOp::UpdateChore).await?;
        let updated = self.patch_chore(id, &patch);
        self.before_confirm().await;
        updated
    }

    async fn delete_chore(&self, id: &str) -> ChoresResult<()> {
        self.before_write(GatewayOp::DeleteChore).await?;
        self.erase_chore(id);
        self.before_confirm().await;
        Ok(())
    }

    async fn fetch_completions(&self) -> ChoresResult<Vec<CompletionRecord>> {
        self.take_failure(GatewayOp::FetchCompletions)?;
        let mut completions = lock(&self.data).completions.clone();
        completions.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
        Ok(completions)
    }

    async fn insert_completion(&self, completion: NewCompletion) -> ChoresResult<CompletionRecord> {
        self.before_write(GatewayOp::InsertCompletion).await?;
        let created = self.write_completion(completion);
        self.before_confirm().await;
        created
    }

    async fn delete_completion(&self, chore_id: &str, occurrence_date: NaiveDate) -> ChoresResult<()> {
        self.before_write(GatewayOp::DeleteCompletion).await?;
        self.erase_completion(&OccurrenceKey::new(chore_id, occurrence_date));
        self.before_confirm().await;
        Ok(())
    }

    fn subscribe(&self, collection: Collection) -> ChoresResult<Subscription> {
        let (tx, rx) = mpsc::unbounded_channel();
        lock(&self.subscribers).entry(collection).or_default().push(tx);
        debug!(%collection, "subscribed");
        Ok(Subscription::new(collection, rx))
    }
}
