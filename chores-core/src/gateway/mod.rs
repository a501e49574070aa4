//! Remote data gateway.
//!
//! The store talks to persistent storage exclusively through the `Gateway`
//! trait: CRUD per collection plus change subscriptions. Field-name translation
//! between storage rows and the model is the gateway's job; change payloads
//! are delivered in the model's camelCase shape.

mod file;
mod memory;

use std::fmt;
use std::future::Future;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::ChoresResult;
use crate::model::{
    Chore, ChorePatch, CompletionRecord, NewChore, NewCompletion, NewMember, TeamMember,
};

pub use file::FileGateway;
pub use memory::{Dataset, GatewayOp, MemoryGateway};

/// The three persisted collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Members,
    Chores,
    Completions,
}

impl Collection {
    pub const ALL: [Collection; 3] = [
        Collection::Members,
        Collection::Chores,
        Collection::Completions,
    ];
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Collection::Members => write!(f, "members"),
            Collection::Chores => write!(f, "chores"),
            Collection::Completions => write!(f, "completions"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
    /// Unspecified change; treat as "something changed"
    Any,
}

/// A change pushed by the gateway.
///
/// `payload` is the full row for inserts and updates, and the prior row
/// (at least its `id`) for deletes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub collection: Collection,
    pub kind: ChangeKind,
    pub payload: serde_json::Value,
}

impl ChangeEvent {
    pub fn new(collection: Collection, kind: ChangeKind, payload: serde_json::Value) -> Self {
        ChangeEvent {
            collection,
            kind,
            payload,
        }
    }

    /// The `id` field of the payload, if present.
    pub fn row_id(&self) -> Option<&str> {
        self.payload.get("id").and_then(|v| v.as_str())
    }
}

/// A live stream of change events for one collection.
///
/// Dropping the subscription releases it.
pub struct Subscription {
    collection: Collection,
    receiver: mpsc::UnboundedReceiver<ChangeEvent>,
}

impl Subscription {
    pub fn new(collection: Collection, receiver: mpsc::UnboundedReceiver<ChangeEvent>) -> Self {
        Subscription {
            collection,
            receiver,
        }
    }

    pub fn collection(&self) -> Collection {
        self.collection
    }

    /// Next change, or `None` once the gateway closes the stream.
    pub async fn next(&mut self) -> Option<ChangeEvent> {
        self.receiver.recv().await
    }
}

/// Persistent storage for members, chores and completions.
///
/// Fetches return members and chores in creation order and completions
/// most recently completed first. Inserts return the stored row with its
/// assigned id.
pub trait Gateway: Send + Sync + 'static {
    fn fetch_members(&self) -> impl Future<Output = ChoresResult<Vec<TeamMember>>> + Send;

    fn insert_member(
        &self,
        member: NewMember,
    ) -> impl Future<Output = ChoresResult<TeamMember>> + Send;

    fn delete_member(&self, id: &str) -> impl Future<Output = ChoresResult<()>> + Send;

    fn fetch_chores(&self) -> impl Future<Output = ChoresResult<Vec<Chore>>> + Send;

    fn insert_chore(&self, chore: NewChore) -> impl Future<Output = ChoresResult<Chore>> + Send;

    /// Apply a partial update and return the canonical merged row.
    fn update_chore(
        &self,
        id: &str,
        patch: ChorePatch,
    ) -> impl Future<Output = ChoresResult<Chore>> + Send;

    fn delete_chore(&self, id: &str) -> impl Future<Output = ChoresResult<()>> + Send;

    fn fetch_completions(
        &self,
    ) -> impl Future<Output = ChoresResult<Vec<CompletionRecord>>> + Send;

    fn insert_completion(
        &self,
        completion: NewCompletion,
    ) -> impl Future<Output = ChoresResult<CompletionRecord>> + Send;

    /// Delete by business key `(chore_id, occurrence_date)`.
    fn delete_completion(
        &self,
        chore_id: &str,
        occurrence_date: NaiveDate,
    ) -> impl Future<Output = ChoresResult<()>> + Send;

    fn subscribe(&self, collection: Collection) -> ChoresResult<Subscription>;
}
