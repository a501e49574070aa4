//! JSON-file backed gateway.
//!
//! Keeps the dataset in a `MemoryGateway` and rewrites the whole file after
//! every successful write. A write that cannot be saved is undone in memory.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::error::{ChoresError, ChoresResult};
use crate::gateway::{Collection, Dataset, Gateway, MemoryGateway, Subscription};
use crate::model::{
    Chore, ChorePatch, CompletionRecord, NewChore, NewCompletion, NewMember, TeamMember,
};

pub struct FileGateway {
    path: PathBuf,
    inner: MemoryGateway,
}

impl FileGateway {
    /// Open the data file, starting empty if it does not exist yet.
    pub fn open(path: &Path) -> ChoresResult<Self> {
        let dataset = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            serde_json::from_str(&content).map_err(|e| {
                ChoresError::Serialization(format!("{}: {}", path.display(), e))
            })?
        } else {
            Dataset::default()
        };

        Ok(FileGateway {
            path: path.to_path_buf(),
            inner: MemoryGateway::with_dataset(dataset),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    fn persist(&self) -> ChoresResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(&self.inner.dataset())
            .map_err(|e| ChoresError::Serialization(e.to_string()))?;

        let mut temp = self.path.clone().into_os_string();
        temp.push(".tmp");
        let temp = PathBuf::from(temp);

        std::fs::write(&temp, content)?;
        std::fs::rename(&temp, &self.path)?;

        debug!(path = %self.path.display(), "saved dataset");
        Ok(())
    }

    fn persisted<T>(&self, before: Dataset, result: ChoresResult<T>) -> ChoresResult<T> {
        let value = result?;
        if let Err(e) = self.persist() {
            warn!(path = %self.path.display(), "could not save, undoing write: {}", e);
            self.inner.replace_dataset(before);
            return Err(e);
        }
        Ok(value)
    }
}

impl Gateway for FileGateway {
    async fn fetch_members(&self) -> ChoresResult<Vec<TeamMember>> {
        self.inner.fetch_members().await
    }

    async fn insert_member(&self, member: NewMember) -> ChoresResult<TeamMember> {
        let before = self.inner.dataset();
        let result = self.inner.insert_member(member).await;
        self.persisted(before, result)
    }

    async fn delete_member(&self, id: &str) -> ChoresResult<()> {
        let before = self.inner.dataset();
        let result = self.inner.delete_member(id).await;
        self.persisted(before, result)
    }

    async fn fetch_chores(&self) -> ChoresResult<Vec<Chore>> {
        self.inner.fetch_chores().await
    }

    async fn insert_chore(&self, chore: NewChore) -> ChoresResult<Chore> {
        let before = self.inner.dataset();
        let result = self.inner.insert_chore(chore).await;
        self.persisted(before, result)
    }

    async fn update_chore(&self, id: &str, patch: ChorePatch) -> ChoresResult<Chore> {
        let before = self.inner.dataset();
        let result = self.inner.update_chore(id, patch).await;
        self.persisted(before, result)
    }

    async fn delete_chore(&self, id: &str) -> ChoresResult<()> {
        let before = self.inner.dataset();
        let result = self.inner.delete_chore(id).await;
        self.persisted(before, result)
    }

    async fn fetch_completions(&self) -> ChoresResult<Vec<CompletionRecord>> {
        self.inner.fetch_completions().await
    }

    async fn insert_completion(&self, completion: NewCompletion) -> ChoresResult<CompletionRecord> {
        let before = self.inner.dataset();
        let result = self.inner.insert_completion(completion).await;
        self.persisted(before, result)
    }

    async fn delete_completion(&self, chore_id: &str, occurrence_date: NaiveDate) -> ChoresResult<()> {
        let before = self.inner.dataset();
        let result = self.inner.delete_completion(chore_id, occurrence_date).await;
        self.persisted(before, result)
    }

    fn subscribe(&self, collection: Collection) -> ChoresResult<Subscription> {
        self.inner.subscribe(collection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::ChangeKind;

    #[tokio::test]
    async fn test_writes_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data/chores.json");

        let gateway = FileGateway::open(&path).unwrap();
        assert!(!gateway.exists());

        let member = gateway
            .insert_member(NewMember::new("Ada", "#3B82F6"))
            .await
            .unwrap();
        let chore = gateway
            .insert_chore(
                NewChore::one_time("Dishes", NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
                    .assigned_to(&member.id),
            )
            .await
            .unwrap();

        let reopened = FileGateway::open(&path).unwrap();
        assert_eq!(reopened.fetch_members().await.unwrap(), vec![member]);
        assert_eq!(reopened.fetch_chores().await.unwrap(), vec![chore]);
        assert!(!dir.path().join("data/chores.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_failed_save_undoes_the_write() {
        let dir = tempfile::tempdir().unwrap();
        // a regular file where the data directory should be
        std::fs::write(dir.path().join("blocker"), "").unwrap();
        let gateway = FileGateway::open(&dir.path().join("blocker/chores.json")).unwrap();
        let mut changes = gateway.subscribe(Collection::Members).unwrap();

        let result = gateway.insert_member(NewMember::new("Ada", "#3B82F6")).await;

        assert!(result.is_err());
        assert!(gateway.fetch_members().await.unwrap().is_empty());
        assert_eq!(changes.next().await.unwrap().kind, ChangeKind::Insert);
        assert_eq!(changes.next().await.unwrap().kind, ChangeKind::Any);
    }

    #[test]
    fn test_corrupt_file_is_a_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chores.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            FileGateway::open(&path),
            Err(ChoresError::Serialization(_))
        ));
    }
}
