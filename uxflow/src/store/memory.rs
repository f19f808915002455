use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use uuid::Uuid;

use super::{validate_artifact_name, ResultStore};
use crate::errors::StoreError;

/// In-process result store.
#[derive(Debug, Default)]
pub struct MemoryResultStore {
    entries: DashMap<(Uuid, String), String>,
}

impl MemoryResultStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of stored artifacts across all runs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl ResultStore for MemoryResultStore {
    async fn put(&self, run_id: Uuid, artifact: &str, content: &str) -> Result<(), StoreError> {
        validate_artifact_name(artifact)?;
        match self.entries.entry((run_id, artifact.to_string())) {
            Entry::Occupied(_) => Err(StoreError::AlreadyExists {
                run_id,
                artifact: artifact.to_string(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(content.to_string());
                Ok(())
            }
        }
    }

    async fn get(&self, run_id: Uuid, artifact: &str) -> Result<Option<String>, StoreError> {
        validate_artifact_name(artifact)?;
        Ok(self
            .entries
            .get(&(run_id, artifact.to_string()))
            .map(|entry| entry.value().clone()))
    }

    async fn list(&self, run_id: Uuid) -> Result<Vec<String>, StoreError> {
        let mut names: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| entry.key().0 == run_id)
            .map(|entry| entry.key().1.clone())
            .collect();
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_put_get() {
        let store = MemoryResultStore::new();
        let run_id = Uuid::new_v4();

        store.put(run_id, "wireframe.html", "<html></html>").await.unwrap();

        assert_eq!(
            store.get(run_id, "wireframe.html").await.unwrap().as_deref(),
            Some("<html></html>")
        );
        assert_eq!(store.get(run_id, "feedback.json").await.unwrap(), None);
        assert_eq!(store.get(Uuid::new_v4(), "wireframe.html").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_write_once() {
        let store = MemoryResultStore::new();
        let run_id = Uuid::new_v4();

        store.put(run_id, "a.json", "1").await.unwrap();
        let err = store.put(run_id, "a.json", "2").await.unwrap_err();

        assert!(matches!(err, StoreError::AlreadyExists { .. }));
        assert_eq!(store.get(run_id, "a.json").await.unwrap().as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn test_list_is_per_run() {
        let store = MemoryResultStore::new();
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();

        store.put(first, "b.json", "{}").await.unwrap();
        store.put(first, "a.json", "{}").await.unwrap();
        store.put(second, "c.json", "{}").await.unwrap();

        assert_eq!(store.list(first).await.unwrap(), vec!["a.json", "b.json"]);
        assert!(store.contains_run(second).await.unwrap());
        assert!(!store.contains_run(Uuid::new_v4()).await.unwrap());
        assert_eq!(store.len(), 3);
    }

    #[tokio::test]
    async fn test_concurrent_writes_to_one_key() {
        let store = Arc::new(MemoryResultStore::new());
        let run_id = Uuid::new_v4();

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.put(run_id, "race.json", &i.to_string()).await })
            })
            .collect();

        let mut wins = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                wins += 1;
            }
        }
        assert_eq!(wins, 1);
    }
}
