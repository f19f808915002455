//! Persistence of run artifacts.
//!
//! Artifacts are text (JSON, HTML, Markdown) keyed by `(run id, artifact
//! name)`. Every key is written at most once.

mod fs;
mod memory;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::errors::StoreError;

pub use fs::FileResultStore;
pub use memory::MemoryResultStore;

/// Write-once artifact storage shared by all runs.
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Stores `content` under `(run_id, artifact)`.
    ///
    /// Fails with [`StoreError::AlreadyExists`] if the key was written before.
    async fn put(&self, run_id: Uuid, artifact: &str, content: &str) -> Result<(), StoreError>;

    /// Loads an artifact, or `None` if it was never written.
    async fn get(&self, run_id: Uuid, artifact: &str) -> Result<Option<String>, StoreError>;

    /// Names of the artifacts stored for a run, sorted.
    async fn list(&self, run_id: Uuid) -> Result<Vec<String>, StoreError>;

    /// Whether anything was stored for a run.
    async fn contains_run(&self, run_id: Uuid) -> Result<bool, StoreError> {
        Ok(!self.list(run_id).await?.is_empty())
    }
}

/// Rejects names that could escape the run's namespace. Hidden names are
/// reserved for the stores' own staging files.
pub fn validate_artifact_name(artifact: &str) -> Result<(), StoreError> {
    let invalid = artifact.is_empty()
        || artifact.starts_with('.')
        || artifact.contains("..")
        || artifact.contains(['/', '\\', '\0']);
    if invalid {
        return Err(StoreError::InvalidArtifactName(artifact.to_string()));
    }
    Ok(())
}

/// Serializes `value` as pretty JSON and stores it.
pub async fn put_json<T: Serialize + Sync>(
    store: &dyn ResultStore,
    run_id: Uuid,
    artifact: &str,
    value: &T,
) -> Result<(), StoreError> {
    let content = serde_json::to_string_pretty(value).map_err(|e| StoreError::WriteFailed {
        run_id,
        artifact: artifact.to_string(),
        reason: e.to_string(),
    })?;
    store.put(run_id, artifact, &content).await
}

/// Loads and deserializes a JSON artifact.
pub async fn get_json<T: DeserializeOwned>(
    store: &dyn ResultStore,
    run_id: Uuid,
    artifact: &str,
) -> Result<Option<T>, StoreError> {
    let Some(content) = store.get(run_id, artifact).await? else {
        return Ok(None);
    };
    serde_json::from_str(&content)
        .map(Some)
        .map_err(|e| StoreError::ReadFailed {
            run_id,
            artifact: artifact.to_string(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn test_validate_artifact_name() {
        assert!(validate_artifact_name("feedback.json").is_ok());
        assert!(validate_artifact_name("run.json").is_ok());

        for bad in ["", ".", "../etc", "a/b", "a\\b", "x..y", ".staged-abc"] {
            assert!(
                matches!(validate_artifact_name(bad), Err(StoreError::InvalidArtifactName(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn test_json_helpers() {
        let store = MemoryResultStore::new();
        let run_id = Uuid::new_v4();

        put_json(&store, run_id, "a.json", &json!({"k": [1, 2]})).await.unwrap();
        let loaded: Value = get_json(&store, run_id, "a.json").await.unwrap().unwrap();
        assert_eq!(loaded, json!({"k": [1, 2]}));

        let missing: Option<Value> = get_json(&store, run_id, "b.json").await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_get_json_rejects_bad_content() {
        let store = MemoryResultStore::new();
        let run_id = Uuid::new_v4();
        store.put(run_id, "a.json", "not json").await.unwrap();

        let err = get_json::<Value>(&store, run_id, "a.json").await.unwrap_err();
        assert!(matches!(err, StoreError::ReadFailed { .. }));
    }
}
