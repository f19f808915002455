use async_trait::async_trait;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

use super::{validate_artifact_name, ResultStore};
use crate::errors::StoreError;

/// Result store laid out as `{root}/{run_id}/{artifact}`.
#[derive(Debug, Clone)]
pub struct FileResultStore {
    root: PathBuf,
}

impl FileResultStore {
    /// Creates a store rooted at `root`. Directories are created lazily.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding a run's artifacts.
    #[must_use]
    pub fn run_dir(&self, run_id: Uuid) -> PathBuf {
        self.root.join(run_id.to_string())
    }

    /// Path of one artifact.
    pub fn artifact_path(&self, run_id: Uuid, artifact: &str) -> Result<PathBuf, StoreError> {
        validate_artifact_name(artifact)?;
        Ok(self.run_dir(run_id).join(artifact))
    }
}

/// Prefix of the staging files `put` writes before publishing.
const STAGING_PREFIX: &str = ".staged-";

/// Writes `content` to a staging file in `dir` and links it to `target`
/// only if `target` does not exist yet. The staging file is removed on any
/// failure, so readers see either nothing or the complete artifact.
fn publish(dir: &Path, target: &Path, content: &[u8]) -> std::io::Result<()> {
    let mut staged = tempfile::Builder::new()
        .prefix(STAGING_PREFIX)
        .tempfile_in(dir)?;
    staged.write_all(content)?;
    staged.as_file().sync_all()?;
    staged.persist_noclobber(target).map_err(|e| e.error)?;
    Ok(())
}

#[async_trait]
impl ResultStore for FileResultStore {
    async fn put(&self, run_id: Uuid, artifact: &str, content: &str) -> Result<(), StoreError> {
        let path = self.artifact_path(run_id, artifact)?;
        let dir = self.run_dir(run_id);
        let write_failed = |e: std::io::Error| StoreError::WriteFailed {
            run_id,
            artifact: artifact.to_string(),
            reason: e.to_string(),
        };

        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(write_failed)?;

        let target = path.clone();
        let bytes = content.as_bytes().to_vec();
        let published = tokio::task::spawn_blocking(move || publish(&dir, &target, &bytes))
            .await
            .map_err(std::io::Error::other)
            .and_then(|result| result);

        match published {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(StoreError::AlreadyExists {
                    run_id,
                    artifact: artifact.to_string(),
                })
            }
            Err(e) => return Err(write_failed(e)),
        }

        tracing::debug!(run_id = %run_id, artifact, path = %path.display(), "Artifact written");
        Ok(())
    }

    async fn get(&self, run_id: Uuid, artifact: &str) -> Result<Option<String>, StoreError> {
        let path = self.artifact_path(run_id, artifact)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::ReadFailed {
                run_id,
                artifact: artifact.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    async fn list(&self, run_id: Uuid) -> Result<Vec<String>, StoreError> {
        let read_failed = |e: std::io::Error| StoreError::ReadFailed {
            run_id,
            artifact: String::new(),
            reason: e.to_string(),
        };

        let mut entries = match tokio::fs::read_dir(self.run_dir(run_id)).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(read_failed(e)),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(read_failed)? {
            match entry.file_name().into_string() {
                Ok(name) if !name.starts_with(STAGING_PREFIX) => names.push(name),
                _ => {}
            }
        }
        names.sort();
        Ok(names)
    }
}
