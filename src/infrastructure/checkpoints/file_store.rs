//! JSON-file checkpoint store.
//!
//! One file per checkpoint under a caller-chosen directory, named by id.
//! Survives process restarts, which is the whole point of a checkpoint.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;
use uuid::Uuid;

use crate::domain::errors::{DispatchError, DispatchResult};
use crate::domain::models::Checkpoint;
use crate::domain::ports::CheckpointStore;

pub struct FileCheckpointStore {
    directory: PathBuf,
}

impl FileCheckpointStore {
    /// Store rooted at `directory`; the directory is created on first save.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    fn path_for(&self, id: Uuid) -> PathBuf {
        self.directory.join(format!("{id}.json"))
    }

    async fn ensure_directory(&self) -> DispatchResult<()> {
        fs::create_dir_all(&self.directory)
            .await
            .map_err(|e| store_error(&self.directory, "create checkpoint directory", &e))
    }
}

#[async_trait]
impl CheckpointStore for FileCheckpointStore {
    async fn save(&self, checkpoint: &Checkpoint) -> DispatchResult<Uuid> {
        self.ensure_directory().await?;
        let path = self.path_for(checkpoint.id);
        let json = serde_json::to_vec_pretty(checkpoint)?;
        fs::write(&path, json)
            .await
            .map_err(|e| store_error(&path, "write checkpoint", &e))?;
        debug!(path = %path.display(), "Checkpoint written");
        Ok(checkpoint.id)
    }

    async fn load(&self, id: Uuid) -> DispatchResult<Option<Checkpoint>> {
        let path = self.path_for(id);
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(store_error(&path, "read checkpoint", &e)),
        };
        let checkpoint = serde_json::from_slice(&bytes)?;
        Ok(Some(checkpoint))
    }

    async fn delete(&self, id: Uuid) -> DispatchResult<()> {
        let path = self.path_for(id);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(store_error(&path, "delete checkpoint", &e)),
        }
    }
}

fn store_error(path: &Path, action: &str, err: &std::io::Error) -> DispatchError {
    DispatchError::Checkpoint(format!("failed to {action} at {}: {err}", path.display()))
}
