//! Checkpoint store port.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::DispatchResult;
use crate::domain::models::Checkpoint;

/// Id-keyed get/put persistence for sequential workflow checkpoints.
///
/// Backing storage (files, a database) is the implementor's concern.
/// Checkpoints are immutable once saved; `delete` exists because retention
/// is caller-managed.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Persist a checkpoint and return its id.
    async fn save(&self, checkpoint: &Checkpoint) -> DispatchResult<Uuid>;

    /// Load a checkpoint by id; `None` when absent.
    async fn load(&self, id: Uuid) -> DispatchResult<Option<Checkpoint>>;

    /// Remove a checkpoint. Removing an absent id is not an error.
    async fn delete(&self, id: Uuid) -> DispatchResult<()>;
}
