//! Domain errors for the Conductor dispatch engine.

use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur while building or running a dispatch.
///
/// Construction errors are raised at plan-build time, before any worker is
/// invoked. Execution-time failures are folded into per-task results and
/// never escape as a hard error from the facade.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Invalid plan: {0}")]
    Construction(String),

    #[error("Task '{task}' exceeded its {budget_secs}s budget")]
    Timeout { task: String, budget_secs: u64 },

    #[error("No capability provider registered for worker: {0}")]
    WorkerUnavailable(String),

    #[error("Unknown aggregation strategy: {0}")]
    Aggregation(String),

    #[error("Checkpoint not found: {0}")]
    CheckpointNotFound(Uuid),

    #[error("Checkpoint store error: {0}")]
    Checkpoint(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),
}

pub type DispatchResult<T> = Result<T, DispatchError>;

impl From<serde_json::Error> for DispatchError {
    fn from(err: serde_json::Error) -> Self {
        DispatchError::Serialization(err.to_string())
    }
}
