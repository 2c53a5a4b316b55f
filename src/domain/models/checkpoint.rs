//! Sequential workflow progress snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A persisted snapshot of a sequential workflow's progress.
///
/// Read-only once created; retention is caller-managed via
/// `CheckpointStore::delete`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    pub id: Uuid,
    pub workflow_name: String,
    /// Index of the next step to run when resuming.
    pub step_index: usize,
    /// Accumulated task context at capture time.
    pub state: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl Checkpoint {
    pub fn new(workflow_name: impl Into<String>, step_index: usize, state: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            workflow_name: workflow_name.into(),
            step_index,
            state,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkpoint_ids_are_unique() {
        let a = Checkpoint::new("wf", 0, serde_json::json!({}));
        let b = Checkpoint::new("wf", 0, serde_json::json!({}));
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_checkpoint_roundtrip() {
        let cp = Checkpoint::new("review", 2, serde_json::json!({"step_0_result": "ok"}));
        let json = serde_json::to_string(&cp).unwrap();
        let back: Checkpoint = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, cp.id);
        assert_eq!(back.step_index, 2);
        assert_eq!(back.state, cp.state);
    }
}
