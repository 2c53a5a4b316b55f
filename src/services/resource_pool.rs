//! Bounded concurrency gate for parallel task execution.
//!
//! A semaphore enforces the hard cap on simultaneously active tasks; an
//! active-slot map tracks what is running for diagnostics. A task that
//! cannot acquire a slot queues on the semaphore rather than failing, so
//! the pool doubles as the deadlock-prevention mechanism.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::debug;
use uuid::Uuid;

/// One occupied slot.
#[derive(Debug, Clone)]
pub struct ActiveSlot {
    pub task_name: String,
    pub acquired_at: DateTime<Utc>,
}

/// Fixed-capacity task slot pool.
#[derive(Debug)]
pub struct ResourcePool {
    semaphore: Arc<Semaphore>,
    capacity: usize,
    active: Arc<Mutex<HashMap<Uuid, ActiveSlot>>>,
}

impl ResourcePool {
    pub fn new(capacity: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(capacity.max(1))),
            capacity: capacity.max(1),
            active: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Wait for a slot. The returned guard releases the slot on drop, so
    /// every successful acquire is balanced by exactly one release even
    /// when the holding future is cancelled.
    pub async fn acquire(&self, task_name: &str) -> SlotGuard {
        // acquire_owned only errors when the semaphore is closed, which the
        // pool never does.
        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .unwrap_or_else(|_| unreachable!("pool semaphore is never closed"));

        let id = Uuid::new_v4();
        let slot = ActiveSlot {
            task_name: task_name.to_string(),
            acquired_at: Utc::now(),
        };
        self.active
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(id, slot);
        debug!(task = task_name, active = self.active_count(), "Acquired pool slot");

        SlotGuard {
            id,
            active: Arc::clone(&self.active),
            _permit: permit,
        }
    }

    /// Number of currently occupied slots. Always ≤ `capacity`.
    pub fn active_count(&self) -> usize {
        self.active
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Snapshot of the active-slot map.
    pub fn active_slots(&self) -> Vec<ActiveSlot> {
        self.active
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }
}

/// RAII slot handle; dropping it frees the slot and the semaphore permit.
#[derive(Debug)]
pub struct SlotGuard {
    id: Uuid,
    active: Arc<Mutex<HashMap<Uuid, ActiveSlot>>>,
    _permit: OwnedSemaphorePermit,
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        self.active
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .remove(&self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_acquire_release_balance() {
        let pool = ResourcePool::new(2);
        assert_eq!(pool.active_count(), 0);

        let a = pool.acquire("a").await;
        let b = pool.acquire("b").await;
        assert_eq!(pool.active_count(), 2);

        drop(a);
        assert_eq!(pool.active_count(), 1);
        drop(b);
        assert_eq!(pool.active_count(), 0);
    }

    #[tokio::test]
    async fn test_cap_enforced() {
        let pool = Arc::new(ResourcePool::new(1));
        let _held = pool.acquire("holder").await;

        let waiter = {
            let pool = Arc::clone(&pool);
            tokio::spawn(async move {
                let _slot = pool.acquire("waiter").await;
            })
        };

        // The waiter must still be queued while the slot is held.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiter.is_finished());
        assert_eq!(pool.active_count(), 1);

        drop(_held);
        waiter.await.unwrap();
        assert_eq!(pool.active_count(), 0);
    }

    #[tokio::test]
    async fn test_zero_capacity_clamped() {
        let pool = ResourcePool::new(0);
        assert_eq!(pool.capacity(), 1);
        let _slot = pool.acquire("only").await;
        assert_eq!(pool.active_count(), 1);
    }
}
