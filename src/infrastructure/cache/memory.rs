//! In-memory TTL cache adapter.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::Value;
use tracing::trace;

use crate::domain::errors::DispatchResult;
use crate::domain::ports::ResponseCache;

struct Entry {
    value: Value,
    expires_at: Instant,
}

/// Process-local cache keyed by `namespace:key` with lazy expiry: stale
/// entries are dropped on the access that finds them, not by a sweeper.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn compose_key(namespace: &str, key: &str) -> String {
        format!("{namespace}:{key}")
    }
}

#[async_trait]
impl ResponseCache for MemoryCache {
    async fn get(&self, namespace: &str, key: &str) -> DispatchResult<Option<Value>> {
        let composed = Self::compose_key(namespace, key);
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        match entries.get(&composed) {
            Some(entry) if entry.expires_at > Instant::now() => {
                trace!(key = %composed, "Cache hit");
                Ok(Some(entry.value.clone()))
            }
            Some(_) => {
                trace!(key = %composed, "Cache entry expired");
                entries.remove(&composed);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(
        &self,
        namespace: &str,
        key: &str,
        value: Value,
        ttl: Duration,
    ) -> DispatchResult<()> {
        let composed = Self::compose_key(namespace, key);
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        entries.insert(
            composed,
            Entry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }
}
