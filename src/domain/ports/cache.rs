//! Response cache port.

use std::time::Duration;

use async_trait::async_trait;

use crate::domain::errors::DispatchResult;

/// Namespaced key/value cache with per-entry TTL.
///
/// The dispatch facade uses it to short-circuit routing and execution for
/// previously seen requests; backing storage is the implementor's concern.
#[async_trait]
pub trait ResponseCache: Send + Sync {
    async fn get(&self, namespace: &str, key: &str) -> DispatchResult<Option<serde_json::Value>>;

    async fn set(
        &self,
        namespace: &str,
        key: &str,
        value: serde_json::Value,
        ttl: Duration,
    ) -> DispatchResult<()>;
}

/// Cache that stores nothing. Used when caching is disabled and in tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullCache;

#[async_trait]
impl ResponseCache for NullCache {
    async fn get(&self, _namespace: &str, _key: &str) -> DispatchResult<Option<serde_json::Value>> {
        Ok(None)
    }

    async fn set(
        &self,
        _namespace: &str,
        _key: &str,
        _value: serde_json::Value,
        _ttl: Duration,
    ) -> DispatchResult<()> {
        Ok(())
    }
}
