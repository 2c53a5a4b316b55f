//! Capability provider port.
//!
//! A provider is an opaque specialized worker: it accepts an instruction
//! plus context and returns a payload. Its internals are out of scope;
//! failures are returned, never panicked across this boundary, so the
//! executor can apply its own error-behavior policy.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::models::TaskContext;

/// Failure reported by a capability provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Provider rejected the instruction: {0}")]
    Rejected(String),

    #[error("Provider failed: {0}")]
    Failed(String),
}

/// An external unit of capability, invoked in-process. Transport to a
/// remote worker is the implementor's concern.
#[async_trait]
pub trait CapabilityProvider: Send + Sync {
    /// Execute one instruction with the given context and return the
    /// payload.
    async fn invoke(&self, instruction: &str, context: &TaskContext)
        -> Result<String, ProviderError>;
}

/// Typed worker registry, resolved at startup.
///
/// Replaces stringly-typed runtime lookup tables: the set of registered
/// workers is fixed once the registry is built.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn CapabilityProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        worker_id: impl Into<String>,
        provider: Arc<dyn CapabilityProvider>,
    ) {
        self.providers.insert(worker_id.into(), provider);
    }

    pub fn get(&self, worker_id: &str) -> Option<Arc<dyn CapabilityProvider>> {
        self.providers.get(worker_id).cloned()
    }

    pub fn contains(&self, worker_id: &str) -> bool {
        self.providers.contains_key(worker_id)
    }

    /// Registered worker ids, sorted for stable display.
    pub fn worker_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.providers.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}
