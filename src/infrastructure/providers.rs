//! Built-in capability providers.
//!
//! Local stand-ins that satisfy the provider port without any external
//! backend, so the CLI works out of the box. Real deployments register
//! their own `CapabilityProvider` implementations instead.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::domain::models::TaskContext;
use crate::domain::ports::{CapabilityProvider, ProviderError, ProviderRegistry};

/// Specialist that acknowledges the instruction under its own banner.
///
/// `work_duration` simulates time on task, which keeps pool occupancy and
/// the parallel-efficiency diagnostic meaningful in local runs.
pub struct StubSpecialist {
    specialty: String,
    work_duration: Duration,
}

impl StubSpecialist {
    pub fn new(specialty: impl Into<String>, work_duration: Duration) -> Self {
        Self {
            specialty: specialty.into(),
            work_duration,
        }
    }
}

#[async_trait]
impl CapabilityProvider for StubSpecialist {
    async fn invoke(
        &self,
        instruction: &str,
        context: &TaskContext,
    ) -> Result<String, ProviderError> {
        debug!(
            specialty = %self.specialty,
            context_keys = context.len(),
            "Stub specialist invoked"
        );
        tokio::time::sleep(self.work_duration).await;
        Ok(format!(
            "[{}] handled: {}",
            self.specialty,
            instruction.lines().next().unwrap_or_default()
        ))
    }
}

/// Registry preloaded with one stub per built-in worker category.
pub fn builtin_registry() -> ProviderRegistry {
    let mut registry = ProviderRegistry::new();
    for specialty in [
        "generalist",
        "security",
        "architecture",
        "performance",
        "testing",
        "documentation",
    ] {
        registry.register(
            specialty,
            Arc::new(StubSpecialist::new(specialty, Duration::from_millis(10))),
        );
    }
    registry
}
