//! Ports: traits the engine consumes, implemented by infrastructure
//! adapters or test doubles.

pub mod cache;
pub mod capability;
pub mod checkpoint_store;

pub use cache::{NullCache, ResponseCache};
pub use capability::{CapabilityProvider, ProviderError, ProviderRegistry};
pub use checkpoint_store::CheckpointStore;
