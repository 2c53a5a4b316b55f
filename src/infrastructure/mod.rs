//! Infrastructure layer: adapters behind the domain ports plus process
//! concerns (configuration loading, logging setup).

pub mod cache;
pub mod checkpoints;
pub mod config;
pub mod logging;
pub mod providers;

pub use cache::MemoryCache;
pub use checkpoints::{FileCheckpointStore, MemoryCheckpointStore};
pub use config::{ConfigError, ConfigLoader};
pub use providers::{builtin_registry, StubSpecialist};
