//! Conductor - confidence-scored task router and workflow engine
//!
//! Conductor routes free-form requests to specialized workers using a
//! multi-factor confidence score, then runs the detected workflow shape
//! (sequential chain, bounded parallel batch, or condition-driven loop)
//! over a shared resource pool.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): Plans, tasks, routing rules, ports
//! - **Application Layer** (`application`): The plan executor, orchestrators, and the dispatch facade
//! - **Service Layer** (`services`): Routing, classification, metrics, pooling
//! - **Infrastructure Layer** (`infrastructure`): Cache, checkpoint stores, config, logging
//! - **CLI Layer** (`cli`): Command-line interface
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use conductor::application::{DispatchRequest, Dispatcher};
//! use conductor::domain::models::Config;
//! use conductor::infrastructure::{builtin_registry, MemoryCache};
//! use conductor::services::MetricsCollector;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let dispatcher = Dispatcher::new(
//!         Config::default(),
//!         Arc::new(builtin_registry()),
//!         Arc::new(MemoryCache::new()),
//!         Arc::new(MetricsCollector::new()),
//!     )?;
//!     let response = dispatcher
//!         .dispatch(DispatchRequest::new("Check for SQL injection vulnerabilities"))
//!         .await?;
//!     println!("{}", response.formatted_text);
//!     Ok(())
//! }
//! ```

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use application::{
    DispatchRequest, DispatchResponse, Dispatcher, LoopOrchestrator, ParallelOrchestrator,
    PlanExecutor, ProgressTracker, SequentialOrchestrator,
};
pub use domain::errors::{DispatchError, DispatchResult};
pub use domain::models::{
    AggregatedResult, AggregationStrategy, Checkpoint, Config, LoggingConfig, ParallelTask, Plan,
    SpecialistResult, TaskChain, TaskContext, WorkflowKind, WorkflowTask,
};
pub use domain::ports::{
    CapabilityProvider, CheckpointStore, ProviderError, ProviderRegistry, ResponseCache,
};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{
    MetricsCollector, PerformanceMonitor, ResourcePool, ResultAggregator, TaskRouter,
    WorkflowClassifier,
};
