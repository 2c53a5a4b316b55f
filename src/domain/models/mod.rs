//! Domain models for the Conductor dispatch engine.

pub mod checkpoint;
pub mod config;
pub mod outcome;
pub mod plan;
pub mod routing;
pub mod task;

pub use checkpoint::Checkpoint;
pub use config::{Config, LoggingConfig, RoutingRuleConfig};
pub use outcome::{AggregatedResult, AggregationStrategy, SpecialistResult};
pub use plan::{LoopCondition, Plan, WorkflowKind};
pub use routing::{ConfidenceWeights, RoutingRule};
pub use task::{
    iteration_result_key, step_result_key, ErrorBehavior, ParallelTask, TaskChain, TaskContext,
    WorkflowTask, MAX_TOOLS_PER_TASK,
};
