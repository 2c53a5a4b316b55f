//! Service layer: routing, classification, metrics, and the execution
//! support components (pool, aggregator, performance monitor).

pub mod aggregator;
pub mod classifier;
pub mod metrics;
pub mod performance;
pub mod resource_pool;
pub mod router;

pub use aggregator::ResultAggregator;
pub use classifier::WorkflowClassifier;
pub use metrics::{MetricsCollector, MetricsSummary, WorkerPerformanceCounter};
pub use performance::{PerformanceMonitor, PerformanceRecord, TaskSpan};
pub use resource_pool::{ResourcePool, SlotGuard};
pub use router::{default_rules, RouteDecision, TaskRouter};
