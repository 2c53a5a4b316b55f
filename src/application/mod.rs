//! Application layer: the generic plan executor, the three orchestration
//! fronts, and the dispatch facade.

pub mod dispatcher;
pub mod executor;
pub mod loops;
pub mod parallel;
pub mod sequential;

pub use dispatcher::{DispatchRequest, DispatchResponse, Dispatcher};
pub use executor::{ExecutionReport, PlanExecutor};
pub use loops::{LoopOrchestrator, LoopOutcome};
pub use parallel::{BatchOutcome, ParallelOrchestrator};
pub use sequential::{ChainOutcome, ProgressSnapshot, ProgressTracker, SequentialOrchestrator};
