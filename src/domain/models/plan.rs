//! Execution plans.
//!
//! Every workflow shape is a `Plan` variant tree interpreted by one generic
//! executor. Phased workflows (parallel batches run one after another) fall
//! out of `Sequence(Parallel, Parallel, ...)` with no bespoke code path.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::models::outcome::SpecialistResult;
use crate::domain::models::task::WorkflowTask;

/// The workflow shape detected in (or hinted for) a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowKind {
    Sequential,
    Parallel,
    Loop,
}

impl fmt::Display for WorkflowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sequential => write!(f, "sequential"),
            Self::Parallel => write!(f, "parallel"),
            Self::Loop => write!(f, "loop"),
        }
    }
}

/// Predicate deciding whether a loop runs another iteration.
///
/// Receives the zero-based iteration index about to run and every result
/// produced so far.
pub type LoopCondition = Arc<dyn Fn(u32, &[SpecialistResult]) -> bool + Send + Sync>;

/// A validated execution plan.
#[derive(Clone)]
pub enum Plan {
    /// One task, one worker invocation.
    Single(WorkflowTask),
    /// Children run strictly in order; each child's output is visible to
    /// later children through the shared context.
    Sequence(Vec<Plan>),
    /// Children run concurrently, bounded by the resource pool.
    Parallel(Vec<Plan>),
    /// One task re-invoked while `condition` holds, up to `max_iterations`.
    Loop {
        body: Box<Plan>,
        condition: LoopCondition,
        max_iterations: u32,
    },
}

impl Plan {
    /// Number of leaf tasks in the plan. Loop bodies count once; the
    /// iteration count is not known until run time.
    pub fn leaf_count(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Sequence(children) | Self::Parallel(children) => {
                children.iter().map(Plan::leaf_count).sum()
            }
            Self::Loop { body, .. } => body.leaf_count(),
        }
    }

    /// Top-level child count; 1 for a single task or loop.
    pub fn width(&self) -> usize {
        match self {
            Self::Sequence(children) | Self::Parallel(children) => children.len(),
            _ => 1,
        }
    }
}

impl fmt::Debug for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(task) => f.debug_tuple("Single").field(&task.name).finish(),
            Self::Sequence(children) => f.debug_tuple("Sequence").field(children).finish(),
            Self::Parallel(children) => f.debug_tuple("Parallel").field(children).finish(),
            Self::Loop {
                body,
                max_iterations,
                ..
            } => f
                .debug_struct("Loop")
                .field("body", body)
                .field("max_iterations", max_iterations)
                .finish(),
        }
    }
}
