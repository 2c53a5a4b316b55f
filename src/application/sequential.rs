//! Sequential orchestration with checkpointing and progress reporting.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::application::executor::{ExecutionReport, PlanExecutor};
use crate::domain::errors::{DispatchError, DispatchResult};
use crate::domain::models::{Checkpoint, Plan, TaskChain, TaskContext};
use crate::domain::ports::CheckpointStore;
use crate::services::performance::PerformanceRecord;
use crate::services::ResultAggregator;

/// Live progress of a running chain, queryable at any time.
#[derive(Debug)]
pub struct ProgressTracker {
    total_steps: usize,
    completed: AtomicUsize,
    started_at: Instant,
}

/// Point-in-time view of a tracker.
#[derive(Debug, Clone, Copy)]
pub struct ProgressSnapshot {
    pub completed_steps: usize,
    pub total_steps: usize,
    /// 0.0 - 100.0
    pub percent_complete: f64,
    pub elapsed: Duration,
    /// `avg_time_per_completed_step * remaining_steps`; `None` ("unknown")
    /// until at least one step completes.
    pub eta: Option<Duration>,
}

impl ProgressTracker {
    pub fn new(total_steps: usize) -> Self {
        Self {
            total_steps,
            completed: AtomicUsize::new(0),
            started_at: Instant::now(),
        }
    }

    pub fn mark_step_complete(&self) {
        self.completed.fetch_add(1, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        let completed = self.completed.load(Ordering::SeqCst).min(self.total_steps);
        let elapsed = self.started_at.elapsed();
        #[allow(clippy::cast_precision_loss)]
        let percent_complete = if self.total_steps == 0 {
            100.0
        } else {
            completed as f64 / self.total_steps as f64 * 100.0
        };
        let eta = if completed == 0 {
            None
        } else {
            let avg = elapsed / u32::try_from(completed).unwrap_or(1);
            let remaining = self.total_steps.saturating_sub(completed);
            Some(avg * u32::try_from(remaining).unwrap_or(0))
        };
        ProgressSnapshot {
            completed_steps: completed,
            total_steps: self.total_steps,
            percent_complete,
            elapsed,
            eta,
        }
    }
}

/// Outcome of a sequential run: recorded results plus the final context,
/// which the caller may checkpoint.
pub struct ChainOutcome {
    pub aggregator: ResultAggregator,
    pub context: TaskContext,
    pub halted: bool,
    pub completed_steps: usize,
    pub performance: Option<PerformanceRecord>,
}

/// Builds and runs sequential chains; owns checkpoint save/resume.
pub struct SequentialOrchestrator {
    executor: PlanExecutor,
    checkpoints: Arc<dyn CheckpointStore>,
}

impl SequentialOrchestrator {
    pub fn new(executor: PlanExecutor, checkpoints: Arc<dyn CheckpointStore>) -> Self {
        Self {
            executor,
            checkpoints,
        }
    }

    /// Validate a chain and turn it into a plan. Fails fast, before any
    /// worker is invoked.
    pub fn build(&self, chain: &TaskChain) -> DispatchResult<Plan> {
        chain.validate()?;
        Ok(Plan::Sequence(
            chain.tasks.iter().cloned().map(Plan::Single).collect(),
        ))
    }

    /// Run a chain from the start.
    pub async fn run(
        &self,
        chain: &TaskChain,
        workflow_name: &str,
        initial_context: TaskContext,
    ) -> DispatchResult<ChainOutcome> {
        let plan = self.build(chain)?;
        let progress = Arc::new(ProgressTracker::new(chain.len()));
        let report = self
            .executor
            .run_with_progress(&plan, workflow_name, initial_context, Some(progress), 0)
            .await;
        Ok(self.outcome(workflow_name, report))
    }

    /// Run a chain with an externally held progress tracker, so the caller
    /// can poll percent/elapsed/ETA while the chain executes.
    pub async fn run_tracked(
        &self,
        chain: &TaskChain,
        workflow_name: &str,
        initial_context: TaskContext,
        progress: Arc<ProgressTracker>,
    ) -> DispatchResult<ChainOutcome> {
        let plan = self.build(chain)?;
        let report = self
            .executor
            .run_with_progress(&plan, workflow_name, initial_context, Some(progress), 0)
            .await;
        Ok(self.outcome(workflow_name, report))
    }

    /// Capture a checkpoint of a chain's progress. Explicit API; nothing is
    /// captured automatically.
    pub async fn save_checkpoint(
        &self,
        workflow_name: &str,
        step_index: usize,
        context: &TaskContext,
    ) -> DispatchResult<Uuid> {
        let state = serde_json::to_value(context)?;
        let checkpoint = Checkpoint::new(workflow_name, step_index, state);
        let id = self.checkpoints.save(&checkpoint).await?;
        info!(workflow = workflow_name, step_index, %id, "Checkpoint saved");
        Ok(id)
    }

    /// Load a saved checkpoint so the caller can re-enter the chain without
    /// re-running completed steps.
    pub async fn resume_from_checkpoint(&self, id: Uuid) -> DispatchResult<Checkpoint> {
        self.checkpoints
            .load(id)
            .await?
            .ok_or(DispatchError::CheckpointNotFound(id))
    }

    /// Resume a chain at the checkpointed step, seeding the context from
    /// the snapshot. Steps before `checkpoint.step_index` are skipped and
    /// the remaining steps keep their original `step_<i>_result` numbering.
    pub async fn run_from_checkpoint(
        &self,
        chain: &TaskChain,
        workflow_name: &str,
        checkpoint_id: Uuid,
    ) -> DispatchResult<ChainOutcome> {
        chain.validate()?;
        let checkpoint = self.resume_from_checkpoint(checkpoint_id).await?;
        if checkpoint.step_index >= chain.len() {
            return Err(DispatchError::Construction(format!(
                "checkpoint step {} is past the end of a {}-step chain",
                checkpoint.step_index,
                chain.len()
            )));
        }

        let context: TaskContext = match checkpoint.state {
            Value::Object(map) => map.into_iter().collect(),
            _ => TaskContext::new(),
        };
        let remaining: Vec<Plan> = chain.tasks[checkpoint.step_index..]
            .iter()
            .cloned()
            .map(Plan::Single)
            .collect();
        let plan = Plan::Sequence(remaining);
        let progress = Arc::new(ProgressTracker::new(chain.len() - checkpoint.step_index));
        info!(
            workflow = workflow_name,
            resume_at = checkpoint.step_index,
            "Resuming chain from checkpoint"
        );
        let report = self
            .executor
            .run_with_progress(
                &plan,
                workflow_name,
                context,
                Some(progress),
                checkpoint.step_index,
            )
            .await;
        Ok(self.outcome(workflow_name, report))
    }

    /// Fold a report into the chain outcome, closing the timing record so
    /// it never lingers in the monitor's in-flight table.
    fn outcome(&self, workflow_name: &str, report: ExecutionReport) -> ChainOutcome {
        let performance = self
            .executor
            .monitor()
            .finish_workflow(workflow_name, self.executor.pool().capacity());
        let completed_steps = report.completed_steps();
        let aggregator = ResultAggregator::new();
        aggregator.record_all(report.results);
        ChainOutcome {
            aggregator,
            context: report.context,
            halted: report.halted,
            completed_steps,
            performance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_eta_unknown_before_first_step() {
        let tracker = ProgressTracker::new(4);
        let snap = tracker.snapshot();
        assert_eq!(snap.completed_steps, 0);
        assert!(snap.eta.is_none());
        assert!(snap.percent_complete.abs() < f64::EPSILON);
    }

    #[test]
    fn test_progress_percent_and_eta() {
        let tracker = ProgressTracker::new(4);
        tracker.mark_step_complete();
        tracker.mark_step_complete();
        let snap = tracker.snapshot();
        assert_eq!(snap.completed_steps, 2);
        assert!((snap.percent_complete - 50.0).abs() < f64::EPSILON);
        assert!(snap.eta.is_some());
    }

    #[test]
    fn test_empty_tracker_is_complete() {
        let tracker = ProgressTracker::new(0);
        assert!((tracker.snapshot().percent_complete - 100.0).abs() < f64::EPSILON);
    }
}
