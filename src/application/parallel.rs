//! Parallel orchestration: bounded concurrent batches and phased runs.

use tracing::info;

use crate::application::executor::PlanExecutor;
use crate::domain::errors::{DispatchError, DispatchResult};
use crate::domain::models::{ParallelTask, Plan, TaskContext};
use crate::services::performance::PerformanceRecord;
use crate::services::ResultAggregator;

/// Outcome of a parallel batch: recorded results plus the closed timing
/// record with its parallel-efficiency diagnostic.
pub struct BatchOutcome {
    pub aggregator: ResultAggregator,
    pub performance: Option<PerformanceRecord>,
}

/// Builds and runs parallel batches.
pub struct ParallelOrchestrator {
    executor: PlanExecutor,
}

impl ParallelOrchestrator {
    pub fn new(executor: PlanExecutor) -> Self {
        Self { executor }
    }

    /// Validate a batch and turn it into a plan. Fails fast, before any
    /// worker is invoked.
    pub fn build(&self, tasks: &[ParallelTask]) -> DispatchResult<Plan> {
        if tasks.is_empty() {
            return Err(DispatchError::Construction(
                "parallel batch cannot be empty".to_string(),
            ));
        }
        let mut names = std::collections::HashSet::new();
        for task in tasks {
            task.validate()?;
            if !names.insert(task.name.as_str()) {
                return Err(DispatchError::Construction(format!(
                    "duplicate task name '{}' in batch",
                    task.name
                )));
            }
        }
        Ok(Plan::Parallel(
            tasks
                .iter()
                .cloned()
                .map(|t| Plan::Single(t.into_workflow_task()))
                .collect(),
        ))
    }

    /// Build a phased plan: each batch runs as one parallel phase, and
    /// phase N+1 starts only after every task in phase N finished. This is
    /// just a sequence of parallel plans; the generic executor does the
    /// rest.
    pub fn build_phased(&self, phases: &[Vec<ParallelTask>]) -> DispatchResult<Plan> {
        if phases.is_empty() {
            return Err(DispatchError::Construction(
                "phased workflow needs at least one phase".to_string(),
            ));
        }
        // Names must be unique across the whole plan, not just a phase, or
        // later phases overwrite earlier timing spans.
        let mut names = std::collections::HashSet::new();
        for task in phases.iter().flatten() {
            if !names.insert(task.name.as_str()) {
                return Err(DispatchError::Construction(format!(
                    "duplicate task name '{}' across phases",
                    task.name
                )));
            }
        }
        let plans = phases
            .iter()
            .map(|phase| self.build(phase))
            .collect::<DispatchResult<Vec<Plan>>>()?;
        Ok(Plan::Sequence(plans))
    }

    /// Run a batch (or phased) plan and close out its timing record.
    pub async fn run(
        &self,
        plan: &Plan,
        workflow_name: &str,
        context: TaskContext,
    ) -> BatchOutcome {
        let report = self.executor.run(plan, workflow_name, context).await;
        let performance = self
            .executor
            .monitor()
            .finish_workflow(workflow_name, self.executor.pool().capacity());

        if let Some(record) = &performance {
            info!(
                workflow = workflow_name,
                tasks = record.task_spans.len(),
                efficiency = ?record.parallel_efficiency,
                "Parallel batch finished"
            );
        }

        let aggregator = ResultAggregator::new();
        aggregator.record_all(report.results);
        BatchOutcome {
            aggregator,
            performance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::MAX_TOOLS_PER_TASK;
    use crate::domain::ports::{
        CapabilityProvider, ProviderError, ProviderRegistry,
    };
    use crate::services::{PerformanceMonitor, ResourcePool};
    use async_trait::async_trait;
    use std::sync::Arc;

    struct NoopProvider;

    #[async_trait]
    impl CapabilityProvider for NoopProvider {
        async fn invoke(
            &self,
            _instruction: &str,
            _context: &TaskContext,
        ) -> Result<String, ProviderError> {
            Ok("done".to_string())
        }
    }

    fn orchestrator() -> ParallelOrchestrator {
        let mut registry = ProviderRegistry::new();
        registry.register("generalist", Arc::new(NoopProvider));
        ParallelOrchestrator::new(PlanExecutor::new(
            Arc::new(registry),
            Arc::new(ResourcePool::new(4)),
            Arc::new(PerformanceMonitor::new()),
        ))
    }

    #[test]
    fn test_empty_batch_rejected() {
        let orch = orchestrator();
        assert!(matches!(
            orch.build(&[]),
            Err(DispatchError::Construction(_))
        ));
    }

    #[test]
    fn test_tool_overflow_rejected_before_execution() {
        let orch = orchestrator();
        let tools: Vec<&str> = (0..=MAX_TOOLS_PER_TASK).map(|_| "tool").collect();
        let tasks = vec![ParallelTask::new("wide", "use everything", "generalist")
            .with_tools(tools)];
        assert!(matches!(
            orch.build(&tasks),
            Err(DispatchError::Construction(_))
        ));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let orch = orchestrator();
        let tasks = vec![
            ParallelTask::new("scan", "scan the backend", "generalist"),
            ParallelTask::new("scan", "scan the frontend", "generalist"),
        ];
        assert!(matches!(
            orch.build(&tasks),
            Err(DispatchError::Construction(_))
        ));

        let phases = vec![
            vec![ParallelTask::new("scan", "phase one", "generalist")],
            vec![ParallelTask::new("scan", "phase two", "generalist")],
        ];
        assert!(matches!(
            orch.build_phased(&phases),
            Err(DispatchError::Construction(_))
        ));
    }

    #[tokio::test]
    async fn test_batch_runs_all_tasks() {
        let orch = orchestrator();
        let tasks: Vec<ParallelTask> = (0..3)
            .map(|i| ParallelTask::new(format!("t{i}"), "go", "generalist"))
            .collect();
        let plan = orch.build(&tasks).unwrap();
        let outcome = orch.run(&plan, "batch", TaskContext::new()).await;
        assert_eq!(outcome.aggregator.len(), 3);
        assert!(outcome.performance.is_some());
    }

    #[tokio::test]
    async fn test_phased_plan_shape() {
        let orch = orchestrator();
        let phases = vec![
            vec![ParallelTask::new("a", "go", "generalist")],
            vec![
                ParallelTask::new("b", "go", "generalist"),
                ParallelTask::new("c", "go", "generalist"),
            ],
        ];
        let plan = orch.build_phased(&phases).unwrap();
        assert_eq!(plan.width(), 2);
        assert_eq!(plan.leaf_count(), 3);

        let outcome = orch.run(&plan, "phased", TaskContext::new()).await;
        assert_eq!(outcome.aggregator.len(), 3);
    }
}
