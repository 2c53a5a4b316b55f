//! Bounded loop orchestration.

use crate::application::executor::PlanExecutor;
use crate::domain::errors::DispatchResult;
use crate::domain::models::{LoopCondition, Plan, TaskContext, WorkflowTask};
use crate::services::performance::PerformanceRecord;
use crate::services::ResultAggregator;

/// Outcome of a loop run.
pub struct LoopOutcome {
    pub aggregator: ResultAggregator,
    pub iterations: usize,
    pub context: TaskContext,
    pub performance: Option<PerformanceRecord>,
}

/// Builds and runs single-task loops with a caller-supplied continuation
/// predicate and a hard iteration bound.
pub struct LoopOrchestrator {
    executor: PlanExecutor,
    max_iterations: u32,
}

impl LoopOrchestrator {
    pub fn new(executor: PlanExecutor, max_iterations: u32) -> Self {
        Self {
            executor,
            max_iterations: max_iterations.max(1),
        }
    }

    /// Validate the body task and build the loop plan. The predicate is
    /// evaluated before each iteration over the index and prior results;
    /// the iteration bound guarantees termination even if it never returns
    /// false.
    pub fn build(&self, task: &WorkflowTask, condition: LoopCondition) -> DispatchResult<Plan> {
        task.validate()?;
        Ok(Plan::Loop {
            body: Box::new(Plan::Single(task.clone())),
            condition,
            max_iterations: self.max_iterations,
        })
    }

    pub async fn run(
        &self,
        plan: &Plan,
        workflow_name: &str,
        context: TaskContext,
    ) -> LoopOutcome {
        let report = self.executor.run(plan, workflow_name, context).await;
        let performance = self
            .executor
            .monitor()
            .finish_workflow(workflow_name, self.executor.pool().capacity());
        let iterations = report.results.len();
        let aggregator = ResultAggregator::new();
        aggregator.record_all(report.results);
        LoopOutcome {
            aggregator,
            iterations,
            context: report.context,
            performance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::DispatchError;
    use crate::domain::ports::{CapabilityProvider, ProviderError, ProviderRegistry};
    use crate::services::{PerformanceMonitor, ResourcePool};
    use async_trait::async_trait;
    use std::sync::Arc;

    struct CountingProvider;

    #[async_trait]
    impl CapabilityProvider for CountingProvider {
        async fn invoke(
            &self,
            _instruction: &str,
            context: &TaskContext,
        ) -> Result<String, ProviderError> {
            Ok(format!("seen {} keys", context.len()))
        }
    }

    fn orchestrator(max_iterations: u32) -> LoopOrchestrator {
        let mut registry = ProviderRegistry::new();
        registry.register("generalist", Arc::new(CountingProvider));
        LoopOrchestrator::new(
            PlanExecutor::new(
                Arc::new(registry),
                Arc::new(ResourcePool::new(4)),
                Arc::new(PerformanceMonitor::new()),
            ),
            max_iterations,
        )
    }

    #[tokio::test]
    async fn test_condition_controls_iterations() {
        let orch = orchestrator(25);
        let task = WorkflowTask::new("refine", "refine the draft", "generalist");
        let plan = orch.build(&task, Arc::new(|step, _| step < 3)).unwrap();
        let outcome = orch.run(&plan, "refine-loop", TaskContext::new()).await;
        assert_eq!(outcome.iterations, 3);
    }

    #[tokio::test]
    async fn test_prior_results_visible_to_predicate() {
        let orch = orchestrator(25);
        let task = WorkflowTask::new("until-ok", "keep going", "generalist");
        // Stop as soon as any iteration produced output.
        let plan = orch
            .build(&task, Arc::new(|_, results| results.is_empty()))
            .unwrap();
        let outcome = orch.run(&plan, "predicate-loop", TaskContext::new()).await;
        assert_eq!(outcome.iterations, 1);
    }

    #[tokio::test]
    async fn test_iteration_results_feed_next_context() {
        let orch = orchestrator(25);
        let task = WorkflowTask::new("grow", "count the context", "generalist");
        let plan = orch.build(&task, Arc::new(|step, _| step < 2)).unwrap();
        let outcome = orch.run(&plan, "ctx-loop", TaskContext::new()).await;

        let results = outcome.aggregator.results();
        // Second iteration sees the first iteration's published result.
        assert_eq!(results[0].output.as_deref(), Some("seen 0 keys"));
        assert_eq!(results[1].output.as_deref(), Some("seen 1 keys"));
        assert!(outcome.context.contains_key("iteration_1_result"));
    }

    #[tokio::test]
    async fn test_timing_record_closed_after_run() {
        let mut registry = ProviderRegistry::new();
        registry.register("generalist", Arc::new(CountingProvider));
        let monitor = Arc::new(PerformanceMonitor::new());
        let orch = LoopOrchestrator::new(
            PlanExecutor::new(
                Arc::new(registry),
                Arc::new(ResourcePool::new(4)),
                Arc::clone(&monitor),
            ),
            25,
        );
        let task = WorkflowTask::new("spin", "go", "generalist");
        let plan = orch.build(&task, Arc::new(|step, _| step < 2)).unwrap();
        let outcome = orch.run(&plan, "spin-loop", TaskContext::new()).await;

        assert!(outcome.performance.is_some());
        // Nothing left in the in-flight table.
        assert!(monitor.finish_workflow("spin-loop", 4).is_none());
    }

    #[test]
    fn test_invalid_body_rejected() {
        let orch = orchestrator(25);
        let task = WorkflowTask::new("", "anonymous", "generalist");
        let result = orch.build(&task, Arc::new(|_, _| false));
        assert!(matches!(result, Err(DispatchError::Construction(_))));
    }
}
