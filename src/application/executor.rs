//! Generic plan executor.
//!
//! One interpreter walks the `Plan` variant tree: singles invoke a
//! provider, sequences thread context in declared order, parallels spawn
//! bounded concurrent workers, loops re-invoke a body under a predicate.
//! Orchestrators only build plans; everything runs through here.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::BoxFuture;
use serde_json::Value;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::application::sequential::ProgressTracker;
use crate::domain::models::{
    iteration_result_key, step_result_key, ErrorBehavior, Plan, SpecialistResult, TaskContext,
    WorkflowTask,
};
use crate::domain::ports::ProviderRegistry;
use crate::services::{PerformanceMonitor, ResourcePool};

/// Outcome of interpreting one plan (sub)tree.
#[derive(Debug, Default)]
struct SubReport {
    results: Vec<SpecialistResult>,
    halted: bool,
}

/// Outcome of a full plan run.
#[derive(Debug)]
pub struct ExecutionReport {
    /// Every task outcome, in completion order for sequences and loops;
    /// unordered across parallel siblings.
    pub results: Vec<SpecialistResult>,
    /// True when a halt-on-error step aborted the remaining work.
    pub halted: bool,
    /// Final task context, including `step_<i>_result` slots.
    pub context: TaskContext,
}

impl ExecutionReport {
    pub fn completed_steps(&self) -> usize {
        self.results.len()
    }
}

/// Interprets plans against the provider registry.
///
/// Cheap to clone; all fields are shared handles.
#[derive(Clone)]
pub struct PlanExecutor {
    providers: Arc<ProviderRegistry>,
    pool: Arc<ResourcePool>,
    monitor: Arc<PerformanceMonitor>,
}

impl PlanExecutor {
    pub fn new(
        providers: Arc<ProviderRegistry>,
        pool: Arc<ResourcePool>,
        monitor: Arc<PerformanceMonitor>,
    ) -> Self {
        Self {
            providers,
            pool,
            monitor,
        }
    }

    pub fn pool(&self) -> &Arc<ResourcePool> {
        &self.pool
    }

    pub fn monitor(&self) -> &Arc<PerformanceMonitor> {
        &self.monitor
    }

    /// Run a plan to completion.
    pub async fn run(&self, plan: &Plan, workflow_name: &str, context: TaskContext) -> ExecutionReport {
        self.run_with_progress(plan, workflow_name, context, None, 0).await
    }

    /// Run a plan, reporting top-level sequence progress to `progress` and
    /// numbering top-level steps from `step_offset` (used when resuming
    /// from a checkpoint).
    pub async fn run_with_progress(
        &self,
        plan: &Plan,
        workflow_name: &str,
        context: TaskContext,
        progress: Option<Arc<ProgressTracker>>,
        step_offset: usize,
    ) -> ExecutionReport {
        self.monitor.start_workflow(workflow_name, plan.leaf_count());
        let (report, context) = Self::execute(
            self.clone(),
            plan.clone(),
            workflow_name.to_string(),
            context,
            false,
            progress,
            step_offset,
        )
        .await;
        ExecutionReport {
            results: report.results,
            halted: report.halted,
            context,
        }
    }

    /// Recursive interpreter. `bounded` is set once execution crosses into
    /// a parallel region: only leaf tasks inside such a region occupy pool
    /// slots, so nested plans can never deadlock on their own permits.
    fn execute(
        exec: Self,
        plan: Plan,
        workflow: String,
        mut ctx: TaskContext,
        bounded: bool,
        progress: Option<Arc<ProgressTracker>>,
        step_offset: usize,
    ) -> BoxFuture<'static, (SubReport, TaskContext)> {
        Box::pin(async move {
            match plan {
                Plan::Single(task) => {
                    let result = exec.execute_task(&task, &ctx, &workflow, bounded).await;
                    let halted = !result.success && task.error_behavior == ErrorBehavior::Halt;
                    (
                        SubReport {
                            results: vec![result],
                            halted,
                        },
                        ctx,
                    )
                }

                Plan::Sequence(children) => {
                    let mut results = Vec::new();
                    let mut halted = false;
                    for (i, child) in children.into_iter().enumerate() {
                        let step_index = step_offset + i;
                        let (sub, returned_ctx) = Self::execute(
                            exec.clone(),
                            child,
                            workflow.clone(),
                            ctx,
                            bounded,
                            None,
                            0,
                        )
                        .await;
                        ctx = returned_ctx;

                        // Publish the step output before any later step starts.
                        if let Some(output) =
                            sub.results.iter().rev().find_map(|r| r.output.clone())
                        {
                            ctx.insert(step_result_key(step_index), Value::String(output));
                        }
                        let sub_halted = sub.halted;
                        results.extend(sub.results);
                        if let Some(p) = progress.as_ref() {
                            p.mark_step_complete();
                        }
                        if sub_halted {
                            warn!(workflow = %workflow, step = step_index, "Chain halted on step failure");
                            halted = true;
                            break;
                        }
                    }
                    (SubReport { results, halted }, ctx)
                }

                Plan::Parallel(children) => {
                    let mut handles = Vec::with_capacity(children.len());
                    for child in children {
                        handles.push(tokio::spawn(Self::execute(
                            exec.clone(),
                            child,
                            workflow.clone(),
                            ctx.clone(),
                            true,
                            None,
                            0,
                        )));
                    }

                    let mut results = Vec::new();
                    for handle in handles {
                        match handle.await {
                            Ok((sub, _)) => results.extend(sub.results),
                            Err(e) => results.push(SpecialistResult::failure(
                                "parallel-branch",
                                "executor",
                                format!("branch panicked: {e}"),
                                Duration::ZERO,
                            )),
                        }
                    }
                    // A failing branch never aborts its siblings.
                    (
                        SubReport {
                            results,
                            halted: false,
                        },
                        ctx,
                    )
                }

                Plan::Loop {
                    body,
                    condition,
                    max_iterations,
                } => {
                    let mut results = Vec::new();
                    let mut iteration = 0u32;
                    while iteration < max_iterations && condition(iteration, &results) {
                        debug!(workflow = %workflow, iteration, "Loop iteration starting");
                        let (sub, returned_ctx) = Self::execute(
                            exec.clone(),
                            (*body).clone(),
                            workflow.clone(),
                            ctx,
                            bounded,
                            None,
                            0,
                        )
                        .await;
                        ctx = returned_ctx;

                        if let Some(output) =
                            sub.results.iter().rev().find_map(|r| r.output.clone())
                        {
                            ctx.insert(iteration_result_key(iteration), Value::String(output));
                        }
                        let sub_halted = sub.halted;
                        results.extend(sub.results);
                        if sub_halted {
                            return (
                                SubReport {
                                    results,
                                    halted: true,
                                },
                                ctx,
                            );
                        }
                        iteration += 1;
                    }
                    if iteration >= max_iterations {
                        warn!(workflow = %workflow, max_iterations, "Loop hit iteration bound");
                    }
                    (
                        SubReport {
                            results,
                            halted: false,
                        },
                        ctx,
                    )
                }
            }
        })
    }

    /// Invoke one task against its provider, applying timeout and retry
    /// policy. Failures are folded into the result, never raised.
    async fn execute_task(
        &self,
        task: &WorkflowTask,
        ctx: &TaskContext,
        workflow: &str,
        bounded: bool,
    ) -> SpecialistResult {
        // Slot held for the whole invocation; released on drop even if the
        // provider future is cancelled by the timeout.
        let _slot = if bounded {
            Some(self.pool.acquire(&task.name).await)
        } else {
            None
        };

        self.monitor.task_started(workflow, &task.name);
        let started = Instant::now();

        let Some(provider) = self.providers.get(&task.worker_id) else {
            self.monitor.task_finished(workflow, &task.name);
            return SpecialistResult::failure(
                &task.name,
                &task.worker_id,
                format!("specialist '{}' not available", task.worker_id),
                started.elapsed(),
            );
        };

        let instruction = with_time_budget(&task.instruction, task.timeout);
        let attempts = match task.error_behavior {
            ErrorBehavior::Retry => task.retry_count.saturating_add(1),
            _ => 1,
        };

        let mut last_error = String::new();
        for attempt in 0..attempts {
            if attempt > 0 {
                debug!(task = %task.name, attempt, "Retrying task");
            }
            match timeout(task.timeout, provider.invoke(&instruction, ctx)).await {
                Ok(Ok(payload)) => {
                    self.monitor.task_finished(workflow, &task.name);
                    return SpecialistResult::success(
                        &task.name,
                        &task.worker_id,
                        payload,
                        started.elapsed(),
                    );
                }
                Ok(Err(e)) => {
                    last_error = e.to_string();
                    warn!(task = %task.name, error = %last_error, "Task attempt failed");
                }
                Err(_) => {
                    last_error = format!(
                        "exceeded {}s budget",
                        task.timeout.as_secs()
                    );
                    warn!(task = %task.name, budget_secs = task.timeout.as_secs(), "Task timed out");
                }
            }
        }

        self.monitor.task_finished(workflow, &task.name);
        SpecialistResult::failure(&task.name, &task.worker_id, last_error, started.elapsed())
    }
}

/// Embed the time budget into the instruction so the worker can
/// self-truncate; the executor enforces the same budget on its side.
fn with_time_budget(instruction: &str, budget: Duration) -> String {
    format!(
        "{instruction}\n\n[Time budget: {}s. Return your best partial answer before the budget expires.]",
        budget.as_secs()
    )
}
