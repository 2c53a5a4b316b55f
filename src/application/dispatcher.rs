//! Dispatch facade: the single entry point.
//!
//! classify → route → build plan → execute → aggregate → record metrics →
//! format. A cache hit short-circuits the whole pipeline; a single worker
//! failure never fails the response.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::application::executor::PlanExecutor;
use crate::domain::errors::{DispatchError, DispatchResult};
use crate::domain::models::{
    AggregatedResult, AggregationStrategy, Config, Plan, RoutingRule, RoutingRuleConfig,
    TaskContext, WorkflowKind, WorkflowTask,
};
use crate::domain::ports::{ProviderRegistry, ResponseCache};
use crate::services::aggregator;
use crate::services::{
    default_rules, MetricsCollector, MetricsSummary, PerformanceMonitor, ResourcePool, TaskRouter,
    WorkflowClassifier,
};

const CACHE_NAMESPACE: &str = "dispatch";

/// An incoming request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchRequest {
    pub text: String,
    #[serde(default)]
    pub context: TaskContext,
}

impl DispatchRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            context: TaskContext::new(),
        }
    }
}

/// The formatted outcome handed back to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchResponse {
    /// Worker the request (or its first step) was routed to.
    pub worker_id: String,
    pub workflow_kind: Option<WorkflowKind>,
    pub formatted_text: String,
    pub result: AggregatedResult,
    #[serde(default)]
    pub from_cache: bool,
}

/// Single entry point wiring the router, classifier, executor, cache, and
/// metrics together. Constructed once per process; all shared state is
/// injected explicitly.
pub struct Dispatcher {
    config: Config,
    router: TaskRouter,
    classifier: WorkflowClassifier,
    executor: PlanExecutor,
    cache: Arc<dyn ResponseCache>,
    metrics: Arc<MetricsCollector>,
}

impl Dispatcher {
    pub fn new(
        config: Config,
        providers: Arc<ProviderRegistry>,
        cache: Arc<dyn ResponseCache>,
        metrics: Arc<MetricsCollector>,
    ) -> DispatchResult<Self> {
        let rules = if config.routing_rules.is_empty() {
            default_rules()
        } else {
            rules_from_config(&config.routing_rules)?
        };
        let router = TaskRouter::new(rules, config.fallback_worker.clone(), Arc::clone(&metrics))?;
        let pool = Arc::new(ResourcePool::new(config.max_concurrency));
        let monitor = Arc::new(PerformanceMonitor::new());
        let executor = PlanExecutor::new(providers, pool, monitor);
        Ok(Self {
            config,
            router,
            classifier: WorkflowClassifier::new(),
            executor,
            cache,
            metrics,
        })
    }

    /// Shared executor, for wiring orchestrators onto the same pool and
    /// registry.
    pub fn executor(&self) -> PlanExecutor {
        self.executor.clone()
    }

    pub fn metrics_summary(&self) -> MetricsSummary {
        self.metrics.summary()
    }

    /// Dispatch a request end to end, aggregating under the default
    /// comprehensive strategy.
    pub async fn dispatch(&self, request: DispatchRequest) -> DispatchResult<DispatchResponse> {
        self.dispatch_with_strategy(request, AggregationStrategy::Comprehensive)
            .await
    }

    /// Dispatch a request, selecting the aggregation shape per call.
    pub async fn dispatch_with_strategy(
        &self,
        request: DispatchRequest,
        strategy: AggregationStrategy,
    ) -> DispatchResult<DispatchResponse> {
        // Cache short-circuit for previously seen requests.
        match self.cache.get(CACHE_NAMESPACE, &request.text).await {
            Ok(Some(cached)) => {
                if let Ok(mut response) = serde_json::from_value::<DispatchResponse>(cached) {
                    self.metrics.record_cache_hit();
                    debug!(text = %request.text, "Dispatch served from cache");
                    response.from_cache = true;
                    return Ok(response);
                }
                self.metrics.record_cache_miss();
            }
            Ok(None) => self.metrics.record_cache_miss(),
            Err(e) => warn!(error = %e, "Cache lookup failed, dispatching anyway"),
        }

        // Independent analyses: workflow shape and routing.
        let detected = self.classifier.detect(&request.text);
        let decision = self.router.route(&request.text, "general");
        let kind = detected.or(decision.workflow_hint);

        info!(
            worker = %decision.worker_id,
            workflow = ?kind,
            confidence = decision.confidence,
            via_fallback = decision.via_fallback,
            "Dispatching request"
        );

        let workflow_name = format!("dispatch-{}", Uuid::new_v4());
        let plan = self.build_plan(&request.text, kind, &decision.worker_id)?;
        let report = self
            .executor
            .run(&plan, &workflow_name, request.context)
            .await;
        self.executor
            .monitor()
            .finish_workflow(&workflow_name, self.executor.pool().capacity());

        // Outcome and latency feed the router's historical term.
        for result in &report.results {
            self.metrics
                .record_request(&result.worker_id, result.success, result.duration);
        }

        let result = aggregator::aggregate(&report.results, strategy);
        let formatted_text = format_response(&decision.worker_id, kind, &result);
        let response = DispatchResponse {
            worker_id: decision.worker_id,
            workflow_kind: kind,
            formatted_text,
            result,
            from_cache: false,
        };

        let ttl = Duration::from_secs(self.config.cache_ttl_secs);
        if ttl > Duration::ZERO {
            if let Ok(value) = serde_json::to_value(&response) {
                if let Err(e) = self
                    .cache
                    .set(CACHE_NAMESPACE, &request.text, value, ttl)
                    .await
                {
                    warn!(error = %e, "Failed to cache dispatch response");
                }
            }
        }

        Ok(response)
    }

    /// Build the plan matching the detected shape; `None` means direct
    /// single-worker dispatch.
    fn build_plan(
        &self,
        text: &str,
        kind: Option<WorkflowKind>,
        worker_id: &str,
    ) -> DispatchResult<Plan> {
        let timeout = Duration::from_secs(self.config.default_task_timeout_secs);
        let single = |name: &str, instruction: &str, worker: &str| {
            WorkflowTask::new(name, instruction, worker).with_timeout(timeout)
        };

        let plan = match kind {
            None => Plan::Single(single("request", text, worker_id)),

            Some(WorkflowKind::Sequential) => {
                let steps = self.classifier.split_steps(text);
                if steps.len() < 2 {
                    Plan::Single(single("request", text, worker_id))
                } else {
                    let children = steps
                        .iter()
                        .enumerate()
                        .map(|(i, step)| {
                            // Each step may belong to a different specialist.
                            let routed = self.router.route(step, "general");
                            Plan::Single(single(&format!("step-{i}"), step, &routed.worker_id))
                        })
                        .collect();
                    Plan::Sequence(children)
                }
            }

            Some(WorkflowKind::Parallel) => {
                let branches = self.classifier.split_branches(text);
                if branches.len() < 2 {
                    Plan::Single(single("request", text, worker_id))
                } else {
                    let children = branches
                        .iter()
                        .enumerate()
                        .map(|(i, branch)| {
                            let routed = self.router.route(branch, "general");
                            Plan::Single(single(
                                &format!("branch-{i}"),
                                branch,
                                &routed.worker_id,
                            ))
                        })
                        .collect();
                    Plan::Parallel(children)
                }
            }

            Some(WorkflowKind::Loop) => {
                let iterations = self.config.default_loop_iterations;
                Plan::Loop {
                    body: Box::new(Plan::Single(single("iteration", text, worker_id))),
                    condition: Arc::new(move |step, _| step < iterations),
                    max_iterations: self.config.max_loop_iterations,
                }
            }
        };
        Ok(plan)
    }
}

/// Human-readable outcome summary. Always states what succeeded and what
/// did not.
fn format_response(
    worker_id: &str,
    kind: Option<WorkflowKind>,
    result: &AggregatedResult,
) -> String {
    let shape = kind.map_or_else(|| "direct".to_string(), |k| k.to_string());
    match result {
        AggregatedResult::Comprehensive {
            results, errors, ..
        } => {
            let mut text = format!(
                "[{worker_id} / {shape}] {}/{} tasks succeeded.",
                results.len() - errors.len(),
                results.len()
            );
            for r in results {
                if let Some(output) = &r.output {
                    text.push_str(&format!("\n- {}: {output}", r.task_name));
                }
            }
            for error in errors {
                text.push_str(&format!("\n- FAILED {error}"));
            }
            text
        }
        AggregatedResult::Summary {
            succeeded, failed, ..
        } => format!(
            "[{worker_id} / {shape}] succeeded: {}; failed: {}",
            if succeeded.is_empty() {
                "none".to_string()
            } else {
                succeeded.join(", ")
            },
            if failed.is_empty() {
                "none".to_string()
            } else {
                failed.join(", ")
            },
        ),
        AggregatedResult::ErrorsOnly { errors } => {
            if errors.is_empty() {
                format!("[{worker_id} / {shape}] no errors")
            } else {
                format!("[{worker_id} / {shape}] errors:\n{}", errors.join("\n"))
            }
        }
    }
}

/// Convert configuration rules into validated routing rules.
pub(crate) fn rules_from_config(configs: &[RoutingRuleConfig]) -> DispatchResult<Vec<RoutingRule>> {
    configs
        .iter()
        .map(|c| {
            let mut rule = RoutingRule::new(
                c.worker_id.clone(),
                c.keywords.iter().map(String::as_str).collect(),
                c.patterns.iter().map(String::as_str).collect(),
                c.priority,
                c.confidence_threshold,
            )?;
            if let Some(hint) = &c.workflow_hint {
                rule.workflow_hint = Some(match hint.to_lowercase().as_str() {
                    "sequential" => WorkflowKind::Sequential,
                    "parallel" => WorkflowKind::Parallel,
                    "loop" => WorkflowKind::Loop,
                    other => {
                        return Err(DispatchError::ValidationFailed(format!(
                            "unknown workflow hint '{other}' on rule '{}'",
                            c.worker_id
                        )))
                    }
                });
            }
            Ok(rule)
        })
        .collect()
}
