//! Dispatch facade integration tests: routing, caching, and the metrics
//! feedback loop working together.

use std::sync::Arc;

use async_trait::async_trait;

use conductor::application::{DispatchRequest, Dispatcher};
use conductor::domain::models::{AggregationStrategy, Config, TaskContext, WorkflowKind};
use conductor::domain::ports::{CapabilityProvider, ProviderError, ProviderRegistry};
use conductor::infrastructure::MemoryCache;
use conductor::services::MetricsCollector;

struct BannerProvider(&'static str);

#[async_trait]
impl CapabilityProvider for BannerProvider {
    async fn invoke(
        &self,
        instruction: &str,
        _context: &TaskContext,
    ) -> Result<String, ProviderError> {
        Ok(format!(
            "[{}] {}",
            self.0,
            instruction.lines().next().unwrap_or_default()
        ))
    }
}

fn full_registry() -> Arc<ProviderRegistry> {
    let mut registry = ProviderRegistry::new();
    for worker in [
        "generalist",
        "security",
        "architecture",
        "performance",
        "testing",
        "documentation",
    ] {
        registry.register(worker, Arc::new(BannerProvider(worker)));
    }
    Arc::new(registry)
}

fn dispatcher(metrics: Arc<MetricsCollector>) -> Dispatcher {
    Dispatcher::new(
        Config::default(),
        full_registry(),
        Arc::new(MemoryCache::new()),
        metrics,
    )
    .unwrap()
}

#[tokio::test]
async fn test_security_request_end_to_end() {
    let metrics = Arc::new(MetricsCollector::new());
    let d = dispatcher(Arc::clone(&metrics));

    let response = d
        .dispatch(DispatchRequest::new(
            "Check for SQL injection vulnerabilities",
        ))
        .await
        .unwrap();

    assert_eq!(response.worker_id, "security");
    assert_eq!(response.workflow_kind, None);
    assert!(response.result.all_succeeded());

    // The run fed the metrics table.
    let counters = metrics.worker_performance();
    assert_eq!(counters["security"].total_count, 1);
    assert_eq!(counters["security"].success_count, 1);
}

#[tokio::test]
async fn test_sequential_request_chains_steps() {
    let d = dispatcher(Arc::new(MetricsCollector::new()));

    let response = d
        .dispatch(DispatchRequest::new(
            "Review the module design then document the findings",
        ))
        .await
        .unwrap();

    assert_eq!(response.workflow_kind, Some(WorkflowKind::Sequential));
    match &response.result {
        conductor::AggregatedResult::Comprehensive { results, .. } => {
            assert_eq!(results.len(), 2);
            assert!(results.iter().all(|r| r.success));
        }
        other => panic!("expected comprehensive shape, got {other:?}"),
    }
}

#[tokio::test]
async fn test_non_ascii_sequential_request_dispatches() {
    let d = dispatcher(Arc::new(MetricsCollector::new()));

    // Characters whose lowercase form is wider in bytes ('İ') must not
    // break step splitting.
    let response = d
        .dispatch(DispatchRequest::new("İnspect the log then summarize ééé"))
        .await
        .unwrap();

    assert_eq!(response.workflow_kind, Some(WorkflowKind::Sequential));
    assert!(response.result.all_succeeded());
}

#[tokio::test]
async fn test_cache_short_circuits_second_dispatch() {
    let metrics = Arc::new(MetricsCollector::new());
    let d = dispatcher(Arc::clone(&metrics));
    let request = DispatchRequest::new("Summarize the release notes");

    let first = d.dispatch(request.clone()).await.unwrap();
    let second = d.dispatch(request).await.unwrap();

    assert!(!first.from_cache);
    assert!(second.from_cache);
    assert_eq!(second.formatted_text, first.formatted_text);

    let summary = metrics.summary();
    // One worker run, one hit, one miss.
    assert_eq!(summary.total_requests, 1);
    assert!((summary.cache_hit_rate - 0.5).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_history_shifts_future_routing() {
    let metrics = Arc::new(MetricsCollector::new());
    // Two rules that tie on keywords; history is the only differentiator.
    let config = Config {
        routing_rules: vec![
            conductor::domain::models::RoutingRuleConfig {
                worker_id: "testing".to_string(),
                keywords: vec!["pipeline".to_string()],
                patterns: vec![],
                priority: 5,
                confidence_threshold: 0.0,
                workflow_hint: None,
            },
            conductor::domain::models::RoutingRuleConfig {
                worker_id: "performance".to_string(),
                keywords: vec!["pipeline".to_string()],
                patterns: vec![],
                priority: 5,
                confidence_threshold: 0.0,
                workflow_hint: None,
            },
        ],
        ..Default::default()
    };
    let d = Dispatcher::new(
        config,
        full_registry(),
        Arc::new(MemoryCache::new()),
        Arc::clone(&metrics),
    )
    .unwrap();

    // Seed history: performance succeeds a lot, testing fails a lot.
    for _ in 0..10 {
        metrics.record_request("performance", true, std::time::Duration::from_millis(5));
        metrics.record_request("testing", false, std::time::Duration::from_millis(5));
    }

    let response = d
        .dispatch(DispatchRequest::new("Inspect the pipeline"))
        .await
        .unwrap();
    assert_eq!(response.worker_id, "performance");
}

#[tokio::test]
async fn test_summary_strategy_shape() {
    let d = dispatcher(Arc::new(MetricsCollector::new()));

    let response = d
        .dispatch_with_strategy(
            DispatchRequest::new("Summarize the meeting notes"),
            AggregationStrategy::Summary,
        )
        .await
        .unwrap();

    assert!(matches!(
        response.result,
        conductor::AggregatedResult::Summary { .. }
    ));
}
