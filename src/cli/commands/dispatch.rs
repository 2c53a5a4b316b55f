//! `conductor dispatch` - route a request and run the detected workflow.

use std::sync::Arc;

use anyhow::Context;

use crate::application::{DispatchRequest, Dispatcher};
use crate::cli::output::list_table;
use crate::domain::models::{AggregationStrategy, Config};
use crate::infrastructure::{builtin_registry, MemoryCache};
use crate::services::MetricsCollector;

pub async fn execute(
    text: &str,
    strategy: &str,
    show_metrics: bool,
    config: Config,
    json: bool,
) -> anyhow::Result<()> {
    let strategy = AggregationStrategy::parse_or_comprehensive(strategy);

    let metrics = Arc::new(MetricsCollector::new());
    let dispatcher = Dispatcher::new(
        config,
        Arc::new(builtin_registry()),
        Arc::new(MemoryCache::new()),
        Arc::clone(&metrics),
    )
    .context("failed to build dispatcher")?;

    let response = dispatcher
        .dispatch_with_strategy(DispatchRequest::new(text), strategy)
        .await
        .context("dispatch failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        println!("{}", response.formatted_text);
    }

    if show_metrics {
        let summary = dispatcher.metrics_summary();
        let mut table = list_table(&["worker", "requests", "success rate"]);
        let mut workers: Vec<_> = summary.workers.iter().collect();
        workers.sort_by(|a, b| a.0.cmp(b.0));
        for (worker, counter) in workers {
            table.add_row(vec![
                worker.clone(),
                counter.total_count.to_string(),
                counter
                    .rate()
                    .map_or_else(|| "-".to_string(), |r| format!("{:.0}%", r * 100.0)),
            ]);
        }
        println!("\n{table}");
        println!(
            "total: {} ({} failed), avg latency: {:.1}ms, cache hit rate: {:.0}%",
            summary.total_requests,
            summary.error_count,
            summary.avg_latency_ms,
            summary.cache_hit_rate * 100.0
        );
    }

    Ok(())
}
