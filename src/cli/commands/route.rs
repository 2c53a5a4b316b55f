//! `conductor route` - dry-run scoring, no execution.

use std::sync::Arc;

use serde_json::json;

use crate::application::dispatcher::rules_from_config;
use crate::cli::output::list_table;
use crate::domain::models::Config;
use crate::services::{default_rules, MetricsCollector, TaskRouter, WorkflowClassifier};

pub fn execute(text: &str, config: Config, json: bool) -> anyhow::Result<()> {
    let metrics = Arc::new(MetricsCollector::new());
    let rules = if config.routing_rules.is_empty() {
        default_rules()
    } else {
        rules_from_config(&config.routing_rules)?
    };
    let router = TaskRouter::new(rules, config.fallback_worker, metrics)?;
    let classifier = WorkflowClassifier::new();

    let decision = router.route(text, "general");
    let detected = classifier.detect(text);
    let kind = detected.or(decision.workflow_hint);

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "worker_id": decision.worker_id,
                "confidence": decision.confidence,
                "via_fallback": decision.via_fallback,
                "workflow_kind": kind.map(|k| k.to_string()),
            }))?
        );
        return Ok(());
    }

    let mut table = list_table(&["worker", "confidence", "product"]);
    let request_lower = text.to_lowercase();
    let mut scored: Vec<_> = router
        .rules()
        .iter()
        .map(|rule| {
            let confidence = router.confidence(&request_lower, rule);
            (rule.worker_id.clone(), confidence, confidence * f64::from(rule.priority))
        })
        .collect();
    scored.sort_by(|a, b| b.2.total_cmp(&a.2));
    for (worker, confidence, product) in scored {
        table.add_row(vec![
            worker,
            format!("{confidence:.3}"),
            format!("{product:.3}"),
        ]);
    }
    println!("{table}\n");
    println!(
        "winner: {} ({})",
        decision.worker_id,
        if decision.via_fallback {
            "fallback".to_string()
        } else {
            format!("confidence {:.3}", decision.confidence)
        }
    );
    println!(
        "workflow: {}",
        kind.map_or_else(|| "direct".to_string(), |k| k.to_string())
    );
    Ok(())
}
