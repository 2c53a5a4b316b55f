//! Confidence-scored task routing.
//!
//! Every routing rule is scored against the request; rules are ranked by
//! `confidence * priority` and the top rule wins only if its confidence
//! clears its own threshold. Otherwise a static task-type fallback table
//! decides, defaulting to the configured generic worker.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::domain::errors::DispatchResult;
use crate::domain::models::{ConfidenceWeights, RoutingRule, WorkflowKind};
use crate::services::metrics::MetricsCollector;

/// Historical term used for a worker with no recorded dispatches.
const NEUTRAL_HISTORY: f64 = 0.5;

/// Outcome of one routing decision.
#[derive(Debug, Clone)]
pub struct RouteDecision {
    pub worker_id: String,
    pub workflow_hint: Option<WorkflowKind>,
    /// Confidence of the winning rule; 0.0 when the fallback table decided.
    pub confidence: f64,
    pub via_fallback: bool,
}

/// Multi-factor router over an immutable rule set.
pub struct TaskRouter {
    rules: Vec<RoutingRule>,
    fallback: HashMap<String, String>,
    default_worker: String,
    weights: ConfidenceWeights,
    metrics: Arc<MetricsCollector>,
    max_priority: u32,
}

impl TaskRouter {
    /// Build a router over a validated rule set.
    pub fn new(
        rules: Vec<RoutingRule>,
        default_worker: impl Into<String>,
        metrics: Arc<MetricsCollector>,
    ) -> DispatchResult<Self> {
        for rule in &rules {
            rule.validate()?;
        }
        let max_priority = rules.iter().map(|r| r.priority).max().unwrap_or(1);
        Ok(Self {
            rules,
            fallback: default_fallback_table(),
            default_worker: default_worker.into(),
            weights: ConfidenceWeights::default(),
            metrics,
            max_priority,
        })
    }

    /// Router with the built-in rule set.
    pub fn with_default_rules(
        default_worker: impl Into<String>,
        metrics: Arc<MetricsCollector>,
    ) -> Self {
        // Built-in rules always validate.
        Self::new(default_rules(), default_worker, metrics)
            .unwrap_or_else(|_| unreachable!("built-in rules are valid"))
    }

    pub fn with_weights(mut self, weights: ConfidenceWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn rules(&self) -> &[RoutingRule] {
        &self.rules
    }

    /// Pick the best worker for a request.
    ///
    /// Never fails: when no rule clears its threshold, the fallback table
    /// maps `fallback_task_type` to a worker, defaulting to the generic
    /// worker for unrecognized types. Equal `confidence * priority`
    /// products keep the first-declared rule.
    pub fn route(&self, request: &str, fallback_task_type: &str) -> RouteDecision {
        let request_lower = request.to_lowercase();

        let mut best: Option<(&RoutingRule, f64, f64)> = None;
        for rule in &self.rules {
            let confidence = self.confidence(&request_lower, rule);
            let product = confidence * f64::from(rule.priority);
            debug!(
                worker = %rule.worker_id,
                confidence,
                product,
                "Scored routing rule"
            );
            // Strictly-greater comparison keeps the first-declared rule on ties.
            if best.is_none_or(|(_, _, best_product)| product > best_product) {
                best = Some((rule, confidence, product));
            }
        }

        if let Some((rule, confidence, _)) = best {
            if confidence >= rule.confidence_threshold {
                debug!(worker = %rule.worker_id, confidence, "Routing via rule match");
                return RouteDecision {
                    worker_id: rule.worker_id.clone(),
                    workflow_hint: rule.workflow_hint,
                    confidence,
                    via_fallback: false,
                };
            }
        }

        let worker_id = self
            .fallback
            .get(fallback_task_type)
            .cloned()
            .unwrap_or_else(|| self.default_worker.clone());
        debug!(worker = %worker_id, task_type = fallback_task_type, "Routing via fallback table");
        RouteDecision {
            worker_id,
            workflow_hint: None,
            confidence: 0.0,
            via_fallback: true,
        }
    }

    /// Report the outcome of a routed dispatch, shifting future scores.
    pub fn record_result(&self, worker_id: &str, success: bool, latency: std::time::Duration) {
        self.metrics.record_request(worker_id, success, latency);
    }

    /// Weighted confidence of one rule against a lowercased request.
    pub fn confidence(&self, request_lower: &str, rule: &RoutingRule) -> f64 {
        let keyword_ratio = match_ratio(request_lower, &rule.keywords);
        let pattern_ratio = match_ratio(request_lower, &rule.patterns);
        let history = self
            .metrics
            .success_rate(&rule.worker_id)
            .unwrap_or(NEUTRAL_HISTORY);
        let priority_norm = f64::from(rule.priority) / f64::from(self.max_priority);

        self.weights.keyword * keyword_ratio
            + self.weights.pattern * pattern_ratio
            + self.weights.history * history
            + self.weights.priority * priority_norm
    }
}

/// Fraction of terms found in the request; 0.0 for an empty term set.
fn match_ratio(request_lower: &str, terms: &[String]) -> f64 {
    if terms.is_empty() {
        return 0.0;
    }
    let matched = terms.iter().filter(|t| request_lower.contains(t.as_str())).count();
    #[allow(clippy::cast_precision_loss)]
    {
        matched as f64 / terms.len() as f64
    }
}

/// Static task-type to worker mapping used when no rule clears its
/// threshold.
fn default_fallback_table() -> HashMap<String, String> {
    [
        ("security", "security"),
        ("architecture", "architecture"),
        ("performance", "performance"),
        ("testing", "testing"),
        ("documentation", "documentation"),
        ("general", "generalist"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

/// Built-in rule set, one per worker category.
///
/// The security rule carries a deliberately low threshold so that even a
/// single strong keyword match beats higher-keyword-count but
/// lower-priority categories.
pub fn default_rules() -> Vec<RoutingRule> {
    let rule = |worker: &str, keywords: Vec<&str>, patterns: Vec<&str>, priority, threshold| {
        RoutingRule::new(worker, keywords, patterns, priority, threshold)
            .unwrap_or_else(|_| unreachable!("built-in rules are valid"))
    };
    vec![
        rule(
            "security",
            vec!["injection", "vulnerability", "vulnerabilities", "exploit", "auth", "cve"],
            vec!["sql injection", "security audit", "threat model"],
            10,
            0.25,
        ),
        rule(
            "performance",
            vec!["latency", "slow", "optimize", "profiling", "throughput"],
            vec!["performance regression", "memory usage"],
            8,
            0.5,
        ),
        rule(
            "architecture",
            vec!["design", "refactor", "module", "architecture", "review"],
            vec!["design review", "tech debt"],
            7,
            0.5,
        ),
        rule(
            "testing",
            vec!["test", "coverage", "regression", "flaky"],
            vec!["unit test", "integration test"],
            6,
            0.5,
        ),
        rule(
            "documentation",
            vec!["document", "readme", "docs", "changelog"],
            vec!["api reference"],
            5,
            0.5,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn router_with(rules: Vec<RoutingRule>) -> TaskRouter {
        TaskRouter::new(rules, "generalist", Arc::new(MetricsCollector::new())).unwrap()
    }

    #[test]
    fn test_security_rule_wins_scenario() {
        // Single strong keyword match on a high-priority, low-threshold rule
        // beats a lower-priority category with no match.
        let rules = vec![
            RoutingRule::new("security", vec!["injection", "vulnerability"], vec![], 10, 0.3)
                .unwrap(),
            RoutingRule::new("architecture", vec!["review"], vec![], 7, 0.5).unwrap(),
        ];
        let router = router_with(rules);
        let decision = router.route("Check for SQL injection vulnerabilities", "general");
        assert_eq!(decision.worker_id, "security");
        assert!(!decision.via_fallback);
        assert!(decision.confidence >= 0.3);
    }

    #[test]
    fn test_fallback_when_no_rule_clears_threshold() {
        let rules = vec![
            RoutingRule::new("security", vec!["injection"], vec![], 10, 0.9).unwrap(),
        ];
        let router = router_with(rules);
        let decision = router.route("Summarize the meeting notes", "documentation");
        assert!(decision.via_fallback);
        assert_eq!(decision.worker_id, "documentation");

        let unknown = router.route("Summarize the meeting notes", "nonsense-type");
        assert_eq!(unknown.worker_id, "generalist");
    }

    #[test]
    fn test_tie_keeps_first_declared_rule() {
        let rules = vec![
            RoutingRule::new("alpha", vec!["shared"], vec![], 5, 0.0).unwrap(),
            RoutingRule::new("beta", vec!["shared"], vec![], 5, 0.0).unwrap(),
        ];
        let router = router_with(rules);
        let decision = router.route("a shared request", "general");
        assert_eq!(decision.worker_id, "alpha");
    }

    #[test]
    fn test_history_shifts_confidence() {
        let metrics = Arc::new(MetricsCollector::new());
        let rules = vec![
            RoutingRule::new("testing", vec!["flaky"], vec![], 5, 0.0).unwrap(),
        ];
        let router = TaskRouter::new(rules, "generalist", Arc::clone(&metrics)).unwrap();

        let before = router.confidence("a flaky suite", &router.rules()[0]);
        for _ in 0..10 {
            metrics.record_request("testing", true, std::time::Duration::from_millis(5));
        }
        let after = router.confidence("a flaky suite", &router.rules()[0]);
        assert!(after > before, "history term should raise confidence: {before} -> {after}");
    }

    #[test]
    fn test_confidence_monotone_in_keyword_matches() {
        let rules = vec![
            RoutingRule::new("security", vec!["injection", "exploit", "auth"], vec![], 5, 0.0)
                .unwrap(),
        ];
        let router = router_with(rules);
        let rule = &router.rules()[0];

        let one = router.confidence("an injection report", rule);
        let two = router.confidence("an injection exploit report", rule);
        let three = router.confidence("an injection exploit in auth", rule);
        assert!(one <= two && two <= three);
    }

    #[test]
    fn test_default_rules_validate() {
        for rule in default_rules() {
            rule.validate().unwrap();
        }
    }
}
