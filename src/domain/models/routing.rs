//! Routing rules and confidence scoring inputs.

use serde::{Deserialize, Serialize};

use crate::domain::errors::{DispatchError, DispatchResult};
use crate::domain::models::plan::WorkflowKind;

/// A declarative routing rule binding a worker category to the request
/// vocabulary that selects it.
///
/// Rules are immutable once the router is constructed; one rule exists per
/// worker category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingRule {
    /// Worker this rule routes to.
    pub worker_id: String,

    /// Single keywords matched anywhere in the request text.
    pub keywords: Vec<String>,

    /// Multi-word phrase patterns matched as substrings.
    pub patterns: Vec<String>,

    /// Declared priority; higher is preferred. Must be > 0.
    pub priority: u32,

    /// Minimum confidence this rule demands before it may win.
    /// Must lie in [0, 1].
    pub confidence_threshold: f64,

    /// Optional workflow shape this category usually implies.
    #[serde(default)]
    pub workflow_hint: Option<WorkflowKind>,
}

impl RoutingRule {
    /// Create a rule, normalizing keywords and patterns to lowercase.
    pub fn new(
        worker_id: impl Into<String>,
        keywords: Vec<&str>,
        patterns: Vec<&str>,
        priority: u32,
        confidence_threshold: f64,
    ) -> DispatchResult<Self> {
        let rule = Self {
            worker_id: worker_id.into(),
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
            patterns: patterns.iter().map(|p| p.to_lowercase()).collect(),
            priority,
            confidence_threshold,
            workflow_hint: None,
        };
        rule.validate()?;
        Ok(rule)
    }

    pub fn with_workflow_hint(mut self, hint: WorkflowKind) -> Self {
        self.workflow_hint = Some(hint);
        self
    }

    /// Enforce the rule invariants: priority > 0, threshold in [0, 1].
    pub fn validate(&self) -> DispatchResult<()> {
        if self.worker_id.is_empty() {
            return Err(DispatchError::ValidationFailed(
                "routing rule worker_id cannot be empty".to_string(),
            ));
        }
        if self.priority == 0 {
            return Err(DispatchError::ValidationFailed(format!(
                "routing rule '{}' priority must be > 0",
                self.worker_id
            )));
        }
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(DispatchError::ValidationFailed(format!(
                "routing rule '{}' threshold {} outside [0, 1]",
                self.worker_id, self.confidence_threshold
            )));
        }
        Ok(())
    }
}

/// Weights for the confidence score terms. The defaults mirror the
/// 40/30/20/10 split of keyword, pattern, history, and priority terms.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ConfidenceWeights {
    pub keyword: f64,
    pub pattern: f64,
    pub history: f64,
    pub priority: f64,
}

impl Default for ConfidenceWeights {
    fn default() -> Self {
        Self {
            keyword: 0.4,
            pattern: 0.3,
            history: 0.2,
            priority: 0.1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_validation_rejects_zero_priority() {
        let result = RoutingRule::new("security", vec!["injection"], vec![], 0, 0.3);
        assert!(result.is_err());
    }

    #[test]
    fn test_rule_validation_rejects_out_of_range_threshold() {
        let result = RoutingRule::new("security", vec!["injection"], vec![], 10, 1.5);
        assert!(result.is_err());
    }

    #[test]
    fn test_rule_normalizes_case() {
        let rule = RoutingRule::new("security", vec!["Injection"], vec!["SQL Injection"], 10, 0.3)
            .unwrap();
        assert_eq!(rule.keywords[0], "injection");
        assert_eq!(rule.patterns[0], "sql injection");
    }

    #[test]
    fn test_default_weights_sum_to_one() {
        let w = ConfidenceWeights::default();
        assert!((w.keyword + w.pattern + w.history + w.priority - 1.0).abs() < f64::EPSILON);
    }
}
