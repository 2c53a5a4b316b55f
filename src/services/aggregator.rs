//! Result aggregation.
//!
//! Collects per-task outcomes and combines them on demand under a
//! selectable strategy. Aggregation is a pure function of the recorded
//! results: two calls without new results yield identical output, and the
//! output is independent of task completion order.

use std::sync::Mutex;
use std::time::Duration;

use crate::domain::models::{AggregatedResult, AggregationStrategy, SpecialistResult};

/// Accumulates `SpecialistResult`s for one workflow run.
#[derive(Debug, Default)]
pub struct ResultAggregator {
    results: Mutex<Vec<SpecialistResult>>,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, result: SpecialistResult) {
        self.lock().push(result);
    }

    pub fn record_all(&self, results: impl IntoIterator<Item = SpecialistResult>) {
        self.lock().extend(results);
    }

    /// Snapshot of the recorded results, in recording order.
    pub fn results(&self) -> Vec<SpecialistResult> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Combine the recorded results under the given strategy.
    pub fn aggregate(&self, strategy: AggregationStrategy) -> AggregatedResult {
        let results = self.results();
        aggregate(&results, strategy)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<SpecialistResult>> {
        self.results
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

/// Strategy application over a result slice. Identity of the tasks matters;
/// their ordering does not affect rates or durations.
pub fn aggregate(results: &[SpecialistResult], strategy: AggregationStrategy) -> AggregatedResult {
    let errors: Vec<String> = results
        .iter()
        .filter(|r| !r.success)
        .map(|r| {
            format!(
                "{}: {}",
                r.task_name,
                r.error.as_deref().unwrap_or("unknown error")
            )
        })
        .collect();

    #[allow(clippy::cast_precision_loss)]
    let success_rate = if results.is_empty() {
        0.0
    } else {
        results.iter().filter(|r| r.success).count() as f64 / results.len() as f64
    };

    match strategy {
        AggregationStrategy::Comprehensive => {
            let total_duration: Duration = results.iter().map(|r| r.duration).sum();
            let avg_duration = if results.is_empty() {
                Duration::ZERO
            } else {
                total_duration / u32::try_from(results.len()).unwrap_or(1)
            };
            AggregatedResult::Comprehensive {
                results: results.to_vec(),
                errors,
                success_rate,
                avg_duration,
                total_duration,
            }
        }
        AggregationStrategy::Summary => AggregatedResult::Summary {
            succeeded: results
                .iter()
                .filter(|r| r.success)
                .map(|r| r.task_name.clone())
                .collect(),
            failed: results
                .iter()
                .filter(|r| !r.success)
                .map(|r| r.task_name.clone())
                .collect(),
            success_rate,
        },
        AggregationStrategy::ErrorsOnly => AggregatedResult::ErrorsOnly { errors },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_results() -> Vec<SpecialistResult> {
        vec![
            SpecialistResult::success("scan", "security", "clean", Duration::from_millis(100)),
            SpecialistResult::failure("probe", "performance", "timed out", Duration::from_millis(300)),
        ]
    }

    #[test]
    fn test_comprehensive_shape() {
        let agg = ResultAggregator::new();
        agg.record_all(sample_results());

        let AggregatedResult::Comprehensive {
            results,
            errors,
            success_rate,
            avg_duration,
            total_duration,
        } = agg.aggregate(AggregationStrategy::Comprehensive)
        else {
            panic!("wrong shape");
        };
        assert_eq!(results.len(), 2);
        assert_eq!(errors, vec!["probe: timed out".to_string()]);
        assert!((success_rate - 0.5).abs() < f64::EPSILON);
        assert_eq!(total_duration, Duration::from_millis(400));
        assert_eq!(avg_duration, Duration::from_millis(200));
    }

    #[test]
    fn test_summary_shape() {
        let agg = ResultAggregator::new();
        agg.record_all(sample_results());

        let AggregatedResult::Summary {
            succeeded, failed, ..
        } = agg.aggregate(AggregationStrategy::Summary)
        else {
            panic!("wrong shape");
        };
        assert_eq!(succeeded, vec!["scan".to_string()]);
        assert_eq!(failed, vec!["probe".to_string()]);
    }

    #[test]
    fn test_aggregation_is_pure() {
        let agg = ResultAggregator::new();
        agg.record_all(sample_results());

        let first = agg.aggregate(AggregationStrategy::Comprehensive);
        let second = agg.aggregate(AggregationStrategy::Comprehensive);
        assert_eq!(
            serde_json::to_value(&first).unwrap(),
            serde_json::to_value(&second).unwrap()
        );
    }

    #[test]
    fn test_rate_commutative_over_order() {
        let mut results = sample_results();
        let forward = aggregate(&results, AggregationStrategy::Summary);
        results.reverse();
        let backward = aggregate(&results, AggregationStrategy::Summary);
        assert!((forward.success_rate() - backward.success_rate()).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_aggregation() {
        let agg = ResultAggregator::new();
        let result = agg.aggregate(AggregationStrategy::ErrorsOnly);
        assert!(result.all_succeeded());
    }
}
