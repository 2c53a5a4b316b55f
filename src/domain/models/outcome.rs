//! Per-task results and the aggregated shapes reported to callers.

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::errors::DispatchError;

/// Outcome of exactly one task execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecialistResult {
    pub task_name: String,
    pub worker_id: String,
    pub success: bool,
    /// Payload on success.
    pub output: Option<String>,
    /// Error description on failure.
    pub error: Option<String>,
    /// Wall-clock duration of the invocation, including retries.
    #[serde(with = "duration_millis")]
    pub duration: Duration,
}

impl SpecialistResult {
    pub fn success(
        task_name: impl Into<String>,
        worker_id: impl Into<String>,
        output: impl Into<String>,
        duration: Duration,
    ) -> Self {
        Self {
            task_name: task_name.into(),
            worker_id: worker_id.into(),
            success: true,
            output: Some(output.into()),
            error: None,
            duration,
        }
    }

    pub fn failure(
        task_name: impl Into<String>,
        worker_id: impl Into<String>,
        error: impl Into<String>,
        duration: Duration,
    ) -> Self {
        Self {
            task_name: task_name.into(),
            worker_id: worker_id.into(),
            success: false,
            output: None,
            error: Some(error.into()),
            duration,
        }
    }
}

/// How multiple task outcomes are combined into one reported result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationStrategy {
    #[default]
    Comprehensive,
    Summary,
    ErrorsOnly,
}

impl AggregationStrategy {
    /// Parse a strategy name, degrading an unknown name to the
    /// comprehensive shape instead of failing the whole call.
    pub fn parse_or_comprehensive(name: &str) -> Self {
        name.parse().unwrap_or_else(|_| {
            warn!(strategy = name, "Unknown aggregation strategy, using comprehensive");
            Self::Comprehensive
        })
    }
}

impl FromStr for AggregationStrategy {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "comprehensive" | "full" => Ok(Self::Comprehensive),
            "summary" => Ok(Self::Summary),
            "errors" | "errors_only" | "errors-only" => Ok(Self::ErrorsOnly),
            other => Err(DispatchError::Aggregation(other.to_string())),
        }
    }
}

/// Combined view over a set of `SpecialistResult`s. Derived on demand,
/// never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum AggregatedResult {
    Comprehensive {
        results: Vec<SpecialistResult>,
        errors: Vec<String>,
        success_rate: f64,
        #[serde(with = "duration_millis")]
        avg_duration: Duration,
        #[serde(with = "duration_millis")]
        total_duration: Duration,
    },
    Summary {
        succeeded: Vec<String>,
        failed: Vec<String>,
        success_rate: f64,
    },
    ErrorsOnly {
        errors: Vec<String>,
    },
}

impl AggregatedResult {
    /// Fraction of tasks that succeeded, in [0, 1].
    pub fn success_rate(&self) -> f64 {
        match self {
            Self::Comprehensive { success_rate, .. } | Self::Summary { success_rate, .. } => {
                *success_rate
            }
            Self::ErrorsOnly { errors } => {
                if errors.is_empty() {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    /// True when every recorded task succeeded.
    pub fn all_succeeded(&self) -> bool {
        match self {
            Self::Comprehensive { errors, .. } | Self::ErrorsOnly { errors } => errors.is_empty(),
            Self::Summary { failed, .. } => failed.is_empty(),
        }
    }
}

mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}
