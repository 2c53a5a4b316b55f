//! Per-workflow timing and the parallel-efficiency diagnostic.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Start/end timestamps of one task inside a workflow.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TaskSpan {
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

/// Timing record of one workflow execution. Lives for the duration of the
/// run; the caller persists it externally if it cares.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceRecord {
    pub workflow_name: String,
    pub task_count: usize,
    pub started_at: DateTime<Utc>,
    pub task_spans: HashMap<String, TaskSpan>,
    /// `sum(task durations) / (wall_clock * max_concurrency)`, capped at
    /// 1.0. Diagnostic only; never alters scheduling.
    pub parallel_efficiency: Option<f64>,
}

impl PerformanceRecord {
    fn new(workflow_name: &str, task_count: usize) -> Self {
        Self {
            workflow_name: workflow_name.to_string(),
            task_count,
            started_at: Utc::now(),
            task_spans: HashMap::new(),
            parallel_efficiency: None,
        }
    }
}

/// Records task spans for in-flight workflows.
#[derive(Debug, Default)]
pub struct PerformanceMonitor {
    records: Mutex<HashMap<String, PerformanceRecord>>,
}

impl PerformanceMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_workflow(&self, workflow_name: &str, task_count: usize) {
        let mut records = self.lock();
        records.insert(
            workflow_name.to_string(),
            PerformanceRecord::new(workflow_name, task_count),
        );
    }

    pub fn task_started(&self, workflow_name: &str, task_name: &str) {
        let mut records = self.lock();
        if let Some(record) = records.get_mut(workflow_name) {
            record.task_spans.insert(
                task_name.to_string(),
                TaskSpan {
                    started_at: Utc::now(),
                    ended_at: None,
                },
            );
        }
    }

    pub fn task_finished(&self, workflow_name: &str, task_name: &str) {
        let mut records = self.lock();
        if let Some(span) = records
            .get_mut(workflow_name)
            .and_then(|r| r.task_spans.get_mut(task_name))
        {
            span.ended_at = Some(Utc::now());
        }
    }

    /// Close out a workflow: compute parallel efficiency and return the
    /// record, removing it from the in-flight table.
    pub fn finish_workflow(
        &self,
        workflow_name: &str,
        max_concurrency: usize,
    ) -> Option<PerformanceRecord> {
        let mut record = self.lock().remove(workflow_name)?;

        let now = Utc::now();
        let wall_clock = (now - record.started_at).to_std().unwrap_or_default();
        let busy: f64 = record
            .task_spans
            .values()
            .map(|span| {
                (span.ended_at.unwrap_or(now) - span.started_at)
                    .to_std()
                    .unwrap_or_default()
                    .as_secs_f64()
            })
            .sum();

        #[allow(clippy::cast_precision_loss)]
        let denominator = wall_clock.as_secs_f64() * max_concurrency.max(1) as f64;
        if denominator > 0.0 {
            record.parallel_efficiency = Some((busy / denominator).min(1.0));
        }
        debug!(
            workflow = workflow_name,
            efficiency = ?record.parallel_efficiency,
            "Workflow timing closed"
        );
        Some(record)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, PerformanceRecord>> {
        self.records
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
