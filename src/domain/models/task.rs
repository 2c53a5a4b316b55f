//! Workflow task definitions consumed by the orchestrators.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::errors::{DispatchError, DispatchResult};

/// Hard cap on the tool/capability list carried by a single task.
pub const MAX_TOOLS_PER_TASK: usize = 6;

/// Mutable key/value state threaded through a workflow run.
///
/// Sequential steps publish their output under `step_<i>_result`; loop
/// iterations under `iteration_<n>_result`.
pub type TaskContext = HashMap<String, serde_json::Value>;

/// What the executor does when a step fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorBehavior {
    /// Abort the remaining chain.
    Halt,
    /// Record the failure and proceed.
    Continue,
    /// Re-invoke the step up to `retry_count` times, then continue.
    Retry,
}

impl Default for ErrorBehavior {
    fn default() -> Self {
        Self::Halt
    }
}

/// A single unit of work handed to a capability provider.
///
/// Created when a plan is built and consumed exactly once by the executor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowTask {
    /// Unique within its plan.
    pub name: String,

    /// Instruction text sent to the worker.
    pub instruction: String,

    /// Worker this task is routed to.
    pub worker_id: String,

    /// Tools the worker may use; at most `MAX_TOOLS_PER_TASK`.
    pub tools: Vec<String>,

    /// Per-task time budget.
    #[serde(with = "duration_secs")]
    pub timeout: Duration,

    /// Retries allowed under `ErrorBehavior::Retry`.
    pub retry_count: u32,

    /// Failure policy for this step.
    pub error_behavior: ErrorBehavior,
}

impl WorkflowTask {
    pub fn new(
        name: impl Into<String>,
        instruction: impl Into<String>,
        worker_id: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            instruction: instruction.into(),
            worker_id: worker_id.into(),
            tools: Vec::new(),
            timeout: Duration::from_secs(30),
            retry_count: 0,
            error_behavior: ErrorBehavior::default(),
        }
    }

    pub fn with_tools(mut self, tools: Vec<&str>) -> Self {
        self.tools = tools.into_iter().map(String::from).collect();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retries(mut self, retry_count: u32) -> Self {
        self.retry_count = retry_count;
        self.error_behavior = ErrorBehavior::Retry;
        self
    }

    pub fn with_error_behavior(mut self, behavior: ErrorBehavior) -> Self {
        self.error_behavior = behavior;
        self
    }

    /// Fail-fast validation applied at plan-build time.
    pub fn validate(&self) -> DispatchResult<()> {
        if self.name.trim().is_empty() {
            return Err(DispatchError::Construction(
                "task name cannot be empty".to_string(),
            ));
        }
        if self.tools.len() > MAX_TOOLS_PER_TASK {
            return Err(DispatchError::Construction(format!(
                "task '{}' declares {} tools, maximum is {}",
                self.name,
                self.tools.len(),
                MAX_TOOLS_PER_TASK
            )));
        }
        Ok(())
    }
}

/// An independent task inside a parallel batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParallelTask {
    pub name: String,
    pub instruction: String,
    pub worker_id: String,
    pub tools: Vec<String>,
    #[serde(with = "duration_secs")]
    pub timeout: Duration,
}

impl ParallelTask {
    pub fn new(
        name: impl Into<String>,
        instruction: impl Into<String>,
        worker_id: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            instruction: instruction.into(),
            worker_id: worker_id.into(),
            tools: Vec::new(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_tools(mut self, tools: Vec<&str>) -> Self {
        self.tools = tools.into_iter().map(String::from).collect();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Batch tasks never retry; a timeout or failure is recorded and the
    /// rest of the batch keeps going.
    pub fn into_workflow_task(self) -> WorkflowTask {
        WorkflowTask {
            name: self.name,
            instruction: self.instruction,
            worker_id: self.worker_id,
            tools: self.tools,
            timeout: self.timeout,
            retry_count: 0,
            error_behavior: ErrorBehavior::Continue,
        }
    }

    pub fn validate(&self) -> DispatchResult<()> {
        if self.name.trim().is_empty() {
            return Err(DispatchError::Construction(
                "parallel task name cannot be empty".to_string(),
            ));
        }
        if self.tools.len() > MAX_TOOLS_PER_TASK {
            return Err(DispatchError::Construction(format!(
                "parallel task '{}' declares {} tools, maximum is {}",
                self.name,
                self.tools.len(),
                MAX_TOOLS_PER_TASK
            )));
        }
        Ok(())
    }
}

/// Ordered sequence of tasks for sequential execution.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskChain {
    pub tasks: Vec<WorkflowTask>,
}

impl TaskChain {
    pub fn new(tasks: Vec<WorkflowTask>) -> Self {
        Self { tasks }
    }

    pub fn push(&mut self, task: WorkflowTask) {
        self.tasks.push(task);
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Validate the whole chain before anything executes.
    pub fn validate(&self) -> DispatchResult<()> {
        if self.tasks.is_empty() {
            return Err(DispatchError::Construction(
                "task chain cannot be empty".to_string(),
            ));
        }
        let mut names = HashSet::new();
        for task in &self.tasks {
            task.validate()?;
            if !names.insert(task.name.as_str()) {
                return Err(DispatchError::Construction(format!(
                    "duplicate task name '{}' in chain",
                    task.name
                )));
            }
        }
        Ok(())
    }
}

/// Context key a sequential step publishes its output under.
pub fn step_result_key(index: usize) -> String {
    format!("step_{index}_result")
}

/// Context key a loop iteration publishes its output under.
pub fn iteration_result_key(iteration: u32) -> String {
    format!("iteration_{iteration}_result")
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(d)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_validation_rejects_tool_overflow() {
        let task = WorkflowTask::new("scan", "scan the repo", "security")
            .with_tools(vec!["a", "b", "c", "d", "e", "f", "g"]);
        let err = task.validate().unwrap_err();
        assert!(matches!(err, DispatchError::Construction(_)));
    }

    #[test]
    fn test_task_validation_rejects_blank_name() {
        let task = WorkflowTask::new("  ", "do something", "generalist");
        assert!(task.validate().is_err());
    }

    #[test]
    fn test_empty_chain_rejected() {
        let chain = TaskChain::default();
        assert!(chain.validate().is_err());
    }

    #[test]
    fn test_chain_rejects_duplicate_names() {
        let chain = TaskChain::new(vec![
            WorkflowTask::new("scan", "scan the repo", "security"),
            WorkflowTask::new("scan", "scan it again", "security"),
        ]);
        let err = chain.validate().unwrap_err();
        assert!(matches!(err, DispatchError::Construction(_)));
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_step_result_keys() {
        assert_eq!(step_result_key(0), "step_0_result");
        assert_eq!(iteration_result_key(2), "iteration_2_result");
    }

    #[test]
    fn test_parallel_task_conversion_continues_on_error() {
        let task = ParallelTask::new("probe", "probe it", "performance").into_workflow_task();
        assert_eq!(task.error_behavior, ErrorBehavior::Continue);
        assert_eq!(task.retry_count, 0);
    }
}
