//! Execution snapshots returned by the server.
//!
//! [`Workflow`] and [`Task`] are read-only views of server-owned state. Their
//! lifecycle belongs entirely to the server; the client only reads them or
//! issues commands that the server may accept or reject. Almost every
//! field is optional because servers omit what is unset.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use super::definitions::{TaskDef, WorkflowDef, WorkflowTask};

/// Lifecycle status of a workflow instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkflowStatus {
    Running,
    Paused,
    Completed,
    Failed,
    TimedOut,
    Terminated,
}

impl WorkflowStatus {
    /// Returns `true` if the server will not move the workflow further on
    /// its own.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Running | Self::Paused)
    }
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Running => "RUNNING",
            Self::Paused => "PAUSED",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
            Self::TimedOut => "TIMED_OUT",
            Self::Terminated => "TERMINATED",
        };
        f.write_str(s)
    }
}

/// Status of an executed task as reported by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Scheduled,
    InProgress,
    Canceled,
    Failed,
    FailedWithTerminalError,
    Completed,
    CompletedWithErrors,
    TimedOut,
    Skipped,
}

impl TaskStatus {
    /// Returns `true` once the task has finished, successfully or not.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Scheduled | Self::InProgress)
    }
}

/// A workflow instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Workflow {
    pub workflow_id: String,
    pub workflow_name: Option<String>,
    pub workflow_version: Option<u32>,
    pub status: Option<WorkflowStatus>,
    pub correlation_id: Option<String>,
    pub parent_workflow_id: Option<String>,
    pub parent_workflow_task_id: Option<String>,
    pub re_run_from_workflow_id: Option<String>,
    pub reason_for_incompletion: Option<String>,
    pub event: Option<String>,
    pub owner_app: Option<String>,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
    pub create_time: Option<i64>,
    pub update_time: Option<i64>,
    pub start_time: Option<i64>,
    pub end_time: Option<i64>,
    pub last_retried_time: Option<i64>,
    pub priority: Option<i32>,
    /// Executed tasks in scheduling order. Empty unless tasks were requested.
    pub tasks: Vec<Task>,
    pub input: Map<String, Value>,
    pub output: Map<String, Value>,
    pub variables: Map<String, Value>,
    pub task_to_domain: IndexMap<String, String>,
    pub failed_reference_task_names: Vec<String>,
    pub workflow_definition: Option<WorkflowDef>,
    pub external_input_payload_storage_path: Option<String>,
    pub external_output_payload_storage_path: Option<String>,
}

impl Workflow {
    /// Find an executed task by its reference name.
    ///
    /// Loops and retries produce several tasks with the same reference
    /// name; the latest one is returned.
    pub fn task_by_ref(&self, reference_task_name: &str) -> Option<&Task> {
        self.tasks
            .iter()
            .rev()
            .find(|t| t.reference_task_name.as_deref() == Some(reference_task_name))
    }
}

/// One executed step of a workflow instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Task {
    pub task_id: String,
    pub task_type: Option<String>,
    pub status: Option<TaskStatus>,
    pub reference_task_name: Option<String>,
    pub task_def_name: Option<String>,
    pub workflow_instance_id: Option<String>,
    pub workflow_type: Option<String>,
    pub correlation_id: Option<String>,
    pub worker_id: Option<String>,
    pub domain: Option<String>,
    pub reason_for_incompletion: Option<String>,
    pub retried_task_id: Option<String>,
    pub sub_workflow_id: Option<String>,
    pub input_data: Map<String, Value>,
    pub output_data: Map<String, Value>,
    pub seq: Option<u32>,
    pub retry_count: Option<u32>,
    pub poll_count: Option<u32>,
    pub iteration: Option<u32>,
    pub scheduled_time: Option<i64>,
    pub start_time: Option<i64>,
    pub end_time: Option<i64>,
    pub update_time: Option<i64>,
    pub start_delay_in_seconds: Option<u32>,
    pub callback_after_seconds: Option<u64>,
    pub response_timeout_seconds: Option<u64>,
    pub queue_wait_time: Option<i64>,
    pub rate_limit_per_frequency: Option<u32>,
    pub rate_limit_frequency_in_seconds: Option<u32>,
    pub workflow_priority: Option<i32>,
    pub retried: Option<bool>,
    pub executed: Option<bool>,
    pub callback_from_worker: Option<bool>,
    pub subworkflow_changed: Option<bool>,
    pub loop_over_task: Option<bool>,
    pub execution_name_space: Option<String>,
    pub isolation_group_id: Option<String>,
    pub external_input_payload_storage_path: Option<String>,
    pub external_output_payload_storage_path: Option<String>,
    /// The definition node this task was scheduled from.
    pub workflow_task: Option<WorkflowTask>,
    pub task_definition: Option<TaskDef>,
}

/// Condensed workflow view returned by search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkflowSummary {
    pub workflow_id: String,
    pub workflow_type: Option<String>,
    pub version: Option<u32>,
    pub correlation_id: Option<String>,
    pub status: Option<WorkflowStatus>,
    pub start_time: Option<String>,
    pub update_time: Option<String>,
    pub end_time: Option<String>,
    pub reason_for_incompletion: Option<String>,
    pub execution_time: Option<i64>,
    pub failed_reference_task_names: Option<String>,
    pub input: Option<String>,
    pub output: Option<String>,
    pub priority: Option<i32>,
}

/// One page of search hits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult<T> {
    #[serde(default)]
    pub total_hits: u64,
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}
