//! Request bodies and query parameter sets.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Status a worker may report for a task it is executing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskResultStatus {
    /// Still running; the server re-queues it after `callbackAfterSeconds`.
    InProgress,
    /// Failed; the server applies the task definition's retry policy.
    Failed,
    /// Failed without retry.
    FailedWithTerminalError,
    Completed,
}

/// Body of `POST /tasks`: a worker's report on a task.
///
/// ```
/// use conductor_client::{TaskResult, TaskResultStatus};
///
/// let result = TaskResult::new("wf-1", "t-1", TaskResultStatus::Completed)
///     .with_output("url", "s3://bucket/video.mp4");
/// assert_eq!(result.output_data.as_ref().unwrap()["url"], "s3://bucket/video.mp4");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResult {
    pub workflow_instance_id: String,
    pub task_id: String,
    pub status: TaskResultStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason_for_incompletion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_after_seconds: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_data: Option<Map<String, Value>>,
}

impl TaskResult {
    pub fn new(
        workflow_instance_id: impl Into<String>,
        task_id: impl Into<String>,
        status: TaskResultStatus,
    ) -> Self {
        Self {
            workflow_instance_id: workflow_instance_id.into(),
            task_id: task_id.into(),
            status,
            reason_for_incompletion: None,
            callback_after_seconds: None,
            output_data: None,
        }
    }

    /// A completed report.
    pub fn completed(workflow_instance_id: impl Into<String>, task_id: impl Into<String>) -> Self {
        Self::new(workflow_instance_id, task_id, TaskResultStatus::Completed)
    }

    /// A failed report with a reason.
    pub fn failed(
        workflow_instance_id: impl Into<String>,
        task_id: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        let mut result = Self::new(workflow_instance_id, task_id, TaskResultStatus::Failed);
        result.reason_for_incompletion = Some(reason.into());
        result
    }

    /// Add one output value.
    pub fn with_output(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.output_data
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        self
    }

    /// Ask the server to call back after `seconds` (for `IN_PROGRESS`).
    pub fn with_callback_after(mut self, seconds: u64) -> Self {
        self.callback_after_seconds = Some(seconds);
        self
    }
}

/// Body of `PUT /workflow/{id}/skiptask/{ref}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkipTaskRequest {
    #[serde(default)]
    pub task_input: Map<String, Value>,
    #[serde(default)]
    pub task_output: Map<String, Value>,
}

/// Body of `POST /workflow/{id}/rerun`.
///
/// Execution resumes from `re_run_from_task_id`, with `task_input` and
/// `workflow_input` substituted for the recorded inputs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RerunWorkflowRequest {
    pub re_run_from_workflow_id: String,
    #[serde(default)]
    pub workflow_input: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub re_run_from_task_id: Option<String>,
    #[serde(default)]
    pub task_input: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

impl RerunWorkflowRequest {
    pub fn from_task(workflow_id: impl Into<String>, task_id: impl Into<String>) -> Self {
        Self {
            re_run_from_workflow_id: workflow_id.into(),
            re_run_from_task_id: Some(task_id.into()),
            ..Default::default()
        }
    }
}

/// Query parameters of `GET /workflow/search`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    /// Offset of the first hit. Default `0`.
    pub start: u32,
    /// Page size. Default `20`.
    pub size: u32,
    /// Sort spec `ASC|DESC:field`. Default `ASC:createTime`.
    pub sort: String,
    pub free_text: Option<String>,
    pub query: Option<String>,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            start: 0,
            size: 20,
            sort: "ASC:createTime".to_string(),
            free_text: None,
            query: None,
        }
    }
}

impl SearchQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, start: u32, size: u32) -> Self {
        self.start = start;
        self.size = size;
        self
    }

    pub fn sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = sort.into();
        self
    }

    pub fn free_text(mut self, text: impl Into<String>) -> Self {
        self.free_text = Some(text.into());
        self
    }

    /// Structured filter, e.g. `workflowType IN (order_flow) AND status IN (FAILED)`.
    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }
}
