//! Wire types for the Conductor REST API.
//!
//! - [`definitions`] - task and workflow definitions (metadata)
//! - [`execution`] - workflow and task snapshots returned by the server
//! - [`requests`] - request bodies and query parameter sets

pub mod definitions;
pub mod execution;
pub mod requests;

pub use definitions::{
    EvaluatorType, RetryLogic, SubWorkflowParams, TaskDef, TaskKind, TaskTimeoutPolicy,
    WorkflowDef, WorkflowTask, WorkflowTimeoutPolicy,
};
pub use execution::{
    SearchResult, Task, TaskStatus, Workflow, WorkflowStatus, WorkflowSummary,
};
pub use requests::{
    RerunWorkflowRequest, SearchQuery, SkipTaskRequest, TaskResult, TaskResultStatus,
};
