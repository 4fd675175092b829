//! Workflow execution operations (`/workflow`).
//!
//! Lifecycle commands are forwarded unconditionally. Whether a transition
//! such as pause or resume is legal is decided by the server and reported
//! only through the response status.

use super::request::{segment, ApiRequest};
use super::{ConductorClient, DEFAULT_VERSION};
use crate::config::ClientConfig;
use crate::error::Result;
use crate::types::{
    RerunWorkflowRequest, SearchQuery, SearchResult, SkipTaskRequest, Workflow, WorkflowSummary,
};
use serde_json::{Map, Value};

/// `GET /workflow/{workflowId}?includeTasks=`
pub fn get_workflow(config: &ClientConfig, workflow_id: &str, include_tasks: bool) -> ApiRequest {
    ApiRequest::get(format!("/workflow/{}", segment(workflow_id)))
        .query("includeTasks", config.flag_value(include_tasks))
}

/// `GET /workflow/running/{name}?version=`
pub fn get_running_workflows(name: &str, version: Option<u32>) -> ApiRequest {
    ApiRequest::get(format!("/workflow/running/{}", segment(name)))
        .query("version", version.unwrap_or(DEFAULT_VERSION))
}

/// `GET /workflow/search?start=&size=&sort=[&freeText=][&query=]`
pub fn search_workflows(search: &SearchQuery) -> ApiRequest {
    ApiRequest::get("/workflow/search")
        .query("start", search.start)
        .query("size", search.size)
        .query("sort", &search.sort)
        .query_opt("freeText", search.free_text.as_deref())
        .query_opt("query", search.query.as_deref())
}

/// `POST /workflow/{name}?version=[&correlationId=]`
///
/// The body is the workflow input, `{}` when none is given.
pub fn start_workflow(
    name: &str,
    version: Option<u32>,
    correlation_id: Option<&str>,
    input: Option<&Value>,
) -> Result<ApiRequest> {
    let request = ApiRequest::post(format!("/workflow/{}", segment(name)))
        .query("version", version.unwrap_or(DEFAULT_VERSION))
        .query_opt("correlationId", correlation_id);
    match input {
        Some(input) => request.json(input),
        None => request.json(&Map::new()),
    }
}

/// `DELETE /workflow/{workflowId}[?reason=]`
pub fn terminate_workflow(workflow_id: &str, reason: Option<&str>) -> ApiRequest {
    ApiRequest::delete(format!("/workflow/{}", segment(workflow_id))).query_opt("reason", reason)
}

/// `DELETE /workflow/{workflowId}/remove[?reason=]`
pub fn delete_workflow_from_system(workflow_id: &str, reason: Option<&str>) -> ApiRequest {
    ApiRequest::delete(format!("/workflow/{}/remove", segment(workflow_id)))
        .query_opt("reason", reason)
}

/// `PUT /workflow/{workflowId}/pause`
pub fn pause_workflow(workflow_id: &str) -> ApiRequest {
    ApiRequest::put(format!("/workflow/{}/pause", segment(workflow_id)))
}

/// `PUT /workflow/{workflowId}/resume`
pub fn resume_workflow(workflow_id: &str) -> ApiRequest {
    ApiRequest::put(format!("/workflow/{}/resume", segment(workflow_id)))
}

/// `PUT /workflow/{workflowId}/skiptask/{taskReferenceName}`
///
/// Without a request body the task is skipped with empty input and output.
pub fn skip_task_from_workflow(
    workflow_id: &str,
    task_reference_name: &str,
    request: Option<&SkipTaskRequest>,
) -> Result<ApiRequest> {
    let path = format!(
        "/workflow/{}/skiptask/{}",
        segment(workflow_id),
        segment(task_reference_name)
    );
    match request {
        Some(request) => ApiRequest::put(path).json(request),
        None => ApiRequest::put(path).json(&SkipTaskRequest::default()),
    }
}

/// `POST /workflow/{workflowId}/rerun`
pub fn rerun_workflow(workflow_id: &str, request: &RerunWorkflowRequest) -> Result<ApiRequest> {
    ApiRequest::post(format!("/workflow/{}/rerun", segment(workflow_id))).json(request)
}

/// `POST /workflow/{workflowId}/retry`
pub fn retry_workflow(workflow_id: &str) -> ApiRequest {
    ApiRequest::post(format!("/workflow/{}/retry", segment(workflow_id)))
}

/// `POST /workflow/{workflowId}/restart`
pub fn restart_workflow(workflow_id: &str) -> ApiRequest {
    ApiRequest::post(format!("/workflow/{}/restart", segment(workflow_id)))
}

/// `GET /workflow/{name}/correlated/{correlationId}?includeTasks=&includeClosed=`
pub fn get_correlated_workflows(
    config: &ClientConfig,
    name: &str,
    correlation_id: &str,
    include_closed: bool,
    include_tasks: bool,
) -> ApiRequest {
    ApiRequest::get(format!(
        "/workflow/{}/correlated/{}",
        segment(name),
        segment(correlation_id)
    ))
    .query("includeTasks", config.flag_value(include_tasks))
    .query("includeClosed", config.flag_value(include_closed))
}

impl ConductorClient {
    /// Fetch a workflow instance, with its tasks if `include_tasks` is set.
    pub async fn get_workflow(&self, workflow_id: &str, include_tasks: bool) -> Result<Workflow> {
        let request = get_workflow(self.config(), workflow_id, include_tasks);
        self.send_json("get_workflow", request).await
    }

    /// Ids of running instances of a workflow. `version` defaults to 1.
    pub async fn get_running_workflows(
        &self,
        name: &str,
        version: Option<u32>,
    ) -> Result<Vec<String>> {
        self.send_json("get_running_workflows", get_running_workflows(name, version))
            .await
    }

    /// Search workflow executions.
    ///
    /// ```rust,no_run
    /// # use conductor_client::{ConductorClient, SearchQuery};
    /// # async fn example(client: &ConductorClient) -> conductor_client::Result<()> {
    /// let failed = client
    ///     .search_workflows(&SearchQuery::new().query("status IN (FAILED)").page(0, 50))
    ///     .await?;
    /// println!("{} failed executions", failed.total_hits);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn search_workflows(
        &self,
        search: &SearchQuery,
    ) -> Result<SearchResult<WorkflowSummary>> {
        self.send_json("search_workflows", search_workflows(search))
            .await
    }

    /// Start a workflow and return the new instance id.
    ///
    /// `version` defaults to 1 and `input` to `{}`.
    pub async fn start_workflow(
        &self,
        name: &str,
        version: Option<u32>,
        correlation_id: Option<&str>,
        input: Option<&Value>,
    ) -> Result<String> {
        let request = start_workflow(name, version, correlation_id, input)?;
        self.send_text("start_workflow", request).await
    }

    /// Terminate a running workflow, recording `reason` if given.
    pub async fn terminate_workflow(&self, workflow_id: &str, reason: Option<&str>) -> Result<()> {
        self.send_unit("terminate_workflow", terminate_workflow(workflow_id, reason))
            .await
    }

    /// Remove a workflow instance and its tasks from the server.
    pub async fn delete_workflow_from_system(
        &self,
        workflow_id: &str,
        reason: Option<&str>,
    ) -> Result<()> {
        self.send_unit(
            "delete_workflow_from_system",
            delete_workflow_from_system(workflow_id, reason),
        )
        .await
    }

    /// Pause a running workflow. Scheduled tasks keep running; no new ones start.
    pub async fn pause_workflow(&self, workflow_id: &str) -> Result<()> {
        self.send_unit("pause_workflow", pause_workflow(workflow_id))
            .await
    }

    /// Resume a paused workflow.
    pub async fn resume_workflow(&self, workflow_id: &str) -> Result<()> {
        self.send_unit("resume_workflow", resume_workflow(workflow_id))
            .await
    }

    /// Mark a task as skipped, recording the given input and output.
    pub async fn skip_task_from_workflow(
        &self,
        workflow_id: &str,
        task_reference_name: &str,
        request: Option<&SkipTaskRequest>,
    ) -> Result<()> {
        let request = skip_task_from_workflow(workflow_id, task_reference_name, request)?;
        self.send_unit("skip_task_from_workflow", request).await
    }

    /// Re-run a workflow from a prior task. Returns the workflow id.
    pub async fn rerun_workflow(
        &self,
        workflow_id: &str,
        request: &RerunWorkflowRequest,
    ) -> Result<String> {
        self.send_text("rerun_workflow", rerun_workflow(workflow_id, request)?)
            .await
    }

    /// Retry the last failed task of a workflow.
    pub async fn retry_workflow(&self, workflow_id: &str) -> Result<()> {
        self.send_unit("retry_workflow", retry_workflow(workflow_id))
            .await
    }

    /// Restart a completed workflow from the beginning.
    pub async fn restart_workflow(&self, workflow_id: &str) -> Result<()> {
        self.send_unit("restart_workflow", restart_workflow(workflow_id))
            .await
    }

    /// Workflow instances sharing a correlation id.
    pub async fn get_correlated_workflows(
        &self,
        name: &str,
        correlation_id: &str,
        include_closed: bool,
        include_tasks: bool,
    ) -> Result<Vec<Workflow>> {
        let request = get_correlated_workflows(
            self.config(),
            name,
            correlation_id,
            include_closed,
            include_tasks,
        );
        self.send_json("get_correlated_workflows", request).await
    }
}
