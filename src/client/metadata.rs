//! Workflow and task definition operations (`/metadata`).
//!
//! Definitions are sent as-is. The server is the only validator; a
//! malformed definition comes back as [`Error::Transport`](crate::Error::Transport).

use super::request::{segment, ApiRequest};
use super::{ConductorClient, DEFAULT_VERSION};
use crate::error::Result;
use crate::types::{TaskDef, WorkflowDef};

/// `GET /metadata/workflow/{name}?version=`
pub fn get_workflow_def(name: &str, version: Option<u32>) -> ApiRequest {
    ApiRequest::get(format!("/metadata/workflow/{}", segment(name)))
        .query("version", version.unwrap_or(DEFAULT_VERSION))
}

/// `POST /metadata/workflow`
pub fn create_workflow_def(definition: &WorkflowDef) -> Result<ApiRequest> {
    ApiRequest::post("/metadata/workflow").json(definition)
}

/// `PUT /metadata/workflow` with an array body.
pub fn update_workflow_defs(definitions: &[WorkflowDef]) -> Result<ApiRequest> {
    ApiRequest::put("/metadata/workflow").json(definitions)
}

/// `GET /metadata/workflow`
pub fn get_all_workflow_defs() -> ApiRequest {
    ApiRequest::get("/metadata/workflow")
}

/// `DELETE /metadata/workflow/{name}/{version}?version=`
///
/// The version travels in both the path and the query.
pub fn unregister_workflow_def(name: &str, version: Option<u32>) -> ApiRequest {
    let version = version.unwrap_or(DEFAULT_VERSION);
    ApiRequest::delete(format!("/metadata/workflow/{}/{}", segment(name), version))
        .query("version", version)
}

/// `GET /metadata/taskdefs/{name}`
pub fn get_task_def(name: &str) -> ApiRequest {
    ApiRequest::get(format!("/metadata/taskdefs/{}", segment(name)))
}

/// `POST /metadata/taskdefs` with an array body.
pub fn register_task_defs(definitions: &[TaskDef]) -> Result<ApiRequest> {
    ApiRequest::post("/metadata/taskdefs").json(definitions)
}

/// `PUT /metadata/taskdefs`
pub fn update_task_def(definition: &TaskDef) -> Result<ApiRequest> {
    ApiRequest::put("/metadata/taskdefs").json(definition)
}

/// `DELETE /metadata/taskdefs/{name}`
pub fn unregister_task_def(name: &str) -> ApiRequest {
    ApiRequest::delete(format!("/metadata/taskdefs/{}", segment(name)))
}

/// `GET /metadata/taskdefs`
pub fn get_all_task_defs() -> ApiRequest {
    ApiRequest::get("/metadata/taskdefs")
}

impl ConductorClient {
    /// Fetch a workflow definition. `version` defaults to 1.
    pub async fn get_workflow_def(&self, name: &str, version: Option<u32>) -> Result<WorkflowDef> {
        self.send_json("get_workflow_def", get_workflow_def(name, version))
            .await
    }

    /// Register a new workflow definition.
    pub async fn create_workflow_def(&self, definition: &WorkflowDef) -> Result<()> {
        self.send_unit("create_workflow_def", create_workflow_def(definition)?)
            .await
    }

    /// Create or replace several workflow definitions at once.
    pub async fn update_workflow_defs(&self, definitions: &[WorkflowDef]) -> Result<()> {
        self.send_unit("update_workflow_defs", update_workflow_defs(definitions)?)
            .await
    }

    /// List every registered workflow definition.
    pub async fn get_all_workflow_defs(&self) -> Result<Vec<WorkflowDef>> {
        self.send_json("get_all_workflow_defs", get_all_workflow_defs())
            .await
    }

    /// Remove one version of a workflow definition. `version` defaults to 1.
    pub async fn unregister_workflow_def(&self, name: &str, version: Option<u32>) -> Result<()> {
        self.send_unit(
            "unregister_workflow_def",
            unregister_workflow_def(name, version),
        )
        .await
    }

    /// `GET /metadata/taskdefs/{name}`
    pub async fn get_task_def(&self, name: &str) -> Result<TaskDef> {
        self.send_json("get_task_def", get_task_def(name)).await
    }

    /// Register new task definitions in one batch.
    pub async fn register_task_defs(&self, definitions: &[TaskDef]) -> Result<()> {
        self.send_unit("register_task_defs", register_task_defs(definitions)?)
            .await
    }

    /// Replace an existing task definition.
    pub async fn update_task_def(&self, definition: &TaskDef) -> Result<()> {
        self.send_unit("update_task_def", update_task_def(definition)?)
            .await
    }

    /// `DELETE /metadata/taskdefs/{name}`
    pub async fn unregister_task_def(&self, name: &str) -> Result<()> {
        self.send_unit("unregister_task_def", unregister_task_def(name))
            .await
    }

    /// Every registered task definition.
    pub async fn get_all_task_defs(&self) -> Result<Vec<TaskDef>> {
        self.send_json("get_all_task_defs", get_all_task_defs())
            .await
    }
}
