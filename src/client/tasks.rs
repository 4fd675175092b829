//! Task operations (`/tasks`): polling, status updates and queue
//! introspection.

use super::request::{segment, ApiRequest};
use super::ConductorClient;
use crate::error::Result;
use crate::types::{Task, TaskResult};
use indexmap::IndexMap;

/// `GET /tasks/{taskId}`
pub fn get_task(task_id: &str) -> ApiRequest {
    ApiRequest::get(format!("/tasks/{}", segment(task_id)))
}

/// `POST /tasks` with a [`TaskResult`] body.
pub fn update_task(result: &TaskResult) -> Result<ApiRequest> {
    ApiRequest::post("/tasks").json(result)
}

/// `GET /tasks/poll/{taskType}?workerid=`
pub fn poll_for_task(task_type: &str, worker_id: &str) -> ApiRequest {
    ApiRequest::get(format!("/tasks/poll/{}", segment(task_type))).query("workerid", worker_id)
}

/// `GET /tasks/poll/batch/{taskType}?workerid=&count=[&domain=]`
///
/// `count` defaults to 1. `domain` is only sent when it is non-empty.
pub fn poll_for_tasks(
    task_type: &str,
    worker_id: &str,
    count: Option<u32>,
    domain: Option<&str>,
) -> ApiRequest {
    ApiRequest::get(format!("/tasks/poll/batch/{}", segment(task_type)))
        .query("workerid", worker_id)
        .query("count", count.unwrap_or(1))
        .query_opt("domain", domain.filter(|d| !d.is_empty()))
}

/// `POST /tasks/{taskId}/ack?workerid=`
pub fn ack_task(task_id: &str, worker_id: &str) -> ApiRequest {
    ApiRequest::post(format!("/tasks/{}/ack", segment(task_id))).query("workerid", worker_id)
}

/// `GET /tasks/queue/all`
pub fn get_all_tasks_in_queue() -> ApiRequest {
    ApiRequest::get("/tasks/queue/all")
}

/// `DELETE /tasks/queue/{taskType}/{taskId}`
pub fn remove_task_from_queue(task_type: &str, task_id: &str) -> ApiRequest {
    ApiRequest::delete(format!(
        "/tasks/queue/{}/{}",
        segment(task_type),
        segment(task_id)
    ))
}

/// `POST /tasks/queue/sizes` with an array of task names.
pub fn get_task_queue_sizes(task_names: &[&str]) -> Result<ApiRequest> {
    ApiRequest::post("/tasks/queue/sizes").json(task_names)
}

impl ConductorClient {
    /// Fetch a task instance by id.
    pub async fn get_task(&self, task_id: &str) -> Result<Task> {
        self.send_json("get_task", get_task(task_id)).await
    }

    /// Report progress or completion of a task. Returns the task id echoed
    /// by the server.
    pub async fn update_task(&self, result: &TaskResult) -> Result<String> {
        self.send_text("update_task", update_task(result)?).await
    }

    /// Poll for one queued task. `None` when the queue is empty.
    pub async fn poll_for_task(&self, task_type: &str, worker_id: &str) -> Result<Option<Task>> {
        self.send("poll_for_task", poll_for_task(task_type, worker_id))
            .await?
            .json_opt()
    }

    /// Poll for up to `count` queued tasks, optionally restricted to a
    /// domain.
    pub async fn poll_for_tasks(
        &self,
        task_type: &str,
        worker_id: &str,
        count: Option<u32>,
        domain: Option<&str>,
    ) -> Result<Vec<Task>> {
        let response = self
            .send(
                "poll_for_tasks",
                poll_for_tasks(task_type, worker_id, count, domain),
            )
            .await?;
        Ok(response.json_opt()?.unwrap_or_default())
    }

    /// Acknowledge receipt of a polled task.
    pub async fn ack_task(&self, task_id: &str, worker_id: &str) -> Result<bool> {
        let response = self.send("ack_task", ack_task(task_id, worker_id)).await?;
        Ok(response.json_opt()?.unwrap_or(false))
    }

    /// Size of every task queue, keyed by queue name.
    pub async fn get_all_tasks_in_queue(&self) -> Result<IndexMap<String, u64>> {
        self.send_json("get_all_tasks_in_queue", get_all_tasks_in_queue())
            .await
    }

    /// Drop a task from its type's pending queue without changing its status.
    pub async fn remove_task_from_queue(&self, task_type: &str, task_id: &str) -> Result<()> {
        self.send_unit(
            "remove_task_from_queue",
            remove_task_from_queue(task_type, task_id),
        )
        .await
    }

    /// Queue sizes for the given task types.
    pub async fn get_task_queue_sizes(&self, task_names: &[&str]) -> Result<IndexMap<String, u64>> {
        self.send_json("get_task_queue_sizes", get_task_queue_sizes(task_names)?)
            .await
    }
}
