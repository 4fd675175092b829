//! HTTP-level tests of `ConductorClient` against a mock Conductor server.
//!
//! Tests:
//! - Wire shape: method, path, query and body per operation
//! - Defaults: version, poll count, search paging, boolean flags
//! - Errors: non-2xx as `Error::Transport`, refused connection as `Error::Connection`
//! - Headers: configured defaults and middleware injection
//! - Decoding: definitions with unlisted task types and unmodelled fields

use async_trait::async_trait;
use conductor_client::{
    ApiRequest, ClientConfig, ConductorClient, Error, HttpMiddleware, HttpMiddlewareContext,
    HttpRequest, RerunWorkflowRequest, SearchQuery, SkipTaskRequest, TaskDef, TaskResult,
    TaskStatus, WorkflowStatus,
};
use mockito::{Matcher, Server, ServerGuard};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;

fn client_for(server: &ServerGuard) -> ConductorClient {
    ConductorClient::new(ClientConfig::new(format!("{}/api", server.url()))).unwrap()
}

#[tokio::test]
async fn test_start_workflow_request_shape() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/api/workflow/wf")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("version".into(), "2".into()),
            Matcher::UrlEncoded("correlationId".into(), "corr1".into()),
        ]))
        .match_header("content-type", "application/json")
        .match_body(Matcher::Json(json!({"a": 1})))
        .with_status(200)
        .with_header("content-type", "text/plain")
        .with_body("wf-123")
        .expect(1)
        .create_async()
        .await;

    let client = client_for(&server);
    let id = client
        .start_workflow("wf", Some(2), Some("corr1"), Some(&json!({"a": 1})))
        .await
        .unwrap();

    assert_eq!(id, "wf-123");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_start_workflow_defaults() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/api/workflow/order_flow")
        .match_query(Matcher::Exact("version=1".into()))
        .match_body(Matcher::Json(json!({})))
        .with_body("wf-1")
        .create_async()
        .await;

    let client = client_for(&server);
    let id = client
        .start_workflow("order_flow", None, None, None)
        .await
        .unwrap();

    assert_eq!(id, "wf-1");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_get_workflow_sends_legacy_flag() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/workflow/wf-1")
        .match_query(Matcher::Exact("includeTasks=boolean".into()))
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "workflowId": "wf-1",
                "workflowName": "order_flow",
                "status": "RUNNING",
                "tasks": [
                    {"taskId": "t-1", "referenceTaskName": "charge_ref", "status": "COMPLETED"},
                    {"taskId": "t-2", "referenceTaskName": "ship_ref", "status": "SCHEDULED"}
                ]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client = client_for(&server);
    let workflow = client.get_workflow("wf-1", true).await.unwrap();

    assert_eq!(workflow.workflow_id, "wf-1");
    assert_eq!(workflow.status, Some(WorkflowStatus::Running));
    assert_eq!(workflow.tasks.len(), 2);
    assert_eq!(
        workflow.task_by_ref("ship_ref").and_then(|t| t.status),
        Some(TaskStatus::Scheduled)
    );
    mock.assert_async().await;
}

#[tokio::test]
async fn test_get_workflow_standard_flag_when_configured() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/workflow/wf-1")
        .match_query(Matcher::Exact("includeTasks=true".into()))
        .with_body(json!({"workflowId": "wf-1"}).to_string())
        .create_async()
        .await;

    let config = ClientConfig::new(server.url()).with_legacy_boolean_flags(false);
    let client = ConductorClient::new(config).unwrap();
    client.get_workflow("wf-1", true).await.unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn test_get_correlated_workflows() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/workflow/order_flow/correlated/order-42")
        .match_query(Matcher::Exact("includeTasks=false&includeClosed=boolean".into()))
        .with_body(json!([{"workflowId": "wf-1"}, {"workflowId": "wf-2"}]).to_string())
        .create_async()
        .await;

    let client = client_for(&server);
    let workflows = client
        .get_correlated_workflows("order_flow", "order-42", true, false)
        .await
        .unwrap();

    let ids: Vec<_> = workflows.iter().map(|w| w.workflow_id.as_str()).collect();
    assert_eq!(ids, vec!["wf-1", "wf-2"]);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_poll_for_tasks_omits_domain() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/tasks/poll/batch/encode_video")
        .match_query(Matcher::Exact("workerid=worker-1&count=1".into()))
        .with_body("[]")
        .create_async()
        .await;

    let client = client_for(&server);
    let tasks = client
        .poll_for_tasks("encode_video", "worker-1", None, None)
        .await
        .unwrap();

    assert!(tasks.is_empty());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_poll_for_tasks_with_domain() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/tasks/poll/batch/encode_video")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("workerid".into(), "worker-1".into()),
            Matcher::UrlEncoded("count".into(), "3".into()),
            Matcher::UrlEncoded("domain".into(), "gpu".into()),
        ]))
        .with_body(json!([{"taskId": "t-1", "domain": "gpu"}]).to_string())
        .create_async()
        .await;

    let client = client_for(&server);
    let tasks = client
        .poll_for_tasks("encode_video", "worker-1", Some(3), Some("gpu"))
        .await
        .unwrap();

    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].domain.as_deref(), Some("gpu"));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_poll_for_task_empty_queue() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/tasks/poll/encode_video")
        .match_query(Matcher::UrlEncoded("workerid".into(), "worker-1".into()))
        .with_status(204)
        .create_async()
        .await;

    let client = client_for(&server);
    let task = client
        .poll_for_task("encode_video", "worker-1")
        .await
        .unwrap();

    assert!(task.is_none());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_update_task_and_ack() {
    let mut server = Server::new_async().await;
    let update = server
        .mock("POST", "/api/tasks")
        .match_body(Matcher::Json(json!({
            "workflowInstanceId": "wf-1",
            "taskId": "t-1",
            "status": "COMPLETED",
            "outputData": {"url": "s3://out"}
        })))
        .with_body("t-1")
        .create_async()
        .await;
    let ack = server
        .mock("POST", "/api/tasks/t-1/ack")
        .match_query(Matcher::UrlEncoded("workerid".into(), "worker-1".into()))
        .with_body("true")
        .create_async()
        .await;

    let client = client_for(&server);
    assert!(client.ack_task("t-1", "worker-1").await.unwrap());
    let id = client
        .update_task(&TaskResult::completed("wf-1", "t-1").with_output("url", "s3://out"))
        .await
        .unwrap();

    assert_eq!(id, "t-1");
    update.assert_async().await;
    ack.assert_async().await;
}

#[tokio::test]
async fn test_task_queue_sizes() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/api/tasks/queue/sizes")
        .match_body(Matcher::Json(json!(["encode_video", "publish"])))
        .with_body(json!({"encode_video": 4, "publish": 0}).to_string())
        .create_async()
        .await;

    let client = client_for(&server);
    let sizes = client
        .get_task_queue_sizes(&["encode_video", "publish"])
        .await
        .unwrap();

    assert_eq!(sizes.get("encode_video"), Some(&4));
    assert_eq!(sizes.get("publish"), Some(&0));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_search_defaults() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/workflow/search")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("start".into(), "0".into()),
            Matcher::UrlEncoded("size".into(), "20".into()),
            Matcher::UrlEncoded("sort".into(), "ASC:createTime".into()),
        ]))
        .with_body(
            json!({
                "totalHits": 1,
                "results": [{"workflowId": "wf-1", "workflowType": "order_flow", "status": "FAILED"}]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client = client_for(&server);
    let result = client.search_workflows(&SearchQuery::new()).await.unwrap();

    assert_eq!(result.total_hits, 1);
    assert_eq!(result.results[0].status, Some(WorkflowStatus::Failed));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_metadata_round_trip() {
    let mut server = Server::new_async().await;
    let def = TaskDef::new("encode_video", "media@example.com");
    let register = server
        .mock("POST", "/api/metadata/taskdefs")
        .match_body(Matcher::Json(json!([serde_json::to_value(&def).unwrap()])))
        .with_status(204)
        .create_async()
        .await;
    let unregister = server
        .mock("DELETE", "/api/metadata/workflow/order_flow/1")
        .match_query(Matcher::Exact("version=1".into()))
        .with_status(200)
        .create_async()
        .await;
    let get = server
        .mock("GET", "/api/metadata/taskdefs/encode_video")
        .with_body(
            json!({"name": "encode_video", "ownerEmail": "media@example.com", "ownerApp": "media"})
                .to_string(),
        )
        .create_async()
        .await;

    let client = client_for(&server);
    client.register_task_defs(&[def]).await.unwrap();
    client
        .unregister_workflow_def("order_flow", None)
        .await
        .unwrap();
    let fetched = client.get_task_def("encode_video").await.unwrap();

    assert_eq!(fetched.name, "encode_video");
    assert_eq!(fetched.extra.get("ownerApp"), Some(&json!("media")));
    register.assert_async().await;
    unregister.assert_async().await;
    get.assert_async().await;
}

#[tokio::test]
async fn test_definitions_with_unlisted_task_types_survive_update() {
    let mut server = Server::new_async().await;
    let stored = json!([{
        "name": "order_flow",
        "version": 2,
        "createTime": 1700000000000u64,
        "ownerApp": "shop",
        "inputTemplate": {"priority": "normal"},
        "tasks": [
            {"name": "noop", "taskReferenceName": "noop_ref", "type": "NOOP"},
            {
                "name": "start_child",
                "taskReferenceName": "start_child_ref",
                "type": "START_WORKFLOW",
                "inputParameters": {"startWorkflow": {"name": "child"}}
            },
            {
                "name": "charge",
                "taskReferenceName": "charge_ref",
                "type": "SIMPLE",
                "retryCount": 2,
                "taskDefinition": {"name": "charge", "timeoutSeconds": 60}
            }
        ],
        "inputParameters": [],
        "schemaVersion": 2
    }]);
    let list = server
        .mock("GET", "/api/metadata/workflow")
        .with_header("content-type", "application/json")
        .with_body(stored.to_string())
        .create_async()
        .await;
    let update = server
        .mock("PUT", "/api/metadata/workflow")
        .match_body(Matcher::Json(stored.clone()))
        .with_status(200)
        .expect(1)
        .create_async()
        .await;

    let client = client_for(&server);
    let defs = client.get_all_workflow_defs().await.unwrap();
    assert_eq!(defs.len(), 1);
    let types: Vec<&str> = defs[0].tasks.iter().map(|t| t.type_name()).collect();
    assert_eq!(types, vec!["NOOP", "START_WORKFLOW", "SIMPLE"]);

    client.update_workflow_defs(&defs).await.unwrap();

    list.assert_async().await;
    update.assert_async().await;
}

#[tokio::test]
async fn test_get_workflow_with_unlisted_task_type() {
    let mut server = Server::new_async().await;
    let noop = json!({"name": "noop", "taskReferenceName": "noop_ref", "type": "NOOP"});
    let mock = server
        .mock("GET", "/api/workflow/wf-1")
        .match_query(Matcher::Any)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "workflowId": "wf-1",
                "status": "COMPLETED",
                "tasks": [{
                    "taskId": "t-1",
                    "taskType": "NOOP",
                    "status": "COMPLETED",
                    "referenceTaskName": "noop_ref",
                    "workflowTask": noop.clone()
                }],
                "workflowDefinition": {"name": "wf", "version": 1, "tasks": [noop.clone()]}
            })
            .to_string(),
        )
        .create_async()
        .await;

    let workflow = client_for(&server).get_workflow("wf-1", true).await.unwrap();

    let task = workflow.task_by_ref("noop_ref").unwrap();
    assert_eq!(task.workflow_task.as_ref().map(|t| t.type_name()), Some("NOOP"));
    let def = workflow.workflow_definition.as_ref().unwrap();
    assert_eq!(serde_json::to_value(&def.tasks[0]).unwrap(), noop);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_lifecycle_commands() {
    let mut server = Server::new_async().await;
    let pause = server
        .mock("PUT", "/api/workflow/wf-1/pause")
        .create_async()
        .await;
    let skip = server
        .mock("PUT", "/api/workflow/wf-1/skiptask/charge_ref")
        .match_body(Matcher::Json(json!({"taskInput": {}, "taskOutput": {}})))
        .create_async()
        .await;
    let terminate = server
        .mock("DELETE", "/api/workflow/wf-1")
        .match_query(Matcher::UrlEncoded("reason".into(), "stuck order".into()))
        .create_async()
        .await;
    let rerun = server
        .mock("POST", "/api/workflow/wf-1/rerun")
        .match_body(Matcher::PartialJson(json!({
            "reRunFromWorkflowId": "wf-1",
            "reRunFromTaskId": "t-3"
        })))
        .with_body("wf-1")
        .create_async()
        .await;

    let client = client_for(&server);
    client.pause_workflow("wf-1").await.unwrap();
    client
        .skip_task_from_workflow("wf-1", "charge_ref", Some(&SkipTaskRequest::default()))
        .await
        .unwrap();
    client
        .terminate_workflow("wf-1", Some("stuck order"))
        .await
        .unwrap();
    let id = client
        .rerun_workflow("wf-1", &RerunWorkflowRequest::from_task("wf-1", "t-3"))
        .await
        .unwrap();

    assert_eq!(id, "wf-1");
    pause.assert_async().await;
    skip.assert_async().await;
    terminate.assert_async().await;
    rerun.assert_async().await;
}

#[tokio::test]
async fn test_not_found_surfaces_status_and_body() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/workflow/missing")
        .match_query(Matcher::Any)
        .with_status(404)
        .with_body("{\"message\":\"No such workflow found by id: missing\"}")
        .expect(1)
        .create_async()
        .await;

    let client = client_for(&server);
    let err = client.get_workflow("missing", false).await.unwrap_err();

    assert!(err.is_transport());
    assert_eq!(err.status(), Some(404));
    assert_eq!(
        err.response_body(),
        Some("{\"message\":\"No such workflow found by id: missing\"}")
    );
    mock.assert_async().await;
}

#[tokio::test]
async fn test_server_error_is_not_retried() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("PUT", "/api/workflow/wf-1/resume")
        .with_status(500)
        .with_body("internal")
        .expect(1)
        .create_async()
        .await;

    let client = client_for(&server);
    let err = client.resume_workflow("wf-1").await.unwrap_err();

    match err {
        Error::Transport { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "internal");
        },
        other => panic!("unexpected error: {other:?}"),
    }
    mock.assert_async().await;
}

#[tokio::test]
async fn test_connection_refused() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let client =
        ConductorClient::new(ClientConfig::new(format!("http://127.0.0.1:{}/api", port))).unwrap();
    let err = client.pause_workflow("wf-1").await.unwrap_err();

    assert!(matches!(err, Error::Connection(_)));
    assert_eq!(err.status(), None);
}

struct TokenMiddleware;

#[async_trait]
impl HttpMiddleware for TokenMiddleware {
    async fn on_request(
        &self,
        request: &mut HttpRequest,
        context: &HttpMiddlewareContext,
    ) -> conductor_client::Result<()> {
        request.add_header("X-Authorization", "token-abc");
        if let Some(operation) = &context.operation {
            request.add_header("X-Operation", operation);
        }
        Ok(())
    }
}

#[tokio::test]
async fn test_middleware_and_configured_headers() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/workflow/running/order_flow")
        .match_query(Matcher::Exact("version=1".into()))
        .match_header("content-type", "application/json")
        .match_header("x-authorization", "token-abc")
        .match_header("x-operation", "get_running_workflows")
        .match_header("x-tenant", "acme")
        .with_body("[\"wf-1\"]")
        .create_async()
        .await;

    let config = ClientConfig::new(format!("{}/api", server.url())).with_header("X-Tenant", "acme");
    let client = ConductorClient::new(config)
        .unwrap()
        .with_middleware(Arc::new(TokenMiddleware));
    let running = client
        .get_running_workflows("order_flow", None)
        .await
        .unwrap();

    assert_eq!(running, vec!["wf-1"]);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_execute_raw_request() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/admin/config")
        .with_body("{\"jobs\":3}")
        .create_async()
        .await;

    let client = client_for(&server);
    let response = client
        .execute(ApiRequest::get("/admin/config"))
        .await
        .unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.json::<serde_json::Value>().unwrap(), json!({"jobs": 3}));
    mock.assert_async().await;
}
