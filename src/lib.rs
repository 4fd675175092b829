//! # Conductor Client
//!
//! A typed async client for the Conductor workflow engine REST API.
//!
//! The client is a thin proxy: every method issues exactly one HTTP request
//! against the configured server and decodes the response. There is no
//! local state, caching, retrying or validation. Workflow and task
//! definitions are checked only by the server, and any non-2xx answer
//! surfaces as [`Error::Transport`] with the raw status and body.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use conductor_client::{ClientConfig, ConductorClient, TaskResult, WorkflowDef, WorkflowTask};
//! use serde_json::json;
//!
//! # async fn example() -> conductor_client::Result<()> {
//! let client = ConductorClient::new(
//!     ClientConfig::new("http://localhost:8080/api").with_header("X-Authorization", "token"),
//! )?;
//!
//! // Register a definition
//! let def = WorkflowDef::new("encode_and_publish", 1)
//!     .with_owner("media@example.com")
//!     .with_task(WorkflowTask::simple("encode_video", "encode"));
//! client.create_workflow_def(&def).await?;
//!
//! // Start it
//! let workflow_id = client
//!     .start_workflow("encode_and_publish", None, None, Some(&json!({"file": "a.mov"})))
//!     .await?;
//!
//! // Work on it
//! if let Some(task) = client.poll_for_task("encode_video", "worker-1").await? {
//!     client
//!         .update_task(&TaskResult::completed(&workflow_id, &task.task_id).with_output("url", "s3://out"))
//!         .await?;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! - `logging` (default): enables [`init_logging`] via `tracing-subscriber`.

#![warn(missing_debug_implementations)]

pub mod client;
pub mod config;
pub mod error;
pub mod types;

pub use client::http_logging_middleware::HttpLoggingMiddleware;
pub use client::http_middleware::{
    HttpMiddleware, HttpMiddlewareChain, HttpMiddlewareContext, HttpRequest, HttpResponse,
};
pub use client::{ApiRequest, ApiResponse, ConductorClient, DEFAULT_VERSION};
pub use config::ClientConfig;
pub use error::{Error, Result};
pub use types::{
    EvaluatorType, RerunWorkflowRequest, RetryLogic, SearchQuery, SearchResult, SkipTaskRequest,
    SubWorkflowParams, Task, TaskDef, TaskKind, TaskResult, TaskResultStatus, TaskStatus,
    TaskTimeoutPolicy, Workflow, WorkflowDef, WorkflowStatus, WorkflowSummary, WorkflowTask,
    WorkflowTimeoutPolicy,
};

/// Install a `fmt` subscriber filtered by `RUST_LOG` (default `info`).
///
/// Does nothing if a global subscriber is already set.
#[cfg(feature = "logging")]
pub fn init_logging() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
