//! Metadata types: task definitions and workflow definitions.
//!
//! A [`WorkflowDef`] is a named, versioned tree of [`WorkflowTask`] nodes.
//! Each node carries the fields common to every task type and a
//! [`TaskKind`] holding the fields specific to its `type` tag. Branching
//! kinds (`DECISION`, `SWITCH`, `FORK_JOIN`, `DO_WHILE`) embed further
//! nodes, so the tree is recursive.
//!
//! # Serialization
//!
//! Field names are `camelCase` on the wire. The `type` tag and the
//! variant fields are flattened into the node object, matching the
//! server's JSON exactly:
//!
//! ```
//! use conductor_client::{TaskKind, WorkflowTask};
//! use serde_json::json;
//!
//! let join = WorkflowTask::new(
//!     "join",
//!     "join_ref",
//!     TaskKind::Join { join_on: vec!["a".into(), "b".into()] },
//! );
//! assert_eq!(
//!     serde_json::to_value(&join).unwrap(),
//!     json!({
//!         "name": "join",
//!         "taskReferenceName": "join_ref",
//!         "type": "JOIN",
//!         "joinOn": ["a", "b"]
//!     })
//! );
//! ```
//!
//! Task types with no [`TaskKind`] variant decode as [`TaskKind::Other`],
//! and fields no type models land in the `extra` maps, so definitions
//! read from a server can be sent back without losing anything.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// How a failed task is rescheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RetryLogic {
    /// Reschedule after `retryDelaySeconds`.
    Fixed,
    /// Reschedule after `retryDelaySeconds * 2^attempt`.
    ExponentialBackoff,
    /// Reschedule after `retryDelaySeconds * attempt`.
    LinearBackoff,
}

/// What the server does when a task times out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskTimeoutPolicy {
    /// Retry the task.
    #[serde(rename = "RETRY")]
    Retry,
    /// Mark the workflow `TIMED_OUT` and terminate it.
    #[serde(rename = "TIME_OUT_WF")]
    TimeOutWorkflow,
    /// Only register a timeout counter.
    #[serde(rename = "ALERT_ONLY")]
    AlertOnly,
}

/// What the server does when a workflow times out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkflowTimeoutPolicy {
    /// Mark the workflow `TIMED_OUT` and terminate it.
    #[serde(rename = "TIME_OUT_WF")]
    TimeOutWorkflow,
    /// Only register a timeout counter.
    #[serde(rename = "ALERT_ONLY")]
    AlertOnly,
}

/// Static metadata for one reusable task type. Identified by `name`.
///
/// Fields the server adds that are not modelled here (audit timestamps,
/// `inputTemplate`, ...) are kept in [`extra`](Self::extra) so that a
/// definition read from the server can be written back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDef {
    /// Task type name.
    pub name: String,
    /// Owner contact, required by most servers on registration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub input_keys: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub output_keys: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_policy: Option<TaskTimeoutPolicy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_logic: Option<RetryLogic>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_delay_seconds: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_timeout_seconds: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poll_timeout_seconds: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concurrent_exec_limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_limit_frequency_in_seconds: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_limit_per_frequency: Option<u32>,
    /// Any other field, passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TaskDef {
    /// Create a task definition with only a name and owner.
    pub fn new(name: impl Into<String>, owner_email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            owner_email: Some(owner_email.into()),
            description: None,
            retry_count: None,
            timeout_seconds: None,
            input_keys: Vec::new(),
            output_keys: Vec::new(),
            timeout_policy: None,
            retry_logic: None,
            retry_delay_seconds: None,
            response_timeout_seconds: None,
            poll_timeout_seconds: None,
            concurrent_exec_limit: None,
            rate_limit_frequency_in_seconds: None,
            rate_limit_per_frequency: None,
            extra: Map::new(),
        }
    }

    /// Set the retry policy.
    pub fn with_retry(mut self, count: u32, logic: RetryLogic, delay_seconds: u64) -> Self {
        self.retry_count = Some(count);
        self.retry_logic = Some(logic);
        self.retry_delay_seconds = Some(delay_seconds);
        self
    }

    /// Set the timeout policy.
    pub fn with_timeout(mut self, timeout_seconds: u64, policy: TaskTimeoutPolicy) -> Self {
        self.timeout_seconds = Some(timeout_seconds);
        self.timeout_policy = Some(policy);
        self
    }

    /// Limit executions to `per_frequency` every `frequency_seconds`.
    pub fn with_rate_limit(mut self, per_frequency: u32, frequency_seconds: u32) -> Self {
        self.rate_limit_per_frequency = Some(per_frequency);
        self.rate_limit_frequency_in_seconds = Some(frequency_seconds);
        self
    }
}

/// Script language of a `SWITCH` expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EvaluatorType {
    /// `expression` names an input parameter whose value selects the case.
    ValueParam,
    /// `expression` is a JavaScript expression evaluated by the server.
    Javascript,
}

/// Target of a `SUB_WORKFLOW` task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubWorkflowParams {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_to_domain: Option<IndexMap<String, String>>,
}

/// The `type` tag of a workflow task node plus its type-specific fields.
///
/// Only meaningful as part of a [`WorkflowTask`], which handles its wire
/// form. Types this enum does not list decode as [`TaskKind::Other`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum TaskKind {
    /// Executed by an external worker polling for its task type.
    Simple,
    Wait,
    /// Superseded by [`TaskKind::Switch`]; still accepted by servers.
    Decision {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        case_value_param: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        case_expression: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        default_case: Vec<WorkflowTask>,
        #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
        decision_cases: IndexMap<String, Vec<WorkflowTask>>,
    },
    Switch {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        evaluator_type: Option<EvaluatorType>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        expression: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        default_case: Vec<WorkflowTask>,
        #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
        decision_cases: IndexMap<String, Vec<WorkflowTask>>,
    },
    SubWorkflow {
        sub_workflow_param: SubWorkflowParams,
    },
    Join {
        #[serde(default)]
        join_on: Vec<String>,
    },
    /// Runs each branch in parallel; pair with a [`TaskKind::Join`].
    ForkJoin {
        #[serde(default)]
        fork_tasks: Vec<Vec<WorkflowTask>>,
    },
    ForkJoinDynamic {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        dynamic_fork_tasks_param: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        dynamic_fork_tasks_input_param_name: Option<String>,
    },
    ExclusiveJoin {
        #[serde(default)]
        join_on: Vec<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        default_exclusive_join_task: Vec<String>,
    },
    Dynamic {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        dynamic_task_name_param: Option<String>,
    },
    /// Superseded by [`TaskKind::Inline`].
    Lambda {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        script_expression: Option<String>,
    },
    Inline,
    Terminate,
    KafkaPublish,
    DoWhile {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        loop_condition: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        loop_over: Vec<WorkflowTask>,
    },
    SetVariable,
    Http,
    Event {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sink: Option<String>,
    },
    JsonJqTransform,
    Human,
    /// Any other task type (`NOOP`, `START_WORKFLOW`, custom system tasks),
    /// or a listed type whose fields did not decode. Kept verbatim.
    #[serde(skip)]
    Other {
        type_name: String,
        fields: Map<String, Value>,
    },
}

impl TaskKind {
    /// The wire value of the `type` tag.
    pub fn type_name(&self) -> &str {
        match self {
            Self::Simple => "SIMPLE",
            Self::Wait => "WAIT",
            Self::Decision { .. } => "DECISION",
            Self::Switch { .. } => "SWITCH",
            Self::SubWorkflow { .. } => "SUB_WORKFLOW",
            Self::Join { .. } => "JOIN",
            Self::ForkJoin { .. } => "FORK_JOIN",
            Self::ForkJoinDynamic { .. } => "FORK_JOIN_DYNAMIC",
            Self::ExclusiveJoin { .. } => "EXCLUSIVE_JOIN",
            Self::Dynamic { .. } => "DYNAMIC",
            Self::Lambda { .. } => "LAMBDA",
            Self::Inline => "INLINE",
            Self::Terminate => "TERMINATE",
            Self::KafkaPublish => "KAFKA_PUBLISH",
            Self::DoWhile { .. } => "DO_WHILE",
            Self::SetVariable => "SET_VARIABLE",
            Self::Http => "HTTP",
            Self::Event { .. } => "EVENT",
            Self::JsonJqTransform => "JSON_JQ_TRANSFORM",
            Self::Human => "HUMAN",
            Self::Other { type_name, .. } => type_name,
        }
    }

    /// Wire names of the fields this kind owns, besides `type`.
    fn field_names(&self) -> &'static [&'static str] {
        match self {
            Self::Decision { .. } => &[
                "caseValueParam",
                "caseExpression",
                "defaultCase",
                "decisionCases",
            ],
            Self::Switch { .. } => &["evaluatorType", "expression", "defaultCase", "decisionCases"],
            Self::SubWorkflow { .. } => &["subWorkflowParam"],
            Self::Join { .. } => &["joinOn"],
            Self::ForkJoin { .. } => &["forkTasks"],
            Self::ForkJoinDynamic { .. } => {
                &["dynamicForkTasksParam", "dynamicForkTasksInputParamName"]
            },
            Self::ExclusiveJoin { .. } => &["joinOn", "defaultExclusiveJoinTask"],
            Self::Dynamic { .. } => &["dynamicTaskNameParam"],
            Self::Lambda { .. } => &["scriptExpression"],
            Self::DoWhile { .. } => &["loopCondition", "loopOver"],
            Self::Event { .. } => &["sink"],
            _ => &[],
        }
    }

    /// Split the non-common fields of a node into its kind and the
    /// leftovers the kind does not own.
    ///
    /// A missing `type` means `SIMPLE`, as on the server.
    fn from_fields(
        mut fields: Map<String, Value>,
    ) -> Result<(Self, Map<String, Value>), String> {
        let type_name = match fields.get("type") {
            Some(Value::String(name)) => name.clone(),
            Some(other) => return Err(format!("task type must be a string, got {}", other)),
            None => {
                fields.insert("type".to_string(), Value::from("SIMPLE"));
                "SIMPLE".to_string()
            },
        };

        match serde_json::from_value::<Self>(Value::Object(fields.clone())) {
            Ok(kind) => {
                let owned = kind.field_names();
                let extra = fields
                    .into_iter()
                    .filter(|(key, _)| key != "type" && !owned.contains(&key.as_str()))
                    .collect();
                Ok((kind, extra))
            },
            Err(err) => {
                tracing::debug!(task_type = %type_name, "Keeping task node verbatim: {}", err);
                let fields = fields.into_iter().filter(|(key, _)| key != "type").collect();
                Ok((Self::Other { type_name, fields }, Map::new()))
            },
        }
    }

    /// The `type` tag and the fields this kind owns, in wire form.
    fn to_fields(&self) -> serde_json::Result<Map<String, Value>> {
        match self {
            Self::Other { type_name, fields } => {
                let mut out = Map::with_capacity(fields.len() + 1);
                out.insert("type".to_string(), Value::from(type_name.as_str()));
                out.extend(fields.iter().map(|(k, v)| (k.clone(), v.clone())));
                Ok(out)
            },
            known => match serde_json::to_value(known)? {
                Value::Object(map) => Ok(map),
                other => Err(serde::ser::Error::custom(format!(
                    "task kind serialized to {}",
                    other
                ))),
            },
        }
    }
}

/// One node of a workflow definition's task graph.
///
/// `task_reference_name` must be unique within a workflow definition; the
/// server enforces that, the client does not.
///
/// On the wire the common fields, the `type` tag, the kind's fields and
/// [`extra`](Self::extra) all share one JSON object.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowTask {
    /// Task definition name (or a label for system tasks).
    pub name: String,
    /// Identifier of this node within its workflow definition.
    pub task_reference_name: String,
    pub description: Option<String>,
    pub input_parameters: Map<String, Value>,
    pub start_delay: Option<u32>,
    pub optional: Option<bool>,
    pub async_complete: Option<bool>,
    /// Documentation only. Servers drop it on save.
    pub comment: Option<String>,
    pub kind: TaskKind,
    /// Fields neither the node nor its kind models (`retryCount`, an
    /// inline `taskDefinition`, ...), passed through untouched.
    pub extra: Map<String, Value>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WorkflowTaskRepr {
    name: String,
    task_reference_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    input_parameters: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    start_delay: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    optional: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    async_complete: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    comment: Option<String>,
    #[serde(flatten)]
    rest: Map<String, Value>,
}

impl Serialize for WorkflowTask {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut rest = self.kind.to_fields().map_err(serde::ser::Error::custom)?;
        for (key, value) in &self.extra {
            if !rest.contains_key(key) {
                rest.insert(key.clone(), value.clone());
            }
        }

        WorkflowTaskRepr {
            name: self.name.clone(),
            task_reference_name: self.task_reference_name.clone(),
            description: self.description.clone(),
            input_parameters: self.input_parameters.clone(),
            start_delay: self.start_delay,
            optional: self.optional,
            async_complete: self.async_complete,
            comment: self.comment.clone(),
            rest,
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for WorkflowTask {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let repr = WorkflowTaskRepr::deserialize(deserializer)?;
        let (kind, extra) = TaskKind::from_fields(repr.rest).map_err(serde::de::Error::custom)?;
        Ok(Self {
            name: repr.name,
            task_reference_name: repr.task_reference_name,
            description: repr.description,
            input_parameters: repr.input_parameters,
            start_delay: repr.start_delay,
            optional: repr.optional,
            async_complete: repr.async_complete,
            comment: repr.comment,
            kind,
            extra,
        })
    }
}

impl WorkflowTask {
    /// Create a node with no input parameters.
    pub fn new(
        name: impl Into<String>,
        task_reference_name: impl Into<String>,
        kind: TaskKind,
    ) -> Self {
        Self {
            name: name.into(),
            task_reference_name: task_reference_name.into(),
            description: None,
            input_parameters: Map::new(),
            start_delay: None,
            optional: None,
            async_complete: None,
            comment: None,
            kind,
            extra: Map::new(),
        }
    }

    /// Create a `SIMPLE` worker task node.
    pub fn simple(name: impl Into<String>, task_reference_name: impl Into<String>) -> Self {
        Self::new(name, task_reference_name, TaskKind::Simple)
    }

    /// Set one input parameter.
    pub fn with_input(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.input_parameters.insert(key.into(), value.into());
        self
    }

    /// Mark the node optional: its failure does not fail the workflow.
    pub fn optional(mut self) -> Self {
        self.optional = Some(true);
        self
    }

    /// The wire value of this node's `type` tag.
    pub fn type_name(&self) -> &str {
        self.kind.type_name()
    }

    /// Nodes embedded directly in this one, in declaration order.
    ///
    /// For `DECISION`/`SWITCH` the cases come first, then the default case.
    pub fn children(&self) -> Vec<&WorkflowTask> {
        match &self.kind {
            TaskKind::Decision {
                default_case,
                decision_cases,
                ..
            }
            | TaskKind::Switch {
                default_case,
                decision_cases,
                ..
            } => decision_cases
                .values()
                .flatten()
                .chain(default_case.iter())
                .collect(),
            TaskKind::ForkJoin { fork_tasks } => fork_tasks.iter().flatten().collect(),
            TaskKind::DoWhile { loop_over, .. } => loop_over.iter().collect(),
            _ => Vec::new(),
        }
    }

    fn collect_into<'a>(&'a self, out: &mut Vec<&'a WorkflowTask>) {
        out.push(self);
        for child in self.children() {
            child.collect_into(out);
        }
    }
}

/// A named, versioned workflow template. Identity is `(name, version)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowDef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "default_version")]
    pub version: u32,
    /// Root sequence of the task tree.
    #[serde(default)]
    pub tasks: Vec<WorkflowTask>,
    #[serde(default)]
    pub input_parameters: Vec<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub output_parameters: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_workflow: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restartable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_status_listener_enabled: Option<bool>,
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_policy: Option<WorkflowTimeoutPolicy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub variables: Map<String, Value>,
    /// Server bookkeeping and other unmodelled fields (`createTime`,
    /// `ownerApp`, `inputTemplate`, ...), sent back as received.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_version() -> u32 {
    1
}

fn default_schema_version() -> u32 {
    2
}

impl WorkflowDef {
    /// Create an empty definition at schema version 2.
    pub fn new(name: impl Into<String>, version: u32) -> Self {
        Self {
            name: name.into(),
            description: None,
            version,
            tasks: Vec::new(),
            input_parameters: Vec::new(),
            output_parameters: Map::new(),
            failure_workflow: None,
            restartable: None,
            workflow_status_listener_enabled: None,
            schema_version: default_schema_version(),
            owner_email: None,
            timeout_policy: None,
            timeout_seconds: None,
            variables: Map::new(),
            extra: Map::new(),
        }
    }

    /// Append a node to the root sequence.
    pub fn with_task(mut self, task: WorkflowTask) -> Self {
        self.tasks.push(task);
        self
    }

    /// Set the owner email.
    pub fn with_owner(mut self, owner_email: impl Into<String>) -> Self {
        self.owner_email = Some(owner_email.into());
        self
    }

    /// Every node of the tree, depth-first in declaration order.
    pub fn all_tasks(&self) -> Vec<&WorkflowTask> {
        let mut out = Vec::new();
        for task in &self.tasks {
            task.collect_into(&mut out);
        }
        out
    }

    /// Find a node anywhere in the tree by its reference name.
    pub fn find_task(&self, task_reference_name: &str) -> Option<&WorkflowTask> {
        self.all_tasks()
            .into_iter()
            .find(|t| t.task_reference_name == task_reference_name)
    }
}
