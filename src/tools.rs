//! Orchestration boundary: request validation and JSON responses.
//!
//! The host process registers three tools (`subagent_call`,
//! `subagent_parallel`, `subagent_conditional`) and forwards their JSON
//! arguments here. Arguments are validated once into typed [`Task`]s; any
//! problem fails the whole submission before a single provider is called.
//!
//! Responses are always JSON strings with a `status` field (never panics or
//! `Err` variants), so the host always receives a well-formed object.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::config::AppConfig;
use crate::error::ParseError;
use crate::orchestration::SubagentOrchestrator;
use crate::orchestration::types::{CallRequest, Message, Task};
use crate::provider::Provider;

/// Values applied to task fields the caller leaves out.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RequestDefaults {
    pub max_tokens: u32,
    pub temperature: f32,
    pub max_workers: usize,
}

impl From<&AppConfig> for RequestDefaults {
    fn from(config: &AppConfig) -> Self {
        Self {
            max_tokens: config.default_max_tokens,
            temperature: config.default_temperature,
            max_workers: config.max_workers,
        }
    }
}

/// Everything a tool call needs: the orchestrator plus request defaults.
#[derive(Clone)]
pub struct ToolContext {
    pub orchestrator: SubagentOrchestrator,
    pub defaults: RequestDefaults,
}

impl ToolContext {
    pub fn new(orchestrator: SubagentOrchestrator, defaults: RequestDefaults) -> Self {
        Self {
            orchestrator,
            defaults,
        }
    }
}

/// Raw task as it arrives from the host, before validation.
#[derive(Debug, Deserialize)]
struct TaskSpec {
    name: Option<String>,
    provider: String,
    model: String,
    messages: Value,
    max_tokens: Option<i64>,
    temperature: Option<f64>,
}

/// Decode a field that may be given either as JSON or as a JSON-encoded string.
fn decode_field<T: DeserializeOwned>(field: &str, value: &Value) -> Result<T, ParseError> {
    let decoded = match value {
        Value::String(text) => serde_json::from_str(text),
        other => serde_json::from_value(other.clone()),
    };
    decoded.map_err(|e| ParseError::InvalidJson {
        field: field.to_string(),
        message: e.to_string(),
    })
}

fn invalid(field: &str, reason: impl Into<String>) -> ParseError {
    ParseError::InvalidField {
        field: field.to_string(),
        reason: reason.into(),
    }
}

/// Validate one task spec. `default_name` is used when the spec has no name.
pub fn parse_task(
    field: &str,
    value: &Value,
    default_name: &str,
    defaults: &RequestDefaults,
) -> Result<Task, ParseError> {
    let spec: TaskSpec = decode_field(field, value)?;

    let provider: Provider = spec.provider.parse()?;

    let model = spec.model.trim().to_string();
    if model.is_empty() {
        return Err(invalid("model", "must not be empty"));
    }

    let messages: Vec<Message> = decode_field("messages", &spec.messages)?;
    if messages.is_empty() {
        return Err(invalid("messages", "must contain at least one message"));
    }

    let max_tokens = match spec.max_tokens {
        None => defaults.max_tokens,
        Some(n) if n > 0 => {
            u32::try_from(n).map_err(|_| invalid("max_tokens", format!("{n} is too large")))?
        }
        Some(n) => return Err(invalid("max_tokens", format!("must be positive, got {n}"))),
    };

    let temperature = spec
        .temperature
        .map(|t| t as f32)
        .unwrap_or(defaults.temperature);
    let range = provider.temperature_range();
    if !temperature.is_finite() || !range.contains(&temperature) {
        return Err(invalid(
            "temperature",
            format!(
                "{temperature} is outside {}..={} for {provider}",
                range.start(),
                range.end()
            ),
        ));
    }

    Ok(Task::new(
        spec.name.unwrap_or_else(|| default_name.to_string()),
        CallRequest {
            provider,
            model,
            messages,
            max_tokens,
            temperature,
        },
    ))
}

/// Validate a task list; unnamed tasks are named by their index.
pub fn parse_tasks(value: &Value, defaults: &RequestDefaults) -> Result<Vec<Task>, ParseError> {
    let items: Vec<Value> = decode_field("tasks", value)?;
    items
        .iter()
        .enumerate()
        .map(|(index, item)| parse_task(&format!("tasks[{index}]"), item, &index.to_string(), defaults))
        .collect()
}

fn failure(error: impl std::fmt::Display) -> Value {
    json!({"status": "failed", "error": error.to_string()})
}

fn to_json<T: serde::Serialize>(value: &T) -> Value {
    serde_json::to_value(value)
        .unwrap_or_else(|e| failure(format!("Failed to serialize result: {e}")))
}

/// Single call. Arguments: `provider`, `model`, `messages`, optional
/// `max_tokens` and `temperature`.
pub async fn subagent_call(ctx: &ToolContext, args: &Value) -> Value {
    let task = match parse_task("arguments", args, "call", &ctx.defaults) {
        Ok(task) => task,
        Err(e) => return failure(e),
    };

    let orchestrator = &ctx.orchestrator;
    match orchestrator
        .manager()
        .call_ai(&task.request, orchestrator.timeout())
        .await
    {
        Ok(result) => to_json(&result),
        Err(e) => failure(e),
    }
}

/// Batch call. Arguments: `tasks` (list of task specs), optional `max_workers`.
pub async fn subagent_parallel(ctx: &ToolContext, args: &Value) -> Value {
    let Some(tasks_value) = args.get("tasks") else {
        return failure(invalid("tasks", "missing"));
    };

    let tasks = match parse_tasks(tasks_value, &ctx.defaults) {
        Ok(tasks) => tasks,
        Err(e) => return failure(e),
    };

    let max_workers = match args.get("max_workers") {
        None | Some(Value::Null) => ctx.defaults.max_workers,
        Some(value) => match value.as_u64().filter(|&n| n > 0).map(usize::try_from) {
            Some(Ok(n)) => n,
            _ => return failure(invalid("max_workers", "must be a positive integer")),
        },
    };

    match ctx.orchestrator.execute_parallel(tasks, max_workers).await {
        Ok(result) => to_json(&result),
        Err(e) => failure(e),
    }
}

/// Conditional call. Arguments: `condition_task`, `true_task`, `false_task`.
pub async fn subagent_conditional(ctx: &ToolContext, args: &Value) -> Value {
    let parse = |field: &str| -> Result<Task, ParseError> {
        let value = args.get(field).ok_or_else(|| invalid(field, "missing"))?;
        parse_task(field, value, field, &ctx.defaults)
    };

    let (condition, if_true, if_false) =
        match (parse("condition_task"), parse("true_task"), parse("false_task")) {
            (Ok(c), Ok(t), Ok(f)) => (c, t, f),
            (Err(e), _, _) | (_, Err(e), _) | (_, _, Err(e)) => return failure(e),
        };

    match ctx
        .orchestrator
        .execute_conditional(condition, if_true, if_false)
        .await
    {
        Ok(result) => to_json(&result),
        Err(e) => failure(e),
    }
}

/// Dispatch a tool call by name and render the response as a JSON string.
pub async fn dispatch_tool_call(ctx: &ToolContext, name: &str, args: &Value) -> String {
    let response = match name {
        "subagent_call" => subagent_call(ctx, args).await,
        "subagent_parallel" => subagent_parallel(ctx, args).await,
        "subagent_conditional" => subagent_conditional(ctx, args).await,
        unknown => failure(format!("Unknown tool: {unknown}")),
    };
    response.to_string()
}
