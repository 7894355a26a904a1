//! Type definitions for the sub-agent orchestration subsystem.
//!
//! These types form the shared vocabulary between the provider clients, the
//! [`super::manager::SubagentManager`], the [`super::orchestrator::SubagentOrchestrator`]
//! and the tool boundary. Result types derive [`serde::Serialize`] so they can
//! be returned to the host as JSON without an intermediate mapping.

use std::fmt;
use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};

use crate::provider::Provider;

/// Speaker of a chat message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// One turn of a conversation. Order within a message list is meaningful.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A fully validated request for a single provider call.
#[derive(Clone, Debug, PartialEq)]
pub struct CallRequest {
    pub provider: Provider,
    pub model: String,
    pub messages: Vec<Message>,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// A named [`CallRequest`] submitted to the orchestrator.
#[derive(Clone, Debug, PartialEq)]
pub struct Task {
    /// Explicit name, or the task's positional index when none was given.
    pub name: String,
    pub request: CallRequest,
}

impl Task {
    pub fn new(name: impl Into<String>, request: CallRequest) -> Self {
        Self {
            name: name.into(),
            request,
        }
    }
}

/// Token accounting for one or more calls.
///
/// Construct through [`Usage::new`] so that `total_tokens` always equals
/// `input_tokens + output_tokens`. Sums saturate at `u64::MAX`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_tokens: u64,
}

impl Usage {
    pub fn new(input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens: input_tokens.saturating_add(output_tokens),
        }
    }
}

impl Add for Usage {
    type Output = Usage;

    fn add(self, rhs: Usage) -> Usage {
        Usage::new(
            self.input_tokens.saturating_add(rhs.input_tokens),
            self.output_tokens.saturating_add(rhs.output_tokens),
        )
    }
}

impl AddAssign for Usage {
    fn add_assign(&mut self, rhs: Usage) {
        *self = *self + rhs;
    }
}

/// Outcome of a single call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallStatus {
    Success,
    Failed,
}

/// Normalized result of one provider call.
///
/// `usage` and `cost` are only present on success; `error` is present iff
/// `status` is [`CallStatus::Failed`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CallResult {
    pub provider: Provider,
    pub model: String,
    pub result: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    pub status: CallStatus,
    /// Wall-clock duration of the call in seconds.
    pub elapsed_time: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CallResult {
    pub fn success(
        provider: Provider,
        model: impl Into<String>,
        result: impl Into<String>,
        usage: Usage,
        elapsed_time: f64,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            result: result.into(),
            usage: Some(usage),
            cost: None,
            status: CallStatus::Success,
            elapsed_time,
            error: None,
        }
    }

    pub fn failed(
        provider: Provider,
        model: impl Into<String>,
        error: impl Into<String>,
        elapsed_time: f64,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            result: String::new(),
            usage: None,
            cost: None,
            status: CallStatus::Failed,
            elapsed_time,
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == CallStatus::Success
    }

    /// Usage of a successful call, zero for a failed one.
    pub fn usage_or_default(&self) -> Usage {
        self.usage.unwrap_or_default()
    }
}

/// One entry of a batch: the task's name plus its call result.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TaskResult {
    pub task_name: String,
    #[serde(flatten)]
    pub call: CallResult,
}

/// Aggregate over a batch. Token and cost totals cover successful tasks only.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct BatchSummary {
    pub total_tasks: usize,
    pub successful: usize,
    pub failed: usize,
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    pub total_tokens: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_cost: Option<f64>,
}

impl BatchSummary {
    /// Fold a result list into a summary.
    pub fn from_results(results: &[TaskResult]) -> Self {
        let mut summary = BatchSummary {
            total_tasks: results.len(),
            ..Default::default()
        };
        let mut usage = Usage::default();

        for entry in results {
            if entry.call.is_success() {
                summary.successful += 1;
                usage += entry.call.usage_or_default();
                if let Some(cost) = entry.call.cost {
                    *summary.total_cost.get_or_insert(0.0) += cost;
                }
            } else {
                summary.failed += 1;
            }
        }

        summary.total_input_tokens = usage.input_tokens;
        summary.total_output_tokens = usage.output_tokens;
        summary.total_tokens = usage.total_tokens;
        summary
    }
}

/// Result of a parallel batch. `results` follows input task order.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OrchestrationResult {
    pub status: CallStatus,
    pub results: Vec<TaskResult>,
    pub summary: BatchSummary,
}

/// The branch selected by a conditional execution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Branch {
    TrueBranch,
    FalseBranch,
}

/// The condition call's result with the boolean it was classified as.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ConditionOutcome {
    #[serde(flatten)]
    pub call: CallResult,
    pub evaluated_as: bool,
}

/// Result of a two-step conditional execution.
///
/// When the condition call itself fails no branch runs, so `branch_taken` and
/// `final_result` are absent and `error` explains why.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ConditionalResult {
    pub status: CallStatus,
    pub condition_result: ConditionOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch_taken: Option<Branch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_result: Option<CallResult>,
    pub total_usage: Usage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
