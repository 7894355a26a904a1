//! Parallel and conditional execution on top of [`SubagentManager`].
//!
//! **Worker pool:** `execute_parallel` spawns `min(max_workers, tasks)` tokio
//! tasks. Each worker claims the next task index from a shared atomic cursor,
//! runs that task to completion, and sends `(index, result)` back over a
//! channel. The caller collects into a pre-sized slot vector, so each index is
//! written exactly once by the worker that claimed it and output order is
//! input order. The channel closes when the last worker exits, which is the
//! barrier. A task that panics is caught at the worker and reported as that
//! task's failure; the worker goes on claiming indices.
//!
//! **Isolation:** every outcome of a task, including a configuration error for
//! its provider, becomes that task's [`CallResult`]. Nothing a task does can
//! stop another task from running.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::mpsc;
use tracing::Instrument;
use uuid::Uuid;

use super::condition::evaluate_condition;
use super::manager::SubagentManager;
use super::types::{
    BatchSummary, Branch, CallResult, CallStatus, ConditionOutcome, ConditionalResult,
    OrchestrationResult, Task, TaskResult,
};
use crate::error::{ConfigError, OrchestrationError};

/// Runs batches of independent tasks and two-step conditional flows.
#[derive(Clone)]
pub struct SubagentOrchestrator {
    manager: SubagentManager,
    timeout: Duration,
}

impl SubagentOrchestrator {
    /// `timeout` bounds each individual provider call.
    pub fn new(manager: SubagentManager, timeout: Duration) -> Self {
        Self { manager, timeout }
    }

    pub fn manager(&self) -> &SubagentManager {
        &self.manager
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run `tasks` concurrently on a bounded worker pool.
    ///
    /// Returns [`OrchestrationError::EmptyTasks`] before starting any worker
    /// when `tasks` is empty. Otherwise returns one result per task, in input
    /// order, plus a summary. `max_workers` of zero is treated as one.
    pub async fn execute_parallel(
        &self,
        tasks: Vec<Task>,
        max_workers: usize,
    ) -> Result<OrchestrationResult, OrchestrationError> {
        if tasks.is_empty() {
            return Err(OrchestrationError::EmptyTasks);
        }

        let total = tasks.len();
        let workers = max_workers.clamp(1, total);
        let batch_id = Uuid::new_v4();
        tracing::info!(%batch_id, tasks = total, workers, "starting parallel batch");

        let tasks: Arc<[Task]> = tasks.into();
        let cursor = Arc::new(AtomicUsize::new(0));
        let (tx, mut rx) = mpsc::unbounded_channel::<(usize, CallResult)>();

        let mut handles = Vec::with_capacity(workers);
        for worker in 0..workers {
            let tasks = Arc::clone(&tasks);
            let cursor = Arc::clone(&cursor);
            let tx = tx.clone();
            let manager = self.manager.clone();
            let timeout = self.timeout;
            let span = tracing::info_span!("worker", %batch_id, worker);

            handles.push(tokio::spawn(
                async move {
                    loop {
                        let index = cursor.fetch_add(1, Ordering::SeqCst);
                        let Some(task) = tasks.get(index) else {
                            break;
                        };
                        tracing::debug!(index, task = %task.name, "task claimed");
                        let result = AssertUnwindSafe(manager.call_isolated(&task.request, timeout))
                            .catch_unwind()
                            .await
                            .unwrap_or_else(|payload| {
                                let reason = panic_reason(payload.as_ref());
                                tracing::error!(index, task = %task.name, %reason, "task panicked");
                                CallResult::failed(
                                    task.request.provider,
                                    &task.request.model,
                                    format!("Task panicked: {reason}"),
                                    0.0,
                                )
                            });
                        if tx.send((index, result)).is_err() {
                            break;
                        }
                    }
                }
                .instrument(span),
            ));
        }
        drop(tx);

        let mut slots: Vec<Option<CallResult>> = vec![None; total];
        while let Some((index, result)) = rx.recv().await {
            slots[index] = Some(result);
        }

        for handle in futures::future::join_all(handles).await {
            if let Err(e) = handle {
                tracing::error!(%batch_id, error = %e, "worker terminated abnormally");
            }
        }

        let results: Vec<TaskResult> = tasks
            .iter()
            .zip(slots)
            .map(|(task, slot)| TaskResult {
                task_name: task.name.clone(),
                call: slot.unwrap_or_else(|| {
                    CallResult::failed(
                        task.request.provider,
                        &task.request.model,
                        "worker terminated before the task completed",
                        0.0,
                    )
                }),
            })
            .collect();

        let summary = BatchSummary::from_results(&results);
        tracing::info!(
            %batch_id,
            successful = summary.successful,
            failed = summary.failed,
            total_tokens = summary.total_tokens,
            "parallel batch finished"
        );

        Ok(OrchestrationResult {
            status: CallStatus::Success,
            results,
            summary,
        })
    }

    /// Evaluate `condition`, then run exactly one of `if_true` / `if_false`.
    ///
    /// The branch not selected is never called. A configuration error on the
    /// condition's provider is returned as `Err`; every other failure is
    /// reported inside the [`ConditionalResult`].
    pub async fn execute_conditional(
        &self,
        condition: Task,
        if_true: Task,
        if_false: Task,
    ) -> Result<ConditionalResult, ConfigError> {
        let condition_call = self.manager.call_ai(&condition.request, self.timeout).await?;
        let evaluated_as = condition_call.is_success() && evaluate_condition(&condition_call.result);
        let mut total_usage = condition_call.usage_or_default();

        if !condition_call.is_success() {
            let error = format!(
                "Condition evaluation failed: {}",
                condition_call.error.as_deref().unwrap_or("unknown error")
            );
            return Ok(ConditionalResult {
                status: CallStatus::Failed,
                condition_result: ConditionOutcome {
                    call: condition_call,
                    evaluated_as,
                },
                branch_taken: None,
                final_result: None,
                total_usage,
                error: Some(error),
            });
        }

        let (branch, task) = if evaluated_as {
            (Branch::TrueBranch, if_true)
        } else {
            (Branch::FalseBranch, if_false)
        };
        tracing::info!(condition = %condition.name, branch = ?branch, "condition evaluated");

        let final_result = self.manager.call_isolated(&task.request, self.timeout).await;
        total_usage += final_result.usage_or_default();

        let (status, error) = if final_result.is_success() {
            (CallStatus::Success, None)
        } else {
            (
                CallStatus::Failed,
                Some(format!(
                    "Branch `{}` failed: {}",
                    task.name,
                    final_result.error.as_deref().unwrap_or("unknown error")
                )),
            )
        };

        Ok(ConditionalResult {
            status,
            condition_result: ConditionOutcome {
                call: condition_call,
                evaluated_as,
            },
            branch_taken: Some(branch),
            final_result: Some(final_result),
            total_usage,
            error,
        })
    }
}

fn panic_reason(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
