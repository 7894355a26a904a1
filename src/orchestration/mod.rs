//! Sub-agent orchestration subsystem.
//!
//! Provides the [`manager::SubagentManager`] single-call entry point with its
//! per-provider client cache, the [`orchestrator::SubagentOrchestrator`] for
//! parallel and conditional execution, and the shared [`types`] used across
//! the orchestration layer.

pub mod condition;
pub mod manager;
pub mod orchestrator;
pub mod types;

pub use manager::SubagentManager;
pub use orchestrator::SubagentOrchestrator;
