use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use serde_json::json;

use subagent::cli::{Cli, Commands};
use subagent::config;
use subagent::orchestration::{SubagentManager, SubagentOrchestrator};
use subagent::tools::{RequestDefaults, ToolContext, dispatch_tool_call};
use subagent::usage::TextEstimate;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing on stderr; stdout carries the JSON responses.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    let config = config::load_config(&cli)?;
    tracing::info!(
        timeout_secs = config.timeout_secs,
        max_workers = config.max_workers,
        track_cost = config.track_cost,
        "Config loaded"
    );

    // One manager for the whole process; every tool call shares its client cache.
    let manager = SubagentManager::new(&config);
    let orchestrator = SubagentOrchestrator::new(manager, Duration::from_secs(config.timeout_secs));
    let ctx = ToolContext::new(orchestrator, RequestDefaults::from(&config));

    let response = match cli.command {
        Commands::Call {
            provider,
            model,
            system,
            prompt,
            max_tokens,
            temperature,
        } => {
            let mut messages = Vec::new();
            if let Some(system) = system {
                messages.push(json!({"role": "system", "content": system}));
            }
            messages.push(json!({"role": "user", "content": prompt}));

            let args = json!({
                "provider": provider,
                "model": model,
                "messages": messages,
                "max_tokens": max_tokens,
                "temperature": temperature,
            });
            dispatch_tool_call(&ctx, "subagent_call", &args).await
        }
        Commands::Parallel { tasks, max_workers } => {
            let tasks = read_json(&tasks)?;
            let args = json!({"tasks": tasks, "max_workers": max_workers});
            dispatch_tool_call(&ctx, "subagent_parallel", &args).await
        }
        Commands::Conditional {
            condition,
            if_true,
            if_false,
        } => {
            let args = json!({
                "condition_task": read_json(&condition)?,
                "true_task": read_json(&if_true)?,
                "false_task": read_json(&if_false)?,
            });
            dispatch_tool_call(&ctx, "subagent_conditional", &args).await
        }
        Commands::Estimate { model, text, file } => {
            let text = match (text, file) {
                (Some(text), _) => text,
                (None, Some(path)) => tokio::fs::read_to_string(&path)
                    .await
                    .with_context(|| format!("Failed to read {}", path.display()))?,
                (None, None) => anyhow::bail!("either --text or --file is required"),
            };
            serde_json::to_string(&TextEstimate::for_text(&model, &text))?
        }
    };

    let pretty = serde_json::from_str::<serde_json::Value>(&response)
        .and_then(|value| serde_json::to_string_pretty(&value))
        .unwrap_or(response);
    println!("{pretty}");

    Ok(())
}

/// Read a JSON file into a value. Unparseable content is passed through as a
/// string so the tool boundary reports it as a parse error.
fn read_json(path: &std::path::Path) -> anyhow::Result<serde_json::Value> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(serde_json::from_str(&contents).unwrap_or(serde_json::Value::String(contents)))
}
