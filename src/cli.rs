use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "subagent", version, about = "Concurrent LLM sub-agent calls")]
pub struct Cli {
    /// Path to config file (overrides default search)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Per-call timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Attach cost estimates to results
    #[arg(long, global = true)]
    pub track_cost: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Issue a single provider call
    Call {
        /// Provider tag ("openai" or "anthropic")
        #[arg(short, long)]
        provider: String,

        /// Vendor model name (e.g., "gpt-4o-mini", "claude-3-haiku-20240307")
        #[arg(short, long)]
        model: String,

        /// Optional system prompt
        #[arg(long)]
        system: Option<String>,

        /// User prompt
        #[arg(long)]
        prompt: String,

        #[arg(long)]
        max_tokens: Option<u32>,

        #[arg(long)]
        temperature: Option<f32>,
    },
    /// Run a JSON list of tasks concurrently
    Parallel {
        /// File containing a JSON array of task specs
        #[arg(short, long)]
        tasks: PathBuf,

        /// Maximum concurrent calls
        #[arg(long)]
        max_workers: Option<usize>,
    },
    /// Evaluate a condition task, then run one of two branch tasks
    Conditional {
        /// File containing the condition task spec
        #[arg(long)]
        condition: PathBuf,

        /// File containing the task to run when the condition is true
        #[arg(long)]
        if_true: PathBuf,

        /// File containing the task to run when the condition is false
        #[arg(long)]
        if_false: PathBuf,
    },
    /// Estimate tokens and cost for a piece of text
    Estimate {
        /// Model used for the cost lookup
        #[arg(short, long)]
        model: String,

        /// Text to estimate
        #[arg(long, conflicts_with = "file")]
        text: Option<String>,

        /// File whose contents to estimate
        #[arg(long)]
        file: Option<PathBuf>,
    },
}
