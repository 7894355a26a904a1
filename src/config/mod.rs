pub mod merge;
pub mod schema;

pub use schema::*;

use crate::cli::Cli;
use anyhow::Context;
use std::path::Path;

/// Load configuration by merging global, explicit file, and CLI sources.
/// Precedence: CLI > `--config` file > global config > defaults.
///
/// A missing global file is handled gracefully (defaults apply). An explicit
/// `--config` path that cannot be read is an error.
pub fn load_config(cli: &Cli) -> anyhow::Result<AppConfig> {
    // Layer 1: Global config (~/.config/subagent/subagent.toml or platform equivalent)
    let global = load_global_config();

    // Layer 2: Explicit config file
    let explicit = match &cli.config {
        Some(path) => load_explicit_config(path)?,
        None => PartialConfig::default(),
    };

    // Layer 3: CLI args
    let cli_partial = cli_to_partial(cli);

    Ok(cli_partial
        .with_fallback(explicit)
        .with_fallback(global)
        .finalize())
}

/// Load global config from the platform-specific config directory.
/// Returns empty PartialConfig if file not found.
fn load_global_config() -> PartialConfig {
    match global_config_path() {
        Some(p) => load_toml_file(&p).unwrap_or_default(),
        None => {
            tracing::debug!("Could not determine global config directory");
            PartialConfig::default()
        }
    }
}

fn load_explicit_config(path: &Path) -> anyhow::Result<PartialConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config at {}", path.display()))?;
    parse_config(&contents).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Parse TOML text into a PartialConfig.
pub fn parse_config(contents: &str) -> anyhow::Result<PartialConfig> {
    let file: ConfigFile = toml::from_str(contents)?;
    Ok(file.to_partial())
}

/// Load and parse a TOML config file into a PartialConfig.
/// Returns None on file-not-found; logs and ignores parse errors.
pub fn load_toml_file(path: &Path) -> Option<PartialConfig> {
    match std::fs::read_to_string(path) {
        Ok(contents) => match parse_config(&contents) {
            Ok(partial) => {
                tracing::info!("Loaded config from {}", path.display());
                Some(partial)
            }
            Err(e) => {
                tracing::warn!("Config parse error in {}: {:#}", path.display(), e);
                None
            }
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config file at {}, using defaults", path.display());
            None
        }
        Err(e) => {
            tracing::warn!("Failed to read config at {}: {}", path.display(), e);
            None
        }
    }
}

/// Resolve the platform-specific global config path.
/// Linux: ~/.config/subagent/subagent.toml
/// macOS: ~/Library/Application Support/subagent/subagent.toml
fn global_config_path() -> Option<std::path::PathBuf> {
    directories::ProjectDirs::from("", "", "subagent")
        .map(|dirs| dirs.config_dir().join("subagent.toml"))
}

/// Convert global CLI flags to a PartialConfig for merging.
fn cli_to_partial(cli: &Cli) -> PartialConfig {
    PartialConfig {
        timeout_secs: cli.timeout,
        track_cost: cli.track_cost.then_some(true),
        ..Default::default()
    }
}
