use serde::Deserialize;

/// The TOML file structure for subagent.toml.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    pub general: Option<GeneralConfig>,
    pub openai: Option<OpenAiConfig>,
    pub anthropic: Option<AnthropicConfig>,
}

#[derive(Debug, Deserialize)]
pub struct GeneralConfig {
    pub timeout_secs: Option<u64>,
    pub max_workers: Option<usize>,
    pub track_cost: Option<bool>,
    pub default_max_tokens: Option<u32>,
    pub default_temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
pub struct OpenAiConfig {
    pub base_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AnthropicConfig {
    pub base_url: Option<String>,
    pub api_version: Option<String>,
}

/// Fully-resolved runtime configuration. All fields have values.
///
/// API keys are deliberately absent: they are read from the environment
/// when a provider client is built.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub timeout_secs: u64,
    pub max_workers: usize,
    pub track_cost: bool,
    pub default_max_tokens: u32,
    pub default_temperature: f32,
    pub openai_base_url: String,
    pub anthropic_base_url: String,
    pub anthropic_version: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        PartialConfig::default().finalize()
    }
}

/// Partial config used during merge. All fields are Option so that
/// missing fields don't override lower-priority values.
#[derive(Debug, Clone, Default)]
pub struct PartialConfig {
    pub timeout_secs: Option<u64>,
    pub max_workers: Option<usize>,
    pub track_cost: Option<bool>,
    pub default_max_tokens: Option<u32>,
    pub default_temperature: Option<f32>,
    pub openai_base_url: Option<String>,
    pub anthropic_base_url: Option<String>,
    pub anthropic_version: Option<String>,
}

impl ConfigFile {
    /// Flatten the sectioned file layout into a [`PartialConfig`].
    pub fn to_partial(self) -> PartialConfig {
        let general = self.general;
        let openai = self.openai;
        let anthropic = self.anthropic;

        PartialConfig {
            timeout_secs: general.as_ref().and_then(|g| g.timeout_secs),
            max_workers: general.as_ref().and_then(|g| g.max_workers),
            track_cost: general.as_ref().and_then(|g| g.track_cost),
            default_max_tokens: general.as_ref().and_then(|g| g.default_max_tokens),
            default_temperature: general.as_ref().and_then(|g| g.default_temperature),
            openai_base_url: openai.and_then(|o| o.base_url),
            anthropic_base_url: anthropic.as_ref().and_then(|a| a.base_url.clone()),
            anthropic_version: anthropic.and_then(|a| a.api_version),
        }
    }
}
