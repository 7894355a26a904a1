use super::schema::{AppConfig, PartialConfig};

pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_MAX_WORKERS: usize = 5;
pub const DEFAULT_MAX_TOKENS: u32 = 1000;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_ANTHROPIC_VERSION: &str = "2023-06-01";

impl PartialConfig {
    /// Merge self with a lower-priority fallback.
    /// Self's non-None values take precedence.
    pub fn with_fallback(self, fallback: PartialConfig) -> PartialConfig {
        PartialConfig {
            timeout_secs: self.timeout_secs.or(fallback.timeout_secs),
            max_workers: self.max_workers.or(fallback.max_workers),
            track_cost: self.track_cost.or(fallback.track_cost),
            default_max_tokens: self.default_max_tokens.or(fallback.default_max_tokens),
            default_temperature: self.default_temperature.or(fallback.default_temperature),
            openai_base_url: self.openai_base_url.or(fallback.openai_base_url),
            anthropic_base_url: self.anthropic_base_url.or(fallback.anthropic_base_url),
            anthropic_version: self.anthropic_version.or(fallback.anthropic_version),
        }
    }

    /// Convert to AppConfig, filling any remaining gaps with defaults.
    /// Zero worker and timeout values are raised to 1.
    pub fn finalize(self) -> AppConfig {
        AppConfig {
            timeout_secs: self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS).max(1),
            max_workers: self.max_workers.unwrap_or(DEFAULT_MAX_WORKERS).max(1),
            track_cost: self.track_cost.unwrap_or(false),
            default_max_tokens: self.default_max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            default_temperature: self.default_temperature.unwrap_or(DEFAULT_TEMPERATURE),
            openai_base_url: self
                .openai_base_url
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            anthropic_base_url: self
                .anthropic_base_url
                .unwrap_or_else(|| DEFAULT_ANTHROPIC_BASE_URL.to_string()),
            anthropic_version: self
                .anthropic_version
                .unwrap_or_else(|| DEFAULT_ANTHROPIC_VERSION.to_string()),
        }
    }
}
