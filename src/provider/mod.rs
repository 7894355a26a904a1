//! Provider clients: one capability (`call`) over several chat-completion vendors.
//!
//! Every vendor response is normalized into [`Completion`], the OpenAI-style
//! `{choices, usage}` shape, so the manager and orchestrator never branch on
//! vendor identity. Clients validate their credential when they are built;
//! a client that exists always has one.

pub mod anthropic;
pub mod openai;

use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::error::{CallError, ConfigError, ParseError};
use crate::orchestration::types::{Message, Role};

pub use anthropic::AnthropicClient;
pub use openai::OpenAiClient;

/// Supported chat-completion vendors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Provider {
    #[serde(rename = "openai")]
    OpenAi,
    #[serde(rename = "anthropic")]
    Anthropic,
}

impl Provider {
    /// Tag used in requests and responses.
    pub fn tag(&self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::Anthropic => "anthropic",
        }
    }

    /// Environment variable holding this provider's API key.
    pub fn credential_var(&self) -> &'static str {
        match self {
            Provider::OpenAi => "OPENAI_API_KEY",
            Provider::Anthropic => "ANTHROPIC_API_KEY",
        }
    }

    /// Sampling temperatures the vendor accepts.
    pub fn temperature_range(&self) -> RangeInclusive<f32> {
        match self {
            Provider::OpenAi => 0.0..=2.0,
            Provider::Anthropic => 0.0..=1.0,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Provider {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Provider::OpenAi),
            "anthropic" => Ok(Provider::Anthropic),
            _ => Err(ParseError::UnknownProvider(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Common response shape
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChoiceMessage {
    pub role: Role,
    pub content: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    pub message: ChoiceMessage,
    pub finish_reason: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

impl CompletionUsage {
    /// Usage from locally computed counts. The total saturates.
    pub fn new(prompt_tokens: u64, completion_tokens: u64) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens.saturating_add(completion_tokens),
        }
    }

    /// Usage from counts a vendor reported. A total that does not fit in
    /// `u64` means the body is garbage.
    pub fn reported(prompt_tokens: u64, completion_tokens: u64) -> Result<Self, CallError> {
        let total_tokens = prompt_tokens.checked_add(completion_tokens).ok_or_else(|| {
            CallError::MalformedResponse(format!(
                "usage overflows: {prompt_tokens} + {completion_tokens} tokens"
            ))
        })?;
        Ok(Self {
            prompt_tokens,
            completion_tokens,
            total_tokens,
        })
    }
}

/// Normalized chat completion returned by every [`ProviderClient`].
///
/// Always carries at least one choice.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Completion {
    pub choices: Vec<Choice>,
    pub usage: CompletionUsage,
}

impl Completion {
    /// A single-choice assistant completion.
    pub fn assistant(
        content: impl Into<String>,
        finish_reason: Option<String>,
        usage: CompletionUsage,
    ) -> Self {
        Self {
            choices: vec![Choice {
                message: ChoiceMessage {
                    role: Role::Assistant,
                    content: content.into(),
                },
                finish_reason,
            }],
            usage,
        }
    }

    /// Text of the first choice.
    pub fn text(&self) -> Option<&str> {
        self.choices.first().map(|c| c.message.content.as_str())
    }
}

// ---------------------------------------------------------------------------
// Client capability
// ---------------------------------------------------------------------------

/// A chat-completion vendor behind a single call capability.
///
/// Implementations are shared read-only across workers once built.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    async fn call(
        &self,
        model: &str,
        messages: &[Message],
        max_tokens: u32,
        temperature: f32,
        timeout: Duration,
    ) -> Result<Completion, CallError>;
}

/// Builds the client for a provider. Called at most once per provider by a
/// successful construction in the manager.
pub trait ClientFactory: Send + Sync {
    fn build(&self, provider: Provider) -> Result<Arc<dyn ProviderClient>, ConfigError>;
}

/// Endpoint settings shared by the vendor clients.
#[derive(Clone, Debug, PartialEq)]
pub struct ProviderSettings {
    pub openai_base_url: String,
    pub anthropic_base_url: String,
    pub anthropic_version: String,
}

impl From<&AppConfig> for ProviderSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            openai_base_url: config.openai_base_url.clone(),
            anthropic_base_url: config.anthropic_base_url.clone(),
            anthropic_version: config.anthropic_version.clone(),
        }
    }
}

/// Production factory: reads API keys from the process environment.
pub struct EnvClientFactory {
    settings: ProviderSettings,
}

impl EnvClientFactory {
    pub fn new(settings: ProviderSettings) -> Self {
        Self { settings }
    }
}

impl ClientFactory for EnvClientFactory {
    fn build(&self, provider: Provider) -> Result<Arc<dyn ProviderClient>, ConfigError> {
        let client: Arc<dyn ProviderClient> = match provider {
            Provider::OpenAi => Arc::new(OpenAiClient::from_env(&self.settings)?),
            Provider::Anthropic => Arc::new(AnthropicClient::from_env(&self.settings)?),
        };
        Ok(client)
    }
}

/// Fetch a provider's credential through `lookup`, rejecting absent or blank values.
pub(crate) fn read_credential<F>(provider: Provider, lookup: F) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let var = provider.credential_var();
    match lookup(var) {
        None => Err(ConfigError::MissingCredential {
            provider: provider.to_string(),
            var: var.to_string(),
        }),
        Some(value) if value.trim().is_empty() => Err(ConfigError::EmptyCredential {
            provider: provider.to_string(),
            var: var.to_string(),
        }),
        Some(value) => Ok(value),
    }
}

pub(crate) fn build_http_client() -> Result<reqwest::Client, ConfigError> {
    reqwest::Client::builder()
        .user_agent(concat!("subagent/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| ConfigError::HttpClient(e.to_string()))
}

/// Send a prepared request and return the body of a 2xx response.
///
/// Transport failures, timeouts and non-success statuses all map to
/// [`CallError`]; the body is returned as text for the caller to decode.
pub(crate) async fn send(
    request: reqwest::RequestBuilder,
    timeout: Duration,
) -> Result<String, CallError> {
    let response = request.timeout(timeout).send().await.map_err(|e| {
        if e.is_timeout() {
            CallError::Timeout {
                timeout_secs: timeout.as_secs(),
            }
        } else {
            CallError::Transport(e.to_string())
        }
    })?;

    let status = response.status();
    let body = response.text().await.map_err(|e| {
        if e.is_timeout() {
            CallError::Timeout {
                timeout_secs: timeout.as_secs(),
            }
        } else {
            CallError::Transport(format!("failed to read body: {e}"))
        }
    })?;

    if !status.is_success() {
        return Err(CallError::HttpStatus {
            status: status.as_u16(),
            body: truncate_body(&body, 500),
        });
    }

    Ok(body)
}

/// Join `base` and `path` with exactly one slash between them.
pub(crate) fn endpoint(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

fn truncate_body(body: &str, max_chars: usize) -> String {
    if body.chars().count() > max_chars {
        let head: String = body.chars().take(max_chars).collect();
        format!("{head}...")
    } else {
        body.to_string()
    }
}
