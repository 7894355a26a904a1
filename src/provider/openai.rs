//! OpenAI-style chat completions client (`POST {base}/chat/completions`).

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::{
    Completion, CompletionUsage, Provider, ProviderClient, ProviderSettings, build_http_client,
    endpoint, read_credential, send,
};
use crate::error::{CallError, ConfigError};
use crate::orchestration::types::Message;
use crate::usage::tokens::TokenCounter;

pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl OpenAiClient {
    /// Build a client, reading `OPENAI_API_KEY` from the process environment.
    pub fn from_env(settings: &ProviderSettings) -> Result<Self, ConfigError> {
        Self::from_lookup(settings, |var| std::env::var(var).ok())
    }

    /// Build a client, resolving the credential through `lookup`.
    pub fn from_lookup<F>(settings: &ProviderSettings, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = read_credential(Provider::OpenAi, lookup)?;
        Ok(Self {
            http: build_http_client()?,
            api_key,
            base_url: settings.openai_base_url.clone(),
        })
    }
}

#[async_trait]
impl ProviderClient for OpenAiClient {
    async fn call(
        &self,
        model: &str,
        messages: &[Message],
        max_tokens: u32,
        temperature: f32,
        timeout: Duration,
    ) -> Result<Completion, CallError> {
        let body = json!({
            "model": model,
            "messages": messages,
            "max_tokens": max_tokens,
            "temperature": temperature,
        });

        let request = self
            .http
            .post(endpoint(&self.base_url, "chat/completions"))
            .bearer_auth(&self.api_key)
            .json(&body);

        let text = send(request, timeout).await?;
        parse_response(&text, messages)
    }
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
    usage: Option<OpenAiUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

/// Decode a chat completions body into the common shape.
///
/// Some OpenAI-compatible servers omit `usage`; in that case it is estimated
/// from the request messages and the returned text.
fn parse_response(body: &str, messages: &[Message]) -> Result<Completion, CallError> {
    let response: OpenAiResponse = serde_json::from_str(body)
        .map_err(|e| CallError::MalformedResponse(format!("invalid JSON: {e}")))?;

    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| CallError::MalformedResponse("response has no choices".into()))?;

    let content = choice
        .message
        .content
        .ok_or_else(|| CallError::MalformedResponse("first choice has no content".into()))?;

    let usage = match response.usage {
        Some(u) => CompletionUsage::reported(u.prompt_tokens, u.completion_tokens)?,
        None => {
            let prompt = TokenCounter::count_messages_tokens(messages);
            let completion = TokenCounter::count_tokens(&content);
            tracing::debug!(prompt, completion, "usage missing from response, estimated");
            CompletionUsage::new(prompt, completion)
        }
    };

    Ok(Completion::assistant(content, choice.finish_reason, usage))
}
