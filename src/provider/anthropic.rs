//! Anthropic Messages API client (`POST {base}/v1/messages`).
//!
//! The Messages API differs from chat completions in three ways that this
//! client hides: system prompts travel in a top-level `system` field, content
//! comes back as a list of typed blocks, and usage reports separate
//! `input_tokens`/`output_tokens` with no total.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

use super::{
    Completion, CompletionUsage, Provider, ProviderClient, ProviderSettings, build_http_client,
    endpoint, read_credential, send,
};
use crate::error::{CallError, ConfigError};
use crate::orchestration::types::{Message, Role};

pub struct AnthropicClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    api_version: String,
}

impl std::fmt::Debug for AnthropicClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicClient")
            .field("base_url", &self.base_url)
            .field("api_version", &self.api_version)
            .finish_non_exhaustive()
    }
}

impl AnthropicClient {
    /// Build a client, reading `ANTHROPIC_API_KEY` from the process environment.
    pub fn from_env(settings: &ProviderSettings) -> Result<Self, ConfigError> {
        Self::from_lookup(settings, |var| std::env::var(var).ok())
    }

    /// Build a client, resolving the credential through `lookup`.
    pub fn from_lookup<F>(settings: &ProviderSettings, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = read_credential(Provider::Anthropic, lookup)?;
        Ok(Self {
            http: build_http_client()?,
            api_key,
            base_url: settings.anthropic_base_url.clone(),
            api_version: settings.anthropic_version.clone(),
        })
    }
}

#[async_trait]
impl ProviderClient for AnthropicClient {
    async fn call(
        &self,
        model: &str,
        messages: &[Message],
        max_tokens: u32,
        temperature: f32,
        timeout: Duration,
    ) -> Result<Completion, CallError> {
        let body = build_request_body(model, messages, max_tokens, temperature);

        let request = self
            .http
            .post(endpoint(&self.base_url, "v1/messages"))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", &self.api_version)
            .json(&body);

        let text = send(request, timeout).await?;
        parse_response(&text)
    }
}

/// Lift system messages into the top-level `system` field; keep the rest in order.
fn build_request_body(
    model: &str,
    messages: &[Message],
    max_tokens: u32,
    temperature: f32,
) -> Value {
    let system: Vec<&str> = messages
        .iter()
        .filter(|m| m.role == Role::System)
        .map(|m| m.content.as_str())
        .collect();

    let conversation: Vec<&Message> = messages.iter().filter(|m| m.role != Role::System).collect();

    let mut body = json!({
        "model": model,
        "messages": conversation,
        "max_tokens": max_tokens,
        "temperature": temperature,
    });

    if !system.is_empty() {
        body["system"] = Value::String(system.join("\n\n"));
    }

    body
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    usage: Option<AnthropicUsage>,
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: Option<String>,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: u64,
    output_tokens: u64,
}

fn parse_response(body: &str) -> Result<Completion, CallError> {
    let response: AnthropicResponse = serde_json::from_str(body)
        .map_err(|e| CallError::MalformedResponse(format!("invalid JSON: {e}")))?;

    let texts: Vec<String> = response
        .content
        .into_iter()
        .filter(|block| block.kind.as_deref().is_none_or(|k| k == "text"))
        .filter_map(|block| block.text)
        .collect();

    if texts.is_empty() {
        return Err(CallError::MalformedResponse(
            "response has no text content blocks".into(),
        ));
    }

    let usage = response
        .usage
        .ok_or_else(|| CallError::MalformedResponse("response has no usage".into()))?;

    Ok(Completion::assistant(
        texts.concat(),
        response.stop_reason,
        CompletionUsage::reported(usage.input_tokens, usage.output_tokens)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> ProviderSettings {
        ProviderSettings {
            openai_base_url: "http://127.0.0.1:1".into(),
            anthropic_base_url: "http://127.0.0.1:1".into(),
            anthropic_version: "2023-06-01".into(),
        }
    }

    #[test]
    fn construction_requires_api_key() {
        let err = AnthropicClient::from_lookup(&settings(), |_| None).unwrap_err();
        assert!(err.to_string().contains("ANTHROPIC_API_KEY"));
    }

    #[test]
    fn maps_content_blocks_and_synthesizes_total() {
        let body = r#"{
            "content": [{"type": "text", "text": "Hello! I'm Claude. How can I help?"}],
            "usage": {"input_tokens": 12, "output_tokens": 9},
            "stop_reason": "end_turn"
        }"#;

        let completion = parse_response(body).unwrap();
        assert_eq!(completion.text(), Some("Hello! I'm Claude. How can I help?"));
        assert_eq!(completion.choices[0].message.role, Role::Assistant);
        assert_eq!(completion.choices[0].finish_reason.as_deref(), Some("end_turn"));
        assert_eq!(completion.usage.prompt_tokens, 12);
        assert_eq!(completion.usage.completion_tokens, 9);
        assert_eq!(completion.usage.total_tokens, 21);
    }

    #[test]
    fn overflowing_usage_is_malformed() {
        let body = r#"{
            "content": [{"type": "text", "text": "hi"}],
            "usage": {"input_tokens": 18446744073709551615, "output_tokens": 1}
        }"#;

        let err = parse_response(body).unwrap_err();
        assert!(matches!(err, CallError::MalformedResponse(_)));
    }

    #[test]
    fn concatenates_text_blocks_and_skips_others() {
        let body = r#"{
            "content": [
                {"type": "text", "text": "part one, "},
                {"type": "tool_use", "id": "t1", "name": "x", "input": {}},
                {"text": "part two"}
            ],
            "usage": {"input_tokens": 1, "output_tokens": 1}
        }"#;

        let completion = parse_response(body).unwrap();
        assert_eq!(completion.text(), Some("part one, part two"));
    }

    #[test]
    fn missing_usage_is_malformed() {
        let body = r#"{"content": [{"type": "text", "text": "hi"}]}"#;
        let err = parse_response(body).unwrap_err();
        assert!(err.to_string().contains("usage"));
    }

    #[test]
    fn empty_content_is_malformed() {
        let body = r#"{"content": [], "usage": {"input_tokens": 1, "output_tokens": 0}}"#;
        assert!(matches!(
            parse_response(body).unwrap_err(),
            CallError::MalformedResponse(_)
        ));
    }

    #[test]
    fn system_messages_move_to_top_level() {
        let messages = vec![
            Message::system("Be terse."),
            Message::user("Hi"),
            Message::system("Answer in English."),
            Message::assistant("Hello"),
        ];

        let body = build_request_body("claude-3-haiku-20240307", &messages, 64, 0.2);

        assert_eq!(body["system"], "Be terse.\n\nAnswer in English.");
        let sent = body["messages"].as_array().unwrap();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0]["role"], "user");
        assert_eq!(sent[1]["role"], "assistant");
        assert_eq!(body["max_tokens"], 64);
    }

    #[test]
    fn no_system_field_without_system_messages() {
        let body = build_request_body("m", &[Message::user("Hi")], 10, 0.0);
        assert!(body.get("system").is_none());
    }
}
