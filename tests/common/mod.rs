#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use subagent::error::{CallError, ConfigError};
use subagent::orchestration::types::{CallRequest, Message, Task};
use subagent::orchestration::{SubagentManager, SubagentOrchestrator};
use subagent::provider::{ClientFactory, Completion, CompletionUsage, Provider, ProviderClient};

// ─── Scripted provider client ─────────────────────────────────────────

/// What the fake client does for a given prompt.
#[derive(Clone, Debug)]
pub enum Reply {
    Text {
        text: String,
        delay: Duration,
        usage: (u64, u64),
    },
    Fail(String),
    Panic(String),
}

impl Reply {
    pub fn text(text: &str) -> Self {
        Reply::Text {
            text: text.to_string(),
            delay: Duration::ZERO,
            usage: (10, 5),
        }
    }

    pub fn delayed(text: &str, delay_ms: u64) -> Self {
        Reply::Text {
            text: text.to_string(),
            delay: Duration::from_millis(delay_ms),
            usage: (10, 5),
        }
    }

    pub fn with_usage(text: &str, input: u64, output: u64) -> Self {
        Reply::Text {
            text: text.to_string(),
            delay: Duration::ZERO,
            usage: (input, output),
        }
    }
}

/// Replies according to the last message's content and records every call.
#[derive(Default)]
pub struct ScriptedClient {
    replies: HashMap<String, Reply>,
    calls: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(mut self, prompt: &str, reply: Reply) -> Self {
        self.replies.insert(prompt.to_string(), reply);
        self
    }

    pub fn calls_for(&self, prompt: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|p| *p == prompt).count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProviderClient for ScriptedClient {
    async fn call(
        &self,
        _model: &str,
        messages: &[Message],
        _max_tokens: u32,
        _temperature: f32,
        _timeout: Duration,
    ) -> Result<Completion, CallError> {
        let prompt = messages
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default();
        self.calls.lock().unwrap().push(prompt.clone());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        let reply = self
            .replies
            .get(&prompt)
            .cloned()
            .unwrap_or_else(|| Reply::text(&format!("done: {prompt}")));

        let outcome = match reply {
            Reply::Text { text, delay, usage } => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                } else {
                    tokio::task::yield_now().await;
                }
                Ok(Completion::assistant(
                    text,
                    Some("stop".into()),
                    CompletionUsage::new(usage.0, usage.1),
                ))
            }
            Reply::Fail(message) => Err(CallError::Transport(message)),
            Reply::Panic(message) => panic!("{message}"),
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        outcome
    }
}

/// Hands out the same scripted client for every provider except those
/// marked as missing their credential.
pub struct FakeFactory {
    client: Arc<ScriptedClient>,
    missing: Vec<Provider>,
}

impl FakeFactory {
    pub fn new(client: Arc<ScriptedClient>) -> Self {
        Self {
            client,
            missing: Vec::new(),
        }
    }

    pub fn without(mut self, provider: Provider) -> Self {
        self.missing.push(provider);
        self
    }
}

impl ClientFactory for FakeFactory {
    fn build(&self, provider: Provider) -> Result<Arc<dyn ProviderClient>, ConfigError> {
        if self.missing.contains(&provider) {
            return Err(ConfigError::MissingCredential {
                provider: provider.to_string(),
                var: provider.credential_var().to_string(),
            });
        }
        let client: Arc<dyn ProviderClient> = self.client.clone();
        Ok(client)
    }
}

pub fn orchestrator_with(factory: FakeFactory, track_cost: bool) -> SubagentOrchestrator {
    let manager = SubagentManager::with_factory(Arc::new(factory), track_cost);
    SubagentOrchestrator::new(manager, Duration::from_secs(5))
}

pub fn task(name: &str, provider: Provider, prompt: &str) -> Task {
    Task::new(
        name,
        CallRequest {
            provider,
            model: "gpt-3.5-turbo".to_string(),
            messages: vec![Message::user(prompt)],
            max_tokens: 100,
            temperature: 0.7,
        },
    )
}

// ─── Minimal HTTP responder ───────────────────────────────────────────

/// Serves one canned response to every connection and records raw requests.
pub struct MockServer {
    pub base_url: String,
    requests: Arc<Mutex<Vec<String>>>,
}

impl MockServer {
    pub async fn start(status: u16, body: &str) -> Self {
        Self::start_with_delay(status, body, Duration::ZERO).await
    }

    pub async fn start_with_delay(status: u16, body: &str, delay: Duration) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let body = body.to_string();

        let recorded = requests.clone();
        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    break;
                };
                let recorded = recorded.clone();
                let body = body.clone();
                tokio::spawn(async move {
                    let raw = read_request(&mut socket).await;
                    recorded.lock().unwrap().push(raw);
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    let response = format!(
                        "HTTP/1.1 {status} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                        reason(status),
                        body.len()
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        Self {
            base_url: format!("http://{addr}"),
            requests,
        }
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => n,
        };
        buf.extend_from_slice(&chunk[..n]);

        let text = String::from_utf8_lossy(&buf);
        if let Some(header_end) = text.find("\r\n\r\n") {
            let content_length = text[..header_end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if buf.len() >= header_end + 4 + content_length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        401 => "Unauthorized",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        _ => "Status",
    }
}

/// A localhost URL with nothing listening on it.
pub async fn unused_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}
