//! Single-call entry point and provider client cache.
//!
//! [`SubagentManager`] owns one lazily-built client per [`Provider`]. It is a
//! cheap `Clone` handle over shared state so the process entry point can build
//! it once and hand copies to the orchestrator and its workers.
//!
//! **Concurrency model:** each provider slot is a `once_cell::sync::OnceCell`.
//! Concurrent first use of a provider runs the factory exactly once; other
//! callers block until it finishes and then share the same `Arc`. A failed
//! construction leaves the slot empty, so a credential added later is picked up
//! on the next call. After construction clients are only read.

use std::sync::Arc;
use std::time::{Duration, Instant};

use once_cell::sync::OnceCell;

use super::types::{CallRequest, CallResult, Usage};
use crate::config::AppConfig;
use crate::error::ConfigError;
use crate::provider::{ClientFactory, EnvClientFactory, Provider, ProviderClient, ProviderSettings};
use crate::usage::{CostCalculator, TokenCounter};

/// One cache slot per supported provider.
#[derive(Default)]
struct ClientSlots {
    openai: OnceCell<Arc<dyn ProviderClient>>,
    anthropic: OnceCell<Arc<dyn ProviderClient>>,
}

impl ClientSlots {
    fn slot(&self, provider: Provider) -> &OnceCell<Arc<dyn ProviderClient>> {
        match provider {
            Provider::OpenAi => &self.openai,
            Provider::Anthropic => &self.anthropic,
        }
    }
}

struct ManagerInner {
    factory: Arc<dyn ClientFactory>,
    clients: ClientSlots,
    track_cost: bool,
}

/// Shared handle for issuing provider calls.
///
/// # Example
///
/// ```ignore
/// let manager = SubagentManager::new(&config);
/// let result = manager.call_ai(&request, Duration::from_secs(60)).await?;
/// ```
#[derive(Clone)]
pub struct SubagentManager {
    inner: Arc<ManagerInner>,
}

impl SubagentManager {
    /// Create a manager whose clients read credentials from the environment.
    pub fn new(config: &AppConfig) -> Self {
        let factory = EnvClientFactory::new(ProviderSettings::from(config));
        Self::with_factory(Arc::new(factory), config.track_cost)
    }

    /// Create a manager that builds clients through `factory`.
    ///
    /// When `track_cost` is set, successful results carry a cost estimate.
    pub fn with_factory(factory: Arc<dyn ClientFactory>, track_cost: bool) -> Self {
        Self {
            inner: Arc::new(ManagerInner {
                factory,
                clients: ClientSlots::default(),
                track_cost,
            }),
        }
    }

    pub fn tracks_cost(&self) -> bool {
        self.inner.track_cost
    }

    /// Return the cached client for `provider`, building it on first use.
    ///
    /// Concurrent first callers block while the factory runs, so factories
    /// must stay synchronous and cheap (no network I/O).
    pub fn client(&self, provider: Provider) -> Result<Arc<dyn ProviderClient>, ConfigError> {
        self.inner
            .clients
            .slot(provider)
            .get_or_try_init(|| {
                let client = self.inner.factory.build(provider)?;
                tracing::debug!(%provider, "provider client constructed");
                Ok(client)
            })
            .cloned()
    }

    /// Issue one provider call and normalize the outcome.
    ///
    /// Configuration errors (missing credential) are returned as `Err`. Any
    /// failure of the call itself becomes a failed [`CallResult`] with no
    /// usage or cost.
    pub async fn call_ai(
        &self,
        request: &CallRequest,
        timeout: Duration,
    ) -> Result<CallResult, ConfigError> {
        let client = self.client(request.provider)?;

        tracing::debug!(
            provider = %request.provider,
            model = %request.model,
            estimated_prompt_tokens = TokenCounter::count_messages_tokens(&request.messages),
            "calling provider"
        );

        let start = Instant::now();
        let outcome = client
            .call(
                &request.model,
                &request.messages,
                request.max_tokens,
                request.temperature,
                timeout,
            )
            .await;
        let elapsed = start.elapsed().as_secs_f64();

        let result = match outcome {
            Ok(completion) => {
                let text = completion.text().unwrap_or_default().to_string();
                let usage = Usage::new(
                    completion.usage.prompt_tokens,
                    completion.usage.completion_tokens,
                );
                let mut result =
                    CallResult::success(request.provider, &request.model, text, usage, elapsed);
                if self.inner.track_cost {
                    result.cost = Some(
                        CostCalculator::calculate(
                            &request.model,
                            usage.input_tokens,
                            usage.output_tokens,
                        )
                        .total_cost,
                    );
                }
                tracing::info!(
                    provider = %request.provider,
                    model = %request.model,
                    total_tokens = usage.total_tokens,
                    elapsed_secs = elapsed,
                    "provider call succeeded"
                );
                result
            }
            Err(e) => {
                tracing::warn!(
                    provider = %request.provider,
                    model = %request.model,
                    elapsed_secs = elapsed,
                    error = %e,
                    "provider call failed"
                );
                CallResult::failed(request.provider, &request.model, e.to_string(), elapsed)
            }
        };

        Ok(result)
    }

    /// Like [`call_ai`](Self::call_ai), but a configuration error is folded
    /// into a failed result so it can sit alongside other task outcomes.
    pub async fn call_isolated(&self, request: &CallRequest, timeout: Duration) -> CallResult {
        match self.call_ai(request, timeout).await {
            Ok(result) => result,
            Err(e) => CallResult::failed(request.provider, &request.model, e.to_string(), 0.0),
        }
    }
}
