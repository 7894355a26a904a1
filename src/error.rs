/// Errors raised while constructing a provider client.
///
/// These surface before any request is sent: a client is never built without
/// its credential, so a missing key is reported here and not at call time.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing credential for {provider}: environment variable {var} is not set")]
    MissingCredential { provider: String, var: String },

    #[error("Invalid credential for {provider}: environment variable {var} is empty")]
    EmptyCredential { provider: String, var: String },

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// Errors from a single provider call. Each one becomes a failed result for
/// the task that issued the call and never touches sibling tasks.
#[derive(Debug, thiserror::Error)]
pub enum CallError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Provider returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),
}

/// Errors from validating requests at the orchestration boundary.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Invalid JSON in `{field}`: {message}")]
    InvalidJson { field: String, message: String },

    #[error("Unknown provider `{0}` (supported: openai, anthropic)")]
    UnknownProvider(String),

    #[error("Invalid `{field}`: {reason}")]
    InvalidField { field: String, reason: String },
}

/// Errors from the orchestrator itself (as opposed to any one task).
#[derive(Debug, thiserror::Error)]
pub enum OrchestrationError {
    #[error("No tasks provided")]
    EmptyTasks,
}
