//! Error Types

use thiserror::Error;

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;

/// Agent error types
///
/// Only the turn-level variants (`ReasoningUnavailable`, `SessionConflict`,
/// `IterationLimitExceeded`, `Timeout`) are expected to reach callers of
/// [`crate::Agent::submit_turn`]. Tool-level variants are absorbed into the
/// conversation as text by the turn executor.
#[derive(Error, Debug)]
pub enum AgentError {
    /// LLM provider returned an error response
    #[error("Provider error: {0}")]
    Provider(String),

    /// Provider unavailable or not responding
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// The reasoning step could not produce a decision
    #[error("Reasoning unavailable: {0}")]
    ReasoningUnavailable(String),

    /// Tool not found in registry
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Tool validation failed
    #[error("Tool validation error: {0}")]
    ToolValidation(String),

    /// Tool execution failed
    #[error("Tool execution error: {0}")]
    ToolExecution(String),

    /// Another turn holds the session for longer than the lock timeout
    #[error("Session {0} is busy with another turn")]
    SessionConflict(String),

    /// Reasoning loop hit its iteration cap
    #[error("Maximum iterations ({0}) reached")]
    IterationLimitExceeded(usize),

    /// Turn exceeded its deadline
    #[error("Turn timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// Parse error (e.g., tool call parsing)
    #[error("Parse error: {0}")]
    Parse(String),

    /// Session store error
    #[error("Session error: {0}")]
    Session(String),

    /// Caller supplied an unusable request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Rate limited
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AgentError {
    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AgentError::ProviderUnavailable(_)
                | AgentError::ReasoningUnavailable(_)
                | AgentError::SessionConflict(_)
                | AgentError::Timeout(_)
                | AgentError::RateLimited(_)
                | AgentError::Io(_)
        )
    }

    /// Stable machine-readable error kind
    pub fn kind(&self) -> &'static str {
        match self {
            AgentError::Provider(_) => "provider_error",
            AgentError::ProviderUnavailable(_) => "provider_unavailable",
            AgentError::ReasoningUnavailable(_) => "reasoning_unavailable",
            AgentError::UnknownTool(_) => "unknown_tool",
            AgentError::ToolValidation(_) => "tool_validation",
            AgentError::ToolExecution(_) => "tool_execution",
            AgentError::SessionConflict(_) => "session_conflict",
            AgentError::IterationLimitExceeded(_) => "iteration_limit_exceeded",
            AgentError::Timeout(_) => "timeout",
            AgentError::Parse(_) => "parse_error",
            AgentError::Session(_) => "session_store",
            AgentError::InvalidRequest(_) => "invalid_request",
            AgentError::Config(_) => "config",
            AgentError::RateLimited(_) => "rate_limited",
            AgentError::Io(_) => "io",
            AgentError::Json(_) => "json",
        }
    }

    /// Convert to a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            AgentError::Provider(msg) => format!("The AI service encountered an error: {msg}"),
            AgentError::ProviderUnavailable(_) | AgentError::ReasoningUnavailable(_) => {
                "The AI service is currently unavailable. Please try again.".into()
            }
            AgentError::UnknownTool(name) => format!("The tool '{name}' is not available."),
            AgentError::ToolValidation(msg) => format!("Invalid tool input: {msg}"),
            AgentError::ToolExecution(msg) => format!("Tool error: {msg}"),
            AgentError::SessionConflict(_) => {
                "This conversation is still processing a previous message. Please wait.".into()
            }
            AgentError::IterationLimitExceeded(_) => {
                "The request took too long to process. Please try a simpler query.".into()
            }
            AgentError::Timeout(_) => "The request timed out. Please try again.".into(),
            AgentError::InvalidRequest(msg) => format!("Invalid request: {msg}"),
            AgentError::RateLimited(_) => "You've made too many requests. Please wait a moment.".into(),
            _ => "An unexpected error occurred.".into(),
        }
    }
}
