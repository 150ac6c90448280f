//! Application State

use std::sync::Arc;

use agent_core::{Agent, LlmProvider};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Orchestration engine: tools, sessions and per-session locks
    pub agent: Arc<Agent>,

    /// LLM provider (Ollama, etc.), for health and model listing
    pub provider: Arc<dyn LlmProvider>,
}
