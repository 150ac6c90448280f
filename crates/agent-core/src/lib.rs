//! # agent-core
//!
//! Agent orchestration engine: a resumable reason/act loop over a
//! provider-agnostic LLM abstraction, a fixed tool registry and per-session
//! conversation state.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                              Agent                               │
//! │  ┌──────────────┐   ┌───────────────┐   ┌─────────────────────┐  │
//! │  │ Router       │──▶│ ReasoningStep │──▶│ LlmProvider         │  │
//! │  │ (TurnState)  │   └───────────────┘   │ (Strategy)          │  │
//! │  │              │   ┌───────────────┐   └─────────────────────┘  │
//! │  │              │──▶│ TurnExecutor  │──▶ ToolRegistry            │
//! │  │              │   └───────────────┘                            │
//! │  │              │──▶ SessionLocks + SessionStore                 │
//! │  └──────────────┘                                                │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `LlmProvider` trait enables swapping between Ollama, OpenAI, Anthropic,
//! or any other provider without changing agent logic.

pub mod config;
pub mod error;
pub mod executor;
pub mod message;
pub mod mock;
pub mod provider;
pub mod reasoning;
pub mod router;
pub mod session;
pub mod tool;

pub use config::AgentConfig;
pub use error::{AgentError, Result};
pub use executor::TurnExecutor;
pub use message::{Conversation, Message, Role};
pub use provider::LlmProvider;
pub use reasoning::ReasoningStep;
pub use router::{Agent, AgentBuilder, TurnReply, TurnState};
pub use session::{FileSessionStore, MemorySessionStore, SessionId, SessionStore};
pub use tool::{Tool, ToolCall, ToolRegistry, ToolResult, ToolSchema};
