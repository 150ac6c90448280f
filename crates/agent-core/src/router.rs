//! Orchestration Loop
//!
//! Drives one turn through an explicit state machine:
//!
//! ```text
//!            ┌──────────────────── tool results ───────────────────┐
//!            ▼                                                     │
//!   ┌─────────────────┐  tool calls   ┌──────────────────┐         │
//!   │ AwaitingModel   │──────────────▶│ ExecutingTools   │─────────┘
//!   └─────────────────┘               └──────────────────┘
//!      │ final answer        │ provider error / iteration cap
//!      ▼                     ▼
//!   ┌──────┐             ┌────────┐
//!   │ Done │             │ Failed │
//!   └──────┘             └────────┘
//! ```
//!
//! The turn works on a private copy of the session history. Only on `Done`
//! are the new messages appended to the store, in a single call, while the
//! session lock is held.

use std::sync::Arc;

use crate::config::AgentConfig;
use crate::error::{AgentError, Result};
use crate::executor::TurnExecutor;
use crate::message::{Conversation, Message};
use crate::provider::LlmProvider;
use crate::reasoning::ReasoningStep;
use crate::session::{MemorySessionStore, SessionId, SessionLocks, SessionStore};
use crate::tool::{Tool, ToolCall, ToolRegistry};

/// Turn state machine
#[derive(Debug)]
pub enum TurnState {
    /// Next step is a reasoning call
    AwaitingModel,
    /// The latest assistant message asked for these calls
    ExecutingTools(Vec<ToolCall>),
    /// Terminal assistant message recorded
    Done,
    /// Turn aborted; nothing will be persisted
    Failed(AgentError),
}

/// Result of a completed turn
#[derive(Clone, Debug)]
pub struct TurnReply {
    pub session_id: SessionId,

    /// Text of the terminal assistant message
    pub response: String,

    /// User message plus every assistant/tool message generated this turn
    pub messages: Vec<Message>,

    /// Reasoning calls made
    pub iterations: usize,
}

/// The orchestration context: reasoning, tools and session state
pub struct Agent {
    reasoning: ReasoningStep,
    executor: TurnExecutor,
    tools: Arc<ToolRegistry>,
    store: Arc<dyn SessionStore>,
    locks: SessionLocks,
    config: AgentConfig,
}

impl Agent {
    /// Create a new agent
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        tools: Arc<ToolRegistry>,
        store: Arc<dyn SessionStore>,
        config: AgentConfig,
    ) -> Self {
        Self {
            reasoning: ReasoningStep::new(provider, tools.clone(), config.clone()),
            executor: TurnExecutor::new(tools.clone()),
            tools,
            store,
            locks: SessionLocks::new(),
            config,
        }
    }

    /// Run one turn: `user_text` in, final assistant text out.
    ///
    /// Turns on the same session are serialized. If the reasoning step fails,
    /// the iteration cap is hit or the turn times out, the session is left
    /// exactly as it was.
    pub async fn submit_turn(&self, session_id: &str, user_text: &str) -> Result<TurnReply> {
        let id = SessionId::parse(session_id)?;
        if user_text.trim().is_empty() {
            return Err(AgentError::InvalidRequest("message must not be empty".into()));
        }

        let _guard = self.locks.acquire(&id, self.config.lock_timeout).await?;
        let history = self.store.load(&id).await?;

        let (generated, iterations) = tokio::time::timeout(
            self.config.turn_timeout,
            self.run_turn(history, Message::user(user_text)),
        )
        .await
        .map_err(|_| {
            tracing::warn!(session = %id, timeout = ?self.config.turn_timeout, "Turn timed out");
            AgentError::Timeout(self.config.turn_timeout)
        })??;

        self.store.append(&id, &generated).await?;

        let response = generated
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default();

        tracing::info!(
            session = %id,
            iterations,
            messages_added = generated.len(),
            "Turn completed"
        );

        Ok(TurnReply {
            session_id: id,
            response,
            messages: generated,
            iterations,
        })
    }

    /// One-off question with no stored session
    pub async fn ask(&self, question: &str) -> Result<String> {
        let (generated, _) = tokio::time::timeout(
            self.config.turn_timeout,
            self.run_turn(Vec::new(), Message::user(question)),
        )
        .await
        .map_err(|_| AgentError::Timeout(self.config.turn_timeout))??;

        Ok(generated.last().map(|m| m.content.clone()).unwrap_or_default())
    }

    /// Stored history of a session
    pub async fn history(&self, session_id: &str) -> Result<Vec<Message>> {
        let id = SessionId::parse(session_id)?;
        self.store.load(&id).await
    }

    /// Drive the state machine over a working copy of `history`.
    ///
    /// Returns the messages generated this turn (starting with `user`) and the
    /// number of reasoning calls made.
    async fn run_turn(&self, history: Vec<Message>, user: Message) -> Result<(Vec<Message>, usize)> {
        let mut working = Conversation::from_messages(history);
        let start = working.len();
        working.push(user);

        let mut iterations = 0;
        let mut state = TurnState::AwaitingModel;

        loop {
            state = match state {
                TurnState::AwaitingModel => {
                    iterations += 1;
                    if iterations > self.config.max_iterations {
                        TurnState::Failed(AgentError::IterationLimitExceeded(self.config.max_iterations))
                    } else {
                        match self.reasoning.decide(working.messages()).await {
                            Ok(mut reply) => {
                                let replaced = working.assign_call_ids(&mut reply.tool_calls);
                                if replaced > 0 {
                                    tracing::debug!(replaced, "Reassigned reused tool call ids");
                                }
                                working.push(reply);

                                let calls: Vec<ToolCall> =
                                    working.unresolved_tool_calls().into_iter().cloned().collect();
                                if calls.is_empty() {
                                    TurnState::Done
                                } else {
                                    TurnState::ExecutingTools(calls)
                                }
                            }
                            Err(e) => TurnState::Failed(e),
                        }
                    }
                }
                TurnState::ExecutingTools(calls) => {
                    tracing::debug!(count = calls.len(), iteration = iterations, "Executing tool calls");
                    let results = self.executor.execute(&calls).await;
                    working.extend(results);
                    TurnState::AwaitingModel
                }
                TurnState::Done => break,
                TurnState::Failed(e) => {
                    tracing::warn!(error = %e, iterations, "Turn failed");
                    return Err(e);
                }
            };
        }

        working.check_tool_links(start)?;
        Ok((working.since(start).to_vec(), iterations))
    }

    /// Get the tool registry
    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Get the session store
    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    /// Get the per-session locks
    pub fn locks(&self) -> &SessionLocks {
        &self.locks
    }

    /// Get configuration
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }
}

/// Builder for Agent configuration
#[derive(Default)]
pub struct AgentBuilder {
    provider: Option<Arc<dyn LlmProvider>>,
    tools: ToolRegistry,
    store: Option<Arc<dyn SessionStore>>,
    config: AgentConfig,
}

impl AgentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    #[must_use]
    pub fn tool<T: Tool + 'static>(mut self, tool: T) -> Self {
        self.tools.register(tool);
        self
    }

    #[must_use]
    pub fn tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = tools;
        self
    }

    #[must_use]
    pub fn store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.store = Some(store);
        self
    }

    #[must_use]
    pub fn config(mut self, config: AgentConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = prompt.into();
        self
    }

    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.generation.model = model.into();
        self
    }

    #[must_use]
    pub fn max_iterations(mut self, max: usize) -> Self {
        self.config.max_iterations = max;
        self
    }

    #[must_use]
    pub fn turn_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.config.turn_timeout = timeout;
        self
    }

    #[must_use]
    pub fn lock_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.config.lock_timeout = timeout;
        self
    }

    /// Build the agent. Sessions default to an in-memory store.
    pub fn build(self) -> Result<Agent> {
        let provider = self
            .provider
            .ok_or_else(|| AgentError::Config("Provider is required".into()))?;
        self.config.validate()?;

        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemorySessionStore::new()));

        Ok(Agent::new(provider, Arc::new(self.tools), store, self.config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Role;
    use crate::mock::ScriptedProvider;
    use crate::tool::{ParameterSchema, ToolResult, ToolSchema};
    use async_trait::async_trait;
    use std::time::Duration;

    struct LookupTool;

    #[async_trait]
    impl Tool for LookupTool {
        fn schema(&self) -> ToolSchema {
            ToolSchema {
                name: "lookup".into(),
                description: "Look up a key".into(),
                parameters: vec![ParameterSchema::required_string("key", "Key to look up")],
                category: None,
                has_side_effects: false,
            }
        }

        async fn execute(&self, call: &ToolCall) -> ToolResult {
            match call.str_arg("key") {
                Some("known") => ToolResult::success("lookup", "value for known"),
                Some(other) => ToolResult::failure("lookup", format!("Key {other} not found.")),
                None => ToolResult::failure("lookup", "no key"),
            }
        }
    }

    fn agent(provider: Arc<ScriptedProvider>) -> Agent {
        AgentBuilder::new()
            .provider(provider)
            .tool(LookupTool)
            .max_iterations(4)
            .turn_timeout(Duration::from_secs(5))
            .lock_timeout(Duration::from_secs(5))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_direct_answer() {
        let provider = Arc::new(ScriptedProvider::new().reply_text("Hello!"));
        let agent = agent(provider);

        let reply = agent.submit_turn("s1", "Hi").await.unwrap();
        assert_eq!(reply.response, "Hello!");
        assert_eq!(reply.iterations, 1);

        let history = agent.history("s1").await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, Role::User);
        assert!(history[1].is_terminal());
    }

    #[tokio::test]
    async fn test_tool_loop_records_every_step() {
        let provider = Arc::new(
            ScriptedProvider::new()
                .reply_tool("lookup", serde_json::json!({"key": "known"}))
                .reply_text("The value is known."),
        );
        let agent = agent(provider.clone());

        let reply = agent.submit_turn("s1", "What is known?").await.unwrap();
        assert_eq!(reply.iterations, 2);

        let history = agent.history("s1").await.unwrap();
        let roles: Vec<Role> = history.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant, Role::Tool, Role::Assistant]);
        assert_eq!(history[2].tool_call_id.as_deref(), Some(history[1].tool_calls[0].id.as_str()));
        assert_eq!(history[2].content, "value for known");

        // second reasoning call saw the tool result
        let second = &provider.requests()[1];
        assert_eq!(second.last().unwrap().role, Role::Tool);
    }

    #[tokio::test]
    async fn test_history_grows_by_generated_messages() {
        let provider = Arc::new(
            ScriptedProvider::new()
                .reply_text("first")
                .reply_tool("lookup", serde_json::json!({"key": "other"}))
                .reply_text("second"),
        );
        let agent = agent(provider);

        agent.submit_turn("s1", "one").await.unwrap();
        let before = agent.history("s1").await.unwrap().len();

        let reply = agent.submit_turn("s1", "two").await.unwrap();
        let after = agent.history("s1").await.unwrap();

        assert_eq!(after.len(), before + reply.messages.len());
        assert_eq!(reply.messages.len(), 4);
        assert!(after.last().unwrap().is_terminal());
        assert!(Conversation::from_messages(after).check_tool_links(0).is_ok());
    }

    #[tokio::test]
    async fn test_reasoning_failure_leaves_history_untouched() {
        let provider = Arc::new(
            ScriptedProvider::new()
                .reply_text("first answer")
                .reply_tool("lookup", serde_json::json!({"key": "known"}))
                .fail("model offline"),
        );
        let agent = agent(provider);

        agent.submit_turn("s1", "one").await.unwrap();
        let before = agent.history("s1").await.unwrap();

        let err = agent.submit_turn("s1", "two").await.unwrap_err();
        assert_eq!(err.kind(), "reasoning_unavailable");

        let after = agent.history("s1").await.unwrap();
        assert_eq!(after.len(), before.len());
        assert_eq!(after.last().unwrap().content, "first answer");
    }

    #[tokio::test]
    async fn test_unknown_tool_does_not_abort() {
        let provider = Arc::new(
            ScriptedProvider::new()
                .reply_tool("teleport", serde_json::json!({}))
                .reply_text("Sorry, I cannot do that."),
        );
        let agent = agent(provider);

        let reply = agent.submit_turn("s1", "Beam me up").await.unwrap();
        assert_eq!(reply.response, "Sorry, I cannot do that.");
        assert!(reply.messages[2].is_error());
    }

    #[tokio::test]
    async fn test_iteration_cap() {
        let provider = Arc::new(
            ScriptedProvider::new()
                .reply_tool("lookup", serde_json::json!({"key": "known"}))
                .repeat_last(),
        );
        let agent = agent(provider.clone());

        let err = agent.submit_turn("s1", "loop forever").await.unwrap_err();
        assert!(matches!(err, AgentError::IterationLimitExceeded(4)));
        assert_eq!(provider.requests().len(), 4);
        assert!(agent.history("s1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_timeout_persists_nothing() {
        let provider = Arc::new(
            ScriptedProvider::new()
                .reply_text("too late")
                .with_latency(Duration::from_millis(200)),
        );
        let agent = AgentBuilder::new()
            .provider(provider)
            .turn_timeout(Duration::from_millis(20))
            .build()
            .unwrap();

        let err = agent.submit_turn("s1", "hello").await.unwrap_err();
        assert!(matches!(err, AgentError::Timeout(_)));
        assert!(agent.history("s1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_busy_session_reports_conflict() {
        let provider = Arc::new(ScriptedProvider::new().reply_text("hi"));
        let agent = AgentBuilder::new()
            .provider(provider)
            .lock_timeout(Duration::from_millis(20))
            .build()
            .unwrap();

        let id = SessionId::parse("s1").unwrap();
        let _held = agent.locks().try_acquire(&id).unwrap();

        let err = agent.submit_turn("s1", "hello").await.unwrap_err();
        assert!(matches!(err, AgentError::SessionConflict(_)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_same_session_turns_serialize() {
        let provider = Arc::new(
            ScriptedProvider::new()
                .reply_text("answer one")
                .reply_text("answer two")
                .with_latency(Duration::from_millis(30)),
        );
        let agent = Arc::new(agent(provider));

        let a = tokio::spawn({
            let agent = agent.clone();
            async move { agent.submit_turn("s1", "question one").await }
        });
        let b = tokio::spawn({
            let agent = agent.clone();
            async move { agent.submit_turn("s1", "question two").await }
        });
        a.await.unwrap().unwrap();
        b.await.unwrap().unwrap();

        let roles: Vec<Role> = agent
            .history("s1")
            .await
            .unwrap()
            .iter()
            .map(|m| m.role)
            .collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant, Role::User, Role::Assistant]);
    }

    fn tool_block(key: &str, id: &str) -> String {
        format!("```tool\n{{\"tool\": \"lookup\", \"arguments\": {{\"key\": \"{key}\"}}, \"id\": \"{id}\"}}\n```")
    }

    fn call_ids(messages: &[Message]) -> (Vec<String>, Vec<String>) {
        let requested = messages
            .iter()
            .flat_map(|m| m.tool_calls.iter().map(|c| c.id.clone()))
            .collect();
        let answered = messages
            .iter()
            .filter_map(|m| m.tool_call_id.clone())
            .collect();
        (requested, answered)
    }

    #[tokio::test]
    async fn test_repeated_id_in_one_reply_is_reassigned() {
        let provider = Arc::new(
            ScriptedProvider::new()
                .reply_text(format!("{}\n{}", tool_block("known", "call_1"), tool_block("other", "call_1")))
                .reply_text("done"),
        );
        let agent = agent(provider);

        let reply = agent.submit_turn("s1", "two lookups").await.unwrap();
        assert_eq!(reply.response, "done");

        let (requested, answered) = call_ids(&reply.messages);
        assert_eq!(requested.len(), 2);
        assert_eq!(requested[0], "call_1");
        assert_ne!(requested[1], "call_1");
        assert_eq!(requested, answered);
        assert_eq!(reply.messages[2].content, "value for known");
        assert_eq!(reply.messages[3].content, "Key other not found.");
    }

    #[tokio::test]
    async fn test_id_reused_across_iterations_is_reassigned() {
        let provider = Arc::new(
            ScriptedProvider::new()
                .reply_text(tool_block("known", "call_1"))
                .reply_text(tool_block("other", "call_1"))
                .reply_text("done"),
        );
        let agent = agent(provider);

        let reply = agent.submit_turn("s1", "look twice").await.unwrap();
        let (requested, answered) = call_ids(&reply.messages);

        assert_eq!(requested.len(), 2);
        assert_ne!(requested[0], requested[1]);
        assert_eq!(requested, answered);
    }

    #[tokio::test]
    async fn test_stale_bad_link_in_history_does_not_block_turns() {
        let store = Arc::new(MemorySessionStore::new());
        let id = SessionId::parse("s1").unwrap();
        store
            .append(&id, &[Message::user("old"), Message::tool("stray", "zzz")])
            .await
            .unwrap();

        let agent = AgentBuilder::new()
            .provider(Arc::new(
                ScriptedProvider::new()
                    .reply_tool("lookup", serde_json::json!({"key": "known"}))
                    .reply_text("still working"),
            ))
            .tool(LookupTool)
            .store(store)
            .build()
            .unwrap();

        let reply = agent.submit_turn("s1", "new question").await.unwrap();
        assert_eq!(reply.response, "still working");
        assert_eq!(agent.history("s1").await.unwrap().len(), 6);
    }

    #[tokio::test]
    async fn test_ask_runs_without_a_session() {
        let provider = Arc::new(
            ScriptedProvider::new()
                .reply_tool("lookup", serde_json::json!({"key": "known"}))
                .reply_text("It is known."),
        );
        let agent = agent(provider.clone());

        assert_eq!(agent.ask("What is known?").await.unwrap(), "It is known.");
        assert_eq!(provider.requests().len(), 2);
        assert!(agent.store().list(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rejects_blank_input() {
        let agent = agent(Arc::new(ScriptedProvider::new()));
        assert!(matches!(agent.submit_turn("", "hi").await, Err(AgentError::InvalidRequest(_))));
        assert!(matches!(agent.submit_turn("s1", "  ").await, Err(AgentError::InvalidRequest(_))));
    }

    #[test]
    fn test_builder_requires_provider() {
        assert!(matches!(AgentBuilder::new().build(), Err(AgentError::Config(_))));
    }
}
