//! Turn Executor
//!
//! Runs the tool calls requested by one assistant message and turns every
//! outcome, including unknown tools and invalid arguments, into a tool-result
//! message. Nothing here can fail the turn.

use std::sync::Arc;

use futures::future;

use crate::message::Message;
use crate::tool::{ToolCall, ToolRegistry, ToolResult};

pub struct TurnExecutor {
    tools: Arc<ToolRegistry>,
}

impl TurnExecutor {
    pub fn new(tools: Arc<ToolRegistry>) -> Self {
        Self { tools }
    }

    /// Execute `calls` concurrently. The returned messages follow request
    /// order regardless of completion order.
    pub async fn execute(&self, calls: &[ToolCall]) -> Vec<Message> {
        let results = future::join_all(calls.iter().map(|call| self.execute_one(call))).await;

        calls
            .iter()
            .zip(results)
            .map(|(call, result)| result.into_message(&call.id))
            .collect()
    }

    async fn execute_one(&self, call: &ToolCall) -> ToolResult {
        let Some(tool) = self.tools.get(&call.name) else {
            tracing::warn!(tool = %call.name, id = %call.id, "Model requested unknown tool");
            return ToolResult::failure(
                &call.name,
                format!(
                    "Error: unknown tool '{}'. Available tools: {}",
                    call.name,
                    self.tools.names().join(", ")
                ),
            )
            .with_id(&call.id);
        };

        if let Err(e) = tool.validate(call) {
            tracing::warn!(tool = %call.name, error = %e, "Tool arguments rejected");
            return ToolResult::failure(&call.name, format!("Error: {e}")).with_id(&call.id);
        }

        tracing::debug!(tool = %call.name, id = %call.id, "Executing tool");
        let result = tool.execute(call).await.with_id(&call.id);

        if !result.success {
            tracing::warn!(tool = %call.name, output = %result.output, "Tool reported failure");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::{ParameterSchema, Tool, ToolSchema};
    use async_trait::async_trait;
    use std::time::Duration;

    /// Sleeps for `delay_ms` then echoes it, so later calls can finish first
    struct SlowEcho;

    #[async_trait]
    impl Tool for SlowEcho {
        fn schema(&self) -> ToolSchema {
            ToolSchema {
                name: "slow_echo".into(),
                description: "Echo after a delay".into(),
                parameters: vec![ParameterSchema {
                    name: "delay_ms".into(),
                    param_type: "number".into(),
                    description: "Delay".into(),
                    required: true,
                    default: None,
                    enum_values: None,
                }],
                category: None,
                has_side_effects: false,
            }
        }

        async fn execute(&self, call: &ToolCall) -> ToolResult {
            let delay = call.arguments.get("delay_ms").and_then(serde_json::Value::as_u64).unwrap_or(0);
            tokio::time::sleep(Duration::from_millis(delay)).await;
            ToolResult::success("slow_echo", format!("slept {delay}"))
        }
    }

    fn executor() -> TurnExecutor {
        let mut registry = ToolRegistry::new();
        registry.register(SlowEcho);
        TurnExecutor::new(Arc::new(registry))
    }

    #[tokio::test]
    async fn test_results_keep_request_order() {
        let calls = vec![
            ToolCall::new("slow_echo", serde_json::json!({"delay_ms": 60})).with_id("first"),
            ToolCall::new("slow_echo", serde_json::json!({"delay_ms": 1})).with_id("second"),
        ];

        let messages = executor().execute(&calls).await;

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].tool_call_id.as_deref(), Some("first"));
        assert_eq!(messages[0].content, "slept 60");
        assert_eq!(messages[1].tool_call_id.as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn test_unknown_tool_becomes_result() {
        let calls = vec![ToolCall::new("teleport", serde_json::json!({})).with_id("c1")];

        let messages = executor().execute(&calls).await;

        assert_eq!(messages.len(), 1);
        assert!(messages[0].is_error());
        assert!(messages[0].content.contains("unknown tool 'teleport'"));
        assert!(messages[0].content.contains("slow_echo"));
    }

    #[tokio::test]
    async fn test_missing_argument_becomes_result() {
        let calls = vec![ToolCall::new("slow_echo", serde_json::json!({})).with_id("c1")];

        let messages = executor().execute(&calls).await;

        assert!(messages[0].is_error());
        assert!(messages[0].content.contains("delay_ms"));
    }
}
