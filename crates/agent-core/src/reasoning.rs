//! Reasoning Step
//!
//! Asks the LLM provider what to do next. The answer is always exactly one
//! assistant message: either a final reply, or a request to call tools.
//!
//! Providers with native function calling return [`ToolCall`]s directly.
//! Text-only providers are told (via the system prompt) to emit fenced
//! ```` ```tool ```` JSON blocks, which are parsed out here.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;

use crate::config::AgentConfig;
use crate::error::{AgentError, Result};
use crate::message::{Message, MessageMetadata};
use crate::provider::{Completion, LlmProvider};
use crate::tool::{new_call_id, ToolCall, ToolRegistry};

const TOOL_FENCE: &str = "```tool";
const FENCE_END: &str = "```";

/// Wire shape of a tool request written by the model
#[derive(Deserialize)]
struct ToolBlock {
    #[serde(alias = "name")]
    tool: String,
    #[serde(default)]
    arguments: HashMap<String, serde_json::Value>,
    #[serde(default)]
    id: Option<String>,
}

impl From<ToolBlock> for ToolCall {
    fn from(block: ToolBlock) -> Self {
        Self {
            name: block.tool,
            arguments: block.arguments,
            id: block.id.filter(|id| !id.is_empty()).unwrap_or_else(new_call_id),
        }
    }
}

/// Wraps the provider and the tool definitions it is offered
pub struct ReasoningStep {
    provider: Arc<dyn LlmProvider>,
    tools: Arc<ToolRegistry>,
    config: AgentConfig,
}

impl ReasoningStep {
    pub fn new(provider: Arc<dyn LlmProvider>, tools: Arc<ToolRegistry>, config: AgentConfig) -> Self {
        Self {
            provider,
            tools,
            config,
        }
    }

    /// Build the full system prompt including tool descriptions
    pub fn system_prompt(&self) -> String {
        let mut prompt = self.config.system_prompt.clone();

        if self.config.inject_tool_descriptions && !self.tools.is_empty() {
            prompt.push_str("\n\n");
            prompt.push_str(&self.tools.generate_prompt_section());
        }

        prompt
    }

    /// Run one reasoning call over `history`.
    ///
    /// Any provider failure becomes [`AgentError::ReasoningUnavailable`]; the
    /// caller's history is only borrowed, so nothing is committed on error.
    pub async fn decide(&self, history: &[Message]) -> Result<Message> {
        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(Message::system(self.system_prompt()));
        messages.extend_from_slice(history);

        let completion = self
            .provider
            .complete(&messages, &self.tools.list(), &self.config.generation)
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Reasoning call failed");
                AgentError::ReasoningUnavailable(e.to_string())
            })?;

        Ok(Self::into_message(completion))
    }

    /// Convert a completion into the assistant message to record
    fn into_message(completion: Completion) -> Message {
        let metadata = MessageMetadata {
            tokens: completion.usage.as_ref().map(|u| u.completion_tokens),
            model: Some(completion.model),
            is_error: false,
        };

        let (content, tool_calls) = if completion.tool_calls.is_empty() {
            parse_tool_calls(&completion.content)
        } else {
            (completion.content, completion.tool_calls)
        };

        tracing::debug!(tool_calls = tool_calls.len(), "Reasoning step decided");
        Message::assistant_with_tools(content, tool_calls).with_metadata(metadata)
    }
}

/// Split model output into its prose and the ```tool blocks it contains.
///
/// Blocks that fail to parse are left in the text. If no fenced block is
/// found, a bare JSON object with a `"tool"` key is accepted.
pub fn parse_tool_calls(content: &str) -> (String, Vec<ToolCall>) {
    let mut calls = Vec::new();
    let mut text = String::new();
    let mut rest = content;

    while let Some(start) = rest.find(TOOL_FENCE) {
        let after_marker = &rest[start + TOOL_FENCE.len()..];
        let Some(end) = after_marker.find(FENCE_END) else {
            break;
        };

        let json_str = after_marker[..end].trim();
        let block_end = start + TOOL_FENCE.len() + end + FENCE_END.len();

        match serde_json::from_str::<ToolBlock>(json_str) {
            Ok(block) => {
                text.push_str(&rest[..start]);
                calls.push(ToolCall::from(block));
            }
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring malformed tool block");
                text.push_str(&rest[..block_end]);
            }
        }
        rest = &rest[block_end..];
    }
    text.push_str(rest);

    if calls.is_empty() {
        if let Some(call) = parse_inline_tool_call(content) {
            return (String::new(), vec![call]);
        }
    }

    (text.trim().to_string(), calls)
}

/// Try to parse an inline JSON tool call
fn parse_inline_tool_call(content: &str) -> Option<ToolCall> {
    if !content.contains(r#""tool""#) {
        return None;
    }

    let start = content.find('{')?;
    let end = content.rfind('}')?;

    if end <= start {
        return None;
    }

    serde_json::from_str::<ToolBlock>(&content[start..=end])
        .ok()
        .map(ToolCall::from)
}

/// Render a tool call the way text-only models are asked to write it
pub fn format_tool_call(call: &ToolCall) -> String {
    let block = serde_json::json!({
        "tool": call.name,
        "arguments": call.arguments,
        "id": call.id,
    });
    format!("{TOOL_FENCE}\n{block}\n{FENCE_END}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::ScriptedProvider;
    use crate::provider::LlmProvider;

    #[test]
    fn test_parse_single_tool_block() {
        let content = r#"Let me check that for you.
```tool
{"tool": "check_order_status", "arguments": {"order_id": "ORD-123"}}
```"#;

        let (text, calls) = parse_tool_calls(content);
        assert_eq!(text, "Let me check that for you.");
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name, "check_order_status");
        assert_eq!(calls[0].str_arg("order_id"), Some("ORD-123"));
        assert!(!calls[0].id.is_empty());
    }

    #[test]
    fn test_parse_multiple_blocks_keeps_order() {
        let content = "```tool\n{\"tool\": \"a\", \"arguments\": {}}\n```\n```tool\n{\"name\": \"b\", \"id\": \"x1\"}\n```";

        let (text, calls) = parse_tool_calls(content);
        assert!(text.is_empty());
        let names: Vec<&str> = calls.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(calls[1].id, "x1");
    }

    #[test]
    fn test_parse_inline_fallback() {
        let (text, calls) = parse_tool_calls(r#"{"tool": "get_refund_policy", "arguments": {"query": "refunds"}}"#);
        assert!(text.is_empty());
        assert_eq!(calls[0].name, "get_refund_policy");
    }

    #[test]
    fn test_plain_text_has_no_calls() {
        let (text, calls) = parse_tool_calls("Your order has shipped.");
        assert_eq!(text, "Your order has shipped.");
        assert!(calls.is_empty());
    }

    #[test]
    fn test_malformed_block_stays_in_text() {
        let (text, calls) = parse_tool_calls("```tool\nnot json\n```");
        assert!(calls.is_empty());
        assert!(text.contains("not json"));
    }

    #[test]
    fn test_format_round_trips_through_parser() {
        let call = ToolCall::new("check_order_status", serde_json::json!({"order_id": "ORD-9"}));
        let (_, parsed) = parse_tool_calls(&format_tool_call(&call));
        assert_eq!(parsed, vec![call]);
    }

    #[tokio::test]
    async fn test_decide_prepends_unstored_system_prompt() {
        let provider = Arc::new(ScriptedProvider::new().reply_text("Hello!"));
        let step = ReasoningStep::new(
            provider.clone() as Arc<dyn LlmProvider>,
            Arc::new(ToolRegistry::new()),
            AgentConfig::default(),
        );

        let history = vec![Message::user("Hi")];
        let msg = step.decide(&history).await.unwrap();

        assert!(msg.is_terminal());
        assert_eq!(msg.content, "Hello!");

        let requests = provider.requests();
        assert_eq!(requests[0].len(), 2);
        assert_eq!(requests[0][0].role, crate::message::Role::System);
        assert_eq!(history.len(), 1);
    }

    #[tokio::test]
    async fn test_decide_maps_provider_error() {
        let provider = Arc::new(ScriptedProvider::new().fail("connection refused"));
        let step = ReasoningStep::new(provider, Arc::new(ToolRegistry::new()), AgentConfig::default());

        let err = step.decide(&[Message::user("Hi")]).await.unwrap_err();
        assert!(matches!(err, AgentError::ReasoningUnavailable(_)));
    }
}
