//! Scripted LLM Provider
//!
//! For testing and demo purposes. Replays a fixed list of completions and
//! failures in order and records every request it receives.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{AgentError, Result};
use crate::message::Message;
use crate::provider::{Completion, GenerationOptions, LlmProvider, ModelInfo, ProviderInfo};
use crate::tool::{ToolCall, ToolSchema};

const MODEL: &str = "scripted";

#[derive(Clone, Debug)]
enum Step {
    Reply(Completion),
    Fail(String),
}

/// Provider that answers from a script
#[derive(Default)]
pub struct ScriptedProvider {
    steps: Mutex<VecDeque<Step>>,
    last: Mutex<Option<Step>>,
    requests: Mutex<Vec<Vec<Message>>>,
    repeat_last: bool,
    latency: Option<Duration>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a completion
    #[must_use]
    pub fn reply(self, completion: Completion) -> Self {
        self.push(Step::Reply(completion))
    }

    /// Queue a plain text answer
    #[must_use]
    pub fn reply_text(self, text: impl Into<String>) -> Self {
        self.reply(Completion::text(text, MODEL))
    }

    /// Queue a single native tool call
    #[must_use]
    pub fn reply_tool(self, name: &str, arguments: serde_json::Value) -> Self {
        self.reply(Completion::tool_use(vec![ToolCall::new(name, arguments)], MODEL))
    }

    /// Queue a provider failure
    #[must_use]
    pub fn fail(self, error: impl Into<String>) -> Self {
        self.push(Step::Fail(error.into()))
    }

    /// Keep answering with the final step once the script runs out
    #[must_use]
    pub fn repeat_last(mut self) -> Self {
        self.repeat_last = true;
        self
    }

    /// Delay every answer
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Every message list passed to `complete`, in call order
    pub fn requests(&self) -> Vec<Vec<Message>> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Steps not yet consumed
    pub fn remaining(&self) -> usize {
        self.steps.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn push(self, step: Step) -> Self {
        self.steps
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(step);
        self
    }

    fn next_step(&self) -> Option<Step> {
        let next = self
            .steps
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();

        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        match next {
            Some(step) => {
                *last = Some(step.clone());
                Some(step)
            }
            None if self.repeat_last => last.clone(),
            None => None,
        }
    }

    /// Give repeated native tool calls fresh IDs
    fn refresh_ids(mut completion: Completion) -> Completion {
        for call in &mut completion.tool_calls {
            call.id = crate::tool::new_call_id();
        }
        completion
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    async fn info(&self) -> Result<ProviderInfo> {
        Ok(ProviderInfo {
            name: "Scripted".into(),
            version: None,
            models: self.list_models().await?,
            supports_tools: true,
        })
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    async fn complete(
        &self,
        messages: &[Message],
        _tools: &[ToolSchema],
        _options: &GenerationOptions,
    ) -> Result<Completion> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(messages.to_vec());

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        match self.next_step() {
            Some(Step::Reply(completion)) => Ok(Self::refresh_ids(completion)),
            Some(Step::Fail(error)) => Err(AgentError::Provider(error)),
            None => Err(AgentError::ProviderUnavailable("script exhausted".into())),
        }
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        Ok(vec![ModelInfo {
            id: MODEL.into(),
            name: MODEL.into(),
            context_length: None,
        }])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_script_order_and_exhaustion() {
        let provider = ScriptedProvider::new().reply_text("one").fail("boom");
        let opts = GenerationOptions::default();

        let first = provider.complete(&[], &[], &opts).await.unwrap();
        assert_eq!(first.content, "one");
        assert!(matches!(
            provider.complete(&[], &[], &opts).await,
            Err(AgentError::Provider(_))
        ));
        assert!(matches!(
            provider.complete(&[], &[], &opts).await,
            Err(AgentError::ProviderUnavailable(_))
        ));
        assert_eq!(provider.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_repeat_last_issues_fresh_ids() {
        let provider = ScriptedProvider::new()
            .reply_tool("lookup", serde_json::json!({}))
            .repeat_last();
        let opts = GenerationOptions::default();

        let a = provider.complete(&[], &[], &opts).await.unwrap();
        let b = provider.complete(&[], &[], &opts).await.unwrap();
        assert_ne!(a.tool_calls[0].id, b.tool_calls[0].id);
        assert_eq!(provider.remaining(), 0);
    }
}
