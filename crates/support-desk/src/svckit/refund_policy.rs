//! Refund Policy Tool
//!
//! Searches the policy documents for the passage that best answers a question.

use std::sync::Arc;

use agent_core::{tool::ParameterSchema, Tool, ToolCall, ToolResult, ToolSchema};
use async_trait::async_trait;

use crate::policy::PolicyIndex;

pub const NAME: &str = "get_refund_policy";

/// Tool for retrieving refund, shipping and returns policy text
pub struct RefundPolicyTool {
    index: Arc<dyn PolicyIndex>,
}

impl RefundPolicyTool {
    pub fn new(index: Arc<dyn PolicyIndex>) -> Self {
        Self { index }
    }
}

#[async_trait]
impl Tool for RefundPolicyTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: NAME.into(),
            description: "Look up store policy on refunds, returns or shipping. Returns the most relevant policy text.".into(),
            parameters: vec![ParameterSchema::required_string(
                "query",
                "The customer's policy question",
            )],
            category: Some("policy".into()),
            has_side_effects: false,
        }
    }

    async fn execute(&self, call: &ToolCall) -> ToolResult {
        let query = call.str_arg("query").unwrap_or_default();

        match self.index.search(query, 1).await {
            Ok(docs) => match docs.into_iter().next() {
                Some(doc) => ToolResult::success(NAME, doc.content)
                    .with_data(serde_json::json!({ "topic": doc.topic })),
                None => ToolResult::success(NAME, "No relevant policy information found."),
            },
            Err(e) => {
                tracing::warn!(error = %e, "Policy search failed");
                ToolResult::failure(NAME, format!("Error searching policy documents: {e}"))
            }
        }
    }
}
