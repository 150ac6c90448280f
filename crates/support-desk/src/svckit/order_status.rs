//! Order Status Tool
//!
//! Looks up the current status of a customer order.

use std::sync::Arc;

use agent_core::{tool::ParameterSchema, Tool, ToolCall, ToolResult, ToolSchema};
use async_trait::async_trait;

use crate::orders::OrderStore;

pub const NAME: &str = "check_order_status";

/// Tool for checking order status
pub struct CheckOrderStatusTool {
    orders: Arc<dyn OrderStore>,
}

impl CheckOrderStatusTool {
    pub fn new(orders: Arc<dyn OrderStore>) -> Self {
        Self { orders }
    }
}

#[async_trait]
impl Tool for CheckOrderStatusTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: NAME.into(),
            description: "Check the status of a customer order. Use this for any question about an order's status or whereabouts.".into(),
            parameters: vec![ParameterSchema::required_string(
                "order_id",
                "Order identifier (e.g., 'ORD-123')",
            )],
            category: Some("orders".into()),
            has_side_effects: false,
        }
    }

    async fn execute(&self, call: &ToolCall) -> ToolResult {
        let order_id = call.str_arg("order_id").unwrap_or_default().trim();

        match self.orders.get_order(order_id).await {
            Ok(Some(order)) => ToolResult::success(
                NAME,
                format!(
                    "Order {} containing '{}' is currently: {}",
                    order.id, order.item, order.status
                ),
            )
            .with_data(serde_json::json!({
                "order_id": order.id,
                "item": order.item,
                "status": order.status,
            })),
            Ok(None) => ToolResult::success(NAME, format!("Order ID {order_id} not found.")),
            Err(e) => {
                tracing::warn!(backend = self.orders.name(), error = %e, "Order lookup failed");
                ToolResult::failure(NAME, format!("Error querying database: {e}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DeskError, Result};
    use crate::model::Order;
    use crate::orders::MemoryOrderStore;

    struct BrokenStore;

    #[async_trait]
    impl OrderStore for BrokenStore {
        async fn get_order(&self, _order_id: &str) -> Result<Option<Order>> {
            Err(DeskError::OrderBackend("connection refused".into()))
        }

        async fn health_check(&self) -> bool {
            false
        }

        fn name(&self) -> &str {
            "broken"
        }
    }

    fn call(order_id: &str) -> ToolCall {
        ToolCall::new(NAME, serde_json::json!({ "order_id": order_id }))
    }

    #[tokio::test]
    async fn test_known_order() {
        let tool = CheckOrderStatusTool::new(Arc::new(MemoryOrderStore::seeded()));
        let result = tool.execute(&call("ORD-123")).await;

        assert!(result.success);
        assert_eq!(
            result.output,
            "Order ORD-123 containing 'Gaming Laptop' is currently: Shipped"
        );
        assert_eq!(result.data.unwrap()["status"], "shipped");
    }

    #[tokio::test]
    async fn test_unknown_order_is_not_a_failure() {
        let tool = CheckOrderStatusTool::new(Arc::new(MemoryOrderStore::seeded()));
        let result = tool.execute(&call("ORD-000")).await;

        assert!(result.success);
        assert_eq!(result.output, "Order ID ORD-000 not found.");
    }

    #[tokio::test]
    async fn test_backend_error_becomes_failure_text() {
        let tool = CheckOrderStatusTool::new(Arc::new(BrokenStore));
        let result = tool.execute(&call("ORD-123")).await;

        assert!(!result.success);
        assert_eq!(
            result.output,
            "Error querying database: Order backend error: connection refused"
        );
    }

    #[test]
    fn test_missing_argument_fails_validation() {
        let tool = CheckOrderStatusTool::new(Arc::new(MemoryOrderStore::seeded()));
        let bad = ToolCall::new(NAME, serde_json::json!({}));
        assert!(tool.validate(&bad).is_err());
    }
}
