//! # support-desk
//!
//! Customer-support tools for the agent: order status lookup and policy search.
//!
//! ```text
//! ┌──────────────────────────┐      ┌──────────────────────────┐
//! │  check_order_status      │─────▶│  OrderStore              │
//! │  (CheckOrderStatusTool)  │      │  MemoryOrderStore        │
//! └──────────────────────────┘      └──────────────────────────┘
//! ┌──────────────────────────┐      ┌──────────────────────────┐
//! │  get_refund_policy       │─────▶│  PolicyIndex             │
//! │  (RefundPolicyTool)      │      │  KeywordPolicyIndex      │
//! └──────────────────────────┘      └──────────────────────────┘
//! ```
//!
//! Both tools always answer with text. A missing order is a normal answer,
//! and backend errors are reported as failure text for the model to relay.

pub mod error;
pub mod model;
pub mod orders;
pub mod policy;
pub mod seed;
pub mod svckit;

use std::sync::Arc;

use agent_core::ToolRegistry;

pub use error::{DeskError, Result};
pub use model::{Order, OrderStatus, PolicyDocument};
pub use orders::{MemoryOrderStore, OrderStore};
pub use policy::{KeywordPolicyIndex, PolicyIndex};

/// Re-export tools for easy registration
pub mod tools {
    pub use crate::svckit::{CheckOrderStatusTool, RefundPolicyTool};
}

/// Registry holding both support tools over the given backends
pub fn build_registry(orders: Arc<dyn OrderStore>, policies: Arc<dyn PolicyIndex>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(tools::CheckOrderStatusTool::new(orders));
    registry.register(tools::RefundPolicyTool::new(policies));
    registry
}

/// Registry over the demo dataset
pub fn demo_registry() -> ToolRegistry {
    build_registry(
        Arc::new(MemoryOrderStore::seeded()),
        Arc::new(KeywordPolicyIndex::seeded()),
    )
}

/// System prompt for the support agent
pub const SUPPORT_AGENT_PROMPT: &str = r"You are a helpful customer support assistant for FutureSmart AI.

## Rules

1. ALWAYS use `check_order_status` when the user asks about an order. Never guess an order's status.
2. Use `get_refund_policy` for questions about refunds, returns or shipping.
3. If an order is not found, say so and ask the user to double-check the order ID.
4. Base policy answers only on the text the tool returns.

Be concise and professional.";
