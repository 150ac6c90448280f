//! Service Kit - Agent Tools
//!
//! Domain-specific tools that implement `agent_core::Tool` for the support desk.

mod order_status;
mod refund_policy;

pub use order_status::CheckOrderStatusTool;
pub use refund_policy::RefundPolicyTool;
