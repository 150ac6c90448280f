//! Order Backends
//!
//! Abstractions over wherever orders actually live.

mod memory;

pub use memory::MemoryOrderStore;

use async_trait::async_trait;

use crate::error::Result;
use crate::model::Order;

/// Order lookup backend (Strategy pattern)
///
/// Implement this for a real database; `MemoryOrderStore` serves the demo.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Find an order by ID. `Ok(None)` means no such order.
    async fn get_order(&self, order_id: &str) -> Result<Option<Order>>;

    /// Check if the backend is reachable
    async fn health_check(&self) -> bool;

    /// Backend name
    fn name(&self) -> &str;
}

/// Canonical form of a user-supplied order ID
pub(crate) fn normalize_order_id(raw: &str) -> String {
    raw.trim().to_uppercase()
}
