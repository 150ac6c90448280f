//! In-memory Order Store

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{normalize_order_id, OrderStore};
use crate::error::{DeskError, Result};
use crate::model::{Order, OrderStatus};
use crate::seed;

/// Order store backed by a map, keyed by normalized order ID
#[derive(Default)]
pub struct MemoryOrderStore {
    orders: RwLock<HashMap<String, Order>>,
}

impl MemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store preloaded with the demo orders
    pub fn seeded() -> Self {
        Self::from_orders(seed::orders())
    }

    pub fn from_orders(orders: impl IntoIterator<Item = Order>) -> Self {
        let orders = orders
            .into_iter()
            .map(|o| (normalize_order_id(&o.id), o))
            .collect();
        Self {
            orders: RwLock::new(orders),
        }
    }

    /// Insert or replace an order
    pub async fn upsert(&self, order: Order) {
        self.orders
            .write()
            .await
            .insert(normalize_order_id(&order.id), order);
    }

    /// Move an order to a new status. Returns false if it doesn't exist.
    pub async fn set_status(&self, order_id: &str, status: OrderStatus) -> bool {
        let mut orders = self.orders.write().await;
        match orders.get_mut(&normalize_order_id(order_id)) {
            Some(order) => {
                order.status = status;
                order.updated_at = chrono::Utc::now();
                true
            }
            None => false,
        }
    }

    pub async fn len(&self) -> usize {
        self.orders.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn get_order(&self, order_id: &str) -> Result<Option<Order>> {
        let key = normalize_order_id(order_id);
        if key.is_empty() {
            return Err(DeskError::InvalidOrderId(order_id.to_string()));
        }

        Ok(self.orders.read().await.get(&key).cloned())
    }

    async fn health_check(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "memory"
    }
}
