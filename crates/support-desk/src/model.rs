//! Domain Models
//!
//! Orders and the policy documents the assistant can quote.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fulfilment status of an order
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Processing => "Processing",
            Self::Shipped => "Shipped",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
        };
        f.write_str(label)
    }
}

/// A customer order
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Order {
    /// Order identifier (e.g., "ORD-123")
    pub id: String,

    /// Item description
    pub item: String,

    pub status: OrderStatus,

    /// Last status change
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn new(id: impl Into<String>, item: impl Into<String>, status: OrderStatus) -> Self {
        Self {
            id: id.into(),
            item: item.into(),
            status,
            updated_at: Utc::now(),
        }
    }
}

/// A searchable policy text
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyDocument {
    /// Short topic label (e.g., "refund", "shipping")
    pub topic: String,

    pub content: String,
}

impl PolicyDocument {
    pub fn new(topic: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            content: content.into(),
        }
    }
}
