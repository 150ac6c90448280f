//! Demo dataset
//!
//! A handful of orders and the store's published policies.

use crate::model::{Order, OrderStatus, PolicyDocument};

pub fn orders() -> Vec<Order> {
    vec![
        Order::new("ORD-123", "Gaming Laptop", OrderStatus::Shipped),
        Order::new("ORD-456", "Wireless Mouse", OrderStatus::Processing),
        Order::new("ORD-789", "4K Monitor", OrderStatus::Delivered),
        Order::new("ORD-999", "Mechanical Keyboard", OrderStatus::Cancelled),
    ]
}

pub fn policies() -> Vec<PolicyDocument> {
    vec![
        PolicyDocument::new(
            "refund",
            "Refunds are processed within 7 business days. No refunds on electronics after 30 days of purchase.",
        ),
        PolicyDocument::new(
            "shipping",
            "Shipping is free for orders over $50. International shipping generally takes 14-21 days.",
        ),
        PolicyDocument::new(
            "returns",
            "To return an item, generate a return label from the user dashboard. Returns are free.",
        ),
    ]
}
