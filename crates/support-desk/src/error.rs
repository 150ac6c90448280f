//! Error Types for the Support Desk

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DeskError>;

#[derive(Error, Debug)]
pub enum DeskError {
    #[error("Order backend error: {0}")]
    OrderBackend(String),

    #[error("Policy index error: {0}")]
    PolicyIndex(String),

    #[error("Invalid order ID: {0:?}")]
    InvalidOrderId(String),

    #[error("Empty policy query")]
    EmptyQuery,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
