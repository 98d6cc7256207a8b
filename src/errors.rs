//! # Shop Error Types Module
//!
//! This module defines the error type shared by the cart engine, the stores
//! and the messaging channels. Every variant is recovered where it happens;
//! only configuration errors abort startup.

use crate::catalog::ProductId;

/// Custom error types for storefront operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShopError {
    /// A product id does not resolve in the catalog
    ProductNotFound(ProductId),
    /// A cart line index is stale relative to the stored cart
    CartIndexOutOfRange { index: usize, len: usize },
    /// The chat transport could not send, edit or delete a message
    RenderDeliveryFailure(String),
    /// The operator channel could not be reached
    NotificationDeliveryFailure(String),
    /// No operator chat is configured
    MissingOperatorConfig,
    /// The persistence layer failed
    Storage(String),
    /// Startup configuration is missing or malformed
    Configuration(String),
}

impl std::fmt::Display for ShopError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShopError::ProductNotFound(id) => write!(f, "Product not found: {id}"),
            ShopError::CartIndexOutOfRange { index, len } => {
                write!(f, "Cart index {index} out of range (cart has {len} lines)")
            }
            ShopError::RenderDeliveryFailure(msg) => write!(f, "Render delivery failure: {msg}"),
            ShopError::NotificationDeliveryFailure(msg) => {
                write!(f, "Notification delivery failure: {msg}")
            }
            ShopError::MissingOperatorConfig => write!(f, "Operator chat is not configured"),
            ShopError::Storage(msg) => write!(f, "Storage error: {msg}"),
            ShopError::Configuration(msg) => write!(f, "Configuration error: {msg}"),
        }
    }
}

impl std::error::Error for ShopError {}

impl From<sqlx::Error> for ShopError {
    fn from(err: sqlx::Error) -> Self {
        ShopError::Storage(err.to_string())
    }
}
