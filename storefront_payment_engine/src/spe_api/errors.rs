use thiserror::Error;

use crate::{
    db_types::ExternalRef,
    traits::{GatewayClientError, StoreApiError},
};

#[derive(Debug, Clone, Error)]
pub enum OrderApiError {
    #[error("Catalog item {0} does not exist")]
    ItemNotFound(String),
    #[error("Catalog item {0} has no price and cannot be ordered")]
    ItemNotPriced(String),
    #[error("Line item quantities must be positive")]
    InvalidQuantity,
    #[error("An order must contain at least one line item")]
    EmptyOrder,
    #[error("{0}")]
    StoreError(#[from] StoreApiError),
    /// Raised when the order header was written but a line item insert failed. The header has been deleted
    /// again, so no half-written order remains behind this error.
    #[error("Order {0} could not be completed and was rolled back. {1}")]
    RolledBack(i64, StoreApiError),
}

#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    #[error("{0}")]
    OrderError(#[from] OrderApiError),
    #[error("{0}")]
    GatewayError(#[from] GatewayClientError),
    #[error("{0}")]
    StoreError(#[from] StoreApiError),
    #[error("No pending payment intent exists for reference {0}")]
    IntentNotFound(ExternalRef),
    #[error("The payment request is incomplete. {0}")]
    InvalidIntent(String),
}
