//! Domain error types.

use common::OrderId;
use order_store::StoreError;
use thiserror::Error;

use crate::order::OrderError;

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An error occurred in the order aggregate or during resolution.
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    /// No order with this ID.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// The caller's validator no longer matches the order.
    #[error("Precondition failed for order {order_id}")]
    PreconditionFailed { order_id: OrderId },

    /// The store could not complete the operation.
    #[error("Store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for DomainError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::PreconditionFailed { order_id, .. } => {
                DomainError::PreconditionFailed { order_id }
            }
            StoreError::OrderNotFound(id) => DomainError::OrderNotFound(id),
            other => DomainError::Store(other),
        }
    }
}
