use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::OrderId;

/// Errors that can occur when interacting with the order store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The order was modified since the caller last read it.
    /// The expected `updated_at` did not match the stored one.
    #[error(
        "Precondition failed for order {order_id}: expected updated_at {expected}, found {actual}"
    )]
    PreconditionFailed {
        order_id: OrderId,
        expected: DateTime<Utc>,
        actual: DateTime<Utc>,
    },

    /// The order was not found in the store.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// An order with this ID already exists.
    #[error("Order already exists: {0}")]
    DuplicateOrder(OrderId),

    /// A line item quantity does not fit the storage column.
    #[error("Quantity {quantity} out of range for order {order_id}")]
    QuantityOutOfRange { order_id: OrderId, quantity: u32 },

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
