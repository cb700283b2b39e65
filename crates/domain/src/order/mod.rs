//! Order aggregate and related types.

mod aggregate;
mod commands;
mod repository;
mod resolver;
mod state;
mod value_objects;

pub use aggregate::{Order, ResolvedOrder};
pub use commands::{ArchiveOrder, CreateOrder, UpdateOrder};
pub use repository::OrderRepository;
pub use resolver::{LineItemResolver, MAX_QUANTITY};
pub use state::{ArchiveOutcome, OrderStatus, can_archive};
pub use value_objects::{LineItem, LineItemRequest, Money, PriceList, ResolvedItem};

use common::CatalogKind;
use thiserror::Error;

/// Errors that can occur during order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// A referenced catalog name does not exist.
    #[error("Unknown {kind}: {name}")]
    UnknownCatalogValue { kind: CatalogKind, name: String },

    /// Invalid quantity.
    #[error("Invalid quantity: {quantity} (must be between 1 and 2147483647)")]
    InvalidQuantity { quantity: i64 },

    /// The order exists but its status does not allow cancelling it.
    #[error("Order cannot be archived from {status} status")]
    ArchiveConflict { status: String },
}
