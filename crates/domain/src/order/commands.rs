//! Order commands.

use common::OrderId;
use serde::Deserialize;

use super::{LineItemRequest, OrderStatus};
use crate::conditional::Validator;

/// Command to place a new order.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrder {
    /// The order ID to create.
    #[serde(skip)]
    pub order_id: OrderId,

    /// Consume location name.
    pub location: String,

    /// Status name; `pending` when omitted.
    #[serde(default)]
    pub status: Option<String>,

    /// Requested items, resolved all-or-nothing.
    #[serde(default)]
    pub items: Vec<LineItemRequest>,
}

impl CreateOrder {
    /// Creates a new CreateOrder command with a generated order ID.
    pub fn new(location: impl Into<String>, items: Vec<LineItemRequest>) -> Self {
        Self {
            order_id: OrderId::new(),
            location: location.into(),
            status: None,
            items,
        }
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Status name, falling back to `pending`.
    pub fn status_name(&self) -> &str {
        self.status
            .as_deref()
            .unwrap_or(OrderStatus::default().as_str())
    }
}

/// Command to replace an order's location, status and items wholesale.
#[derive(Debug, Clone)]
pub struct UpdateOrder {
    /// The order to update.
    pub order_id: OrderId,

    pub location: String,

    pub status: String,

    pub items: Vec<LineItemRequest>,

    /// Validator from `If-Match`; the update is refused unless it matches.
    pub precondition: Option<Validator>,
}

impl UpdateOrder {
    /// Creates a new UpdateOrder command with no precondition.
    pub fn new(
        order_id: OrderId,
        location: impl Into<String>,
        status: impl Into<String>,
        items: Vec<LineItemRequest>,
    ) -> Self {
        Self {
            order_id,
            location: location.into(),
            status: status.into(),
            items,
            precondition: None,
        }
    }

    /// Requires the stored order to still match the validator.
    pub fn if_match(mut self, validator: Validator) -> Self {
        self.precondition = Some(validator);
        self
    }
}

/// Command to archive (cancel) an order.
#[derive(Debug, Clone)]
pub struct ArchiveOrder {
    /// The order to archive.
    pub order_id: OrderId,

    /// Validator from `If-Match`; the archive is refused unless it matches.
    pub precondition: Option<Validator>,
}

impl ArchiveOrder {
    /// Creates a new ArchiveOrder command with no precondition.
    pub fn new(order_id: OrderId) -> Self {
        Self {
            order_id,
            precondition: None,
        }
    }

    /// Requires the stored order to still match the validator.
    pub fn if_match(mut self, validator: Validator) -> Self {
        self.precondition = Some(validator);
        self
    }
}
