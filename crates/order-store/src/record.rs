use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{CatalogRef, LineItemId, OrderId};

/// Persisted shape of a line item.
///
/// Every line item belongs to exactly one order and is stored with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemRecord {
    pub id: LineItemId,
    pub product: CatalogRef,
    pub size: CatalogRef,
    pub milk: CatalogRef,
    pub espresso_shot: CatalogRef,
    pub quantity: u32,
}

/// Persisted shape of an order together with its line items.
///
/// The store writes the order row and its items as one unit: replacing a
/// record discards every previously stored item of that order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub id: OrderId,
    pub location: CatalogRef,
    pub status: CatalogRef,
    pub items: Vec<LineItemRecord>,
    /// Order total in cents.
    pub total_cents: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
