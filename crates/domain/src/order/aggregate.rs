//! Order aggregate implementation.

use chrono::{DateTime, Utc};
use common::{CatalogRef, LineItemId, OrderId};
use order_store::OrderRecord;
use serde::{Deserialize, Serialize};

use super::{LineItem, Money, OrderError, PriceList, ResolvedItem, can_archive};
use crate::clock::TICK;
use crate::conditional::Fingerprint;

/// Everything a create or update supplies, already resolved against the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOrder {
    pub location: CatalogRef,
    pub status: CatalogRef,
    pub items: Vec<ResolvedItem>,
}

/// Order aggregate root.
///
/// Owns its line items: every revision replaces the whole item list and
/// hands out fresh item ids. Mutations return a new value and leave the
/// loaded one untouched, so the caller still knows which `updated_at` it
/// read when it writes back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    location: CatalogRef,
    status: CatalogRef,
    items: Vec<LineItem>,
    total: Money,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Order {
    /// Builds a new order stamped with `now` for both timestamps.
    pub fn create(
        id: OrderId,
        resolved: ResolvedOrder,
        now: DateTime<Utc>,
        prices: &PriceList,
    ) -> Self {
        let items = assign_ids(resolved.items);
        Self {
            id,
            location: resolved.location,
            status: resolved.status,
            total: prices.total(&items),
            items,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replaces location, status and items wholesale.
    ///
    /// No transition guard applies here, and an unchanged revision still
    /// advances `updated_at`.
    pub fn revise(
        &self,
        resolved: ResolvedOrder,
        now: DateTime<Utc>,
        prices: &PriceList,
    ) -> Self {
        let items = assign_ids(resolved.items);
        Self {
            id: self.id,
            location: resolved.location,
            status: resolved.status,
            total: prices.total(&items),
            items,
            created_at: self.created_at,
            updated_at: self.next_updated_at(now),
        }
    }

    /// Moves the order to `cancelled` if its status allows it.
    ///
    /// The total and items are kept.
    pub fn archive(&self, cancelled: CatalogRef, now: DateTime<Utc>) -> Result<Self, OrderError> {
        if !can_archive(self.status.name()) {
            return Err(OrderError::ArchiveConflict {
                status: self.status.name().to_string(),
            });
        }

        Ok(Self {
            status: cancelled,
            updated_at: self.next_updated_at(now),
            ..self.clone()
        })
    }

    /// `now`, or one tick past the current `updated_at` if the clock lags.
    fn next_updated_at(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.max(self.updated_at + TICK)
    }

    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn location(&self) -> &CatalogRef {
        &self.location
    }

    pub fn status(&self) -> &CatalogRef {
        &self.status
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn total(&self) -> Money {
        self.total
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns true if the order could be archived right now.
    pub fn is_archivable(&self) -> bool {
        can_archive(self.status.name())
    }

    /// The order's change token.
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::for_order(self.id, self.updated_at)
    }

    /// Persisted shape of the order.
    pub fn to_record(&self) -> OrderRecord {
        OrderRecord {
            id: self.id,
            location: self.location.clone(),
            status: self.status.clone(),
            items: self.items.iter().cloned().map(Into::into).collect(),
            total_cents: self.total.cents(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl From<OrderRecord> for Order {
    fn from(record: OrderRecord) -> Self {
        Self {
            id: record.id,
            location: record.location,
            status: record.status,
            items: record.items.into_iter().map(Into::into).collect(),
            total: Money::from_cents(record.total_cents),
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

fn assign_ids(items: Vec<ResolvedItem>) -> Vec<LineItem> {
    items
        .into_iter()
        .map(|item| item.into_line_item(LineItemId::new()))
        .collect()
}
