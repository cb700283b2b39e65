use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{CatalogKind, CatalogRef, OrderId, OrderRecord, Page, Result};

/// Options for replacing a stored order.
#[derive(Debug, Clone, Copy, Default)]
pub struct WriteOptions {
    /// The `updated_at` the caller observed when it loaded the order.
    /// If None, no staleness check is performed (use with caution).
    pub expected_updated_at: Option<DateTime<Utc>>,
}

impl WriteOptions {
    /// Creates options with no staleness check.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates options expecting the stored order to still carry `updated_at`.
    pub fn expect_updated_at(updated_at: DateTime<Utc>) -> Self {
        Self {
            expected_updated_at: Some(updated_at),
        }
    }
}

/// Core trait for order storage.
///
/// An order store persists orders together with their line items.
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Inserts a new order and its items atomically.
    ///
    /// Fails with `DuplicateOrder` if the ID is already taken.
    async fn insert(&self, order: OrderRecord) -> Result<()>;

    /// Retrieves an order by ID.
    ///
    /// Returns None if the order doesn't exist.
    async fn get(&self, id: OrderId) -> Result<Option<OrderRecord>>;

    /// Lists orders in creation order.
    async fn list(&self, page: Page) -> Result<Vec<OrderRecord>>;

    /// Replaces an existing order and all of its items.
    ///
    /// The staleness check and the write happen as one indivisible step:
    /// if `options.expected_updated_at` is set and the stored order carries a
    /// different `updated_at`, nothing is written and `PreconditionFailed`
    /// is returned. Fails with `OrderNotFound` if the order doesn't exist.
    async fn replace(&self, order: OrderRecord, options: WriteOptions) -> Result<()>;

    /// Returns the order with the greatest `updated_at`, ties broken by ID.
    ///
    /// Returns None for an empty store.
    async fn most_recent(&self) -> Result<Option<OrderRecord>>;

    /// Returns the number of stored orders.
    async fn count(&self) -> Result<usize>;
}

/// Extension trait providing convenience methods for order stores.
#[async_trait]
pub trait OrderStoreExt: OrderStore {
    /// Checks if an order exists.
    async fn exists(&self, id: OrderId) -> Result<bool> {
        Ok(self.get(id).await?.is_some())
    }

    /// Returns the last-modified time of the whole collection.
    async fn last_modified(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(self.most_recent().await?.map(|order| order.updated_at))
    }
}

// Blanket implementation for all OrderStore implementations
impl<T: OrderStore + ?Sized> OrderStoreExt for T {}

/// Read access to the seeded catalog.
///
/// Catalog entries are written once at startup through `seed` and only
/// resolved by name afterwards.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Resolves a catalog entry by kind and exact name.
    ///
    /// Returns None if no entry of that kind carries the name.
    async fn resolve_by_name(&self, kind: CatalogKind, name: &str) -> Result<Option<CatalogRef>>;

    /// Inserts an entry if it is absent and returns the stored reference.
    ///
    /// Seeding the same name twice returns the existing entry.
    async fn seed(&self, kind: CatalogKind, name: &str) -> Result<CatalogRef>;
}
