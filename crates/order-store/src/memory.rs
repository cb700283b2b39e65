use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    CatalogId, CatalogKind, CatalogRef, OrderId, OrderRecord, Page, Result, StoreError,
    store::{CatalogStore, OrderStore, WriteOptions},
};

#[derive(Default)]
struct Orders {
    by_id: HashMap<OrderId, OrderRecord>,
    /// Order IDs in insertion (creation) order.
    sequence: Vec<OrderId>,
}

/// In-memory order store implementation for testing and local runs.
///
/// This implementation keeps all orders in memory and provides
/// the same interface as the PostgreSQL implementation. Every write
/// holds the write lock across its staleness check.
#[derive(Clone, Default)]
pub struct InMemoryOrderStore {
    orders: Arc<RwLock<Orders>>,
}

impl InMemoryOrderStore {
    /// Creates a new empty in-memory order store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn insert(&self, order: OrderRecord) -> Result<()> {
        let mut orders = self.orders.write().await;

        if orders.by_id.contains_key(&order.id) {
            return Err(StoreError::DuplicateOrder(order.id));
        }

        orders.sequence.push(order.id);
        orders.by_id.insert(order.id, order);
        Ok(())
    }

    async fn get(&self, id: OrderId) -> Result<Option<OrderRecord>> {
        Ok(self.orders.read().await.by_id.get(&id).cloned())
    }

    async fn list(&self, page: Page) -> Result<Vec<OrderRecord>> {
        let orders = self.orders.read().await;
        let records = orders
            .sequence
            .iter()
            .filter_map(|id| orders.by_id.get(id))
            .cloned();
        Ok(page.apply(records))
    }

    async fn replace(&self, order: OrderRecord, options: WriteOptions) -> Result<()> {
        let mut orders = self.orders.write().await;

        let current = orders
            .by_id
            .get_mut(&order.id)
            .ok_or(StoreError::OrderNotFound(order.id))?;

        if let Some(expected) = options.expected_updated_at
            && current.updated_at != expected
        {
            return Err(StoreError::PreconditionFailed {
                order_id: order.id,
                expected,
                actual: current.updated_at,
            });
        }

        *current = order;
        Ok(())
    }

    async fn most_recent(&self) -> Result<Option<OrderRecord>> {
        let orders = self.orders.read().await;
        Ok(orders
            .by_id
            .values()
            .max_by(|a, b| a.updated_at.cmp(&b.updated_at).then(a.id.cmp(&b.id)))
            .cloned())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.orders.read().await.by_id.len())
    }
}

#[derive(Default)]
struct Entries {
    by_name: HashMap<(CatalogKind, String), CatalogRef>,
    next_id: i64,
}

/// In-memory catalog, seeded once at startup.
#[derive(Clone, Default)]
pub struct InMemoryCatalog {
    entries: Arc<RwLock<Entries>>,
}

impl InMemoryCatalog {
    /// Creates a new empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of entries of a kind.
    pub async fn len_of(&self, kind: CatalogKind) -> usize {
        self.entries
            .read()
            .await
            .by_name
            .keys()
            .filter(|(k, _)| *k == kind)
            .count()
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalog {
    async fn resolve_by_name(&self, kind: CatalogKind, name: &str) -> Result<Option<CatalogRef>> {
        let entries = self.entries.read().await;
        Ok(entries.by_name.get(&(kind, name.to_string())).cloned())
    }

    async fn seed(&self, kind: CatalogKind, name: &str) -> Result<CatalogRef> {
        let mut entries = self.entries.write().await;
        let key = (kind, name.to_string());

        if let Some(existing) = entries.by_name.get(&key) {
            return Ok(existing.clone());
        }

        entries.next_id += 1;
        let entry = CatalogRef::new(kind, CatalogId::new(entries.next_id), name);
        entries.by_name.insert(key, entry.clone());
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, Utc};

    use super::*;

    fn location() -> CatalogRef {
        CatalogRef::new(CatalogKind::ConsumeLocation, CatalogId::new(1), "take away")
    }

    fn status(name: &str) -> CatalogRef {
        CatalogRef::new(CatalogKind::OrderStatus, CatalogId::new(2), name)
    }

    fn create_test_order(at: DateTime<Utc>) -> OrderRecord {
        OrderRecord {
            id: OrderId::new(),
            location: location(),
            status: status("pending"),
            items: vec![],
            total_cents: 0,
            created_at: at,
            updated_at: at,
        }
    }

    #[tokio::test]
    async fn insert_and_get() {
        let store = InMemoryOrderStore::new();
        let order = create_test_order(Utc::now());

        store.insert(order.clone()).await.unwrap();

        let fetched = store.get(order.id).await.unwrap();
        assert_eq!(fetched, Some(order));
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn insert_duplicate_is_rejected() {
        let store = InMemoryOrderStore::new();
        let order = create_test_order(Utc::now());

        store.insert(order.clone()).await.unwrap();
        let result = store.insert(order).await;

        assert!(matches!(result, Err(StoreError::DuplicateOrder(_))));
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn get_missing_returns_none() {
        let store = InMemoryOrderStore::new();
        assert!(store.get(OrderId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_keeps_creation_order_across_updates() {
        let store = InMemoryOrderStore::new();
        let start = Utc::now();
        let first = create_test_order(start);
        let second = create_test_order(start + Duration::seconds(1));
        let third = create_test_order(start + Duration::seconds(2));
        for order in [&first, &second, &third] {
            store.insert(order.clone()).await.unwrap();
        }

        let mut touched = first.clone();
        touched.updated_at = start + Duration::seconds(10);
        store
            .replace(touched, WriteOptions::expect_updated_at(first.updated_at))
            .await
            .unwrap();

        let ids: Vec<_> = store
            .list(Page::all())
            .await
            .unwrap()
            .into_iter()
            .map(|o| o.id)
            .collect();
        assert_eq!(ids, vec![first.id, second.id, third.id]);

        let page: Vec<_> = store
            .list(Page::new(1, 1))
            .await
            .unwrap()
            .into_iter()
            .map(|o| o.id)
            .collect();
        assert_eq!(page, vec![second.id]);
    }

    #[tokio::test]
    async fn replace_with_matching_precondition() {
        let store = InMemoryOrderStore::new();
        let order = create_test_order(Utc::now());
        store.insert(order.clone()).await.unwrap();

        let mut updated = order.clone();
        updated.status = status("paid");
        updated.updated_at = order.updated_at + Duration::milliseconds(1);

        store
            .replace(updated.clone(), WriteOptions::expect_updated_at(order.updated_at))
            .await
            .unwrap();

        assert_eq!(store.get(order.id).await.unwrap(), Some(updated));
    }

    #[tokio::test]
    async fn replace_with_stale_precondition_writes_nothing() {
        let store = InMemoryOrderStore::new();
        let order = create_test_order(Utc::now());
        store.insert(order.clone()).await.unwrap();

        let mut updated = order.clone();
        updated.status = status("paid");
        updated.updated_at = order.updated_at + Duration::milliseconds(1);

        let stale = order.updated_at - Duration::seconds(1);
        let result = store
            .replace(updated, WriteOptions::expect_updated_at(stale))
            .await;

        assert!(matches!(
            result,
            Err(StoreError::PreconditionFailed { .. })
        ));
        assert_eq!(store.get(order.id).await.unwrap(), Some(order));
    }

    #[tokio::test]
    async fn replace_missing_order() {
        let store = InMemoryOrderStore::new();
        let order = create_test_order(Utc::now());

        let result = store.replace(order, WriteOptions::new()).await;
        assert!(matches!(result, Err(StoreError::OrderNotFound(_))));
    }

    #[tokio::test]
    async fn most_recent_tracks_latest_update() {
        let store = InMemoryOrderStore::new();
        assert!(store.most_recent().await.unwrap().is_none());

        let start = Utc::now();
        let older = create_test_order(start);
        let newer = create_test_order(start + Duration::seconds(1));
        store.insert(older.clone()).await.unwrap();
        store.insert(newer.clone()).await.unwrap();
        assert_eq!(store.most_recent().await.unwrap().unwrap().id, newer.id);

        let mut touched = older.clone();
        touched.updated_at = start + Duration::seconds(5);
        store
            .replace(touched, WriteOptions::expect_updated_at(older.updated_at))
            .await
            .unwrap();
        assert_eq!(store.most_recent().await.unwrap().unwrap().id, older.id);
    }

    #[tokio::test]
    async fn catalog_seed_is_idempotent() {
        let catalog = InMemoryCatalog::new();

        let first = catalog.seed(CatalogKind::Milk, "skim").await.unwrap();
        let again = catalog.seed(CatalogKind::Milk, "skim").await.unwrap();
        assert_eq!(first, again);
        assert_eq!(catalog.len_of(CatalogKind::Milk).await, 1);
    }

    #[tokio::test]
    async fn catalog_names_are_scoped_by_kind() {
        let catalog = InMemoryCatalog::new();
        let milk = catalog.seed(CatalogKind::Milk, "none").await.unwrap();
        let shot = catalog.seed(CatalogKind::EspressoShot, "none").await.unwrap();
        assert_ne!(milk.id, shot.id);

        let resolved = catalog
            .resolve_by_name(CatalogKind::EspressoShot, "none")
            .await
            .unwrap();
        assert_eq!(resolved, Some(shot));
        assert!(
            catalog
                .resolve_by_name(CatalogKind::Size, "none")
                .await
                .unwrap()
                .is_none()
        );
    }
}
