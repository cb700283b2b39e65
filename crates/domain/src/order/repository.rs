//! Order repository: the write path guarded by conditional requests.

use common::{CatalogKind, OrderId};
use order_store::{CatalogStore, OrderStore, OrderStoreExt, Page, StoreError, WriteOptions};

use super::{
    ArchiveOrder, ArchiveOutcome, CreateOrder, LineItemRequest, LineItemResolver, Order,
    OrderError, OrderStatus, PriceList, ResolvedOrder, UpdateOrder,
};
use crate::clock::{Clock, MonotonicClock};
use crate::conditional::{Fingerprint, Validator, precondition_holds};
use crate::error::DomainError;

/// Loads, mutates and persists orders.
///
/// Every write carries the `updated_at` observed at load time, and the
/// store refuses it if another writer got there first. Two writers that
/// loaded the same version can never both succeed.
pub struct OrderRepository<S, C, K = MonotonicClock> {
    orders: S,
    catalog: C,
    clock: K,
    prices: PriceList,
}

impl<S: OrderStore, C: CatalogStore> OrderRepository<S, C> {
    /// Creates a repository using the wall clock and the standard prices.
    pub fn new(orders: S, catalog: C) -> Self {
        Self {
            orders,
            catalog,
            clock: MonotonicClock::new(),
            prices: PriceList::standard(),
        }
    }
}

impl<S: OrderStore, C: CatalogStore, K: Clock> OrderRepository<S, C, K> {
    /// Replaces the clock.
    pub fn with_clock<K2: Clock>(self, clock: K2) -> OrderRepository<S, C, K2> {
        OrderRepository {
            orders: self.orders,
            catalog: self.catalog,
            clock,
            prices: self.prices,
        }
    }

    /// Replaces the price list used for totals.
    pub fn with_prices(mut self, prices: PriceList) -> Self {
        self.prices = prices;
        self
    }

    /// Returns a reference to the underlying order store.
    pub fn orders(&self) -> &S {
        &self.orders
    }

    /// Returns a reference to the underlying catalog.
    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    async fn resolve(
        &self,
        location: &str,
        status: &str,
        items: &[LineItemRequest],
    ) -> Result<ResolvedOrder, DomainError> {
        let resolver = LineItemResolver::new(&self.catalog);
        let location = resolver
            .resolve_name(CatalogKind::ConsumeLocation, location)
            .await?;
        let status = resolver.resolve_name(CatalogKind::OrderStatus, status).await?;
        let items = resolver.resolve_all(items).await?;

        Ok(ResolvedOrder {
            location,
            status,
            items,
        })
    }

    async fn load(&self, id: OrderId) -> Result<Order, DomainError> {
        self.orders
            .get(id)
            .await?
            .map(Order::from)
            .ok_or(DomainError::OrderNotFound(id))
    }

    fn check_precondition(
        &self,
        order: &Order,
        precondition: Option<&Validator>,
    ) -> Result<(), DomainError> {
        if precondition_holds(precondition, &order.fingerprint()) {
            return Ok(());
        }
        metrics::counter!("order_precondition_failures_total").increment(1);
        tracing::debug!(order_id = %order.id(), "precondition does not match current fingerprint");
        Err(DomainError::PreconditionFailed { order_id: order.id() })
    }

    /// Writes `next` only if the store still holds `loaded`.
    async fn write_back(&self, loaded: &Order, next: &Order) -> Result<(), DomainError> {
        let options = WriteOptions::expect_updated_at(loaded.updated_at());
        match self.orders.replace(next.to_record(), options).await {
            Ok(()) => Ok(()),
            Err(err @ StoreError::PreconditionFailed { .. }) => {
                metrics::counter!("order_precondition_failures_total").increment(1);
                tracing::debug!(order_id = %loaded.id(), "lost a concurrent write");
                Err(err.into())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Places a new order.
    ///
    /// Nothing is stored unless every name resolves and every quantity is valid.
    #[tracing::instrument(skip(self, cmd), fields(order_id = %cmd.order_id))]
    pub async fn create(&self, cmd: CreateOrder) -> Result<Order, DomainError> {
        let resolved = self
            .resolve(&cmd.location, cmd.status_name(), &cmd.items)
            .await?;
        let order = Order::create(cmd.order_id, resolved, self.clock.now(), &self.prices);

        self.orders.insert(order.to_record()).await?;

        metrics::counter!("orders_created_total").increment(1);
        tracing::info!(items = order.items().len(), "order created");
        Ok(order)
    }

    /// Retrieves an order by ID.
    #[tracing::instrument(skip(self))]
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, DomainError> {
        Ok(self.orders.get(id).await?.map(Order::from))
    }

    /// Lists orders in creation order.
    #[tracing::instrument(skip(self))]
    pub async fn list(&self, page: Page) -> Result<Vec<Order>, DomainError> {
        let records = self.orders.list(page).await?;
        Ok(records.into_iter().map(Order::from).collect())
    }

    /// Replaces an order's location, status and items.
    ///
    /// The precondition is checked against the loaded order before any
    /// name is resolved. Any status may be written here.
    #[tracing::instrument(skip(self, cmd), fields(order_id = %cmd.order_id))]
    pub async fn update(&self, cmd: UpdateOrder) -> Result<Order, DomainError> {
        let loaded = self.load(cmd.order_id).await?;
        self.check_precondition(&loaded, cmd.precondition.as_ref())?;

        let resolved = self.resolve(&cmd.location, &cmd.status, &cmd.items).await?;
        let next = loaded.revise(resolved, self.clock.now(), &self.prices);

        self.write_back(&loaded, &next).await?;

        metrics::counter!("orders_updated_total").increment(1);
        tracing::info!(status = next.status().name(), "order updated");
        Ok(next)
    }

    /// Cancels an order if its status allows it.
    ///
    /// A failed precondition is an error; a missing order and a blocking
    /// status are outcomes.
    #[tracing::instrument(skip(self, cmd), fields(order_id = %cmd.order_id))]
    pub async fn archive(&self, cmd: ArchiveOrder) -> Result<ArchiveOutcome, DomainError> {
        let loaded = match self.load(cmd.order_id).await {
            Ok(order) => order,
            Err(DomainError::OrderNotFound(_)) => return Ok(ArchiveOutcome::NotFound),
            Err(err) => return Err(err),
        };
        self.check_precondition(&loaded, cmd.precondition.as_ref())?;

        let cancelled = LineItemResolver::new(&self.catalog)
            .resolve_name(CatalogKind::OrderStatus, OrderStatus::Cancelled.as_str())
            .await?;

        let next = match loaded.archive(cancelled, self.clock.now()) {
            Ok(next) => next,
            Err(OrderError::ArchiveConflict { status }) => {
                metrics::counter!("order_archive_conflicts_total").increment(1);
                tracing::info!(%status, "order cannot be archived");
                return Ok(ArchiveOutcome::Conflict { status });
            }
            Err(err) => return Err(err.into()),
        };

        match self.write_back(&loaded, &next).await {
            Ok(()) => {}
            Err(DomainError::OrderNotFound(_)) => return Ok(ArchiveOutcome::NotFound),
            Err(err) => return Err(err),
        }

        metrics::counter!("orders_archived_total").increment(1);
        tracing::info!("order archived");
        Ok(ArchiveOutcome::Archived(next))
    }

    /// The order with the greatest `updated_at`, if any.
    pub async fn most_recent(&self) -> Result<Option<Order>, DomainError> {
        Ok(self.orders.most_recent().await?.map(Order::from))
    }

    /// Number of stored orders.
    pub async fn count(&self) -> Result<usize, DomainError> {
        Ok(self.orders.count().await?)
    }

    /// Current fingerprint of one order, or None if it doesn't exist.
    ///
    /// Reads only; never writes.
    pub async fn fingerprint(&self, id: OrderId) -> Result<Option<Fingerprint>, DomainError> {
        Ok(self.orders.get(id).await?.map(|record| {
            Fingerprint::for_order(record.id, record.updated_at)
        }))
    }

    /// Current fingerprint of the whole collection.
    pub async fn collection_fingerprint(&self) -> Result<Fingerprint, DomainError> {
        let last_modified = self.orders.last_modified().await?;
        Ok(Fingerprint::for_collection(last_modified))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, Utc};
    use order_store::{InMemoryCatalog, InMemoryOrderStore};

    use super::*;
    use crate::catalog::seed_catalog;
    use crate::clock::ManualClock;

    type TestRepository = OrderRepository<InMemoryOrderStore, InMemoryCatalog, Arc<ManualClock>>;

    async fn repository() -> (TestRepository, Arc<ManualClock>) {
        let catalog = InMemoryCatalog::new();
        seed_catalog(&catalog).await.unwrap();
        let clock = Arc::new(ManualClock::frozen());
        let repository =
            OrderRepository::new(InMemoryOrderStore::new(), catalog).with_clock(Arc::clone(&clock));
        (repository, clock)
    }

    fn latte_order() -> CreateOrder {
        CreateOrder::new(
            "take away",
            vec![
                LineItemRequest::new("latte", "medium")
                    .with_milk("skim")
                    .with_quantity(2),
            ],
        )
    }

    #[tokio::test]
    async fn test_create_defaults_status_and_prices_items() {
        let (repository, clock) = repository().await;

        let order = repository.create(latte_order()).await.unwrap();

        assert_eq!(order.status().name(), "pending");
        assert_eq!(order.location().name(), "take away");
        assert_eq!(order.created_at(), clock.now());
        assert_eq!(order.updated_at(), order.created_at());
        assert_eq!(order.total().cents(), 800);
        assert_eq!(repository.get(order.id()).await.unwrap(), Some(order));
    }

    #[tokio::test]
    async fn test_create_with_unknown_name_stores_nothing() {
        let (repository, _) = repository().await;

        let cmd = CreateOrder::new(
            "take away",
            vec![
                LineItemRequest::new("latte", "small"),
                LineItemRequest::new("unicorn-frappe", "small"),
            ],
        );
        let result = repository.create(cmd).await;

        assert!(matches!(
            result,
            Err(DomainError::Order(OrderError::UnknownCatalogValue { .. }))
        ));
        assert_eq!(repository.count().await.unwrap(), 0);

        let result = repository
            .create(CreateOrder::new("drive through", vec![]))
            .await;
        assert!(matches!(
            result,
            Err(DomainError::Order(OrderError::UnknownCatalogValue {
                kind: CatalogKind::ConsumeLocation,
                ..
            }))
        ));
    }

    #[tokio::test]
    async fn test_update_advances_fingerprint_even_when_unchanged() {
        let (repository, _) = repository().await;
        let order = repository.create(latte_order()).await.unwrap();

        let same = UpdateOrder::new(
            order.id(),
            "take away",
            "pending",
            vec![
                LineItemRequest::new("latte", "medium")
                    .with_milk("skim")
                    .with_quantity(2),
            ],
        );
        let updated = repository.update(same).await.unwrap();

        // Frozen clock: the repository still moves updated_at forward.
        assert!(updated.updated_at() > order.updated_at());
        assert_ne!(updated.fingerprint(), order.fingerprint());
        assert_ne!(updated.items()[0].id, order.items()[0].id);
        assert_eq!(updated.created_at(), order.created_at());
    }

    #[tokio::test]
    async fn test_update_with_stale_precondition_is_refused() {
        let (repository, clock) = repository().await;
        let order = repository.create(latte_order()).await.unwrap();
        let stale = Validator::exact(order.fingerprint());

        clock.advance(Duration::seconds(1));
        repository
            .update(UpdateOrder::new(order.id(), "in shop", "paid", vec![]))
            .await
            .unwrap();

        let result = repository
            .update(UpdateOrder::new(order.id(), "take away", "served", vec![]).if_match(stale))
            .await;

        assert!(matches!(result, Err(DomainError::PreconditionFailed { .. })));
        let current = repository.get(order.id()).await.unwrap().unwrap();
        assert_eq!(current.status().name(), "paid");
    }

    #[tokio::test]
    async fn test_precondition_checked_before_resolution() {
        let (repository, _) = repository().await;
        let order = repository.create(latte_order()).await.unwrap();
        let wrong = Validator::exact(Fingerprint::from("order:nope:0"));

        let result = repository
            .update(UpdateOrder::new(order.id(), "moon base", "pending", vec![]).if_match(wrong))
            .await;

        assert!(matches!(result, Err(DomainError::PreconditionFailed { .. })));
    }

    #[tokio::test]
    async fn test_update_missing_order_is_not_found() {
        let (repository, _) = repository().await;

        let result = repository
            .update(UpdateOrder::new(OrderId::new(), "in shop", "paid", vec![]))
            .await;

        assert!(matches!(result, Err(DomainError::OrderNotFound(_))));
    }

    #[tokio::test]
    async fn test_archive_lifecycle() {
        let (repository, _) = repository().await;
        let order = repository.create(latte_order()).await.unwrap();

        let outcome = repository
            .archive(ArchiveOrder::new(order.id()).if_match(Validator::exact(order.fingerprint())))
            .await
            .unwrap();
        let ArchiveOutcome::Archived(archived) = outcome else {
            panic!("expected archived, got {outcome:?}");
        };
        assert_eq!(archived.status().name(), "cancelled");
        assert_eq!(archived.total(), order.total());

        let again = repository
            .archive(ArchiveOrder::new(order.id()))
            .await
            .unwrap();
        assert_eq!(
            again,
            ArchiveOutcome::Conflict {
                status: "cancelled".to_string()
            }
        );

        let missing = repository
            .archive(ArchiveOrder::new(OrderId::new()))
            .await
            .unwrap();
        assert_eq!(missing, ArchiveOutcome::NotFound);
    }

    #[tokio::test]
    async fn test_archive_conflict_leaves_order_untouched() {
        let (repository, _) = repository().await;
        let order = repository
            .create(latte_order().with_status("served"))
            .await
            .unwrap();

        let outcome = repository
            .archive(ArchiveOrder::new(order.id()))
            .await
            .unwrap();

        assert!(matches!(outcome, ArchiveOutcome::Conflict { .. }));
        assert_eq!(repository.get(order.id()).await.unwrap(), Some(order));
    }

    #[tokio::test]
    async fn test_concurrent_updates_admit_one_writer() {
        let (repository, _) = repository().await;
        let repository = Arc::new(repository);
        let order = repository.create(latte_order()).await.unwrap();
        let observed = Validator::exact(order.fingerprint());

        let handles: Vec<_> = ["in shop", "take away"]
            .into_iter()
            .map(|location| {
                let repository = Arc::clone(&repository);
                let cmd = UpdateOrder::new(order.id(), location, "paid", vec![])
                    .if_match(observed.clone());
                tokio::spawn(async move { repository.update(cmd).await })
            })
            .collect();

        let mut successes = 0;
        let mut refused = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => successes += 1,
                Err(DomainError::PreconditionFailed { .. }) => refused += 1,
                Err(err) => panic!("unexpected error: {err}"),
            }
        }
        assert_eq!(successes, 1);
        assert_eq!(refused, 1);
    }

    #[tokio::test]
    async fn test_collection_fingerprint_follows_every_mutation() {
        let (repository, clock) = repository().await;
        let empty = repository.collection_fingerprint().await.unwrap();
        assert_eq!(empty.as_str(), "orders:empty");

        let order = repository.create(latte_order()).await.unwrap();
        let after_create = repository.collection_fingerprint().await.unwrap();
        assert_ne!(after_create, empty);
        assert_eq!(
            repository.collection_fingerprint().await.unwrap(),
            after_create
        );

        clock.set(Utc::now() + Duration::minutes(1));
        repository
            .archive(ArchiveOrder::new(order.id()))
            .await
            .unwrap();
        let after_archive = repository.collection_fingerprint().await.unwrap();
        assert_ne!(after_archive, after_create);
        assert_eq!(
            repository.most_recent().await.unwrap().map(|o| o.id()),
            Some(order.id())
        );
    }

    #[tokio::test]
    async fn test_fingerprint_reads_do_not_mutate() {
        let (repository, _) = repository().await;
        let order = repository.create(latte_order()).await.unwrap();

        let first = repository.fingerprint(order.id()).await.unwrap();
        let second = repository.fingerprint(order.id()).await.unwrap();

        assert_eq!(first, Some(order.fingerprint()));
        assert_eq!(first, second);
        assert_eq!(repository.fingerprint(OrderId::new()).await.unwrap(), None);
    }
}
