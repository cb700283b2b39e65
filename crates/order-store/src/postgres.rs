use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{
    PgPool, Postgres, Row, Transaction,
    postgres::{PgPoolOptions, PgRow},
};
use uuid::Uuid;

use crate::{
    CatalogId, CatalogKind, CatalogRef, LineItemId, LineItemRecord, OrderId, OrderRecord, Page,
    Result, StoreError,
    store::{CatalogStore, OrderStore, WriteOptions},
};

const SELECT_ORDERS: &str = r#"
    SELECT o.id, o.total_cents, o.created_at, o.updated_at,
           o.location_id, l.name AS location_name,
           o.status_id, s.name AS status_name
    FROM orders o
    JOIN catalog_entries l ON l.id = o.location_id
    JOIN catalog_entries s ON s.id = o.status_id
"#;

const SELECT_ITEMS: &str = r#"
    SELECT i.order_id, i.id, i.quantity,
           i.product_id, p.name AS product_name,
           i.size_id, z.name AS size_name,
           i.milk_id, m.name AS milk_name,
           i.espresso_shot_id, e.name AS espresso_shot_name
    FROM order_items i
    JOIN catalog_entries p ON p.id = i.product_id
    JOIN catalog_entries z ON z.id = i.size_id
    JOIN catalog_entries m ON m.id = i.milk_id
    JOIN catalog_entries e ON e.id = i.espresso_shot_id
    WHERE i.order_id = ANY($1)
    ORDER BY i.order_id, i.position
"#;

/// PostgreSQL-backed order store and catalog.
#[derive(Clone)]
pub struct PostgresOrderStore {
    pool: PgPool,
}

impl PostgresOrderStore {
    /// Creates a new PostgreSQL order store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a connection pool to `database_url`.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        tracing::info!("order store migrations applied");
        Ok(())
    }

    fn catalog_ref(
        row: &PgRow,
        kind: CatalogKind,
        id_col: &str,
        name_col: &str,
    ) -> Result<CatalogRef> {
        Ok(CatalogRef::new(
            kind,
            CatalogId::new(row.try_get(id_col)?),
            row.try_get::<String, _>(name_col)?,
        ))
    }

    fn row_to_order(row: &PgRow) -> Result<OrderRecord> {
        Ok(OrderRecord {
            id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
            location: Self::catalog_ref(
                row,
                CatalogKind::ConsumeLocation,
                "location_id",
                "location_name",
            )?,
            status: Self::catalog_ref(row, CatalogKind::OrderStatus, "status_id", "status_name")?,
            items: Vec::new(),
            total_cents: row.try_get("total_cents")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_item(row: &PgRow) -> Result<LineItemRecord> {
        let quantity: i32 = row.try_get("quantity")?;

        Ok(LineItemRecord {
            id: LineItemId::from_uuid(row.try_get::<Uuid, _>("id")?),
            product: Self::catalog_ref(row, CatalogKind::Product, "product_id", "product_name")?,
            size: Self::catalog_ref(row, CatalogKind::Size, "size_id", "size_name")?,
            milk: Self::catalog_ref(row, CatalogKind::Milk, "milk_id", "milk_name")?,
            espresso_shot: Self::catalog_ref(
                row,
                CatalogKind::EspressoShot,
                "espresso_shot_id",
                "espresso_shot_name",
            )?,
            // The schema enforces quantity >= 1.
            quantity: quantity.unsigned_abs(),
        })
    }

    /// Opens a read-only snapshot so order rows and their items come from
    /// the same committed state.
    async fn begin_snapshot(&self) -> Result<Transaction<'static, Postgres>> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;
        Ok(tx)
    }

    /// Maps order rows and attaches their items, read through the same transaction.
    async fn load_orders(
        tx: &mut Transaction<'_, Postgres>,
        rows: &[PgRow],
    ) -> Result<Vec<OrderRecord>> {
        let orders = rows
            .iter()
            .map(Self::row_to_order)
            .collect::<Result<Vec<_>>>()?;
        Self::with_items(tx, orders).await
    }

    /// Loads the items of every given order and attaches them in position order.
    async fn with_items(
        tx: &mut Transaction<'_, Postgres>,
        mut orders: Vec<OrderRecord>,
    ) -> Result<Vec<OrderRecord>> {
        if orders.is_empty() {
            return Ok(orders);
        }

        let ids: Vec<Uuid> = orders.iter().map(|o| o.id.as_uuid()).collect();
        let rows = sqlx::query(SELECT_ITEMS)
            .bind(ids)
            .fetch_all(&mut **tx)
            .await?;

        let mut items: HashMap<Uuid, Vec<LineItemRecord>> = HashMap::new();
        for row in &rows {
            let order_id: Uuid = row.try_get("order_id")?;
            items
                .entry(order_id)
                .or_default()
                .push(Self::row_to_item(row)?);
        }

        for order in &mut orders {
            order.items = items.remove(&order.id.as_uuid()).unwrap_or_default();
        }
        Ok(orders)
    }

    async fn insert_items(
        tx: &mut Transaction<'_, Postgres>,
        order_id: OrderId,
        items: &[LineItemRecord],
    ) -> Result<()> {
        for (position, item) in items.iter().enumerate() {
            let quantity =
                i32::try_from(item.quantity).map_err(|_| StoreError::QuantityOutOfRange {
                    order_id,
                    quantity: item.quantity,
                })?;
            sqlx::query(
                r#"
                INSERT INTO order_items
                    (id, order_id, position, product_id, size_id, milk_id, espresso_shot_id, quantity)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(item.id.as_uuid())
            .bind(order_id.as_uuid())
            .bind(position as i32)
            .bind(item.product.id.as_i64())
            .bind(item.size.id.as_i64())
            .bind(item.milk.id.as_i64())
            .bind(item.espresso_shot.id.as_i64())
            .bind(quantity)
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl OrderStore for PostgresOrderStore {
    async fn insert(&self, order: OrderRecord) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO orders (id, location_id, status_id, total_cents, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.location.id.as_i64())
        .bind(order.status.id.as_i64())
        .bind(order.total_cents)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.constraint() == Some("orders_pkey")
            {
                return StoreError::DuplicateOrder(order.id);
            }
            StoreError::Database(e)
        })?;

        Self::insert_items(&mut tx, order.id, &order.items).await?;

        tx.commit().await?;
        Ok(())
    }

    async fn get(&self, id: OrderId) -> Result<Option<OrderRecord>> {
        let sql = format!("{SELECT_ORDERS} WHERE o.id = $1");
        let mut tx = self.begin_snapshot().await?;
        let rows = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_all(&mut *tx)
            .await?;
        let mut orders = Self::load_orders(&mut tx, &rows).await?;
        tx.commit().await?;

        Ok(orders.pop())
    }

    async fn list(&self, page: Page) -> Result<Vec<OrderRecord>> {
        // LIMIT NULL means no limit.
        let sql = format!("{SELECT_ORDERS} ORDER BY o.created_at ASC, o.id ASC LIMIT $1 OFFSET $2");
        let mut tx = self.begin_snapshot().await?;
        let rows = sqlx::query(&sql)
            .bind(page.limit.map(|limit| limit as i64))
            .bind(page.offset as i64)
            .fetch_all(&mut *tx)
            .await?;
        let orders = Self::load_orders(&mut tx, &rows).await?;
        tx.commit().await?;

        Ok(orders)
    }

    async fn replace(&self, order: OrderRecord, options: WriteOptions) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        // The row lock taken by UPDATE serializes concurrent writers; a writer
        // that waited re-evaluates the updated_at predicate against the new row.
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET location_id = $2, status_id = $3, total_cents = $4, updated_at = $5
            WHERE id = $1 AND ($6::timestamptz IS NULL OR updated_at = $6)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.location.id.as_i64())
        .bind(order.status.id.as_i64())
        .bind(order.total_cents)
        .bind(order.updated_at)
        .bind(options.expected_updated_at)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            let actual: Option<DateTime<Utc>> =
                sqlx::query_scalar("SELECT updated_at FROM orders WHERE id = $1")
                    .bind(order.id.as_uuid())
                    .fetch_optional(&mut *tx)
                    .await?;

            let Some(actual) = actual else {
                return Err(StoreError::OrderNotFound(order.id));
            };
            tracing::debug!(order_id = %order.id, %actual, "conditional update lost the race");
            return Err(StoreError::PreconditionFailed {
                order_id: order.id,
                expected: options.expected_updated_at.unwrap_or(actual),
                actual,
            });
        }

        sqlx::query("DELETE FROM order_items WHERE order_id = $1")
            .bind(order.id.as_uuid())
            .execute(&mut *tx)
            .await?;
        Self::insert_items(&mut tx, order.id, &order.items).await?;

        tx.commit().await?;
        Ok(())
    }

    async fn most_recent(&self) -> Result<Option<OrderRecord>> {
        let sql = format!("{SELECT_ORDERS} ORDER BY o.updated_at DESC, o.id DESC LIMIT 1");
        let mut tx = self.begin_snapshot().await?;
        let rows = sqlx::query(&sql).fetch_all(&mut *tx).await?;
        let mut orders = Self::load_orders(&mut tx, &rows).await?;
        tx.commit().await?;

        Ok(orders.pop())
    }

    async fn count(&self) -> Result<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as usize)
    }
}

#[async_trait]
impl CatalogStore for PostgresOrderStore {
    async fn resolve_by_name(&self, kind: CatalogKind, name: &str) -> Result<Option<CatalogRef>> {
        let id: Option<i64> =
            sqlx::query_scalar("SELECT id FROM catalog_entries WHERE kind = $1 AND name = $2")
                .bind(kind.as_str())
                .bind(name)
                .fetch_optional(&self.pool)
                .await?;

        Ok(id.map(|id| CatalogRef::new(kind, CatalogId::new(id), name)))
    }

    async fn seed(&self, kind: CatalogKind, name: &str) -> Result<CatalogRef> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO catalog_entries (kind, name)
            VALUES ($1, $2)
            ON CONFLICT ON CONSTRAINT unique_catalog_kind_name
            DO UPDATE SET name = EXCLUDED.name
            RETURNING id
            "#,
        )
        .bind(kind.as_str())
        .bind(name)
        .fetch_one(&self.pool)
        .await?;

        Ok(CatalogRef::new(kind, CatalogId::new(id), name))
    }
}
