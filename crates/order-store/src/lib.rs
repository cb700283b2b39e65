pub mod error;
pub mod memory;
pub mod postgres;
pub mod query;
pub mod record;
pub mod store;

pub use common::{CatalogId, CatalogKind, CatalogRef, LineItemId, OrderId};
pub use error::{Result, StoreError};
pub use memory::{InMemoryCatalog, InMemoryOrderStore};
pub use postgres::PostgresOrderStore;
pub use query::Page;
pub use record::{LineItemRecord, OrderRecord};
pub use store::{CatalogStore, OrderStore, OrderStoreExt, WriteOptions};
