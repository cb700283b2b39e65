//! Shared identifier and catalog reference types.

pub mod catalog;
pub mod types;

pub use catalog::{CatalogId, CatalogKind, CatalogRef};
pub use types::{LineItemId, OrderId};
