//! Catalog reference types.
//!
//! Catalog entries are small pre-seeded values (products, sizes, milks,
//! espresso shots, consume locations and order statuses). Each entry is a
//! stable `(id, name)` pair whose name is unique within its kind.

use serde::{Deserialize, Serialize};

/// The six catalog variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogKind {
    Product,
    Size,
    Milk,
    EspressoShot,
    ConsumeLocation,
    OrderStatus,
}

impl CatalogKind {
    /// Every catalog kind, in seeding order.
    pub const ALL: [CatalogKind; 6] = [
        CatalogKind::Product,
        CatalogKind::Size,
        CatalogKind::Milk,
        CatalogKind::EspressoShot,
        CatalogKind::ConsumeLocation,
        CatalogKind::OrderStatus,
    ];

    /// Returns the storage key for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            CatalogKind::Product => "product",
            CatalogKind::Size => "size",
            CatalogKind::Milk => "milk",
            CatalogKind::EspressoShot => "espresso_shot",
            CatalogKind::ConsumeLocation => "consume_location",
            CatalogKind::OrderStatus => "order_status",
        }
    }

    /// Parses a storage key back into a kind.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == s)
    }
}

impl std::fmt::Display for CatalogKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Identifier of a catalog entry. Stable for the lifetime of the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CatalogId(i64);

impl CatalogId {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for CatalogId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A resolved reference to a catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CatalogRef {
    pub kind: CatalogKind,
    pub id: CatalogId,
    pub name: String,
}

impl CatalogRef {
    pub fn new(kind: CatalogKind, id: CatalogId, name: impl Into<String>) -> Self {
        Self {
            kind,
            id,
            name: name.into(),
        }
    }

    /// Returns the entry name.
    pub fn name(&self) -> &str {
        &self.name
    }
}
