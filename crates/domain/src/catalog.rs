//! Catalog seed values.
//!
//! Each catalog kind is a fixed enumeration written to the catalog store
//! once at startup. After seeding, names are only ever resolved back to
//! references; the enums here never travel inside an order.

use common::CatalogKind;
use order_store::{CatalogStore, StoreError};

use crate::order::OrderStatus;

macro_rules! catalog_values {
    (
        $(#[$meta:meta])*
        $name:ident => $kind:expr, {
            $($variant:ident => $value:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Every seeded value of this kind.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// The catalog kind these values are seeded under.
            pub const KIND: CatalogKind = $kind;

            /// Returns the catalog name.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $value),+
                }
            }

            /// Parses a catalog name.
            pub fn parse(name: &str) -> Option<Self> {
                Self::ALL.iter().copied().find(|value| value.as_str() == name)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }
    };
}

catalog_values! {
    /// Drinks on the menu.
    Product => CatalogKind::Product, {
        Latte => "latte",
        Cappuccino => "cappuccino",
        Espresso => "espresso",
        FlatWhite => "flat white",
        Americano => "americano",
        Mocha => "mocha",
        Tea => "tea",
        HotChocolate => "hot chocolate",
    }
}

catalog_values! {
    /// Cup sizes.
    Size => CatalogKind::Size, {
        Small => "small",
        Medium => "medium",
        Large => "large",
    }
}

catalog_values! {
    /// Milk choices. `none` is the default when a request omits milk.
    Milk => CatalogKind::Milk, {
        None => "none",
        Skim => "skim",
        Semi => "semi",
        Whole => "whole",
    }
}

catalog_values! {
    /// Extra espresso shots. `none` is the default when a request omits shots.
    EspressoShot => CatalogKind::EspressoShot, {
        None => "none",
        Single => "single",
        Double => "double",
        Triple => "triple",
    }
}

catalog_values! {
    /// Where the customer consumes the order.
    ConsumeLocation => CatalogKind::ConsumeLocation, {
        TakeAway => "take away",
        InShop => "in shop",
    }
}

/// Every `(kind, name)` pair the catalog is seeded with.
pub fn seed_entries() -> Vec<(CatalogKind, &'static str)> {
    let mut entries = Vec::new();
    entries.extend(Product::ALL.iter().map(|v| (Product::KIND, v.as_str())));
    entries.extend(Size::ALL.iter().map(|v| (Size::KIND, v.as_str())));
    entries.extend(Milk::ALL.iter().map(|v| (Milk::KIND, v.as_str())));
    entries.extend(
        EspressoShot::ALL
            .iter()
            .map(|v| (EspressoShot::KIND, v.as_str())),
    );
    entries.extend(
        ConsumeLocation::ALL
            .iter()
            .map(|v| (ConsumeLocation::KIND, v.as_str())),
    );
    entries.extend(
        OrderStatus::ALL
            .iter()
            .map(|v| (CatalogKind::OrderStatus, v.as_str())),
    );
    entries
}

/// Seeds the catalog with every fixed value. Safe to run more than once.
///
/// Returns the number of entries written or confirmed.
#[tracing::instrument(skip(catalog))]
pub async fn seed_catalog<C: CatalogStore + ?Sized>(catalog: &C) -> Result<usize, StoreError> {
    let entries = seed_entries();
    for (kind, name) in &entries {
        catalog.seed(*kind, name).await?;
    }
    tracing::info!(entries = entries.len(), "catalog seeded");
    Ok(entries.len())
}

#[cfg(test)]
mod tests {
    use order_store::InMemoryCatalog;

    use super::*;

    #[test]
    fn parse_roundtrips_names() {
        assert_eq!(Product::parse("flat white"), Some(Product::FlatWhite));
        assert_eq!(ConsumeLocation::parse("take away"), Some(ConsumeLocation::TakeAway));
        assert_eq!(Milk::parse("whole"), Some(Milk::Whole));
        assert_eq!(Product::parse("unicorn-frappe"), None);
    }

    #[test]
    fn seed_entries_cover_every_kind() {
        let entries = seed_entries();
        for kind in CatalogKind::ALL {
            assert!(entries.iter().any(|(k, _)| *k == kind), "missing {kind}");
        }
        assert_eq!(entries.len(), 8 + 3 + 4 + 4 + 2 + 5);
    }

    #[tokio::test]
    async fn seed_catalog_is_idempotent() {
        let catalog = InMemoryCatalog::new();

        let written = seed_catalog(&catalog).await.unwrap();
        seed_catalog(&catalog).await.unwrap();

        assert_eq!(written, seed_entries().len());
        assert_eq!(catalog.len_of(CatalogKind::Size).await, 3);
        assert_eq!(catalog.len_of(CatalogKind::OrderStatus).await, 5);
    }
}
