//! Value objects for the order domain.

use std::collections::HashMap;

use common::{CatalogRef, LineItemId};
use order_store::LineItemRecord;
use serde::{Deserialize, Serialize};

use crate::catalog::{EspressoShot, Milk, Product, Size};

/// Money amount represented in cents to avoid floating point issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money {
    /// Amount in cents (e.g., 1000 = $10.00)
    cents: i64,
}

impl Money {
    /// Creates a new Money amount from cents.
    pub fn from_cents(cents: i64) -> Self {
        Self { cents }
    }

    /// Returns zero money.
    pub fn zero() -> Self {
        Self { cents: 0 }
    }

    /// Returns the amount in cents.
    pub fn cents(&self) -> i64 {
        self.cents
    }

    /// Returns the dollar portion (whole number).
    pub fn dollars(&self) -> i64 {
        self.cents / 100
    }

    /// Returns the cents portion (remainder after dollars).
    pub fn cents_part(&self) -> i64 {
        self.cents.abs() % 100
    }

    /// Multiplies by a quantity.
    pub fn multiply(&self, quantity: u32) -> Money {
        Money {
            cents: self.cents * quantity as i64,
        }
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.cents < 0 {
            write!(f, "-${}.{:02}", self.dollars().abs(), self.cents_part())
        } else {
            write!(f, "${}.{:02}", self.dollars(), self.cents_part())
        }
    }
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Self::Output {
        Money {
            cents: self.cents + rhs.cents,
        }
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

/// A line item as requested by a client, before any catalog lookup.
///
/// Milk and shot default to `none` and quantity to 1 when omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemRequest {
    pub product_name: String,
    pub size: String,
    #[serde(default)]
    pub milk: Option<String>,
    #[serde(default)]
    pub shot: Option<String>,
    #[serde(default)]
    pub quantity: Option<i64>,
}

impl LineItemRequest {
    /// Creates a request for a product in a size, with default milk, shot and quantity.
    pub fn new(product_name: impl Into<String>, size: impl Into<String>) -> Self {
        Self {
            product_name: product_name.into(),
            size: size.into(),
            milk: None,
            shot: None,
            quantity: None,
        }
    }

    pub fn with_milk(mut self, milk: impl Into<String>) -> Self {
        self.milk = Some(milk.into());
        self
    }

    pub fn with_shot(mut self, shot: impl Into<String>) -> Self {
        self.shot = Some(shot.into());
        self
    }

    pub fn with_quantity(mut self, quantity: i64) -> Self {
        self.quantity = Some(quantity);
        self
    }

    /// Milk name, falling back to `none`.
    pub fn milk_name(&self) -> &str {
        self.milk.as_deref().unwrap_or(Milk::None.as_str())
    }

    /// Shot name, falling back to `none`.
    pub fn shot_name(&self) -> &str {
        self.shot.as_deref().unwrap_or(EspressoShot::None.as_str())
    }
}

/// A line item whose every catalog name has been resolved.
///
/// Has no identity yet; the repository assigns one when it persists the
/// item as part of an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedItem {
    pub product: CatalogRef,
    pub size: CatalogRef,
    pub milk: CatalogRef,
    pub espresso_shot: CatalogRef,
    pub quantity: u32,
}

impl ResolvedItem {
    /// Gives the item an identity as part of an order.
    pub fn into_line_item(self, id: LineItemId) -> LineItem {
        LineItem {
            id,
            product: self.product,
            size: self.size,
            milk: self.milk,
            espresso_shot: self.espresso_shot,
            quantity: self.quantity,
        }
    }
}

/// A line item owned by an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: LineItemId,
    pub product: CatalogRef,
    pub size: CatalogRef,
    pub milk: CatalogRef,
    pub espresso_shot: CatalogRef,
    pub quantity: u32,
}

impl LineItem {
    /// Returns true if both items select the same drink in the same quantity.
    pub fn same_selection(&self, other: &LineItem) -> bool {
        self.product == other.product
            && self.size == other.size
            && self.milk == other.milk
            && self.espresso_shot == other.espresso_shot
            && self.quantity == other.quantity
    }
}

impl From<LineItemRecord> for LineItem {
    fn from(record: LineItemRecord) -> Self {
        Self {
            id: record.id,
            product: record.product,
            size: record.size,
            milk: record.milk,
            espresso_shot: record.espresso_shot,
            quantity: record.quantity,
        }
    }
}

impl From<LineItem> for LineItemRecord {
    fn from(item: LineItem) -> Self {
        Self {
            id: item.id,
            product: item.product,
            size: item.size,
            milk: item.milk,
            espresso_shot: item.espresso_shot,
            quantity: item.quantity,
        }
    }
}

/// Prices used to derive order totals.
///
/// A drink costs its product base price plus a size surcharge and an
/// espresso-shot surcharge. Names missing from the list cost nothing.
#[derive(Debug, Clone, Default)]
pub struct PriceList {
    products: HashMap<String, Money>,
    sizes: HashMap<String, Money>,
    shots: HashMap<String, Money>,
}

impl PriceList {
    /// An empty price list: every order totals zero.
    pub fn free() -> Self {
        Self::default()
    }

    /// The house prices for every seeded product, size and shot.
    pub fn standard() -> Self {
        let products = Product::ALL.iter().map(|product| {
            let cents = match product {
                Product::Latte | Product::Cappuccino => 350,
                Product::Espresso | Product::Tea => 250,
                Product::FlatWhite => 370,
                Product::Americano => 300,
                Product::Mocha => 400,
                Product::HotChocolate => 380,
            };
            (product.as_str().to_string(), Money::from_cents(cents))
        });
        let sizes = Size::ALL.iter().map(|size| {
            let cents = match size {
                Size::Small => 0,
                Size::Medium => 50,
                Size::Large => 100,
            };
            (size.as_str().to_string(), Money::from_cents(cents))
        });
        let shots = EspressoShot::ALL.iter().map(|shot| {
            let cents = match shot {
                EspressoShot::None => 0,
                EspressoShot::Single => 50,
                EspressoShot::Double => 100,
                EspressoShot::Triple => 150,
            };
            (shot.as_str().to_string(), Money::from_cents(cents))
        });

        Self {
            products: products.collect(),
            sizes: sizes.collect(),
            shots: shots.collect(),
        }
    }

    fn lookup(table: &HashMap<String, Money>, name: &str) -> Money {
        table.get(name).copied().unwrap_or_default()
    }

    /// Price of a single unit of the item.
    pub fn unit_price(&self, item: &LineItem) -> Money {
        Self::lookup(&self.products, item.product.name())
            + Self::lookup(&self.sizes, item.size.name())
            + Self::lookup(&self.shots, item.espresso_shot.name())
    }

    /// Total for a list of items.
    pub fn total(&self, items: &[LineItem]) -> Money {
        items
            .iter()
            .map(|item| self.unit_price(item).multiply(item.quantity))
            .sum()
    }
}
