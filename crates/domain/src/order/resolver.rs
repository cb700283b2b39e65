//! Turns free-form catalog names into validated references.

use common::{CatalogKind, CatalogRef};
use futures_util::future::try_join_all;
use order_store::CatalogStore;

use super::{LineItemRequest, OrderError, ResolvedItem};
use crate::error::DomainError;

/// Resolves line items and order-level names against the catalog.
///
/// Reads the catalog only; resolving the same request twice gives the
/// same result.
pub struct LineItemResolver<'a, C: CatalogStore + ?Sized> {
    catalog: &'a C,
}

impl<'a, C: CatalogStore + ?Sized> LineItemResolver<'a, C> {
    pub fn new(catalog: &'a C) -> Self {
        Self { catalog }
    }

    /// Resolves a single catalog name, failing if the catalog lacks it.
    pub async fn resolve_name(
        &self,
        kind: CatalogKind,
        name: &str,
    ) -> Result<CatalogRef, DomainError> {
        self.catalog
            .resolve_by_name(kind, name)
            .await?
            .ok_or_else(|| {
                OrderError::UnknownCatalogValue {
                    kind,
                    name: name.to_string(),
                }
                .into()
            })
    }

    /// Resolves one requested line item.
    pub async fn resolve(&self, request: &LineItemRequest) -> Result<ResolvedItem, DomainError> {
        let product = self
            .resolve_name(CatalogKind::Product, &request.product_name)
            .await?;
        let size = self.resolve_name(CatalogKind::Size, &request.size).await?;
        let milk = self
            .resolve_name(CatalogKind::Milk, request.milk_name())
            .await?;
        let espresso_shot = self
            .resolve_name(CatalogKind::EspressoShot, request.shot_name())
            .await?;
        let quantity = validate_quantity(request.quantity)?;

        Ok(ResolvedItem {
            product,
            size,
            milk,
            espresso_shot,
            quantity,
        })
    }

    /// Resolves every requested item concurrently, keeping request order.
    ///
    /// Fails as soon as any item fails.
    pub async fn resolve_all(
        &self,
        requests: &[LineItemRequest],
    ) -> Result<Vec<ResolvedItem>, DomainError> {
        try_join_all(requests.iter().map(|request| self.resolve(request))).await
    }
}

/// Largest quantity a line item may carry; the durable store keeps it as a 32-bit integer.
pub const MAX_QUANTITY: u32 = i32::MAX as u32;

fn validate_quantity(quantity: Option<i64>) -> Result<u32, OrderError> {
    let quantity = quantity.unwrap_or(1);
    match u32::try_from(quantity) {
        Ok(q) if (1..=MAX_QUANTITY).contains(&q) => Ok(q),
        _ => Err(OrderError::InvalidQuantity { quantity }),
    }
}
