//! Catalog seeding endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use order_store::{CatalogStore, OrderStore};

use super::orders::AppState;
use crate::error::ApiError;

/// POST /seed — (re)seed the catalog. Safe to call repeatedly.
#[tracing::instrument(skip(state))]
pub async fn seed<S: OrderStore + 'static, C: CatalogStore + 'static>(
    State(state): State<Arc<AppState<S, C>>>,
) -> Result<Json<bool>, ApiError> {
    domain::seed_catalog(state.repository.catalog()).await?;
    Ok(Json(true))
}
