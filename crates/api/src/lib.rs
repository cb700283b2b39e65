//! HTTP API server for the order service.
//!
//! Provides REST endpoints for placing, reading, revising and archiving
//! orders behind ETag-based conditional requests, with structured logging
//! (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use domain::OrderRepository;
use metrics_exporter_prometheus::PrometheusHandle;
use order_store::{CatalogStore, InMemoryCatalog, InMemoryOrderStore, OrderStore};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::orders::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: OrderStore + 'static, C: CatalogStore + 'static>(
    state: Arc<AppState<S, C>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check::<S, C>))
        .route("/seed", post(routes::seed::seed::<S, C>))
        .route(
            "/orders",
            post(routes::orders::create::<S, C>).get(routes::orders::list::<S, C>),
        )
        .route(
            "/orders/{id}",
            get(routes::orders::get::<S, C>)
                .put(routes::orders::update::<S, C>)
                .delete(routes::orders::archive::<S, C>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
                .expose_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates application state over the given stores.
pub fn create_state<S: OrderStore, C: CatalogStore>(
    orders: S,
    catalog: C,
    max_page_size: usize,
) -> Arc<AppState<S, C>> {
    Arc::new(AppState {
        repository: OrderRepository::new(orders, catalog),
        max_page_size,
    })
}

/// Creates state backed by in-memory stores with a seeded catalog.
pub async fn create_in_memory_state(
    max_page_size: usize,
) -> Result<Arc<AppState<InMemoryOrderStore, InMemoryCatalog>>, order_store::StoreError> {
    let catalog = InMemoryCatalog::new();
    domain::seed_catalog(&catalog).await?;
    Ok(create_state(InMemoryOrderStore::new(), catalog, max_page_size))
}
