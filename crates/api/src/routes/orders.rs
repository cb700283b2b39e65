//! Order endpoints with conditional-request handling.
//!
//! Reads honour `If-None-Match` and answer 304 when the client's copy is
//! current. Writes honour `If-Match` and answer 412 when it is stale.
//! Every successful response carries the current `ETag`.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::header::{ETAG, IF_MATCH, IF_NONE_MATCH, LOCATION};
use axum::http::{HeaderMap, HeaderName, StatusCode};
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use common::OrderId;
use domain::{
    ArchiveOrder, ArchiveOutcome, CreateOrder, Fingerprint, LineItem, LineItemRequest, Order,
    OrderRepository, ReadDecision, UpdateOrder, Validator,
};
use order_store::{CatalogStore, OrderStore, Page};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S, C> {
    pub repository: OrderRepository<S, C>,
    pub max_page_size: usize,
}

// -- Request types --

#[derive(Deserialize)]
pub struct UpdateOrderRequest {
    pub location: String,
    pub status: String,
    #[serde(default)]
    pub items: Vec<LineItemRequest>,
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub location: String,
    pub status: String,
    pub items: Vec<LineItemResponse>,
    pub total_cents: i64,
    pub cost: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct LineItemResponse {
    pub id: String,
    pub product_name: String,
    pub size: String,
    pub milk: String,
    pub shot: String,
    pub quantity: u32,
}

impl From<&LineItem> for LineItemResponse {
    fn from(item: &LineItem) -> Self {
        Self {
            id: item.id.to_string(),
            product_name: item.product.name().to_string(),
            size: item.size.name().to_string(),
            milk: item.milk.name().to_string(),
            shot: item.espresso_shot.name().to_string(),
            quantity: item.quantity,
        }
    }
}

impl From<&Order> for OrderResponse {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id().to_string(),
            location: order.location().name().to_string(),
            status: order.status().name().to_string(),
            items: order.items().iter().map(LineItemResponse::from).collect(),
            total_cents: order.total().cents(),
            cost: order.total().to_string(),
            created_at: order.created_at(),
            updated_at: order.updated_at(),
        }
    }
}

// -- Handlers --

/// POST /orders — place a new order.
#[tracing::instrument(skip(state, cmd))]
pub async fn create<S: OrderStore + 'static, C: CatalogStore + 'static>(
    State(state): State<Arc<AppState<S, C>>>,
    Json(cmd): Json<CreateOrder>,
) -> Result<Response, ApiError> {
    let order = state.repository.create(cmd).await?;
    let location = format!("/orders/{}", order.id());

    Ok((
        StatusCode::CREATED,
        [
            (LOCATION, location),
            (ETAG, order.fingerprint().to_etag()),
        ],
        Json(OrderResponse::from(&order)),
    )
        .into_response())
}

/// GET /orders — list orders in creation order.
#[tracing::instrument(skip(state, headers))]
pub async fn list<S: OrderStore + 'static, C: CatalogStore + 'static>(
    State(state): State<Arc<AppState<S, C>>>,
    Query(params): Query<ListParams>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let current = state.repository.collection_fingerprint().await?;
    let if_none_match = validator(&headers, IF_NONE_MATCH);
    let fingerprint = match ReadDecision::evaluate(if_none_match.as_ref(), current) {
        ReadDecision::NotModified(fingerprint) => return Ok(not_modified(&fingerprint)),
        ReadDecision::Fresh(fingerprint) => fingerprint,
    };

    let limit = params
        .limit
        .unwrap_or(state.max_page_size)
        .min(state.max_page_size);
    let page = Page::new(params.offset.unwrap_or(0), limit);
    let orders = state.repository.list(page).await?;
    let body: Vec<OrderResponse> = orders.iter().map(OrderResponse::from).collect();

    Ok(([(ETAG, fingerprint.to_etag())], Json(body)).into_response())
}

/// GET /orders/{id} — load one order.
#[tracing::instrument(skip(state, headers))]
pub async fn get<S: OrderStore + 'static, C: CatalogStore + 'static>(
    State(state): State<Arc<AppState<S, C>>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let order_id = parse_order_id(&id)?;

    let current = state
        .repository
        .fingerprint(order_id)
        .await?
        .ok_or_else(|| not_found(order_id))?;
    if let ReadDecision::NotModified(fingerprint) =
        ReadDecision::evaluate(validator(&headers, IF_NONE_MATCH).as_ref(), current)
    {
        return Ok(not_modified(&fingerprint));
    }

    let order = state
        .repository
        .get(order_id)
        .await?
        .ok_or_else(|| not_found(order_id))?;

    Ok(with_etag(&order, StatusCode::OK))
}

/// PUT /orders/{id} — replace an order's location, status and items.
#[tracing::instrument(skip(state, headers, req))]
pub async fn update<S: OrderStore + 'static, C: CatalogStore + 'static>(
    State(state): State<Arc<AppState<S, C>>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<UpdateOrderRequest>,
) -> Result<Response, ApiError> {
    let order_id = parse_order_id(&id)?;

    let mut cmd = UpdateOrder::new(order_id, req.location, req.status, req.items);
    cmd.precondition = validator(&headers, IF_MATCH);
    let order = state.repository.update(cmd).await?;

    Ok(with_etag(&order, StatusCode::OK))
}

/// DELETE /orders/{id} — archive (cancel) an order.
#[tracing::instrument(skip(state, headers))]
pub async fn archive<S: OrderStore + 'static, C: CatalogStore + 'static>(
    State(state): State<Arc<AppState<S, C>>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let order_id = parse_order_id(&id)?;

    let mut cmd = ArchiveOrder::new(order_id);
    cmd.precondition = validator(&headers, IF_MATCH);

    match state.repository.archive(cmd).await? {
        ArchiveOutcome::Archived(order) => Ok((
            StatusCode::NO_CONTENT,
            [(ETAG, order.fingerprint().to_etag())],
        )
            .into_response()),
        ArchiveOutcome::Conflict { status } => Err(ApiError::ArchiveConflict(format!(
            "Order {order_id} cannot be archived from {status} status"
        ))),
        ArchiveOutcome::NotFound => Err(not_found(order_id)),
    }
}

fn with_etag(order: &Order, status: StatusCode) -> Response {
    (
        status,
        [(ETAG, order.fingerprint().to_etag())],
        Json(OrderResponse::from(order)),
    )
        .into_response()
}

fn not_modified(fingerprint: &Fingerprint) -> Response {
    metrics::counter!("order_not_modified_total").increment(1);
    (StatusCode::NOT_MODIFIED, [(ETAG, fingerprint.to_etag())]).into_response()
}

/// Reads a validator header. Unreadable values count as absent.
fn validator(headers: &HeaderMap, name: HeaderName) -> Option<Validator> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .and_then(Validator::parse)
}

fn not_found(order_id: OrderId) -> ApiError {
    ApiError::NotFound(format!("Order {order_id} not found"))
}

fn parse_order_id(id: &str) -> Result<OrderId, ApiError> {
    id.parse()
        .map_err(|e| ApiError::BadRequest(format!("Invalid ID format: {e}")))
}
