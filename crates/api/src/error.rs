//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::{DomainError, OrderError};
use order_store::StoreError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// The order exists but cannot be archived from its status.
    ArchiveConflict(String),
    /// Domain logic error.
    Domain(DomainError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::ArchiveConflict(msg) => (StatusCode::METHOD_NOT_ALLOWED, msg),
            ApiError::Domain(err) => domain_error_to_response(err),
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn domain_error_to_response(err: DomainError) -> (StatusCode, String) {
    match &err {
        DomainError::Order(order_err) => match order_err {
            OrderError::UnknownCatalogValue { .. } | OrderError::InvalidQuantity { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, err.to_string())
            }
            OrderError::ArchiveConflict { .. } => (StatusCode::METHOD_NOT_ALLOWED, err.to_string()),
        },
        DomainError::OrderNotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        DomainError::PreconditionFailed { .. } => {
            (StatusCode::PRECONDITION_FAILED, err.to_string())
        }
        DomainError::Store(StoreError::DuplicateOrder(_)) => {
            (StatusCode::CONFLICT, err.to_string())
        }
        DomainError::Store(_) => {
            tracing::error!(error = %err, "internal server error");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Domain(err.into())
    }
}

#[cfg(test)]
mod tests {
    use common::{CatalogKind, OrderId};

    use super::*;

    fn status_of(err: ApiError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_domain_errors_map_to_distinct_statuses() {
        let id = OrderId::new();

        assert_eq!(
            status_of(
                DomainError::from(OrderError::UnknownCatalogValue {
                    kind: CatalogKind::Product,
                    name: "unicorn-frappe".to_string(),
                })
                .into()
            ),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_of(DomainError::from(OrderError::InvalidQuantity { quantity: 0 }).into()),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_of(DomainError::OrderNotFound(id).into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(DomainError::PreconditionFailed { order_id: id }.into()),
            StatusCode::PRECONDITION_FAILED
        );
        assert_eq!(
            status_of(ApiError::ArchiveConflict("served".to_string())),
            StatusCode::METHOD_NOT_ALLOWED
        );
        assert_eq!(
            status_of(StoreError::DuplicateOrder(id).into()),
            StatusCode::CONFLICT
        );
    }
}
