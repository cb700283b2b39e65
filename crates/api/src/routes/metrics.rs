//! Prometheus metrics endpoint and metric descriptions.

use axum::extract::State;
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use metrics_exporter_prometheus::PrometheusHandle;

/// Registers help text for the order counters.
///
/// Call once after installing the recorder.
pub fn describe() {
    metrics::describe_counter!("orders_created_total", "Orders placed");
    metrics::describe_counter!("orders_updated_total", "Whole-order updates applied");
    metrics::describe_counter!("orders_archived_total", "Orders moved to cancelled");
    metrics::describe_counter!(
        "order_precondition_failures_total",
        "Writes refused because the caller's ETag was stale"
    );
    metrics::describe_counter!(
        "order_archive_conflicts_total",
        "Archive requests refused by the order's status"
    );
    metrics::describe_counter!(
        "order_not_modified_total",
        "Conditional reads answered with 304"
    );
}

/// GET /metrics — returns Prometheus-formatted metrics.
pub async fn get(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        handle.render(),
    )
}
