use std::time::Duration;

use axum::{
    http::{StatusCode, Uri},
    middleware::from_fn,
    response::{IntoResponse, Json},
    Router,
};
use modkit::Problem;
use serde_json::{json, Value};
use tower_http::{
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
};

use crate::config::ApiIngressConfig;
use crate::request_id;

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Fallback for unknown routes, rendered as a Problem like every other error.
pub async fn route_not_found(uri: Uri) -> impl IntoResponse {
    modkit::ProblemResponse(
        Problem::new(
            StatusCode::NOT_FOUND,
            "Not Found",
            format!("No route for {}", uri.path()),
        )
        .with_code("ROUTE_NOT_FOUND")
        .with_instance(uri.path()),
    )
}

/// Wrap `router` in the global middleware stack.
///
/// Outermost to innermost: SetRequestId → PropagateRequestId → Trace →
/// push request id to extensions/span → Timeout → CORS (optional) → BodyLimit.
/// `Router::layer` wraps what is already there, so layers are added innermost first.
pub fn with_middleware(mut router: Router, config: &ApiIngressConfig) -> Router {
    let x_request_id = request_id::header();

    router = router.layer(RequestBodyLimitLayer::new(config.body_limit_bytes));

    if config.cors_enabled {
        router = router.layer(CorsLayer::permissive());
    }

    router = router
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.request_timeout_secs),
        ))
        .layer(from_fn(request_id::push_req_id_to_extensions))
        .layer(request_id::create_trace_layer())
        .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
        .layer(SetRequestIdLayer::new(x_request_id, request_id::MakeReqId));

    router
}
