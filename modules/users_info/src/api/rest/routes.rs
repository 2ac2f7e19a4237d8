use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use modkit::{OpenApiRegistry, SseBroadcaster};
use utoipa::OpenApi;

use crate::api::rest::{dto, handlers, openapi::UsersApi};
use crate::domain::service::Service;

/// Attach the CRUD routes and merge their OpenAPI fragment into `openapi`.
pub fn register_routes(
    router: Router,
    openapi: &dyn OpenApiRegistry,
    service: Arc<Service>,
) -> anyhow::Result<Router> {
    openapi.merge_fragment(UsersApi::openapi());

    let users = Router::new()
        .route(
            "/users",
            get(handlers::list_users).post(handlers::create_user),
        )
        .route(
            "/users/{id}",
            get(handlers::get_user)
                .put(handlers::update_user)
                .delete(handlers::delete_user),
        )
        .layer(Extension(service));

    Ok(router.merge(users))
}

/// Register SSE route for user events. The broadcaster is injected per-route via `Extension`.
pub fn register_users_sse_route(
    router: Router,
    sse: SseBroadcaster<dto::UserEvent>,
) -> Router {
    let events = Router::new()
        .route("/users/events", get(handlers::users_events))
        .layer(Extension(sse));

    router.merge(events)
}
