use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path,
    },
    http::{HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Json},
    Extension,
};
use serde_json::Value;
use tracing::{error, info, warn};

use crate::api::rest::dto::{CreateUserReq, DeletedUserDto, UpdateUserReq, UserDto, UserEvent};
use crate::api::rest::error::{from_parts, map_domain_error, validation_problem};
use crate::contract::model::{NewUser, UserPatch, ValidationErrors};
use crate::domain::service::Service;
use modkit::{Problem, ProblemResponse, SseBroadcaster};

/// Name of the SSE `event:` field on `/users/events`.
pub const USERS_EVENTS: &str = "users_events";

fn request_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}

/// `{id}` must be a positive integer.
fn user_id(
    path: Result<Path<i64>, PathRejection>,
    uri: &Uri,
    headers: &HeaderMap,
) -> Result<i64, ProblemResponse> {
    match path {
        Ok(Path(id)) if id > 0 => Ok(id),
        _ => Err(from_parts(
            StatusCode::BAD_REQUEST,
            "USERS_INVALID_ID",
            "Invalid user id",
            "User id must be a positive integer",
            uri.path(),
            request_id(headers),
        )),
    }
}

/// The body is taken untyped so that wrong field types are reported per field
/// by the `TryFrom<&Value>` conversions. Unparsable JSON points at the root.
fn body(
    payload: Result<Json<Value>, JsonRejection>,
    uri: &Uri,
    headers: &HeaderMap,
) -> Result<Value, ProblemResponse> {
    payload.map(|Json(v)| v).map_err(|rejection| {
        warn!(error = %rejection, "Rejected request body");
        let mut errors = ValidationErrors::default();
        errors.push("", rejection.body_text());
        validation_problem(&errors, uri.path(), request_id(headers))
    })
}

/// List all users, newest first
#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    operation_id = "users_info.list_users",
    responses(
        (status = 200, description = "All users ordered by id descending", body = [UserDto]),
        (status = 500, description = "Internal Server Error", body = Problem, content_type = "application/problem+json")
    )
)]
pub async fn list_users(
    Extension(svc): Extension<Arc<Service>>,
    uri: Uri,
    headers: HeaderMap,
) -> Result<Json<Vec<UserDto>>, ProblemResponse> {
    info!("Listing users");

    match svc.list_users().await {
        Ok(users) => Ok(Json(users.into_iter().map(UserDto::from).collect())),
        Err(e) => {
            error!("Failed to list users: {}", e);
            Err(map_domain_error(&e, uri.path(), request_id(&headers)))
        }
    }
}

/// Get a specific user by ID
#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "users",
    operation_id = "users_info.get_user",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "User found", body = UserDto),
        (status = 400, description = "Bad Request", body = Problem, content_type = "application/problem+json"),
        (status = 404, description = "Not Found", body = Problem, content_type = "application/problem+json")
    )
)]
pub async fn get_user(
    Extension(svc): Extension<Arc<Service>>,
    uri: Uri,
    headers: HeaderMap,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<UserDto>, ProblemResponse> {
    let id = user_id(path, &uri, &headers)?;
    info!("Getting user with id: {}", id);

    match svc.get_user(id).await {
        Ok(user) => Ok(Json(UserDto::from(user))),
        Err(e) => {
            error!("Failed to get user {}: {}", id, e);
            Err(map_domain_error(&e, uri.path(), request_id(&headers)))
        }
    }
}

/// Create a new user
#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    operation_id = "users_info.create_user",
    request_body = CreateUserReq,
    responses(
        (status = 201, description = "Created user", body = UserDto),
        (status = 400, description = "Validation error", body = Problem, content_type = "application/problem+json"),
        (status = 409, description = "Email already in use", body = Problem, content_type = "application/problem+json"),
        (status = 500, description = "Internal Server Error", body = Problem, content_type = "application/problem+json")
    )
)]
pub async fn create_user(
    Extension(svc): Extension<Arc<Service>>,
    uri: Uri,
    headers: HeaderMap,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<UserDto>), ProblemResponse> {
    let req = body(payload, &uri, &headers)?;
    info!("Creating user");

    // Validation happens before the service (and the store) is touched
    let new_user = NewUser::try_from(&req)
        .map_err(|errors| validation_problem(&errors, uri.path(), request_id(&headers)))?;

    match svc.create_user(new_user).await {
        Ok(user) => Ok((StatusCode::CREATED, Json(UserDto::from(user)))),
        Err(e) => {
            error!("Failed to create user: {}", e);
            Err(map_domain_error(&e, uri.path(), request_id(&headers)))
        }
    }
}

/// Update an existing user
#[utoipa::path(
    put,
    path = "/users/{id}",
    tag = "users",
    operation_id = "users_info.update_user",
    params(("id" = i64, Path, description = "User id")),
    request_body = UpdateUserReq,
    responses(
        (status = 200, description = "Updated user", body = UserDto),
        (status = 400, description = "Validation error or bad id", body = Problem, content_type = "application/problem+json"),
        (status = 404, description = "Not Found", body = Problem, content_type = "application/problem+json"),
        (status = 409, description = "Email already in use", body = Problem, content_type = "application/problem+json")
    )
)]
pub async fn update_user(
    Extension(svc): Extension<Arc<Service>>,
    uri: Uri,
    headers: HeaderMap,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<UserDto>, ProblemResponse> {
    let id = user_id(path, &uri, &headers)?;
    let req = body(payload, &uri, &headers)?;
    info!("Updating user {}", id);

    let patch = UserPatch::try_from(&req)
        .map_err(|errors| validation_problem(&errors, uri.path(), request_id(&headers)))?;

    match svc.update_user(id, patch).await {
        Ok(user) => Ok(Json(UserDto::from(user))),
        Err(e) => {
            error!("Failed to update user {}: {}", id, e);
            Err(map_domain_error(&e, uri.path(), request_id(&headers)))
        }
    }
}

/// Delete a user by ID
#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "users",
    operation_id = "users_info.delete_user",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "User deleted", body = DeletedUserDto),
        (status = 400, description = "Bad Request", body = Problem, content_type = "application/problem+json"),
        (status = 404, description = "Not Found", body = Problem, content_type = "application/problem+json")
    )
)]
pub async fn delete_user(
    Extension(svc): Extension<Arc<Service>>,
    uri: Uri,
    headers: HeaderMap,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<DeletedUserDto>, ProblemResponse> {
    let id = user_id(path, &uri, &headers)?;
    info!("Deleting user: {}", id);

    match svc.delete_user(id).await {
        Ok(()) => Ok(Json(DeletedUserDto { id, deleted: true })),
        Err(e) => {
            error!("Failed to delete user {}: {}", id, e);
            Err(map_domain_error(&e, uri.path(), request_id(&headers)))
        }
    }
}

/// SSE endpoint returning a live stream of `UserEvent`.
#[utoipa::path(
    get,
    path = "/users/events",
    tag = "users",
    operation_id = "users_info.events",
    responses(
        (status = 200, description = "SSE stream of UserEvent", body = UserEvent, content_type = "text/event-stream")
    )
)]
pub async fn users_events(
    Extension(sse): Extension<SseBroadcaster<UserEvent>>,
) -> impl IntoResponse {
    info!("New SSE connection for user events");
    sse.sse_response_named(USERS_EVENTS)
}
