use modkit::{Problem, ValidationError};
use utoipa::OpenApi;

use crate::api::rest::{dto, handlers};

/// OpenAPI fragment for the users routes, merged into the host document.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::list_users,
        handlers::get_user,
        handlers::create_user,
        handlers::update_user,
        handlers::delete_user,
        handlers::users_events,
    ),
    components(schemas(
        dto::UserDto,
        dto::CreateUserReq,
        dto::UpdateUserReq,
        dto::DeletedUserDto,
        dto::UserEvent,
        Problem,
        ValidationError,
    )),
    tags((name = "users", description = "User records"))
)]
pub struct UsersApi;
