use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::contract::model::{NewUser, User, UserPatch, ValidationErrors};
use crate::domain::events::UserDomainEvent;

/// REST DTO for user representation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(title = "User")]
pub struct UserDto {
    #[schema(minimum = 1, example = 1)]
    pub id: i64,
    #[schema(example = "Ada")]
    pub name: String,
    #[schema(example = "ada@example.com")]
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// REST DTO for creating a new user. Fields are optional at the wire level
/// so that missing ones are reported as validation errors.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CreateUserReq {
    #[schema(max_length = 100, example = "Ada")]
    pub name: Option<String>,
    #[schema(example = "ada@example.com")]
    pub email: Option<String>,
}

/// REST DTO for updating a user (partial)
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateUserReq {
    #[schema(max_length = 100)]
    pub name: Option<String>,
    pub email: Option<String>,
}

/// Confirmation returned by DELETE
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DeletedUserDto {
    pub id: i64,
    pub deleted: bool,
}

// Conversion implementations between REST DTOs and contract models

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

impl TryFrom<CreateUserReq> for NewUser {
    type Error = ValidationErrors;

    fn try_from(req: CreateUserReq) -> Result<Self, Self::Error> {
        NewUser::parse(req.name, req.email)
    }
}

impl TryFrom<UpdateUserReq> for UserPatch {
    type Error = ValidationErrors;

    fn try_from(req: UpdateUserReq) -> Result<Self, Self::Error> {
        UserPatch::parse(req.name, req.email)
    }
}

/// Fields every user payload may carry, in reporting order.
const USER_FIELDS: [&str; 2] = ["name", "email"];

/// Read `field` from an untyped body. `null` and absence are both `None`;
/// any other non-string value is recorded in `type_errors`.
fn string_field(body: &Value, field: &'static str, type_errors: &mut ValidationErrors) -> Option<String> {
    match body.get(field) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => {
            type_errors.push(field, format!("{field} must be a string"));
            None
        }
    }
}

/// Per field, a type error replaces whatever the field rules said about it.
fn combine(type_errors: ValidationErrors, rule_errors: ValidationErrors) -> ValidationErrors {
    let mut out = ValidationErrors::default();
    for field in USER_FIELDS {
        let source = if type_errors.fields().contains(&field) {
            &type_errors
        } else {
            &rule_errors
        };
        out.violations.extend(
            source
                .violations
                .iter()
                .filter(|v| v.field == field)
                .cloned(),
        );
    }
    out
}

fn object_body(body: &Value) -> Result<&Value, ValidationErrors> {
    if body.is_object() {
        Ok(body)
    } else {
        let mut errors = ValidationErrors::default();
        errors.push("", "request body must be a JSON object");
        Err(errors)
    }
}

impl TryFrom<&Value> for NewUser {
    type Error = ValidationErrors;

    /// Validate a raw create body, reporting type and rule violations together.
    fn try_from(body: &Value) -> Result<Self, Self::Error> {
        let body = object_body(body)?;
        let mut type_errors = ValidationErrors::default();
        let req = CreateUserReq {
            name: string_field(body, "name", &mut type_errors),
            email: string_field(body, "email", &mut type_errors),
        };
        match NewUser::try_from(req) {
            Ok(user) if type_errors.is_empty() => Ok(user),
            Ok(_) => Err(type_errors),
            Err(rule_errors) => Err(combine(type_errors, rule_errors)),
        }
    }
}

impl TryFrom<&Value> for UserPatch {
    type Error = ValidationErrors;

    fn try_from(body: &Value) -> Result<Self, Self::Error> {
        let body = object_body(body)?;
        let mut type_errors = ValidationErrors::default();
        let req = UpdateUserReq {
            name: string_field(body, "name", &mut type_errors),
            email: string_field(body, "email", &mut type_errors),
        };
        match UserPatch::try_from(req) {
            Ok(patch) if type_errors.is_empty() => Ok(patch),
            Ok(_) => Err(type_errors),
            Err(rule_errors) => Err(combine(type_errors, rule_errors)),
        }
    }
}

/// Transport-level SSE payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[schema(title = "UserEvent", description = "Server-sent user event")]
pub struct UserEvent {
    /// `created`, `updated` or `deleted`
    pub kind: String,
    pub id: i64,
    pub at: DateTime<Utc>,
}

impl From<&UserDomainEvent> for UserEvent {
    fn from(e: &UserDomainEvent) -> Self {
        use UserDomainEvent::*;
        let (kind, id, at) = match e {
            Created { id, at } => ("created", id, at),
            Updated { id, at } => ("updated", id, at),
            Deleted { id, at } => ("deleted", id, at),
        };
        Self {
            kind: kind.into(),
            id: *id,
            at: *at,
        }
    }
}
