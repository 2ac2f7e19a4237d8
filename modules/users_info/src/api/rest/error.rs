use axum::http::StatusCode;
use modkit::{Problem, ProblemResponse, ValidationError};

use crate::contract::model::ValidationErrors;
use crate::domain::error::DomainError;

/// Helper to create a ProblemResponse with less boilerplate
pub fn from_parts(
    status: StatusCode,
    code: &str,
    title: &str,
    detail: impl Into<String>,
    instance: &str,
    request_id: Option<String>,
) -> ProblemResponse {
    let problem = Problem::new(status, title, detail)
        .with_type(format!("https://errors.userstore.dev/{code}"))
        .with_code(code)
        .with_instance(instance)
        .with_request_id_opt(request_id);

    ProblemResponse(problem)
}

/// 400 with one `errors[]` entry per failing field.
pub fn validation_problem(
    errors: &ValidationErrors,
    instance: &str,
    request_id: Option<String>,
) -> ProblemResponse {
    let fields = errors
        .violations
        .iter()
        .map(|v| ValidationError {
            // An empty field is the body itself, the JSON Pointer root.
            pointer: if v.field.is_empty() {
                String::new()
            } else {
                format!("/{}", v.field)
            },
            detail: v.message.clone(),
        })
        .collect();

    let ProblemResponse(problem) = from_parts(
        StatusCode::BAD_REQUEST,
        "USERS_VALIDATION",
        "Validation error",
        errors.to_string(),
        instance,
        request_id,
    );
    ProblemResponse(problem.with_errors(fields))
}

/// Map domain error to RFC9457 ProblemResponse
pub fn map_domain_error(
    e: &DomainError,
    instance: &str,
    request_id: Option<String>,
) -> ProblemResponse {
    match e {
        DomainError::UserNotFound { id } => from_parts(
            StatusCode::NOT_FOUND,
            "USERS_NOT_FOUND",
            "User not found",
            format!("User with id {id} was not found"),
            instance,
            request_id,
        ),
        DomainError::EmailAlreadyExists { email } => from_parts(
            StatusCode::CONFLICT,
            "USERS_EMAIL_CONFLICT",
            "Email already exists",
            format!("Email '{email}' is already in use"),
            instance,
            request_id,
        ),
        DomainError::Database { .. } => {
            // Log the internal error details but don't expose them to the client
            tracing::error!(error = ?e, "Database error occurred");
            from_parts(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_DB",
                "Internal error",
                "An internal database error occurred",
                instance,
                request_id,
            )
        }
    }
}
