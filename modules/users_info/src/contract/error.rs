use thiserror::Error;

use crate::contract::model::ValidationErrors;

/// Errors that are safe to expose to other modules
#[derive(Error, Debug, Clone)]
pub enum UsersInfoError {
    #[error("User not found: {id}")]
    NotFound { id: i64 },

    #[error("User with email '{email}' already exists")]
    Conflict { email: String },

    #[error("Validation error: {errors}")]
    Validation { errors: ValidationErrors },

    #[error("Internal error")]
    Internal,
}

impl UsersInfoError {
    pub fn not_found(id: i64) -> Self {
        Self::NotFound { id }
    }

    pub fn conflict(email: String) -> Self {
        Self::Conflict { email }
    }

    pub fn validation(errors: ValidationErrors) -> Self {
        Self::Validation { errors }
    }

    pub fn internal() -> Self {
        Self::Internal
    }
}

impl From<crate::domain::error::DomainError> for UsersInfoError {
    fn from(domain_error: crate::domain::error::DomainError) -> Self {
        use crate::domain::error::DomainError::*;
        match domain_error {
            UserNotFound { id } => Self::not_found(id),
            EmailAlreadyExists { email } => Self::conflict(email),
            Database { .. } => Self::internal(),
        }
    }
}

impl From<ValidationErrors> for UsersInfoError {
    fn from(errors: ValidationErrors) -> Self {
        Self::validation(errors)
    }
}
