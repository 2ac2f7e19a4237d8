use chrono::{DateTime, Utc};
use std::fmt;

use super::validation;

/// Pure user model for inter-module communication (no serde/utoipa)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated data for creating a new user.
///
/// Only obtainable through [`NewUser::parse`], so a value of this type always
/// carries a non-blank name of at most 100 characters and a normalized,
/// syntactically valid email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    name: String,
    email: String,
}

impl NewUser {
    /// Validate raw input; every failing field is reported, not just the first.
    pub fn parse(name: Option<String>, email: Option<String>) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::default();
        let name = validation::required_name(name, &mut errors);
        let email = validation::required_email(email, &mut errors);

        match (name, email) {
            (Some(name), Some(email)) if errors.is_empty() => Ok(Self { name, email }),
            _ => Err(errors),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub(crate) fn into_parts(self) -> (String, String) {
        (self.name, self.email)
    }
}

/// Validated partial update. Absent fields keep their stored values.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserPatch {
    name: Option<String>,
    email: Option<String>,
}

impl UserPatch {
    /// Same per-field rules as [`NewUser::parse`], but both fields are optional.
    pub fn parse(name: Option<String>, email: Option<String>) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::default();
        let name = name.and_then(|n| validation::required_name(Some(n), &mut errors));
        let email = email.and_then(|e| validation::required_email(Some(e), &mut errors));

        if errors.is_empty() {
            Ok(Self { name, email })
        } else {
            Err(errors)
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none()
    }
}

/// One failing input field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: &'static str,
    pub message: String,
}

/// All violations found while validating one payload, in field order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationErrors {
    pub violations: Vec<FieldViolation>,
}

impl ValidationErrors {
    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.violations.push(FieldViolation {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Names of the failing fields, in the order they were checked.
    pub fn fields(&self) -> Vec<&'static str> {
        self.violations.iter().map(|v| v.field).collect()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for v in &self.violations {
            if !first {
                f.write_str("; ")?;
            }
            f.write_str(&v.message)?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}
