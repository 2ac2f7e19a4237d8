use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::contract::model::User;

/// Row to insert; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDraft {
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Storage failures the domain distinguishes.
#[derive(Debug, Error)]
pub enum RepoError {
    /// The unique index on email rejected the write.
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    /// The targeted row does not exist (anymore).
    #[error("record not found")]
    NotFound,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Port for the domain layer: persistence operations the domain needs.
/// Object-safe and async-friendly via `async_trait`.
#[async_trait]
pub trait UsersRepository: Send + Sync {
    /// Load a user by id.
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, RepoError>;
    /// Load a user by (normalized) email.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;
    /// Insert a validated user and return it with its store-assigned id.
    async fn insert(&self, draft: UserDraft) -> Result<User, RepoError>;
    /// Overwrite name/email/updated_at of the row `u.id`.
    /// Fails with `NotFound` if the row vanished since it was loaded.
    async fn update(&self, u: User) -> Result<User, RepoError>;
    /// Delete by id. Returns true if a row was deleted.
    async fn delete(&self, id: i64) -> Result<bool, RepoError>;
    /// Every user, ordered by id descending.
    async fn list_all(&self) -> Result<Vec<User>, RepoError>;
}
