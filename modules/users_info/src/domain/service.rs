use std::sync::Arc;

use chrono::{DateTime, Duration, SubsecRound, Utc};
use tracing::{debug, error, info, instrument};

use crate::contract::model::{NewUser, User, UserPatch};
use crate::domain::error::DomainError;
use crate::domain::events::UserDomainEvent;
use crate::domain::ports::EventPublisher;
use crate::domain::repo::{RepoError, UserDraft, UsersRepository};

/// Domain service with business rules for user management.
/// Depends only on the repository and event ports, not on infra types.
#[derive(Clone)]
pub struct Service {
    repo: Arc<dyn UsersRepository>,
    events: Arc<dyn EventPublisher<UserDomainEvent>>,
}

impl Service {
    /// Create a service with dependencies.
    pub fn new(
        repo: Arc<dyn UsersRepository>,
        events: Arc<dyn EventPublisher<UserDomainEvent>>,
    ) -> Self {
        Self { repo, events }
    }

    #[instrument(name = "users_info.service.get_user", skip(self), fields(user_id = id))]
    pub async fn get_user(&self, id: i64) -> Result<User, DomainError> {
        debug!("Getting user by id");

        let user = self
            .repo
            .find_by_id(id)
            .await
            .map_err(|e| repo_failure(e, id))?
            .ok_or_else(|| DomainError::user_not_found(id))?;
        debug!("Successfully retrieved user");
        Ok(user)
    }

    /// All users, highest id first. Unbounded.
    #[instrument(name = "users_info.service.list_users", skip(self))]
    pub async fn list_users(&self) -> Result<Vec<User>, DomainError> {
        debug!("Listing users");

        let users = self.repo.list_all().await.map_err(|e| repo_failure(e, 0))?;

        debug!("Successfully listed {} users", users.len());
        Ok(users)
    }

    #[instrument(
        name = "users_info.service.create_user",
        skip(self, new_user),
        fields(email = %new_user.email())
    )]
    pub async fn create_user(&self, new_user: NewUser) -> Result<User, DomainError> {
        info!("Creating new user");

        // Friendly pre-check; the unique index still arbitrates races below.
        if self
            .repo
            .find_by_email(new_user.email())
            .await
            .map_err(|e| repo_failure(e, 0))?
            .is_some()
        {
            return Err(DomainError::email_already_exists(new_user.email()));
        }

        let (name, email) = new_user.into_parts();
        let now = now_micros();
        let draft = UserDraft {
            name,
            email: email.clone(),
            created_at: now,
            updated_at: now,
        };

        let user = self.repo.insert(draft).await.map_err(|e| match e {
            RepoError::UniqueViolation(_) => DomainError::email_already_exists(email),
            other => repo_failure(other, 0),
        })?;

        // Publish domain event
        self.events.publish(&UserDomainEvent::Created {
            id: user.id,
            at: user.created_at,
        });

        info!(user_id = user.id, "Successfully created user");
        Ok(user)
    }

    #[instrument(
        name = "users_info.service.update_user",
        skip(self, patch),
        fields(user_id = id)
    )]
    pub async fn update_user(&self, id: i64, patch: UserPatch) -> Result<User, DomainError> {
        info!("Updating user");

        // Load current
        let mut current = self
            .repo
            .find_by_id(id)
            .await
            .map_err(|e| repo_failure(e, id))?
            .ok_or_else(|| DomainError::user_not_found(id))?;

        // Uniqueness for email change; keeping one's own email is fine
        if let Some(new_email) = patch.email() {
            if new_email != current.email {
                let owner = self
                    .repo
                    .find_by_email(new_email)
                    .await
                    .map_err(|e| repo_failure(e, id))?;
                if owner.is_some_and(|u| u.id != id) {
                    return Err(DomainError::email_already_exists(new_email));
                }
            }
        }

        // Apply patch
        if let Some(name) = patch.name() {
            current.name = name.to_owned();
        }
        if let Some(email) = patch.email() {
            current.email = email.to_owned();
        }
        current.updated_at = next_updated_at(current.updated_at);

        // Persist
        let email = current.email.clone();
        let updated = self.repo.update(current).await.map_err(|e| match e {
            RepoError::UniqueViolation(_) => DomainError::email_already_exists(email),
            RepoError::NotFound => DomainError::user_not_found(id),
            other => repo_failure(other, id),
        })?;

        // Publish domain event
        self.events.publish(&UserDomainEvent::Updated {
            id: updated.id,
            at: updated.updated_at,
        });

        info!("Successfully updated user");
        Ok(updated)
    }

    /// Hard delete. Deleting an id that does not exist is `UserNotFound`,
    /// including a repeated delete of the same id.
    #[instrument(
        name = "users_info.service.delete_user",
        skip(self),
        fields(user_id = id)
    )]
    pub async fn delete_user(&self, id: i64) -> Result<(), DomainError> {
        info!("Deleting user");

        let deleted = self
            .repo
            .delete(id)
            .await
            .map_err(|e| repo_failure(e, id))?;

        if !deleted {
            return Err(DomainError::user_not_found(id));
        }

        // Publish domain event
        self.events.publish(&UserDomainEvent::Deleted {
            id,
            at: now_micros(),
        });

        info!("Successfully deleted user");
        Ok(())
    }
}

/// Storage never leaks past the service: log the cause, keep the message internal.
fn repo_failure(e: RepoError, id: i64) -> DomainError {
    match e {
        RepoError::NotFound => DomainError::user_not_found(id),
        other => {
            error!(error = %other, "Repository call failed");
            DomainError::database(other.to_string())
        }
    }
}

/// Wall clock truncated to what every backend stores losslessly.
fn now_micros() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// `updated_at` strictly advances, even if the clock stalls or steps back.
fn next_updated_at(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = now_micros();
    let floor = previous + Duration::microseconds(1);
    if now < floor {
        floor
    } else {
        now
    }
}
