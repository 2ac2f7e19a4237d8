//! SeaORM-backed repository implementation for the domain port.
//!
//! This struct is generic over `C: ConnectionTrait`, so you can construct it
//! with a `DatabaseConnection` **or** a transactional connection.

use anyhow::Context;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, NotSet, QueryFilter,
    QueryOrder, Set, SqlErr,
};

use crate::contract::model::User;
use crate::domain::repo::{RepoError, UserDraft, UsersRepository};
use crate::infra::storage::entity::{ActiveModel as UserAM, Column, Entity as UserEntity};

/// SeaORM repository impl.
/// Holds a connection object; its lifetime/ownership is up to the caller.
pub struct SeaOrmUsersRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    conn: C,
}

impl<C> SeaOrmUsersRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    pub fn new(conn: C) -> Self {
        Self { conn }
    }
}

/// Classify write errors the domain reacts to; everything else stays opaque.
fn classify(e: DbErr, what: &'static str) -> RepoError {
    if matches!(e, DbErr::RecordNotUpdated | DbErr::RecordNotFound(_)) {
        return RepoError::NotFound;
    }
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(msg)) => RepoError::UniqueViolation(msg),
        _ => RepoError::Other(anyhow::Error::new(e).context(what)),
    }
}

#[async_trait::async_trait]
impl<C> UsersRepository for SeaOrmUsersRepository<C>
where
    C: ConnectionTrait + Send + Sync + 'static,
{
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, RepoError> {
        let found = UserEntity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("find_by_id failed")?;
        Ok(found.map(Into::into))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let found = UserEntity::find()
            .filter(Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("find_by_email failed")?;
        Ok(found.map(Into::into))
    }

    async fn insert(&self, draft: UserDraft) -> Result<User, RepoError> {
        let m = UserAM {
            id: NotSet,
            name: Set(draft.name),
            email: Set(draft.email),
            created_at: Set(draft.created_at),
            updated_at: Set(draft.updated_at),
        };
        let saved = m
            .insert(&self.conn)
            .await
            .map_err(|e| classify(e, "insert failed"))?;
        Ok(saved.into())
    }

    async fn update(&self, u: User) -> Result<User, RepoError> {
        // created_at is immutable: leave it out of the UPDATE
        let m = UserAM {
            id: Set(u.id),
            name: Set(u.name),
            email: Set(u.email),
            created_at: NotSet,
            updated_at: Set(u.updated_at),
        };
        let saved = m
            .update(&self.conn)
            .await
            .map_err(|e| classify(e, "update failed"))?;
        Ok(saved.into())
    }

    async fn delete(&self, id: i64) -> Result<bool, RepoError> {
        let res = UserEntity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("delete failed")?;
        Ok(res.rows_affected > 0)
    }

    async fn list_all(&self) -> Result<Vec<User>, RepoError> {
        let rows = UserEntity::find()
            .order_by_desc(Column::Id)
            .all(&self.conn)
            .await
            .context("list_all failed")?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}
