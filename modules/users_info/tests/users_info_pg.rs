#![cfg(feature = "integration")]

mod common;

use std::sync::Arc;

use anyhow::Result;
use sea_orm_migration::MigratorTrait;

use users_info::{
    contract::model::{NewUser, UserPatch},
    domain::{error::DomainError, ports::NoopPublisher, service::Service},
    infra::storage::{migrations::Migrator, SeaOrmUsersRepository},
};

#[tokio::test]
async fn users_info_works_with_postgres() -> Result<()> {
    let dut = common::bring_up_postgres().await?;

    // Connect via modkit-db
    let db = modkit_db::DbHandle::connect(&dut.url, modkit_db::ConnectOpts::default()).await?;

    // Apply migrations using SeaORM migrator
    Migrator::up(db.seaorm(), None)
        .await
        .map_err(|e| anyhow::anyhow!("Migration failed: {}", e))?;

    let repo = SeaOrmUsersRepository::new(db.sea());
    let service = Service::new(Arc::new(repo), Arc::new(NoopPublisher));

    let ada = service
        .create_user(NewUser::parse(
            Some("Ada".into()),
            Some("ada@example.com".into()),
        )?)
        .await?;
    assert_eq!(ada.created_at, ada.updated_at);
    assert_eq!(service.get_user(ada.id).await?, ada);

    // Unique index arbitration surfaces as a conflict
    let err = service
        .create_user(NewUser::parse(
            Some("Other".into()),
            Some("ADA@example.com".into()),
        )?)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::EmailAlreadyExists { .. }));

    let updated = service
        .update_user(ada.id, UserPatch::parse(Some("Ada L.".into()), None)?)
        .await?;
    assert_eq!(updated.email, "ada@example.com");
    assert!(updated.updated_at > ada.updated_at);
    assert_eq!(service.get_user(ada.id).await?, updated);

    let grace = service
        .create_user(NewUser::parse(
            Some("Grace".into()),
            Some("grace@example.com".into()),
        )?)
        .await?;
    let ids: Vec<i64> = service.list_users().await?.iter().map(|u| u.id).collect();
    assert_eq!(ids, vec![grace.id, ada.id]);

    service.delete_user(ada.id).await?;
    assert!(matches!(
        service.delete_user(ada.id).await.unwrap_err(),
        DomainError::UserNotFound { .. }
    ));

    db.close().await;
    Ok(())
}
