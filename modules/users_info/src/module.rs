use std::sync::Arc;

use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use modkit::{DbModule, Module, ModuleCtx, OpenApiRegistry, RestfulModule, SseBroadcaster};
use sea_orm_migration::MigratorTrait;
use tracing::{debug, info};

use crate::api::rest::{dto::UserEvent, routes, sse_adapter::SseUserEventPublisher};
use crate::config::UsersInfoConfig;
use crate::contract::client::UsersInfoApi;
use crate::domain::service::Service;
use crate::gateways::local::UsersInfoLocalClient;
use crate::infra::storage::{migrations::Migrator, SeaOrmUsersRepository};

/// Module name used for registration and for its config section.
pub const MODULE_NAME: &str = "users_info";

/// Everything `init` wires up; swapped in as one unit.
struct Wired {
    service: Arc<Service>,
    events: SseBroadcaster<UserEvent>,
}

/// The user record store: DB migrations, domain service and REST routes.
#[derive(Default)]
pub struct UsersInfo {
    // Read-mostly after init; ArcSwap keeps REST registration lock-free.
    wired: ArcSwapOption<Wired>,
}

impl UsersInfo {
    /// In-process client over the initialized service.
    pub fn client(&self) -> anyhow::Result<Arc<dyn UsersInfoApi>> {
        let wired = self.wired()?;
        Ok(Arc::new(UsersInfoLocalClient::new(wired.service.clone())))
    }

    fn wired(&self) -> anyhow::Result<Arc<Wired>> {
        self.wired
            .load_full()
            .ok_or_else(|| anyhow::anyhow!("users_info is not initialized"))
    }
}

#[async_trait]
impl Module for UsersInfo {
    async fn init(&self, ctx: &ModuleCtx) -> anyhow::Result<()> {
        info!("Initializing users_info module");

        // Load module configuration
        let cfg: UsersInfoConfig = ctx.module_config();
        debug!(events_capacity = cfg.events_capacity, "Loaded users_info config");

        // Acquire DB (SeaORM connection handle)
        let db = ctx.db_required()?;
        let repo = SeaOrmUsersRepository::new(db.sea());

        // Domain events go out over SSE
        let events = SseBroadcaster::<UserEvent>::new(cfg.events_capacity);
        let publisher = SseUserEventPublisher::new(events.clone());

        let service = Service::new(Arc::new(repo), Arc::new(publisher));
        self.wired.store(Some(Arc::new(Wired {
            service: Arc::new(service),
            events,
        })));

        info!("users_info module initialized");
        Ok(())
    }
}

#[async_trait]
impl DbModule for UsersInfo {
    async fn migrate(&self, db: &modkit_db::DbHandle) -> anyhow::Result<()> {
        info!("Running users_info database migrations");
        Migrator::up(db.seaorm(), None).await?;
        info!("Users database migrations completed successfully");
        Ok(())
    }
}

impl RestfulModule for UsersInfo {
    fn register_rest(
        &self,
        _ctx: &ModuleCtx,
        router: axum::Router,
        openapi: &dyn OpenApiRegistry,
    ) -> anyhow::Result<axum::Router> {
        info!("Registering users_info REST routes");

        let wired = self.wired()?;
        let router = routes::register_routes(router, openapi, wired.service.clone())?;
        let router = routes::register_users_sse_route(router, wired.events.clone());

        info!("Users REST routes registered successfully");
        Ok(router)
    }
}
