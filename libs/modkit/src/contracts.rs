//! Capability traits a module implements to take part in the lifecycle phases.
//!
//! A module always implements [`Module`]; the rest are opt-in and are
//! registered separately with the [`RegistryBuilder`](crate::RegistryBuilder).

use async_trait::async_trait;
use axum::Router;
use tokio_util::sync::CancellationToken;

use crate::context::ModuleCtx;
pub use crate::api::openapi::OpenApiRegistry;

/// Wiring phase. The schema may not be migrated yet.
#[async_trait]
pub trait Module: Send + Sync + 'static {
    async fn init(&self, ctx: &ModuleCtx) -> anyhow::Result<()>;
}

/// Schema owner. `migrate` runs after every `init` and before routes are built.
#[async_trait]
pub trait DbModule: Send + Sync {
    async fn migrate(&self, db: &modkit_db::DbHandle) -> anyhow::Result<()>;
}

/// Contributes routes. Synchronous; runs once migrations are done.
pub trait RestfulModule: Send + Sync {
    /// Attach the module's routes and merge its OpenAPI fragment into `openapi`.
    fn register_rest(
        &self,
        ctx: &ModuleCtx,
        router: Router,
        openapi: &dyn OpenApiRegistry,
    ) -> anyhow::Result<Router>;
}

/// Owns the HTTP listener. Exactly one per registry.
///
/// The host shapes the router around every [`RestfulModule`] but never binds
/// a socket here; that happens in its [`StatefulModule::start`].
pub trait RestHostModule: Send + Sync + 'static {
    /// Base routes (such as `/health`) added before any module routes.
    fn rest_prepare(&self, ctx: &ModuleCtx, router: Router) -> anyhow::Result<Router>;

    /// Add `/openapi.json`, the fallback and the middleware stack, then keep
    /// the finished router for the start phase.
    fn rest_finalize(&self, ctx: &ModuleCtx, router: Router) -> anyhow::Result<Router>;

    fn as_registry(&self) -> &dyn OpenApiRegistry;
}

/// Background lifecycle. `stop` runs in reverse registration order.
#[async_trait]
pub trait StatefulModule: Send + Sync {
    async fn start(&self, cancel: CancellationToken) -> anyhow::Result<()>;
    async fn stop(&self, cancel: CancellationToken) -> anyhow::Result<()>;
}
