//! HTTP ingress: owns the listener, the global middleware stack and the
//! merged OpenAPI document. Other modules only contribute routes.

use async_trait::async_trait;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use axum::{routing::get, Router};
use modkit::{OpenApiCollector, OpenApiRegistry};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

mod config;
pub mod request_id;
pub mod web;

pub use config::ApiIngressConfig;

/// Module name used for registration and for its config section.
pub const MODULE_NAME: &str = "api_ingress";

const STOP_TIMEOUT: Duration = Duration::from_secs(30);

/// Main API Ingress module: the REST host. Collects module routes and
/// OpenAPI fragments during the REST phase and serves them from `start`.
pub struct ApiIngress {
    config: ArcSwap<ApiIngressConfig>,
    openapi: OpenApiCollector,
    // Finalized router from the REST phase, taken by `start`
    final_router: Mutex<Option<Router>>,
    server: Mutex<Option<ServerHandle>>,
    local_addr: Mutex<Option<SocketAddr>>,
}

struct ServerHandle {
    cancel: CancellationToken,
    task: JoinHandle<anyhow::Result<()>>,
}

impl Default for ApiIngress {
    fn default() -> Self {
        Self::new(ApiIngressConfig::default())
    }
}

impl ApiIngress {
    pub fn new(config: ApiIngressConfig) -> Self {
        Self {
            config: ArcSwap::from_pointee(config),
            openapi: OpenApiCollector::new("Userstore API", env!("CARGO_PKG_VERSION")),
            final_router: Mutex::new(None),
            server: Mutex::new(None),
            local_addr: Mutex::new(None),
        }
    }

    /// Get the current configuration (cheap clone from ArcSwap)
    pub fn get_config(&self) -> ApiIngressConfig {
        (**self.config.load()).clone()
    }

    /// Address the server is listening on, once started.
    /// Useful with `bind_addr: 127.0.0.1:0`.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.lock()
    }

    /// Merged OpenAPI document of all registered modules.
    pub fn openapi_document(&self) -> utoipa::openapi::OpenApi {
        self.openapi.document()
    }
}

#[async_trait]
impl modkit::Module for ApiIngress {
    async fn init(&self, ctx: &modkit::ModuleCtx) -> anyhow::Result<()> {
        let cfg = ctx.module_config::<ApiIngressConfig>();
        tracing::debug!(bind_addr = %cfg.bind_addr, enable_docs = cfg.enable_docs, "api_ingress configured");
        self.config.store(Arc::new(cfg));
        Ok(())
    }
}

// REST host role: prepare/finalize the router, but do not start the server here.
impl modkit::contracts::RestHostModule for ApiIngress {
    fn rest_prepare(
        &self,
        _ctx: &modkit::ModuleCtx,
        router: Router,
    ) -> anyhow::Result<Router> {
        tracing::debug!("REST host prepared base router with health check");
        Ok(router.route("/health", get(web::health_check)))
    }

    fn rest_finalize(&self, _ctx: &modkit::ModuleCtx, mut router: Router) -> anyhow::Result<Router> {
        let config = self.get_config();

        if config.enable_docs {
            // Build once, serve as static JSON (no per-request serialization)
            let doc = Arc::new(serde_json::to_value(self.openapi.document())?);
            tracing::info!(
                paths = doc["paths"].as_object().map_or(0, |p| p.len()),
                "Serving OpenAPI document at /openapi.json"
            );
            router = router.route(
                "/openapi.json",
                get(move || {
                    let doc = doc.clone();
                    async move { axum::Json((*doc).clone()) }
                }),
            );
        }

        let router = web::with_middleware(router.fallback(web::route_not_found), &config);

        // Keep the finalized router for `start`
        *self.final_router.lock() = Some(router.clone());
        tracing::debug!("REST host finalized router");
        Ok(router)
    }

    fn as_registry(&self) -> &dyn OpenApiRegistry {
        &self.openapi
    }
}

#[async_trait]
impl modkit::contracts::StatefulModule for ApiIngress {
    /// Bind the listener and serve in the background until `cancel` fires.
    async fn start(&self, cancel: CancellationToken) -> anyhow::Result<()> {
        let cfg = self.get_config();
        let addr: SocketAddr = cfg
            .bind_addr
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid bind address '{}': {}", cfg.bind_addr, e))?;

        let router = match self.final_router.lock().take() {
            Some(r) => r,
            None => {
                tracing::warn!("No router from REST phase; serving health check only");
                web::with_middleware(
                    Router::new()
                        .route("/health", get(web::health_check))
                        .fallback(web::route_not_found),
                    &cfg,
                )
            }
        };

        // Bind errors surface here, failing the start phase.
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind {addr}: {e}"))?;
        let bound = listener.local_addr()?;
        *self.local_addr.lock() = Some(bound);
        tracing::info!(%bound, "HTTP server listening");

        let server_cancel = cancel.child_token();
        let shutdown = {
            let c = server_cancel.clone();
            async move {
                c.cancelled().await;
                tracing::info!("HTTP server shutting down gracefully");
            }
        };
        let task = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown)
                .await
                .map_err(anyhow::Error::from)
        });

        *self.server.lock() = Some(ServerHandle {
            cancel: server_cancel,
            task,
        });
        Ok(())
    }

    async fn stop(&self, _cancel: CancellationToken) -> anyhow::Result<()> {
        let Some(handle) = self.server.lock().take() else {
            return Ok(());
        };
        handle.cancel.cancel();

        match tokio::time::timeout(STOP_TIMEOUT, handle.task).await {
            Ok(Ok(res)) => res,
            Ok(Err(join_err)) => Err(anyhow::anyhow!("HTTP server task failed: {join_err}")),
            Err(_) => Err(anyhow::anyhow!(
                "HTTP server did not stop within {}s",
                STOP_TIMEOUT.as_secs()
            )),
        }
    }
}
