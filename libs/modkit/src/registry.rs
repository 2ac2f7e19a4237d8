use axum::Router;
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use thiserror::Error;

use crate::context;
use crate::contracts;

pub struct ModuleEntry {
    pub name: &'static str,
    pub core: Arc<dyn contracts::Module>,
    pub rest: Option<Arc<dyn contracts::RestfulModule>>,
    pub rest_host: Option<Arc<dyn contracts::RestHostModule>>,
    pub db: Option<Arc<dyn contracts::DbModule>>,
    pub stateful: Option<Arc<dyn contracts::StatefulModule>>,
}

impl std::fmt::Debug for ModuleEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleEntry")
            .field("name", &self.name)
            .field("has_rest", &self.rest.is_some())
            .field("is_rest_host", &self.rest_host.is_some())
            .field("has_db", &self.db.is_some())
            .field("has_stateful", &self.stateful.is_some())
            .finish()
    }
}

/// The final runtime registry; modules keep their registration order.
pub struct ModuleRegistry {
    modules: Vec<ModuleEntry>,
}

impl std::fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&'static str> = self.modules.iter().map(|m| m.name).collect();
        f.debug_struct("ModuleRegistry")
            .field("modules", &names)
            .finish()
    }
}

impl ModuleRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    pub fn modules(&self) -> &[ModuleEntry] {
        &self.modules
    }

    // ---- Ordered phases: init → DB → REST (sync) → start → stop ----

    pub async fn run_init_phase(&self, base_ctx: &context::ModuleCtx) -> Result<(), RegistryError> {
        for e in &self.modules {
            let ctx = base_ctx.clone().for_module(e.name);
            e.core
                .init(&ctx)
                .await
                .map_err(|source| RegistryError::Init {
                    module: e.name,
                    source,
                })?;
        }
        Ok(())
    }

    pub async fn run_db_phase(
        &self,
        db: Option<&modkit_db::DbHandle>,
    ) -> Result<(), RegistryError> {
        for e in &self.modules {
            if let Some(dbm) = &e.db {
                let db = db.ok_or(RegistryError::DbUnavailable { module: e.name })?;
                tracing::debug!(module = e.name, "Running DB migrations");
                dbm.migrate(db)
                    .await
                    .map_err(|source| RegistryError::DbMigrate {
                        module: e.name,
                        source,
                    })?;
            }
        }
        Ok(())
    }

    pub fn run_rest_phase(
        &self,
        base_ctx: &context::ModuleCtx,
        mut router: Router,
    ) -> Result<Router, RegistryError> {
        // The builder guarantees at most one host.
        let Some(host_entry) = self.modules.iter().find(|e| e.rest_host.is_some()) else {
            return if self.modules.iter().any(|e| e.rest.is_some()) {
                Err(RegistryError::RestRequiresHost)
            } else {
                Ok(router)
            };
        };
        let Some(host) = host_entry.rest_host.as_ref() else {
            return Err(RegistryError::RestHostMissingFromEntry);
        };
        let host_ctx = base_ctx.clone().for_module(host_entry.name);
        let registry: &dyn contracts::OpenApiRegistry = host.as_registry();

        // 1) Host prepare: base Router / health endpoints
        router =
            host.rest_prepare(&host_ctx, router)
                .map_err(|source| RegistryError::RestPrepare {
                    module: host_entry.name,
                    source,
                })?;

        // 2) Register all REST providers in registration order
        for e in &self.modules {
            if let Some(rest) = &e.rest {
                let ctx = base_ctx.clone().for_module(e.name);
                router = rest
                    .register_rest(&ctx, router, registry)
                    .map_err(|source| RegistryError::RestRegister {
                        module: e.name,
                        source,
                    })?;
            }
        }

        // 3) Host finalize: attach /openapi.json and middleware, keep the Router (no server start)
        router = host.rest_finalize(&host_ctx, router).map_err(|source| {
            RegistryError::RestFinalize {
                module: host_entry.name,
                source,
            }
        })?;

        Ok(router)
    }

    pub async fn run_start_phase(&self, cancel: CancellationToken) -> Result<(), RegistryError> {
        for e in &self.modules {
            if let Some(s) = &e.stateful {
                s.start(cancel.clone())
                    .await
                    .map_err(|source| RegistryError::Start {
                        module: e.name,
                        source,
                    })?;
            }
        }
        Ok(())
    }

    /// Stops stateful modules in reverse order; failures are logged, not returned.
    pub async fn run_stop_phase(&self, cancel: CancellationToken) -> Result<(), RegistryError> {
        for e in self.modules.iter().rev() {
            if let Some(s) = &e.stateful {
                if let Err(err) = s.stop(cancel.clone()).await {
                    tracing::warn!(module = e.name, error = %err, "Failed to stop module");
                }
            }
        }
        Ok(())
    }

    pub fn get_module(&self, name: &str) -> Option<Arc<dyn contracts::Module>> {
        self.modules
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.core.clone())
    }
}

/// Explicit registration surface used by the composition root.
/// Keys are module **names**; uniqueness enforced at build time.
#[derive(Default)]
pub struct RegistryBuilder {
    order: Vec<&'static str>,
    core: HashMap<&'static str, Arc<dyn contracts::Module>>,
    rest: HashMap<&'static str, Arc<dyn contracts::RestfulModule>>,
    rest_host: Option<(&'static str, Arc<dyn contracts::RestHostModule>)>,
    db: HashMap<&'static str, Arc<dyn contracts::DbModule>>,
    stateful: HashMap<&'static str, Arc<dyn contracts::StatefulModule>>,
    errors: Vec<String>,
}

impl RegistryBuilder {
    pub fn register_core(&mut self, name: &'static str, m: Arc<dyn contracts::Module>) -> &mut Self {
        if self.core.contains_key(name) {
            self.errors
                .push(format!("Module '{name}' is already registered"));
            return self;
        }
        self.order.push(name);
        self.core.insert(name, m);
        self
    }

    pub fn register_rest(
        &mut self,
        name: &'static str,
        m: Arc<dyn contracts::RestfulModule>,
    ) -> &mut Self {
        self.rest.insert(name, m);
        self
    }

    pub fn register_rest_host(
        &mut self,
        name: &'static str,
        m: Arc<dyn contracts::RestHostModule>,
    ) -> &mut Self {
        if let Some((existing, _)) = &self.rest_host {
            self.errors.push(format!(
                "Multiple REST host modules detected: '{existing}' and '{name}'. Only one REST host is allowed."
            ));
            return self;
        }
        self.rest_host = Some((name, m));
        self
    }

    pub fn register_db(&mut self, name: &'static str, m: Arc<dyn contracts::DbModule>) -> &mut Self {
        self.db.insert(name, m);
        self
    }

    pub fn register_stateful(
        &mut self,
        name: &'static str,
        m: Arc<dyn contracts::StatefulModule>,
    ) -> &mut Self {
        self.stateful.insert(name, m);
        self
    }

    /// Finalize; verify every capability is bound to a known core module.
    pub fn build(mut self) -> Result<ModuleRegistry, RegistryError> {
        if !self.errors.is_empty() {
            return Err(RegistryError::InvalidRegistryConfiguration {
                errors: self.errors,
            });
        }

        let capability_names = self
            .rest
            .keys()
            .chain(self.db.keys())
            .chain(self.stateful.keys())
            .chain(self.rest_host.iter().map(|(n, _)| n));
        for n in capability_names {
            if !self.core.contains_key(n) {
                return Err(RegistryError::UnknownModule((*n).to_string()));
            }
        }

        let mut entries = Vec::with_capacity(self.order.len());
        for name in self.order {
            let core = self
                .core
                .remove(name)
                .ok_or_else(|| RegistryError::CoreNotFound(name.to_string()))?;
            entries.push(ModuleEntry {
                name,
                core,
                rest: self.rest.remove(name),
                rest_host: self
                    .rest_host
                    .as_ref()
                    .filter(|(host_name, _)| *host_name == name)
                    .map(|(_, module)| module.clone()),
                db: self.db.remove(name),
                stateful: self.stateful.remove(name),
            });
        }

        tracing::info!(
            modules = ?entries.iter().map(|e| e.name).collect::<Vec<_>>(),
            "Module order resolved"
        );

        Ok(ModuleRegistry { modules: entries })
    }
}

/// Structured errors for the module registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    // Phase errors with module context
    #[error("initialization failed for module '{module}'")]
    Init {
        module: &'static str,
        #[source]
        source: anyhow::Error,
    },
    #[error("start failed for '{module}'")]
    Start {
        module: &'static str,
        #[source]
        source: anyhow::Error,
    },
    #[error("module '{module}' needs a database, but none is configured")]
    DbUnavailable { module: &'static str },
    #[error("DB migration failed for module '{module}'")]
    DbMigrate {
        module: &'static str,
        #[source]
        source: anyhow::Error,
    },
    #[error("REST prepare failed for host module '{module}'")]
    RestPrepare {
        module: &'static str,
        #[source]
        source: anyhow::Error,
    },
    #[error("REST registration failed for module '{module}'")]
    RestRegister {
        module: &'static str,
        #[source]
        source: anyhow::Error,
    },
    #[error("REST finalize failed for host module '{module}'")]
    RestFinalize {
        module: &'static str,
        #[source]
        source: anyhow::Error,
    },
    #[error("REST phase requires an ingress host: modules with capability 'rest' found, but no module with capability 'rest_host'")]
    RestRequiresHost,
    #[error("REST host missing from entry")]
    RestHostMissingFromEntry,

    // Build errors
    #[error("unknown module '{0}'")]
    UnknownModule(String),
    #[error("core not found for '{0}'")]
    CoreNotFound(String),
    #[error("invalid registry configuration:\n{errors:#?}")]
    InvalidRegistryConfiguration { errors: Vec<String> },
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use parking_lot::Mutex;
    use std::sync::Arc;
    use tokio_util::sync::CancellationToken;

    use crate::api::openapi::OpenApiCollector;
    use crate::context::{ModuleCtx, ModuleCtxBuilder};
    use crate::contracts::{self, OpenApiRegistry};

    /* --------------------------- Test helpers ------------------------- */
    #[derive(Default)]
    struct DummyCore;
    #[async_trait::async_trait]
    impl contracts::Module for DummyCore {
        async fn init(&self, _ctx: &ModuleCtx) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct DummyRestHost {
        reg: OpenApiCollector,
    }
    impl contracts::RestHostModule for DummyRestHost {
        fn rest_prepare(&self, _ctx: &ModuleCtx, router: Router) -> anyhow::Result<Router> {
            Ok(router)
        }
        fn rest_finalize(&self, _ctx: &ModuleCtx, router: Router) -> anyhow::Result<Router> {
            Ok(router)
        }
        fn as_registry(&self) -> &dyn OpenApiRegistry {
            &self.reg
        }
    }

    #[derive(Default)]
    struct DummyRest;
    impl contracts::RestfulModule for DummyRest {
        fn register_rest(
            &self,
            _ctx: &ModuleCtx,
            router: Router,
            _openapi: &dyn OpenApiRegistry,
        ) -> anyhow::Result<Router> {
            Ok(router.route("/dummy", axum::routing::get(|| async { "ok" })))
        }
    }

    /// Records start/stop calls into a shared journal.
    struct Recorder {
        name: &'static str,
        journal: Arc<Mutex<Vec<String>>>,
    }
    #[async_trait::async_trait]
    impl contracts::StatefulModule for Recorder {
        async fn start(&self, _cancel: CancellationToken) -> anyhow::Result<()> {
            self.journal.lock().push(format!("start:{}", self.name));
            Ok(())
        }
        async fn stop(&self, _cancel: CancellationToken) -> anyhow::Result<()> {
            self.journal.lock().push(format!("stop:{}", self.name));
            Ok(())
        }
    }

    struct NeedsDb;
    #[async_trait::async_trait]
    impl contracts::DbModule for NeedsDb {
        async fn migrate(&self, _db: &modkit_db::DbHandle) -> anyhow::Result<()> {
            Ok(())
        }
    }

    /* ------------------------------- Tests ---------------------------- */

    #[test]
    fn registration_order_is_preserved() {
        let mut b = RegistryBuilder::default();
        b.register_core("core_b", Arc::new(DummyCore))
            .register_core("core_a", Arc::new(DummyCore));

        let reg = b.build().unwrap();
        let order: Vec<_> = reg.modules().iter().map(|m| m.name).collect();
        assert_eq!(order, vec!["core_b", "core_a"]);
        assert!(reg.get_module("core_a").is_some());
        assert!(reg.get_module("nope").is_none());
    }

    #[test]
    fn duplicate_core_reported_in_configuration_errors() {
        let mut b = RegistryBuilder::default();
        b.register_core("a", Arc::new(DummyCore));
        b.register_core("a", Arc::new(DummyCore));

        let err = b.build().unwrap_err();
        match err {
            RegistryError::InvalidRegistryConfiguration { errors } => {
                assert!(
                    errors.iter().any(|e| e.contains("already registered")),
                    "expected duplicate registration error, got {errors:?}"
                );
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn second_rest_host_is_rejected() {
        let mut b = RegistryBuilder::default();
        b.register_core("h1", Arc::new(DummyCore))
            .register_core("h2", Arc::new(DummyCore))
            .register_rest_host("h1", Arc::new(DummyRestHost::default()))
            .register_rest_host("h2", Arc::new(DummyRestHost::default()));

        let err = b.build().unwrap_err();
        assert!(matches!(
            err,
            RegistryError::InvalidRegistryConfiguration { .. }
        ));
    }

    #[test]
    fn capability_without_core_is_unknown_module() {
        let mut b = RegistryBuilder::default();
        b.register_rest("ghost", Arc::new(DummyRest));

        let err = b.build().unwrap_err();
        assert!(matches!(err, RegistryError::UnknownModule(ref n) if n == "ghost"));
    }

    #[test]
    fn rest_requires_host_if_rest_modules_exist() {
        let mut b = RegistryBuilder::default();
        b.register_core("svc", Arc::new(DummyCore))
            .register_rest("svc", Arc::new(DummyRest));
        let reg = b.build().unwrap();

        let base_ctx = ModuleCtxBuilder::new(CancellationToken::new()).build();
        let err = reg.run_rest_phase(&base_ctx, Router::new()).unwrap_err();
        assert!(matches!(err, RegistryError::RestRequiresHost));
    }

    #[test]
    fn rest_single_host_and_provider_happy_path() {
        let mut b = RegistryBuilder::default();
        b.register_core("host", Arc::new(DummyCore))
            .register_rest_host("host", Arc::new(DummyRestHost::default()))
            .register_core("svc", Arc::new(DummyCore))
            .register_rest("svc", Arc::new(DummyRest));

        let reg = b.build().unwrap();
        let base_ctx = ModuleCtxBuilder::new(CancellationToken::new()).build();
        assert!(reg.run_rest_phase(&base_ctx, Router::new()).is_ok());
    }

    #[tokio::test]
    async fn db_phase_without_handle_fails_for_db_modules() {
        let mut b = RegistryBuilder::default();
        b.register_core("store", Arc::new(DummyCore))
            .register_db("store", Arc::new(NeedsDb));
        let reg = b.build().unwrap();

        let err = reg.run_db_phase(None).await.unwrap_err();
        assert!(matches!(err, RegistryError::DbUnavailable { module: "store" }));
    }

    #[tokio::test]
    async fn stop_runs_in_reverse_order() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let mut b = RegistryBuilder::default();
        for name in ["first", "second"] {
            b.register_core(name, Arc::new(DummyCore)).register_stateful(
                name,
                Arc::new(Recorder {
                    name,
                    journal: journal.clone(),
                }),
            );
        }
        let reg = b.build().unwrap();

        let ctx = ModuleCtxBuilder::new(CancellationToken::new()).build();
        reg.run_init_phase(&ctx).await.unwrap();
        reg.run_db_phase(None).await.unwrap();

        let cancel = CancellationToken::new();
        reg.run_start_phase(cancel.child_token()).await.unwrap();
        reg.run_stop_phase(cancel.child_token()).await.unwrap();

        assert_eq!(
            *journal.lock(),
            vec!["start:first", "start:second", "stop:second", "stop:first"]
        );
    }
}
