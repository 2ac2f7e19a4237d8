use parking_lot::Mutex;
use utoipa::openapi::{InfoBuilder, OpenApi, OpenApiBuilder};

/// Sink for per-module OpenAPI documents, owned by the REST host.
pub trait OpenApiRegistry: Send + Sync {
    /// Merge a module's paths and components into the host document.
    fn merge_fragment(&self, fragment: OpenApi);
}

/// Default [`OpenApiRegistry`]: accumulates fragments into one document.
pub struct OpenApiCollector {
    doc: Mutex<OpenApi>,
}

impl OpenApiCollector {
    pub fn new(title: &str, version: &str) -> Self {
        let info = InfoBuilder::new().title(title).version(version).build();
        Self {
            doc: Mutex::new(OpenApiBuilder::new().info(info).build()),
        }
    }

    /// Snapshot of the merged document.
    pub fn document(&self) -> OpenApi {
        self.doc.lock().clone()
    }
}

impl Default for OpenApiCollector {
    fn default() -> Self {
        Self::new("API", env!("CARGO_PKG_VERSION"))
    }
}

impl OpenApiRegistry for OpenApiCollector {
    fn merge_fragment(&self, fragment: OpenApi) {
        self.doc.lock().merge(fragment);
    }
}
