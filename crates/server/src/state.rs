use std::sync::Arc;

use prometheus::Registry;
use service::document::{DocumentKind, DocumentService};
use service::metering::UsageMeter;

/// Shared state for every route.
#[derive(Clone)]
pub struct AppState {
    pub documents: DocumentService,
    pub meter: Arc<dyn UsageMeter>,
    pub registry: Registry,
    /// Public origin, no trailing slash.
    pub base_uri: String,
    /// Mount point for service object configs, e.g. `/service-objects`.
    pub prefix: String,
    /// HS256 secret; `None` disables authorization.
    pub jwt_secret: Option<String>,
}

impl AppState {
    pub fn new(
        documents: DocumentService,
        meter: Arc<dyn UsageMeter>,
        registry: Registry,
        cfg: &configs::AppConfig,
    ) -> Self {
        Self {
            documents,
            meter,
            registry,
            base_uri: cfg.server.base_uri.clone(),
            prefix: cfg.routes.prefix.clone(),
            jwt_secret: cfg.auth.jwt_secret.clone(),
        }
    }

    /// Service object config id a request is scoped to.
    pub fn config_id(&self, local_id: &str) -> String {
        format!("{}{}/{}", self.base_uri, self.prefix, local_id)
    }
}

/// One document collection mounted under each service object config.
#[derive(Clone, Debug)]
pub struct ResourceSpec {
    pub kind: DocumentKind,
    /// Path segment such as `/contexts`.
    pub collection: String,
}

impl ResourceSpec {
    pub fn new(kind: DocumentKind, collection: impl Into<String>) -> Self {
        Self { kind, collection: collection.into() }
    }

    /// Both collections as configured under `[routes]`.
    pub fn from_config(routes: &configs::RoutesConfig) -> Vec<Self> {
        vec![
            Self::new(DocumentKind::JsonLdContext, routes.contexts.clone()),
            Self::new(DocumentKind::CborLdRegistryEntry, routes.registry_entries.clone()),
        ]
    }
}

/// State handed to one collection's handlers.
#[derive(Clone)]
pub struct ResourceState {
    pub app: AppState,
    pub spec: Arc<ResourceSpec>,
}
