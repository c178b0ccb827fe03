use std::sync::Arc;

use serde_json::Value;
use tracing::instrument;

use super::validation::{validate_create, validate_update};
use super::{guard, upsert, DocumentKind, DocumentStore, StoredDocument};
use crate::errors::ServiceError;

/// Validated create/update/get over a shared [`DocumentStore`].
#[derive(Clone)]
pub struct DocumentService {
    store: Arc<dyn DocumentStore>,
}

impl DocumentService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Create from a raw `{id, <contentProperty>}` body.
    #[instrument(skip(self, body), fields(kind = %kind))]
    pub async fn create(&self, scope: &str, kind: DocumentKind, body: &Value) -> Result<StoredDocument, ServiceError> {
        let body = validate_create(kind, body)?;
        upsert::create(self.store.as_ref(), scope, kind, &body.id, body.payload).await
    }

    /// Update from a raw `{id, <contentProperty>, sequence}` body addressed at `id`.
    #[instrument(skip(self, body), fields(kind = %kind))]
    pub async fn update(
        &self,
        scope: &str,
        kind: DocumentKind,
        id: &str,
        body: &Value,
    ) -> Result<StoredDocument, ServiceError> {
        let body = validate_update(kind, body, id)?;
        upsert::update(self.store.as_ref(), scope, kind, &body.id, body.payload, body.sequence).await
    }

    #[instrument(skip(self), fields(kind = %kind))]
    pub async fn get(&self, scope: &str, kind: DocumentKind, id: &str) -> Result<StoredDocument, ServiceError> {
        guard::require_typed(self.store.as_ref(), scope, id, kind).await
    }
}
