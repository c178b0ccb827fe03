use tracing::debug;

use super::{DocumentKind, DocumentStore, StoredDocument};
use crate::errors::ServiceError;

/// Fetch a document and require its stored kind to be `kind`.
///
/// A kind mismatch is reported exactly like absence.
pub async fn get_typed(
    store: &dyn DocumentStore,
    scope: &str,
    id: &str,
    kind: DocumentKind,
) -> Result<Option<StoredDocument>, ServiceError> {
    match store.get(scope, id).await? {
        Some(doc) if kind.matches(&doc.meta.doc_type) => Ok(Some(doc)),
        Some(doc) => {
            debug!(event = "document_kind_mismatch", scope, id, expected = %kind, found = %doc.meta.doc_type);
            Ok(None)
        }
        None => Ok(None),
    }
}

/// [`get_typed`] with absence mapped to `NotFound`.
pub async fn require_typed(
    store: &dyn DocumentStore,
    scope: &str,
    id: &str,
    kind: DocumentKind,
) -> Result<StoredDocument, ServiceError> {
    get_typed(store, scope, id, kind).await?.ok_or_else(|| ServiceError::not_found(kind.noun()))
}
