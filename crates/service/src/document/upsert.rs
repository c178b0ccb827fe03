//! Optimistic-concurrency create and update over a [`DocumentStore`].
//!
//! Both operations are one atomic store upsert driven by a conflict rule.
//! The rule's abort is translated 1:1 into a caller-visible error; there is
//! no retry.

use serde_json::Value;
use tracing::{debug, info, warn};

use super::{Abort, DocumentKind, DocumentStore, NewDocument, Resolution, StoredDocument, UpsertOutcome};
use crate::errors::ServiceError;

/// Commit only when nothing exists at the id, whatever its kind.
pub fn create_rule(doc: NewDocument) -> impl Fn(Option<&StoredDocument>) -> Resolution + Send + Sync {
    move |existing| match existing {
        Some(_) => Resolution::Abort(Abort::Duplicate),
        None => Resolution::Commit(doc.clone()),
    }
}

/// Commit only over a document of `kind` whose sequence is `sequence - 1`.
pub fn update_rule(
    doc: NewDocument,
    kind: DocumentKind,
    sequence: i64,
) -> impl Fn(Option<&StoredDocument>) -> Resolution + Send + Sync {
    move |existing| {
        let Some(existing) = existing else {
            return Resolution::Abort(Abort::Missing);
        };
        if !kind.matches(&existing.meta.doc_type) {
            return Resolution::Abort(Abort::WrongKind { found: existing.meta.doc_type.clone() });
        }
        if existing.sequence != sequence - 1 {
            return Resolution::Abort(Abort::Stale { actual: existing.sequence });
        }
        // content and meta are replaced wholesale; kind is re-stamped
        Resolution::Commit(doc.clone())
    }
}

pub async fn create(
    store: &dyn DocumentStore,
    scope: &str,
    kind: DocumentKind,
    id: &str,
    payload: Value,
) -> Result<StoredDocument, ServiceError> {
    let rule = create_rule(NewDocument::new(kind, id, payload));
    match store.upsert(scope, id, &rule).await? {
        UpsertOutcome::Committed(doc) => {
            info!(event = "document_created", scope, id, kind = %kind, "document created");
            Ok(doc)
        }
        UpsertOutcome::Aborted(abort) => Err(abort_error(abort, kind, scope, id, None)),
    }
}

pub async fn update(
    store: &dyn DocumentStore,
    scope: &str,
    kind: DocumentKind,
    id: &str,
    payload: Value,
    sequence: i64,
) -> Result<StoredDocument, ServiceError> {
    let rule = update_rule(NewDocument::new(kind, id, payload), kind, sequence);
    match store.upsert(scope, id, &rule).await? {
        UpsertOutcome::Committed(doc) => {
            info!(event = "document_updated", scope, id, kind = %kind, sequence = doc.sequence, "document updated");
            Ok(doc)
        }
        UpsertOutcome::Aborted(abort) => Err(abort_error(abort, kind, scope, id, Some(sequence))),
    }
}

fn abort_error(abort: Abort, kind: DocumentKind, scope: &str, id: &str, requested: Option<i64>) -> ServiceError {
    match abort {
        Abort::Duplicate => {
            debug!(event = "duplicate_document", scope, id, kind = %kind);
            ServiceError::Duplicate(format!("Duplicate {}.", kind.label()))
        }
        Abort::Stale { actual } => {
            let expected = requested.unwrap_or(0) - 1;
            debug!(event = "stale_sequence", scope, id, expected, actual);
            ServiceError::InvalidState {
                message: format!("Could not update {}; unexpected sequence.", kind.label()),
                expected,
                actual,
            }
        }
        Abort::WrongKind { found } => {
            warn!(event = "document_kind_mismatch", scope, id, expected = %kind, found = %found);
            ServiceError::NotAllowed(format!("Existing document is not {}.", kind.description()))
        }
        Abort::Missing => ServiceError::not_found(kind.noun()),
    }
}
