use async_trait::async_trait;

use super::{NewDocument, StoredDocument};
use crate::errors::ServiceError;

/// Why a conflict rule refused to commit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Abort {
    /// Any document already exists at the id.
    Duplicate,
    /// Stored sequence did not precede the requested one.
    Stale { actual: i64 },
    /// Stored document carries another kind.
    WrongKind { found: String },
    /// Nothing stored at the id.
    Missing,
}

/// Decision returned by a conflict rule.
#[derive(Clone, Debug, PartialEq)]
pub enum Resolution {
    Commit(NewDocument),
    Abort(Abort),
}

#[derive(Clone, Debug, PartialEq)]
pub enum UpsertOutcome {
    Committed(StoredDocument),
    Aborted(Abort),
}

/// Consulted by the store inside its atomic section with whatever is
/// currently stored at the id.
pub type ConflictRule = dyn Fn(Option<&StoredDocument>) -> Resolution + Send + Sync;

/// Keyed, versioned document storage with atomic compare-and-swap upsert.
///
/// Documents are keyed by `(scope, id)`; the kind is not part of the key.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, scope: &str, id: &str) -> Result<Option<StoredDocument>, ServiceError>;

    /// Read, decide and commit as one atomic step.
    ///
    /// A commit on an absent id inserts at sequence 0; on a present id it
    /// replaces content and meta and sets `sequence = existing + 1`.
    async fn upsert(&self, scope: &str, id: &str, rule: &ConflictRule) -> Result<UpsertOutcome, ServiceError>;

    /// Overwrite without any conflict check.
    async fn put_unchecked(&self, scope: &str, doc: NewDocument) -> Result<StoredDocument, ServiceError> {
        let id = doc.id.clone();
        match self.upsert(scope, &id, &move |_| Resolution::Commit(doc.clone())).await? {
            UpsertOutcome::Committed(stored) => Ok(stored),
            UpsertOutcome::Aborted(abort) => Err(ServiceError::Db(format!("unconditional write aborted: {abort:?}"))),
        }
    }
}

/// Apply a committed replacement on top of what is stored.
pub(crate) fn commit_over(existing: Option<&StoredDocument>, doc: NewDocument) -> StoredDocument {
    let sequence = existing.map_or(0, |e| e.sequence + 1);
    StoredDocument { id: doc.id, content: doc.content, meta: doc.meta, sequence }
}
