use std::{collections::BTreeMap, path::PathBuf, sync::Arc};

use async_trait::async_trait;

use super::json_map_store::{JsonMapStore, MapUpdate};
use crate::document::store::commit_over;
use crate::document::{ConflictRule, DocumentStore, Resolution, StoredDocument, UpsertOutcome};
use crate::errors::ServiceError;

type Documents = BTreeMap<String, StoredDocument>;

/// [`DocumentStore`] persisted as one JSON file: `scope -> id -> document`.
///
/// The rule runs while the map's write lock is held, which makes each upsert
/// atomic within this process.
#[derive(Clone)]
pub struct JsonFileDocumentStore {
    store: Arc<JsonMapStore<String, Documents>>,
}

impl JsonFileDocumentStore {
    /// Open or create the store file.
    pub async fn open<P: Into<PathBuf>>(path: P) -> Result<Arc<Self>, ServiceError> {
        let store = JsonMapStore::<String, Documents>::new(path).await?;
        Ok(Arc::new(Self { store }))
    }

    /// Number of documents stored under `scope`.
    pub async fn count(&self, scope: &str) -> usize {
        self.store.view(|m| m.get(scope).map_or(0, |docs| docs.len())).await
    }
}

#[async_trait]
impl DocumentStore for JsonFileDocumentStore {
    async fn get(&self, scope: &str, id: &str) -> Result<Option<StoredDocument>, ServiceError> {
        Ok(self.store.view(|m| m.get(scope).and_then(|docs| docs.get(id)).cloned()).await)
    }

    async fn upsert(&self, scope: &str, id: &str, rule: &ConflictRule) -> Result<UpsertOutcome, ServiceError> {
        self.store
            .update_map(|m| {
                let existing = m.get(scope).and_then(|docs| docs.get(id));
                match rule(existing) {
                    Resolution::Abort(abort) => Ok(MapUpdate::Unchanged(UpsertOutcome::Aborted(abort))),
                    Resolution::Commit(doc) => {
                        if doc.id != id {
                            return Err(ServiceError::Db(format!("commit for {} addressed at {id}", doc.id)));
                        }
                        let stored = commit_over(existing, doc);
                        m.entry(scope.to_string()).or_default().insert(id.to_string(), stored.clone());
                        Ok(MapUpdate::Changed(UpsertOutcome::Committed(stored)))
                    }
                }
            })
            .await
    }
}
