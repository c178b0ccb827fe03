use async_trait::async_trait;
use chrono::Utc;
use models::document;
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, DbErr, EntityTrait, QuerySelect, Set, SqlErr, TransactionTrait,
};
use tracing::debug;

use crate::document::store::commit_over;
use crate::document::{ConflictRule, DocumentStore, Resolution, StoredDocument, UpsertOutcome};
use crate::errors::ServiceError;

/// [`DocumentStore`] on the Postgres `document` table.
///
/// Each upsert is one transaction holding a row lock on the id.
#[derive(Clone)]
pub struct SeaOrmDocumentStore {
    db: DatabaseConnection,
}

impl SeaOrmDocumentStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn db_err(e: DbErr) -> ServiceError {
    ServiceError::Db(e.to_string())
}

#[async_trait]
impl DocumentStore for SeaOrmDocumentStore {
    async fn get(&self, scope: &str, id: &str) -> Result<Option<StoredDocument>, ServiceError> {
        Ok(document::find(&self.db, scope, id).await?.map(StoredDocument::from))
    }

    async fn upsert(&self, scope: &str, id: &str, rule: &ConflictRule) -> Result<UpsertOutcome, ServiceError> {
        // a second pass only happens when a concurrent creator won the insert
        for attempt in 0..2 {
            let txn = self.db.begin().await.map_err(db_err)?;
            let row = document::Entity::find_by_id((scope.to_string(), id.to_string()))
                .lock_exclusive()
                .one(&txn)
                .await
                .map_err(db_err)?;
            let current = row.clone().map(StoredDocument::from);

            let doc = match rule(current.as_ref()) {
                Resolution::Abort(abort) => {
                    txn.rollback().await.map_err(db_err)?;
                    return Ok(UpsertOutcome::Aborted(abort));
                }
                Resolution::Commit(doc) => doc,
            };
            if doc.id != id {
                txn.rollback().await.map_err(db_err)?;
                return Err(ServiceError::Db(format!("commit for {} addressed at {id}", doc.id)));
            }
            let stored = commit_over(current.as_ref(), doc);
            let now = Utc::now();

            match row {
                Some(model) => {
                    let mut am: document::ActiveModel = model.into();
                    am.doc_type = Set(stored.meta.doc_type.clone());
                    am.content = Set(stored.content.clone());
                    am.sequence = Set(stored.sequence);
                    am.updated_at = Set(now.into());
                    am.update(&txn).await.map_err(db_err)?;
                }
                None => {
                    let am = document::ActiveModel {
                        config_id: Set(scope.to_string()),
                        id: Set(id.to_string()),
                        doc_type: Set(stored.meta.doc_type.clone()),
                        content: Set(stored.content.clone()),
                        sequence: Set(stored.sequence),
                        created_at: Set(now.into()),
                        updated_at: Set(now.into()),
                    };
                    let inserted = document::Entity::insert(am).exec_without_returning(&txn).await;
                    if let Err(e) = inserted {
                        let raced = matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)));
                        txn.rollback().await.map_err(db_err)?;
                        if raced && attempt == 0 {
                            debug!(scope, id, "concurrent insert detected; re-reading");
                            continue;
                        }
                        return Err(db_err(e));
                    }
                }
            }
            txn.commit().await.map_err(db_err)?;
            return Ok(UpsertOutcome::Committed(stored));
        }
        Err(ServiceError::Db(format!("upsert of {id} did not settle")))
    }
}
