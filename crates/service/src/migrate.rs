//! One-time copy of legacy JSON-LD contexts into the document table.
//!
//! Service agents that were never updated (`sequence == 0`) and predate the
//! cutoff are migrated one at a time; an agent's sequence is bumped once all
//! of its configs migrated cleanly, which keeps the job from running twice.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use models::{legacy_document, service_agent, service_config};
use sea_orm::DatabaseConnection;
use serde_json::Value;
use tracing::{debug, error, info, instrument};

use crate::document::{upsert, DocumentKind, DocumentStore};
use crate::errors::ServiceError;

const LEGACY_CONTEXT_TYPE: &str = "JsonLdContext";
const AGENT_LIMIT: u64 = 1000;

fn default_cutoff() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2022, 5, 24, 0, 0, 0).single().unwrap_or_else(Utc::now)
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MigrationReport {
    pub agents: usize,
    pub configs: usize,
    pub failed_configs: usize,
    pub contexts_migrated: usize,
    pub duplicates_skipped: usize,
}

pub struct LegacyContextMigration {
    db: DatabaseConnection,
    documents: Arc<dyn DocumentStore>,
    cutoff: DateTime<Utc>,
}

impl LegacyContextMigration {
    pub fn new(db: DatabaseConnection, documents: Arc<dyn DocumentStore>) -> Self {
        Self { db, documents, cutoff: default_cutoff() }
    }

    /// Only agents created on or before `cutoff` are considered.
    pub fn with_cutoff(mut self, cutoff: DateTime<Utc>) -> Self {
        self.cutoff = cutoff;
        self
    }

    #[instrument(skip(self), fields(cutoff = %self.cutoff))]
    pub async fn run(&self) -> Result<MigrationReport, ServiceError> {
        let agents = service_agent::find_unmigrated(&self.db, self.cutoff, AGENT_LIMIT).await?;
        if agents.len() as u64 == AGENT_LIMIT {
            return Err(ServiceError::Migration("Too many service agent records to perform migration.".into()));
        }
        let mut report = MigrationReport { agents: agents.len(), ..Default::default() };
        if agents.is_empty() {
            debug!("no service agents to migrate contexts for");
            return Ok(report);
        }
        debug!(agents = agents.len(), "migrating service agents");

        for agent in agents {
            let configs = service_config::list_by_service_type(&self.db, &agent.service_type).await?;
            debug!(agent = %agent.id, configs = configs.len(), "migrating service object configs");

            let mut errors = 0usize;
            for config in &configs {
                match self.migrate_config(&config.id).await {
                    Ok((migrated, skipped)) => {
                        report.contexts_migrated += migrated;
                        report.duplicates_skipped += skipped;
                        debug!(config = %config.id, migrated, "contexts migrated for config");
                    }
                    Err(e) => {
                        errors += 1;
                        error!(config = %config.id, error = %e, "could not migrate contexts for config");
                    }
                }
            }
            report.configs += configs.len();
            report.failed_configs += errors;

            if errors == 0 && !service_agent::bump_sequence(&self.db, &agent.id, agent.sequence).await? {
                // another process finished the same agent first
                debug!(agent = %agent.id, "service agent already bumped");
            }
            info!(
                agent = %agent.id,
                migrated = configs.len() - errors,
                total = configs.len(),
                "service object configs migrated"
            );
        }
        Ok(report)
    }

    /// Copy one config's legacy contexts; returns `(migrated, duplicates)`.
    async fn migrate_config(&self, config_id: &str) -> Result<(usize, usize), ServiceError> {
        let legacy = legacy_document::list_by_config(&self.db, config_id).await?;
        let mut migrated = 0;
        let mut skipped = 0;
        for doc in legacy {
            if doc.content.get("type").and_then(Value::as_str) != Some(LEGACY_CONTEXT_TYPE) {
                continue;
            }
            let id = match doc.content.get("id").and_then(Value::as_str) {
                Some(id) => id.to_string(),
                None => doc.id.clone(),
            };
            let context = doc.content.get("context").cloned().unwrap_or(Value::Null);
            match upsert::create(self.documents.as_ref(), config_id, DocumentKind::JsonLdContext, &id, context).await {
                Ok(_) => migrated += 1,
                Err(ServiceError::Duplicate(_)) => {
                    debug!(id = %id, "duplicate context; skipping migration");
                    skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }
        Ok((migrated, skipped))
    }
}
