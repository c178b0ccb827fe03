use std::{net::SocketAddr, sync::Arc};

use axum::Router;
use configs::{AppConfig, StorageBackend};
use migration::MigratorTrait;
use prometheus::Registry;
use sea_orm::DatabaseConnection;
use service::document::{DocumentService, DocumentStore};
use service::metering::PrometheusMeter;
use service::migrate::LegacyContextMigration;
use service::storage::{file_store::JsonFileDocumentStore, seaorm::SeaOrmDocumentStore};
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::errors::StartupError;
use crate::routes;
use crate::state::{AppState, ResourceSpec};

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

fn bind_addr(cfg: &AppConfig) -> Result<SocketAddr, StartupError> {
    format!("{}:{}", cfg.server.host, cfg.server.port)
        .parse()
        .map_err(|e| StartupError::InvalidConfig(format!("server address: {e}")))
}

/// Open the configured document store; the connection is returned for postgres.
pub async fn open_store(cfg: &AppConfig) -> Result<(Arc<dyn DocumentStore>, Option<DatabaseConnection>), StartupError> {
    match cfg.storage.backend {
        StorageBackend::File => {
            let store: Arc<dyn DocumentStore> = JsonFileDocumentStore::open(&cfg.storage.path)
                .await
                .map_err(|e| StartupError::Runtime(e.to_string()))?;
            info!(path = %cfg.storage.path, "file document store ready");
            Ok((store, None))
        }
        StorageBackend::Postgres => {
            let db = models::db::connect_with_config(&cfg.database).await?;
            models::db::test_connection(&db).await?;
            migration::Migrator::up(&db, None).await.map_err(|e| StartupError::Runtime(e.to_string()))?;
            info!("postgres document store ready");
            let store: Arc<dyn DocumentStore> = Arc::new(SeaOrmDocumentStore::new(db.clone()));
            Ok((store, Some(db)))
        }
    }
}

/// Assemble the router from an already opened store.
pub fn build_app(cfg: &AppConfig, store: Arc<dyn DocumentStore>) -> Result<Router, StartupError> {
    let registry = Registry::new();
    let meter = PrometheusMeter::new(&registry).map_err(|e| StartupError::Runtime(e.to_string()))?;
    let state = AppState::new(DocumentService::new(store), Arc::new(meter), registry, cfg);
    Ok(routes::build_router(state, ResourceSpec::from_config(&cfg.routes), build_cors()))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "cannot listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received, draining connections");
}

/// Open the store, run the optional legacy migration, then serve until Ctrl+C.
pub async fn run(cfg: AppConfig) -> anyhow::Result<()> {
    let (store, db) = open_store(&cfg).await?;

    if cfg.migration.migrate_contexts {
        if let Some(db) = db {
            let report = LegacyContextMigration::new(db, store.clone()).run().await?;
            info!(
                agents = report.agents,
                configs = report.configs,
                failed = report.failed_configs,
                contexts = report.contexts_migrated,
                "legacy context migration finished"
            );
        }
    }

    let app = build_app(&cfg, store)?;

    // Bind and serve
    let addr = bind_addr(&cfg)?;
    info!(%addr, base_uri = %cfg.server.base_uri, "starting context store");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    Ok(())
}
