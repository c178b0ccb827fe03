/// Database connection tests
pub mod db_tests;


use anyhow::Result;
use migration::MigratorTrait;
use sea_orm::DatabaseConnection;
use tokio::sync::OnceCell;

// migrations run once per test process
static MIGRATED: OnceCell<()> = OnceCell::const_new();

/// Connect and migrate, or `None` when no database is configured for this run.
pub(crate) async fn setup_test_db() -> Result<Option<DatabaseConnection>> {
    if std::env::var("SKIP_DB_TESTS").is_ok() || std::env::var("DATABASE_URL").is_err() {
        return Ok(None);
    }
    MIGRATED
        .get_or_try_init(|| async {
            let db = crate::db::connect().await?;
            migration::Migrator::up(&db, None).await?;
            Ok::<(), anyhow::Error>(())
        })
        .await?;
    // fresh connection bound to the current test's runtime
    Ok(Some(crate::db::connect().await?))
}
