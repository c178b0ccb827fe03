use std::time::{Duration, Instant};

use anyhow::Result;
use sea_orm::{ConnectionTrait, DatabaseBackend, Statement};

use crate::db::{connect_with_config, test_connection};

#[tokio::test]
async fn test_basic_connection() -> Result<()> {
    let Some(db) = super::setup_test_db().await? else {
        println!("Skipping database tests (no DATABASE_URL or SKIP_DB_TESTS set)");
        return Ok(());
    };

    let stmt = Statement::from_string(DatabaseBackend::Postgres, "SELECT 1 as test".to_string());
    let row = db.query_one(stmt).await?.expect("one row");
    let test_value: i32 = row.try_get("", "test")?;
    assert_eq!(test_value, 1);
    Ok(())
}

#[tokio::test]
async fn test_custom_config_connection() -> Result<()> {
    if super::setup_test_db().await?.is_none() {
        return Ok(());
    }

    let config = configs::DatabaseConfig {
        url: crate::db::DATABASE_URL.clone(),
        max_connections: 5,
        min_connections: 1,
        connect_timeout_secs: 10,
        acquire_timeout_secs: 10,
        idle_timeout_secs: 60,
        max_lifetime_secs: 600,
        sqlx_logging: false,
    };

    let start = Instant::now();
    let db = connect_with_config(&config).await?;
    test_connection(&db).await?;
    assert!(start.elapsed() < Duration::from_secs(10), "connection took too long: {:?}", start.elapsed());
    Ok(())
}
