//! Tests for database initialization
//!
//! - Database file is created on first run, parent directories included
//! - Re-opening an existing database is a no-op for the schema
//! - All festrec tables exist after init

use festrec_common::db::{init_database, init_memory_database, SCHEMA_VERSION};

#[tokio::test]
async fn test_database_creation_when_missing() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("nested").join("festrec.db");

    let result = init_database(&db_path).await;

    assert!(result.is_ok(), "Database initialization failed: {:?}", result.err());
    assert!(db_path.exists(), "Database file was not created");
}

#[tokio::test]
async fn test_database_opens_existing() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("festrec.db");

    let pool1 = init_database(&db_path).await.unwrap();
    pool1.close().await;

    let pool2 = init_database(&db_path).await;
    assert!(pool2.is_ok(), "Failed to open existing database: {:?}", pool2.err());

    let versions: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM schema_version")
        .fetch_one(&pool2.unwrap())
        .await
        .unwrap();
    assert_eq!(versions, 1, "schema_version must not be duplicated on reopen");
}

#[tokio::test]
async fn test_all_tables_created() {
    let pool = init_memory_database().await.unwrap();

    for table in ["schema_version", "entities", "festival_dates", "event_records"] {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?",
        )
        .bind(table)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(count, 1, "missing table {}", table);
    }

    let version: i64 = sqlx::query_scalar("SELECT MAX(version) FROM schema_version")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(version, SCHEMA_VERSION);
}

#[tokio::test]
async fn test_fingerprint_uniqueness_enforced() {
    let pool = init_memory_database().await.unwrap();

    let insert = "INSERT INTO event_records (guid, fingerprint, title, venue_name, start_date) \
                  VALUES (?, 'abc', 'Title', 'Venue', '2026-10-03')";

    sqlx::query(insert).bind("guid-1").execute(&pool).await.unwrap();
    let second = sqlx::query(insert).bind("guid-2").execute(&pool).await;

    assert!(second.is_err(), "Duplicate fingerprint must violate UNIQUE");
}
