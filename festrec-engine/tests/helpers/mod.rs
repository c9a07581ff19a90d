//! Test Helper Utilities
//!
//! Shared setup for festrec-engine integration tests

#![allow(dead_code)]

use festrec_common::db::init_memory_database;
use festrec_engine::models::EntityProfile;
use festrec_engine::{Priors, ReconcileConfig, Reconciler, SqliteStore};

/// Reconciler over a fresh in-memory database with default configuration
pub async fn create_test_reconciler() -> Reconciler<SqliteStore> {
    let pool = init_memory_database().await.expect("in-memory database");
    Reconciler::new(SqliteStore::new(pool), &ReconcileConfig::default())
}

/// Register an entity and return its profile
pub async fn register(
    reconciler: &Reconciler<SqliteStore>,
    slug: &str,
    website: Option<&str>,
    priors: Priors,
) -> EntityProfile {
    let profile = EntityProfile::new(slug, website.map(str::to_string), priors);
    reconciler
        .register_entity(&profile)
        .await
        .expect("entity registration");
    profile
}

/// Count rows in a table
pub async fn count_rows(reconciler: &Reconciler<SqliteStore>, table: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(reconciler.store().pool())
        .await
        .expect("row count")
}
