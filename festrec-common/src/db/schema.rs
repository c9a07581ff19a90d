//! Table definitions
//!
//! Dates are ISO `YYYY-MM-DD` text, timestamps RFC 3339 text, ids UUID text.
//! Every mutable row carries a `revision` used for conditional writes.

use crate::Result;
use sqlx::SqlitePool;

/// Current schema version
pub const SCHEMA_VERSION: i64 = 1;

/// Create all festrec tables (idempotent)
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_schema_version_table(pool).await?;
    create_entities_table(pool).await?;
    create_festival_dates_table(pool).await?;
    create_event_records_table(pool).await?;
    Ok(())
}

async fn create_schema_version_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER NOT NULL PRIMARY KEY
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("INSERT OR IGNORE INTO schema_version (version) VALUES (?)")
        .bind(SCHEMA_VERSION)
        .execute(pool)
        .await?;

    Ok(())
}

/// Recurring-event entities and their domain priors
async fn create_entities_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS entities (
            guid TEXT PRIMARY KEY,
            slug TEXT NOT NULL UNIQUE,
            website TEXT,
            typical_month INTEGER CHECK (typical_month BETWEEN 1 AND 12),
            typical_duration_days INTEGER CHECK (typical_duration_days > 0),
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// One confirmed and one pending date slot per entity
async fn create_festival_dates_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS festival_dates (
            entity_id TEXT PRIMARY KEY REFERENCES entities(guid) ON DELETE CASCADE,
            confirmed_start TEXT,
            confirmed_end TEXT,
            confirmed_confidence INTEGER,
            confirmed_method TEXT,
            confirmed_source_url TEXT,
            confirmed_observed_at TEXT,
            pending_start TEXT,
            pending_end TEXT,
            pending_confidence INTEGER,
            pending_method TEXT,
            pending_source_url TEXT,
            pending_observed_at TEXT,
            revision INTEGER NOT NULL DEFAULT 0,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Event records keyed by content fingerprint
async fn create_event_records_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS event_records (
            guid TEXT PRIMARY KEY,
            fingerprint TEXT NOT NULL UNIQUE,
            title TEXT NOT NULL,
            venue_name TEXT NOT NULL,
            start_date TEXT NOT NULL,
            end_date TEXT,
            start_time TEXT,
            category TEXT,
            description TEXT,
            ticket_url TEXT,
            image_url TEXT,
            price TEXT,
            source_url TEXT,
            source_name TEXT,
            extraction_method TEXT,
            extraction_confidence INTEGER,
            revision INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_event_records_start_date ON event_records(start_date)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
