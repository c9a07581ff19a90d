//! SQLite-backed store
//!
//! **[Storage]** `entities`, `festival_dates` and `event_records` tables
//! created by `festrec_common::db::create_schema`.

use super::{EventStore, FestivalStore};
use crate::error::{ReconcileError, ReconcileResult};
use crate::models::{DateSlot, EntityProfile, EventRecord, FestivalDateFact};
use crate::types::{ExtractionMethod, Priors};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S";

/// Store implementation over a sqlx SQLite pool
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Wrap an initialized pool (see `festrec_common::db::init_database`)
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Underlying pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

// ============================================================================
// Column codecs
// ============================================================================

fn corrupt(column: &str, value: &str) -> ReconcileError {
    ReconcileError::CorruptRow(format!("{column}: {value:?}"))
}

fn decode_uuid(row: &SqliteRow, column: &str) -> ReconcileResult<Uuid> {
    let raw: String = row.try_get(column)?;
    Uuid::parse_str(&raw).map_err(|_| corrupt(column, &raw))
}

fn decode_date(row: &SqliteRow, column: &str) -> ReconcileResult<Option<NaiveDate>> {
    let raw: Option<String> = row.try_get(column)?;
    raw.map(|s| NaiveDate::parse_from_str(&s, DATE_FORMAT).map_err(|_| corrupt(column, &s)))
        .transpose()
}

fn decode_time(row: &SqliteRow, column: &str) -> ReconcileResult<Option<NaiveTime>> {
    let raw: Option<String> = row.try_get(column)?;
    raw.map(|s| NaiveTime::parse_from_str(&s, TIME_FORMAT).map_err(|_| corrupt(column, &s)))
        .transpose()
}

fn decode_timestamp(row: &SqliteRow, column: &str) -> ReconcileResult<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.try_get(column)?;
    raw.map(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|_| corrupt(column, &s))
    })
    .transpose()
}

fn decode_small(row: &SqliteRow, column: &str, max: i64) -> ReconcileResult<Option<u32>> {
    let raw: Option<i64> = row.try_get(column)?;
    raw.map(|v| {
        if (0..=max).contains(&v) {
            Ok(v as u32)
        } else {
            Err(corrupt(column, &v.to_string()))
        }
    })
    .transpose()
}

fn decode_confidence(row: &SqliteRow, column: &str) -> ReconcileResult<Option<u8>> {
    Ok(decode_small(row, column, 100)?.map(|v| v as u8))
}

fn decode_method(row: &SqliteRow, column: &str) -> ReconcileResult<Option<ExtractionMethod>> {
    let raw: Option<String> = row.try_get(column)?;
    Ok(raw.as_deref().map(ExtractionMethod::from_tag))
}

fn encode_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Decode a `confirmed_*` or `pending_*` column group
fn decode_slot(row: &SqliteRow, prefix: &str) -> ReconcileResult<Option<DateSlot>> {
    let column = |name: &str| format!("{prefix}_{name}");

    let Some(start) = decode_date(row, &column("start"))? else {
        return Ok(None);
    };
    let end = decode_date(row, &column("end"))?.unwrap_or(start);
    let confidence = decode_confidence(row, &column("confidence"))?.unwrap_or(0);
    let method = decode_method(row, &column("method"))?.unwrap_or(ExtractionMethod::Unknown);
    let source_url: Option<String> = row.try_get(column("source_url").as_str())?;
    let observed_at = decode_timestamp(row, &column("observed_at"))?.unwrap_or_else(Utc::now);

    Ok(Some(DateSlot {
        start,
        end,
        confidence,
        method,
        source_url: source_url.unwrap_or_default(),
        observed_at,
    }))
}

/// Bind order: start, end, confidence, method, source_url, observed_at
struct SlotColumns {
    start: Option<String>,
    end: Option<String>,
    confidence: Option<i64>,
    method: Option<&'static str>,
    source_url: Option<String>,
    observed_at: Option<String>,
}

impl SlotColumns {
    fn from_slot(slot: Option<&DateSlot>) -> Self {
        Self {
            start: slot.map(|s| encode_date(s.start)),
            end: slot.map(|s| encode_date(s.end)),
            confidence: slot.map(|s| i64::from(s.confidence)),
            method: slot.map(|s| s.method.as_tag()),
            source_url: slot.map(|s| s.source_url.clone()),
            observed_at: slot.map(|s| s.observed_at.to_rfc3339()),
        }
    }
}

fn decode_event(row: &SqliteRow) -> ReconcileResult<EventRecord> {
    let start_date = decode_date(row, "start_date")?
        .ok_or_else(|| ReconcileError::CorruptRow("start_date: NULL".to_string()))?;

    Ok(EventRecord {
        guid: decode_uuid(row, "guid")?,
        fingerprint: row.try_get("fingerprint")?,
        title: row.try_get("title")?,
        venue_name: row.try_get("venue_name")?,
        start_date,
        end_date: decode_date(row, "end_date")?,
        start_time: decode_time(row, "start_time")?,
        category: row.try_get("category")?,
        description: row.try_get("description")?,
        ticket_url: row.try_get("ticket_url")?,
        image_url: row.try_get("image_url")?,
        price: row.try_get("price")?,
        source_url: row.try_get("source_url")?,
        source_name: row.try_get("source_name")?,
        extraction_method: decode_method(row, "extraction_method")?,
        extraction_confidence: decode_confidence(row, "extraction_confidence")?,
        revision: row.try_get("revision")?,
    })
}

// ============================================================================
// Events
// ============================================================================

#[async_trait]
impl EventStore for SqliteStore {
    async fn lookup_by_fingerprint(&self, fingerprint: &str) -> ReconcileResult<Option<EventRecord>> {
        let row = sqlx::query(
            r#"
            SELECT guid, fingerprint, title, venue_name, start_date, end_date, start_time,
                   category, description, ticket_url, image_url, price, source_url,
                   source_name, extraction_method, extraction_confidence, revision
            FROM event_records
            WHERE fingerprint = ?
            "#,
        )
        .bind(fingerprint)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(decode_event).transpose()
    }

    async fn insert_event(&self, record: &EventRecord) -> ReconcileResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO event_records (
                guid, fingerprint, title, venue_name, start_date, end_date, start_time,
                category, description, ticket_url, image_url, price, source_url,
                source_name, extraction_method, extraction_confidence, revision,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
            ON CONFLICT(fingerprint) DO NOTHING
            "#,
        )
        .bind(record.guid.to_string())
        .bind(&record.fingerprint)
        .bind(&record.title)
        .bind(&record.venue_name)
        .bind(encode_date(record.start_date))
        .bind(record.end_date.map(encode_date))
        .bind(record.start_time.map(|t| t.format(TIME_FORMAT).to_string()))
        .bind(&record.category)
        .bind(&record.description)
        .bind(&record.ticket_url)
        .bind(&record.image_url)
        .bind(&record.price)
        .bind(&record.source_url)
        .bind(&record.source_name)
        .bind(record.extraction_method.map(ExtractionMethod::as_tag))
        .bind(record.extraction_confidence.map(i64::from))
        .bind(record.revision)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn update_event(&self, record: &EventRecord, expected_revision: i64) -> ReconcileResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE event_records
            SET end_date = ?,
                start_time = ?,
                category = ?,
                description = ?,
                ticket_url = ?,
                image_url = ?,
                price = ?,
                source_url = ?,
                source_name = ?,
                extraction_method = ?,
                extraction_confidence = ?,
                revision = revision + 1,
                updated_at = CURRENT_TIMESTAMP
            WHERE guid = ? AND revision = ?
            "#,
        )
        .bind(record.end_date.map(encode_date))
        .bind(record.start_time.map(|t| t.format(TIME_FORMAT).to_string()))
        .bind(&record.category)
        .bind(&record.description)
        .bind(&record.ticket_url)
        .bind(&record.image_url)
        .bind(&record.price)
        .bind(&record.source_url)
        .bind(&record.source_name)
        .bind(record.extraction_method.map(ExtractionMethod::as_tag))
        .bind(record.extraction_confidence.map(i64::from))
        .bind(record.guid.to_string())
        .bind(expected_revision)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}

// ============================================================================
// Entities and festival dates
// ============================================================================

#[async_trait]
impl FestivalStore for SqliteStore {
    async fn register_entity(&self, profile: &EntityProfile) -> ReconcileResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO entities (guid, slug, website, typical_month, typical_duration_days, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(profile.entity_id.to_string())
        .bind(&profile.slug)
        .bind(&profile.website)
        .bind(profile.priors.typical_month.map(i64::from))
        .bind(profile.priors.typical_duration_days.map(i64::from))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn lookup_entity_profile(&self, entity_id: Uuid) -> ReconcileResult<Option<EntityProfile>> {
        let row = sqlx::query(
            "SELECT guid, slug, website, typical_month, typical_duration_days FROM entities WHERE guid = ?",
        )
        .bind(entity_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(EntityProfile {
                entity_id: decode_uuid(&row, "guid")?,
                slug: row.try_get("slug")?,
                website: row.try_get("website")?,
                priors: Priors {
                    typical_month: decode_small(&row, "typical_month", 12)?,
                    typical_duration_days: decode_small(&row, "typical_duration_days", i64::from(u32::MAX))?,
                },
            })),
            None => Ok(None),
        }
    }

    async fn update_priors(&self, entity_id: Uuid, priors: Priors) -> ReconcileResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE entities
            SET typical_month = ?, typical_duration_days = ?, updated_at = CURRENT_TIMESTAMP
            WHERE guid = ?
            "#,
        )
        .bind(priors.typical_month.map(i64::from))
        .bind(priors.typical_duration_days.map(i64::from))
        .bind(entity_id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn load_festival_fact(&self, entity_id: Uuid) -> ReconcileResult<Option<FestivalDateFact>> {
        let row = sqlx::query(
            r#"
            SELECT entity_id,
                   confirmed_start, confirmed_end, confirmed_confidence, confirmed_method,
                   confirmed_source_url, confirmed_observed_at,
                   pending_start, pending_end, pending_confidence, pending_method,
                   pending_source_url, pending_observed_at,
                   revision
            FROM festival_dates
            WHERE entity_id = ?
            "#,
        )
        .bind(entity_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(FestivalDateFact {
                entity_id: decode_uuid(&row, "entity_id")?,
                confirmed: decode_slot(&row, "confirmed")?,
                pending: decode_slot(&row, "pending")?,
                revision: row.try_get("revision")?,
            })),
            None => Ok(None),
        }
    }

    async fn write_festival_fact(&self, fact: &FestivalDateFact, expected_revision: i64) -> ReconcileResult<bool> {
        let confirmed = SlotColumns::from_slot(fact.confirmed.as_ref());
        let pending = SlotColumns::from_slot(fact.pending.as_ref());

        let query = if expected_revision == 0 {
            sqlx::query(
                r#"
                INSERT INTO festival_dates (
                    confirmed_start, confirmed_end, confirmed_confidence, confirmed_method,
                    confirmed_source_url, confirmed_observed_at,
                    pending_start, pending_end, pending_confidence, pending_method,
                    pending_source_url, pending_observed_at,
                    entity_id, revision, updated_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 1, CURRENT_TIMESTAMP)
                ON CONFLICT(entity_id) DO NOTHING
                "#,
            )
        } else {
            sqlx::query(
                r#"
                UPDATE festival_dates
                SET confirmed_start = ?, confirmed_end = ?, confirmed_confidence = ?,
                    confirmed_method = ?, confirmed_source_url = ?, confirmed_observed_at = ?,
                    pending_start = ?, pending_end = ?, pending_confidence = ?,
                    pending_method = ?, pending_source_url = ?, pending_observed_at = ?,
                    revision = revision + 1,
                    updated_at = CURRENT_TIMESTAMP
                WHERE entity_id = ? AND revision = ?
                "#,
            )
        };

        let mut query = query;
        for slot in [confirmed, pending] {
            query = query
                .bind(slot.start)
                .bind(slot.end)
                .bind(slot.confidence)
                .bind(slot.method)
                .bind(slot.source_url)
                .bind(slot.observed_at);
        }
        query = query.bind(fact.entity_id.to_string());
        if expected_revision != 0 {
            query = query.bind(expected_revision);
        }

        let result = query.execute(&self.pool).await?;
        Ok(result.rows_affected() == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EventCandidate;
    use festrec_common::db::init_memory_database;

    async fn store() -> SqliteStore {
        SqliteStore::new(init_memory_database().await.unwrap())
    }

    fn slot(start: &str, end: &str, confidence: u8) -> DateSlot {
        DateSlot {
            start: NaiveDate::parse_from_str(start, DATE_FORMAT).unwrap(),
            end: NaiveDate::parse_from_str(end, DATE_FORMAT).unwrap(),
            confidence,
            method: ExtractionMethod::JsonLd,
            source_url: "https://harvestfair.org/".to_string(),
            observed_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_event_insert_lookup_update() {
        let store = store().await;
        let mut candidate = EventCandidate::new(
            "Harvest Fair",
            "Town Green",
            NaiveDate::from_ymd_opt(2026, 10, 3).unwrap(),
        );
        candidate.start_time = NaiveTime::from_hms_opt(19, 30, 0);
        candidate.extraction_method = Some(ExtractionMethod::MetaTag);
        let record = candidate.into_record();

        assert!(store.insert_event(&record).await.unwrap());
        assert!(!store.insert_event(&record).await.unwrap(), "duplicate fingerprint");

        let loaded = store.lookup_by_fingerprint(&record.fingerprint).await.unwrap().unwrap();
        assert_eq!(loaded, record);

        let mut changed = loaded.clone();
        changed.price = Some("$5".to_string());
        assert!(store.update_event(&changed, 0).await.unwrap());
        assert!(!store.update_event(&changed, 0).await.unwrap(), "stale revision");

        let reloaded = store.lookup_by_fingerprint(&record.fingerprint).await.unwrap().unwrap();
        assert_eq!(reloaded.price.as_deref(), Some("$5"));
        assert_eq!(reloaded.revision, 1);
    }

    #[tokio::test]
    async fn test_entity_registration_and_priors() {
        let store = store().await;
        let profile = EntityProfile::new("harvest-fair", None, Priors::default());

        assert!(store.register_entity(&profile).await.unwrap());
        let duplicate = EntityProfile::new("harvest-fair", None, Priors::default());
        assert!(!store.register_entity(&duplicate).await.unwrap());

        assert!(store.update_priors(profile.entity_id, Priors::new(10, 3)).await.unwrap());
        assert!(!store.update_priors(Uuid::new_v4(), Priors::new(10, 3)).await.unwrap());

        let loaded = store.lookup_entity_profile(profile.entity_id).await.unwrap().unwrap();
        assert_eq!(loaded.slug, "harvest-fair");
        assert_eq!(loaded.priors, Priors::new(10, 3));
    }

    #[tokio::test]
    async fn test_festival_fact_conditional_writes() {
        let store = store().await;
        let profile = EntityProfile::new("harvest-fair", None, Priors::default());
        store.register_entity(&profile).await.unwrap();

        assert_eq!(store.load_festival_fact(profile.entity_id).await.unwrap(), None);

        let fact = FestivalDateFact::new(profile.entity_id).with_pending(slot("2026-10-03", "2026-10-05", 40));
        assert!(store.write_festival_fact(&fact, 0).await.unwrap());
        assert!(!store.write_festival_fact(&fact, 0).await.unwrap(), "row already created");

        let loaded = store.load_festival_fact(profile.entity_id).await.unwrap().unwrap();
        assert_eq!(loaded.revision, 1);
        assert_eq!(loaded.pending.as_ref().unwrap().end, NaiveDate::from_ymd_opt(2026, 10, 5).unwrap());
        assert!(loaded.confirmed.is_none());

        let promoted = loaded.with_confirmed(slot("2026-10-03", "2026-10-05", 90));
        assert!(store.write_festival_fact(&promoted, 1).await.unwrap());
        assert!(!store.write_festival_fact(&promoted, 1).await.unwrap(), "stale revision");

        let loaded = store.load_festival_fact(profile.entity_id).await.unwrap().unwrap();
        assert_eq!(loaded.revision, 2);
        assert_eq!(loaded.confirmed.as_ref().unwrap().confidence, 90);
        assert_eq!(loaded.confirmed.as_ref().unwrap().method, ExtractionMethod::JsonLd);
        assert!(loaded.pending.is_none());
    }
}
