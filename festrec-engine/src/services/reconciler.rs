//! Reconciler
//!
//! Entry points for the batch driver. Each call is one logical transaction
//! per key, implemented optimistically:
//!
//! 1. Read the stored state (and its revision)
//! 2. Decide with the pure components (validator, scorer, gate, merger)
//! 3. Write conditionally on the revision read in step 1
//! 4. On a lost race, start over from step 1
//!
//! After `store.max_write_attempts` lost races the call fails with
//! `ReconcileError::Contention`. SQLite lock errors are retried separately
//! by `retry_on_lock`.

use crate::config::{ReconcileConfig, StoreConfig};
use crate::db::{EventStore, FestivalStore};
use crate::error::{ReconcileError, ReconcileResult};
use crate::models::{DateSlot, EntityProfile, EventCandidate, FestivalDateFact};
use crate::services::confidence_scorer::ConfidenceScorer;
use crate::services::priors_cache::PriorsCache;
use crate::services::promotion_gate::{PromotionDecision, PromotionGate};
use crate::services::record_merger::RecordMerger;
use crate::services::source_classifier::SourceClassifier;
use crate::types::{EventOutcome, ExtractionMethod, FestivalOutcome, Priors};
use crate::utils::retry_on_lock;
use crate::validators::{PlausibilityValidator, Validation};
use chrono::{Datelike, Utc};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Reconciler over a store implementing both storage traits
pub struct Reconciler<S> {
    store: S,
    classifier: SourceClassifier,
    scorer: ConfidenceScorer,
    validator: PlausibilityValidator,
    gate: PromotionGate,
    merger: RecordMerger,
    store_config: StoreConfig,
}

impl<S> Reconciler<S>
where
    S: EventStore + FestivalStore,
{
    /// Build a reconciler from validated configuration
    pub fn new(store: S, config: &ReconcileConfig) -> Self {
        Self {
            store,
            classifier: SourceClassifier::new(&config.sources.aggregator_domains),
            scorer: ConfidenceScorer::new(config.scoring.clone(), config.promotion.confirm_threshold),
            validator: PlausibilityValidator::new(config.validation.clone()),
            gate: PromotionGate::new(config.promotion.clone()),
            merger: RecordMerger::new(),
            store_config: config.store.clone(),
        }
    }

    /// The underlying store
    pub fn store(&self) -> &S {
        &self.store
    }

    // ========================================================================
    // Entity administration
    // ========================================================================

    /// Register a recurring-event entity
    ///
    /// Fails with `InvalidInput` if the slug is already taken or the priors
    /// are out of range.
    pub async fn register_entity(&self, profile: &EntityProfile) -> ReconcileResult<()> {
        if profile.slug.trim().is_empty() {
            return Err(festrec_common::Error::InvalidInput("entity slug is empty".to_string()).into());
        }
        check_priors(&profile.priors)?;

        let created = retry_on_lock("register entity", self.store_config.max_lock_wait_ms, || {
            self.store.register_entity(profile)
        })
        .await?;

        if !created {
            warn!(slug = %profile.slug, "Entity slug already registered");
            return Err(festrec_common::Error::InvalidInput(format!(
                "slug already registered: {}",
                profile.slug
            ))
            .into());
        }

        info!(
            entity_id = %profile.entity_id,
            slug = %profile.slug,
            website = ?profile.website,
            typical_month = ?profile.priors.typical_month,
            typical_duration_days = ?profile.priors.typical_duration_days,
            "Entity registered"
        );
        Ok(())
    }

    /// Replace an entity's priors and drop its cached profile
    pub async fn update_priors(
        &self,
        cache: &mut PriorsCache,
        entity_id: Uuid,
        priors: Priors,
    ) -> ReconcileResult<()> {
        check_priors(&priors)?;

        let updated = retry_on_lock("update priors", self.store_config.max_lock_wait_ms, || {
            self.store.update_priors(entity_id, priors)
        })
        .await?;

        if !updated {
            return Err(ReconcileError::UnknownEntity(entity_id));
        }
        cache.invalidate(entity_id);

        info!(
            entity_id = %entity_id,
            typical_month = ?priors.typical_month,
            typical_duration_days = ?priors.typical_duration_days,
            "Priors updated"
        );
        Ok(())
    }

    // ========================================================================
    // Festival dates
    // ========================================================================

    /// Reconcile one festival date observation for a registered entity
    ///
    /// Implausible candidates are `Rejected` without touching storage.
    /// Plausible ones are scored and passed through the promotion gate.
    pub async fn reconcile_festival_date(
        &self,
        cache: &mut PriorsCache,
        entity_id: Uuid,
        candidate_start: &str,
        candidate_end: Option<&str>,
        method: ExtractionMethod,
        url: &str,
    ) -> ReconcileResult<FestivalOutcome> {
        let profile = cache
            .profile(&self.store, entity_id)
            .await?
            .ok_or(ReconcileError::UnknownEntity(entity_id))?;
        let priors = profile.priors;

        let (start, end) = match self.validator.validate(candidate_start, candidate_end, &priors) {
            Validation::Plausible { start, end } => (start, end),
            Validation::Implausible(reason) => {
                warn!(
                    entity_id = %entity_id,
                    start = candidate_start,
                    end = ?candidate_end,
                    url,
                    reason = %reason,
                    "Festival date rejected"
                );
                return Ok(FestivalOutcome::Rejected { reason });
            }
        };

        let url_class = self
            .classifier
            .classify(url, &profile.slug, profile.website.as_deref());
        let confidence =
            self.scorer
                .compute_confidence(method, url_class, priors.typical_month, Some(start.month()));

        debug!(
            entity_id = %entity_id,
            method = %method,
            url_class = url_class.as_str(),
            confidence,
            threshold = self.gate.confirm_threshold(),
            "Festival date scored"
        );

        let candidate = DateSlot {
            start,
            end,
            confidence,
            method,
            source_url: url.to_string(),
            observed_at: Utc::now(),
        };

        let max_attempts = self.store_config.max_write_attempts;
        for attempt in 1..=max_attempts {
            let fact = retry_on_lock("load festival fact", self.store_config.max_lock_wait_ms, || {
                self.store.load_festival_fact(entity_id)
            })
            .await?
            .unwrap_or_else(|| FestivalDateFact::new(entity_id));

            let (next, outcome) = match self.gate.decide(&fact, &candidate, priors.typical_month) {
                PromotionDecision::Skip(reason) => {
                    debug!(entity_id = %entity_id, reason = ?reason, "Festival date skipped");
                    return Ok(FestivalOutcome::Skipped { reason });
                }
                PromotionDecision::Confirm => (
                    fact.with_confirmed(candidate.clone()),
                    FestivalOutcome::Confirmed { confidence },
                ),
                PromotionDecision::Stage => (
                    fact.with_pending(candidate.clone()),
                    FestivalOutcome::Pending { confidence },
                ),
            };

            let written = retry_on_lock("write festival fact", self.store_config.max_lock_wait_ms, || {
                self.store.write_festival_fact(&next, fact.revision)
            })
            .await?;

            if written {
                info!(
                    entity_id = %entity_id,
                    start = %start,
                    end = %end,
                    confidence,
                    method = %method,
                    outcome = ?outcome,
                    "Festival date written"
                );
                return Ok(outcome);
            }

            warn!(
                entity_id = %entity_id,
                attempt,
                expected_revision = fact.revision,
                "Festival date write lost a race, re-reading"
            );
        }

        error!(entity_id = %entity_id, attempts = max_attempts, "Festival date write contention");
        Err(ReconcileError::Contention {
            key: entity_id.to_string(),
            attempts: max_attempts,
        })
    }

    // ========================================================================
    // Events
    // ========================================================================

    /// Reconcile one event observation
    ///
    /// New fingerprints are inserted; known ones are merged. Re-running the
    /// same observation is `Unchanged`.
    pub async fn reconcile_event(&self, candidate: &EventCandidate) -> ReconcileResult<EventOutcome> {
        let fingerprint = candidate.fingerprint();
        let max_attempts = self.store_config.max_write_attempts;

        for attempt in 1..=max_attempts {
            let existing = retry_on_lock("lookup event", self.store_config.max_lock_wait_ms, || {
                self.store.lookup_by_fingerprint(&fingerprint)
            })
            .await?;

            match existing {
                None => {
                    let record = candidate.clone().into_record();
                    let inserted = retry_on_lock("insert event", self.store_config.max_lock_wait_ms, || {
                        self.store.insert_event(&record)
                    })
                    .await?;

                    if inserted {
                        info!(
                            guid = %record.guid,
                            fingerprint = %fingerprint,
                            title = %record.title,
                            start_date = %record.start_date,
                            "Event inserted"
                        );
                        return Ok(EventOutcome::Inserted);
                    }
                }
                Some(existing) => {
                    let merged = self.merger.merge(&existing, candidate);
                    if merged == existing {
                        debug!(fingerprint = %fingerprint, "Event unchanged");
                        return Ok(EventOutcome::Unchanged);
                    }

                    let updated = retry_on_lock("update event", self.store_config.max_lock_wait_ms, || {
                        self.store.update_event(&merged, existing.revision)
                    })
                    .await?;

                    if updated {
                        info!(guid = %existing.guid, fingerprint = %fingerprint, "Event merged");
                        return Ok(EventOutcome::Merged);
                    }
                }
            }

            warn!(fingerprint = %fingerprint, attempt, "Event write lost a race, re-reading");
        }

        error!(fingerprint = %fingerprint, attempts = max_attempts, "Event write contention");
        Err(ReconcileError::Contention {
            key: fingerprint,
            attempts: max_attempts,
        })
    }
}

fn check_priors(priors: &Priors) -> ReconcileResult<()> {
    if let Some(month) = priors.typical_month {
        if !(1..=12).contains(&month) {
            return Err(festrec_common::Error::InvalidInput(format!(
                "typical month must be 1-12, got {month}"
            ))
            .into());
        }
    }
    if priors.typical_duration_days == Some(0) {
        return Err(festrec_common::Error::InvalidInput(
            "typical duration must be at least one day".to_string(),
        )
        .into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SqliteStore;
    use crate::models::EventRecord;
    use crate::types::{RejectReason, SkipReason};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use festrec_common::db::init_memory_database;
    use std::sync::atomic::{AtomicU32, Ordering};

    async fn reconciler() -> Reconciler<SqliteStore> {
        let store = SqliteStore::new(init_memory_database().await.unwrap());
        Reconciler::new(store, &ReconcileConfig::default())
    }

    #[tokio::test]
    async fn test_unknown_entity_is_error() {
        let reconciler = reconciler().await;
        let mut cache = PriorsCache::new();
        let id = Uuid::new_v4();

        let result = reconciler
            .reconcile_festival_date(&mut cache, id, "2026-10-03", None, ExtractionMethod::JsonLd, "https://x.org")
            .await;
        assert!(matches!(result, Err(ReconcileError::UnknownEntity(e)) if e == id));
    }

    #[tokio::test]
    async fn test_register_rejects_duplicate_slug_and_bad_priors() {
        let reconciler = reconciler().await;
        let profile = EntityProfile::new("harvest-fair", None, Priors::default());
        reconciler.register_entity(&profile).await.unwrap();

        let duplicate = EntityProfile::new("harvest-fair", None, Priors::default());
        assert!(reconciler.register_entity(&duplicate).await.is_err());

        let bad = EntityProfile::new("other-fair", None, Priors::new(13, 2));
        assert!(reconciler.register_entity(&bad).await.is_err());
    }

    #[tokio::test]
    async fn test_rejected_candidate_writes_nothing() {
        let reconciler = reconciler().await;
        let profile = EntityProfile::new("harvest-fair", None, Priors::default());
        reconciler.register_entity(&profile).await.unwrap();
        let mut cache = PriorsCache::new();

        let outcome = reconciler
            .reconcile_festival_date(
                &mut cache,
                profile.entity_id,
                "2026-10-05",
                Some("2026-10-03"),
                ExtractionMethod::JsonLd,
                "https://harvest-fair.org",
            )
            .await
            .unwrap();
        assert_eq!(outcome, FestivalOutcome::Rejected { reason: RejectReason::EndBeforeStart });
        assert_eq!(reconciler.store().load_festival_fact(profile.entity_id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_corroboration_is_skipped() {
        let reconciler = reconciler().await;
        let profile = EntityProfile::new(
            "harvest-fair",
            Some("https://harvest-fair.org".to_string()),
            Priors::new(10, 3),
        );
        reconciler.register_entity(&profile).await.unwrap();
        let mut cache = PriorsCache::new();

        let confirmed = reconciler
            .reconcile_festival_date(
                &mut cache,
                profile.entity_id,
                "2026-10-03",
                Some("2026-10-05"),
                ExtractionMethod::JsonLd,
                "https://harvest-fair.org/visit",
            )
            .await
            .unwrap();
        assert!(matches!(confirmed, FestivalOutcome::Confirmed { .. }));

        let corroborating = reconciler
            .reconcile_festival_date(
                &mut cache,
                profile.entity_id,
                "2026-10-03",
                Some("2026-10-05"),
                ExtractionMethod::SingleDate,
                "https://random-blog.net/post",
            )
            .await
            .unwrap();
        assert_eq!(
            corroborating,
            FestivalOutcome::Skipped { reason: SkipReason::CorroboratesConfirmed }
        );
    }

    /// Event store whose conditional writes always lose
    struct AlwaysStale {
        inner: SqliteStore,
        update_attempts: AtomicU32,
    }

    #[async_trait]
    impl EventStore for AlwaysStale {
        async fn lookup_by_fingerprint(&self, fingerprint: &str) -> ReconcileResult<Option<EventRecord>> {
            self.inner.lookup_by_fingerprint(fingerprint).await
        }

        async fn insert_event(&self, record: &EventRecord) -> ReconcileResult<bool> {
            self.inner.insert_event(record).await
        }

        async fn update_event(&self, _record: &EventRecord, _expected_revision: i64) -> ReconcileResult<bool> {
            self.update_attempts.fetch_add(1, Ordering::SeqCst);
            Ok(false)
        }
    }

    #[async_trait]
    impl FestivalStore for AlwaysStale {
        async fn register_entity(&self, profile: &EntityProfile) -> ReconcileResult<bool> {
            self.inner.register_entity(profile).await
        }

        async fn lookup_entity_profile(&self, entity_id: Uuid) -> ReconcileResult<Option<EntityProfile>> {
            self.inner.lookup_entity_profile(entity_id).await
        }

        async fn update_priors(&self, entity_id: Uuid, priors: Priors) -> ReconcileResult<bool> {
            self.inner.update_priors(entity_id, priors).await
        }

        async fn load_festival_fact(&self, entity_id: Uuid) -> ReconcileResult<Option<FestivalDateFact>> {
            self.inner.load_festival_fact(entity_id).await
        }

        async fn write_festival_fact(&self, _fact: &FestivalDateFact, _expected_revision: i64) -> ReconcileResult<bool> {
            Ok(false)
        }
    }

    #[tokio::test]
    async fn test_contention_after_max_attempts() {
        let store = AlwaysStale {
            inner: SqliteStore::new(init_memory_database().await.unwrap()),
            update_attempts: AtomicU32::new(0),
        };
        let reconciler = Reconciler::new(store, &ReconcileConfig::default());

        let date = NaiveDate::from_ymd_opt(2026, 10, 3).unwrap();
        let candidate = EventCandidate::new("Harvest Fair", "Town Green", date);
        assert_eq!(reconciler.reconcile_event(&candidate).await.unwrap(), EventOutcome::Inserted);

        let mut update = candidate.clone();
        update.price = Some("$5".to_string());
        let result = reconciler.reconcile_event(&update).await;
        assert!(matches!(result, Err(ReconcileError::Contention { attempts: 5, .. })));
        assert_eq!(reconciler.store().update_attempts.load(Ordering::SeqCst), 5);

        let profile = EntityProfile::new("harvest-fair", None, Priors::default());
        reconciler.register_entity(&profile).await.unwrap();
        let mut cache = PriorsCache::new();
        let result = reconciler
            .reconcile_festival_date(&mut cache, profile.entity_id, "2026-10-03", None, ExtractionMethod::JsonLd, "https://x.org")
            .await;
        assert!(matches!(result, Err(ReconcileError::Contention { attempts: 5, .. })));
    }
}
