//! Storage seams for the reconciler
//!
//! The reconciler only talks to these traits. `SqliteStore` is the
//! production implementation; every write is conditional on the revision
//! the caller read, and a `false` return means the caller lost a race and
//! must re-read.

use crate::error::ReconcileResult;
use crate::models::{EntityProfile, EventRecord, FestivalDateFact};
use crate::types::Priors;
use async_trait::async_trait;
use uuid::Uuid;

pub mod sqlite_store;

pub use sqlite_store::SqliteStore;

/// Event record persistence keyed by fingerprint
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Load the record with this fingerprint, if any
    async fn lookup_by_fingerprint(&self, fingerprint: &str) -> ReconcileResult<Option<EventRecord>>;

    /// Insert a new record
    ///
    /// Returns `false` if a record with the same fingerprint already exists.
    async fn insert_event(&self, record: &EventRecord) -> ReconcileResult<bool>;

    /// Overwrite a record if its stored revision still equals `expected_revision`
    ///
    /// The stored revision is incremented on success.
    async fn update_event(&self, record: &EventRecord, expected_revision: i64) -> ReconcileResult<bool>;
}

/// Entity and festival date fact persistence
#[async_trait]
pub trait FestivalStore: Send + Sync {
    /// Register a new entity; `false` if the slug is already taken
    async fn register_entity(&self, profile: &EntityProfile) -> ReconcileResult<bool>;

    /// Slug, website and priors for an entity
    async fn lookup_entity_profile(&self, entity_id: Uuid) -> ReconcileResult<Option<EntityProfile>>;

    /// Replace an entity's priors; `false` if the entity does not exist
    async fn update_priors(&self, entity_id: Uuid, priors: Priors) -> ReconcileResult<bool>;

    /// Load the fact for an entity; `None` while it has never been written
    async fn load_festival_fact(&self, entity_id: Uuid) -> ReconcileResult<Option<FestivalDateFact>>;

    /// Write a fact if its stored revision still equals `expected_revision`
    ///
    /// Revision 0 means "never written": the row is created instead, and the
    /// write fails if someone else created it first.
    async fn write_festival_fact(&self, fact: &FestivalDateFact, expected_revision: i64) -> ReconcileResult<bool>;
}
