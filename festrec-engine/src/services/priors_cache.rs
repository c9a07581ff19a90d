//! Batch-scoped entity profile cache
//!
//! One batch looks up the same entity many times. Profiles (slug, website,
//! priors) are loaded once per batch and dropped with the cache; a priors
//! update inside the batch must `invalidate` the entry.

use crate::db::FestivalStore;
use crate::error::ReconcileResult;
use crate::models::EntityProfile;
use std::collections::HashMap;
use uuid::Uuid;

/// Entity profiles loaded so far in this batch
#[derive(Debug, Default)]
pub struct PriorsCache {
    profiles: HashMap<Uuid, EntityProfile>,
}

impl PriorsCache {
    /// Empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Profile for `entity_id`, loading it from `store` on first use
    ///
    /// Misses are not cached, so an entity registered mid-batch is found on
    /// its next lookup.
    pub async fn profile<S>(&mut self, store: &S, entity_id: Uuid) -> ReconcileResult<Option<EntityProfile>>
    where
        S: FestivalStore + ?Sized,
    {
        if let Some(cached) = self.profiles.get(&entity_id) {
            return Ok(Some(cached.clone()));
        }

        let loaded = store.lookup_entity_profile(entity_id).await?;
        tracing::debug!(
            entity_id = %entity_id,
            found = loaded.is_some(),
            "Entity profile loaded"
        );
        if let Some(profile) = &loaded {
            self.profiles.insert(entity_id, profile.clone());
        }
        Ok(loaded)
    }

    /// Forget a cached profile
    pub fn invalidate(&mut self, entity_id: Uuid) {
        self.profiles.remove(&entity_id);
    }

    /// Number of cached profiles
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}
