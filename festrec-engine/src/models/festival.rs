//! Festival date facts
//!
//! One fact per recurring-event entity, holding at most one confirmed and
//! at most one pending start/end date.

use crate::services::date_patterns::extract_date_candidate;
use crate::types::{ExtractionMethod, Priors};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A start/end date pair plus the evidence that produced it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateSlot {
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// 0-100
    pub confidence: u8,
    pub method: ExtractionMethod,
    pub source_url: String,
    pub observed_at: DateTime<Utc>,
}

impl DateSlot {
    /// True if both slots name the same start and end dates
    pub fn same_dates(&self, other: &DateSlot) -> bool {
        self.start == other.start && self.end == other.end
    }
}

/// Lifecycle state of a festival date fact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactState {
    /// Neither slot populated
    Unknown,
    /// Only a pending value
    Pending,
    /// A confirmed value (a pending value may also be staged)
    Confirmed,
}

/// Stored festival date fact for one entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FestivalDateFact {
    pub entity_id: Uuid,
    pub confirmed: Option<DateSlot>,
    pub pending: Option<DateSlot>,
    /// Incremented on every write; conditional writes compare against it
    pub revision: i64,
}

impl FestivalDateFact {
    /// Fresh fact in the `Unknown` state
    pub fn new(entity_id: Uuid) -> Self {
        Self {
            entity_id,
            confirmed: None,
            pending: None,
            revision: 0,
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> FactState {
        match (&self.confirmed, &self.pending) {
            (Some(_), _) => FactState::Confirmed,
            (None, Some(_)) => FactState::Pending,
            (None, None) => FactState::Unknown,
        }
    }

    /// Copy with `slot` confirmed and pending cleared
    pub fn with_confirmed(&self, slot: DateSlot) -> Self {
        Self {
            entity_id: self.entity_id,
            confirmed: Some(slot),
            pending: None,
            revision: self.revision,
        }
    }

    /// Copy with `slot` staged as pending; confirmed untouched
    pub fn with_pending(&self, slot: DateSlot) -> Self {
        Self {
            entity_id: self.entity_id,
            confirmed: self.confirmed.clone(),
            pending: Some(slot),
            revision: self.revision,
        }
    }
}

/// Registered recurring-event entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityProfile {
    pub entity_id: Uuid,
    /// URL-style short name, e.g. `harvest-fair`
    pub slug: String,
    /// The entity's own website, if known
    pub website: Option<String>,
    pub priors: Priors,
}

impl EntityProfile {
    /// New profile with a random id
    pub fn new(slug: impl Into<String>, website: Option<String>, priors: Priors) -> Self {
        Self {
            entity_id: Uuid::new_v4(),
            slug: slug.into(),
            website,
            priors,
        }
    }
}

/// Festival date observation as produced by an external parser
///
/// Either explicit `start`/`end` strings (structured sources) or free
/// `text` to run through the fixed date patterns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawFestivalObservation {
    pub entity_id: Uuid,
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub text: Option<String>,
}

/// Observation reduced to what `reconcile_festival_date` takes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FestivalDateCandidate {
    pub entity_id: Uuid,
    pub start: String,
    pub end: Option<String>,
    pub method: ExtractionMethod,
    pub url: String,
}

impl RawFestivalObservation {
    /// Resolve into a candidate, or `None` when no date can be recovered
    ///
    /// Explicit dates win over `text`. Dates recovered from text carry the
    /// method of the pattern that matched; the parser's tag is ignored there.
    pub fn into_candidate(self) -> Option<FestivalDateCandidate> {
        if let Some(start) = self.start.filter(|s| !s.trim().is_empty()) {
            return Some(FestivalDateCandidate {
                entity_id: self.entity_id,
                start,
                end: self.end.filter(|s| !s.trim().is_empty()),
                method: self
                    .method
                    .as_deref()
                    .map(ExtractionMethod::from_tag)
                    .unwrap_or(ExtractionMethod::Unknown),
                url: self.url,
            });
        }

        let found = extract_date_candidate(self.text.as_deref()?)?;
        Some(FestivalDateCandidate {
            entity_id: self.entity_id,
            start: found.start.format("%Y-%m-%d").to_string(),
            end: found.end.map(|d| d.format("%Y-%m-%d").to_string()),
            method: found.method,
            url: self.url,
        })
    }
}
