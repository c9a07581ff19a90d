//! Promotion Gate
//!
//! State machine over a festival date fact:
//!
//! ```text
//! unknown ──► pending ──► confirmed
//!    │           ▲ │          ▲ │
//!    │           └─┘          └─┘
//!    └────────────────────────┘
//!   (pending replace)   (confirmed replace-if-better)
//! ```
//!
//! A candidate is *promotable* when its confidence reaches the threshold
//! and its month agrees with the typical month (no typical month on file
//! counts as agreement). Only promotable candidates ever touch the
//! confirmed slot, and only when they dominate what is there.

use crate::config::PromotionConfig;
use crate::models::{DateSlot, FestivalDateFact};
use crate::types::{month_distance, ExtractionMethod, SkipReason};
use chrono::Datelike;
use tracing::debug;

/// Should a new observation replace an existing one?
///
/// True when there is no existing value, when the new confidence is
/// strictly higher, or when confidences tie and the new method ranks
/// strictly higher. Ties on both never replace, so two equally weak
/// sources cannot flap a value back and forth.
pub fn should_update(
    existing: Option<(ExtractionMethod, u8)>,
    new_method: ExtractionMethod,
    new_confidence: u8,
) -> bool {
    match existing {
        None => true,
        Some((existing_method, existing_confidence)) => {
            new_confidence > existing_confidence
                || (new_confidence == existing_confidence
                    && new_method.rank() > existing_method.rank())
        }
    }
}

/// What the gate decided for one validated candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromotionDecision {
    /// Write to confirmed and clear pending
    Confirm,
    /// Write to pending; confirmed untouched
    Stage,
    /// No write
    Skip(SkipReason),
}

/// Promotion Gate
pub struct PromotionGate {
    config: PromotionConfig,
}

impl PromotionGate {
    /// Create gate with the given threshold and month tolerance
    pub fn new(config: PromotionConfig) -> Self {
        Self { config }
    }

    /// Confidence needed for the confirmed slot
    pub fn confirm_threshold(&self) -> u8 {
        self.config.confirm_threshold
    }

    /// True if `candidate` may enter the confirmed slot at all
    pub fn is_promotable(&self, candidate: &DateSlot, typical_month: Option<u32>) -> bool {
        candidate.confidence >= self.config.confirm_threshold
            && self.month_agrees(candidate.start.month(), typical_month)
    }

    fn month_agrees(&self, month: u32, typical_month: Option<u32>) -> bool {
        match typical_month {
            None => true,
            Some(typical) => month_distance(month, typical)
                .is_some_and(|d| d <= self.config.month_agreement_tolerance),
        }
    }

    /// Decide what to do with a candidate that already passed validation
    pub fn decide(
        &self,
        fact: &FestivalDateFact,
        candidate: &DateSlot,
        typical_month: Option<u32>,
    ) -> PromotionDecision {
        let promotable = self.is_promotable(candidate, typical_month);

        let decision = if promotable {
            let confirmed = fact.confirmed.as_ref().map(|c| (c.method, c.confidence));
            if should_update(confirmed, candidate.method, candidate.confidence) {
                PromotionDecision::Confirm
            } else {
                PromotionDecision::Skip(SkipReason::ConfirmedDominates)
            }
        } else if fact
            .confirmed
            .as_ref()
            .is_some_and(|confirmed| confirmed.same_dates(candidate))
        {
            PromotionDecision::Skip(SkipReason::CorroboratesConfirmed)
        } else {
            let pending = fact.pending.as_ref().map(|p| (p.method, p.confidence));
            if should_update(pending, candidate.method, candidate.confidence) {
                PromotionDecision::Stage
            } else {
                PromotionDecision::Skip(SkipReason::PendingDominates)
            }
        };

        debug!(
            entity_id = %fact.entity_id,
            state = ?fact.state(),
            confidence = candidate.confidence,
            method = %candidate.method,
            promotable,
            decision = ?decision,
            "Promotion gate decision"
        );

        decision
    }
}

impl Default for PromotionGate {
    fn default() -> Self {
        Self::new(PromotionConfig::default())
    }
}
