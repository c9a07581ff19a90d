//! Confidence Scorer
//!
//! Combines extraction method tier, source trust class and agreement with
//! the entity's typical month into a single 0-100 score.
//!
//! # Scoring
//! ```text
//! score = tier_base(method)
//!       + url_adjustment(url_class)
//!       + month_adjustment(prior_month, extracted_month)
//! ```
//! - Month adjustment is skipped when either month is absent.
//! - Months more than one apart take a penalty and are capped just below the
//!   confirmation threshold, so a disagreeing month can never confirm.
//! - Result is clamped to [0, 100].
//!
//! Holding everything else fixed, a better tier or url class never lowers
//! the score (enforced for custom curves by `ReconcileConfig::validate`).

use crate::config::ScoringConfig;
use crate::types::{month_distance, ExtractionMethod, UrlClass};
use tracing::debug;

/// Confidence Scorer
pub struct ConfidenceScorer {
    scoring: ScoringConfig,
    /// Scores for month-disagreeing candidates are capped at `confirm_threshold - 1`
    confirm_threshold: u8,
}

impl ConfidenceScorer {
    /// Create scorer with a scoring curve and the promotion threshold it caps against
    pub fn new(scoring: ScoringConfig, confirm_threshold: u8) -> Self {
        Self {
            scoring,
            confirm_threshold,
        }
    }

    /// Compute confidence for one observation
    ///
    /// Months must be 1..=12. Out-of-range months are a caller bug: debug
    /// builds panic, release builds skip the month adjustment.
    pub fn compute_confidence(
        &self,
        method: ExtractionMethod,
        url_class: UrlClass,
        prior_month: Option<u32>,
        extracted_month: Option<u32>,
    ) -> u8 {
        let base = self.scoring.base_for_tier(method.rank());

        let url_adjustment = match url_class {
            UrlClass::Official => self.scoring.official_adjustment,
            UrlClass::Secondary => self.scoring.secondary_adjustment,
            UrlClass::Unknown => self.scoring.unknown_adjustment,
        };

        let mut score = base + url_adjustment;
        let mut cap = 100;

        if let (Some(prior), Some(extracted)) = (prior_month, extracted_month) {
            let distance = month_distance(prior, extracted);
            debug_assert!(
                distance.is_some(),
                "month out of range: prior={} extracted={}",
                prior,
                extracted
            );

            match distance {
                Some(0) => score += self.scoring.month_exact_bonus,
                Some(1) => score += self.scoring.month_adjacent_bonus,
                Some(_) => {
                    score -= self.scoring.month_mismatch_penalty;
                    cap = i32::from(self.confirm_threshold) - 1;
                }
                None => {}
            }
        }

        let confidence = score.min(cap).clamp(0, 100) as u8;

        debug!(
            method = %method,
            url_class = %url_class,
            prior_month = ?prior_month,
            extracted_month = ?extracted_month,
            confidence,
            "Computed confidence"
        );

        confidence
    }
}
