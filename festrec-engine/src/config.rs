//! Configuration for festrec-engine
//!
//! Every tunable number in the pipeline lives here with its default.
//! `ReconcileConfig::validate` guards the properties callers rely on:
//! scoring stays monotonic in method tier and URL trust, and thresholds
//! stay inside the 0-100 confidence scale.

use festrec_common::config::{load_toml_file, LoggingConfig};
use festrec_common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level TOML file layout
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FestrecConfig {
    /// SQLite database location (overridden by CLI/env)
    pub database_path: Option<PathBuf>,
    pub logging: LoggingConfig,
    #[serde(flatten)]
    pub reconcile: ReconcileConfig,
}

impl FestrecConfig {
    /// Load from an optional path and validate the reconcile section
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config: FestrecConfig = load_toml_file(path)?;
        config.reconcile.validate()?;
        Ok(config)
    }
}

/// All reconciliation tunables
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    pub scoring: ScoringConfig,
    pub promotion: PromotionConfig,
    pub validation: ValidationConfig,
    pub store: StoreConfig,
    pub sources: SourcesConfig,
}

/// Confidence curve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub tier5_base: i32,
    pub tier4_base: i32,
    pub tier3_base: i32,
    pub tier2_base: i32,
    pub tier1_base: i32,
    pub tier0_base: i32,
    pub official_adjustment: i32,
    pub secondary_adjustment: i32,
    pub unknown_adjustment: i32,
    /// Bonus when extracted month equals the typical month
    pub month_exact_bonus: i32,
    /// Bonus when extracted month is one month off (circularly)
    pub month_adjacent_bonus: i32,
    /// Penalty when months disagree by more than one
    pub month_mismatch_penalty: i32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            tier5_base: 92,
            tier4_base: 80,
            tier3_base: 65,
            tier2_base: 50,
            tier1_base: 35,
            tier0_base: 15,
            official_adjustment: 15,
            secondary_adjustment: 0,
            unknown_adjustment: -5,
            month_exact_bonus: 15,
            month_adjacent_bonus: 8,
            month_mismatch_penalty: 20,
        }
    }
}

impl ScoringConfig {
    /// Base score for a method trust tier
    pub fn base_for_tier(&self, tier: u8) -> i32 {
        match tier {
            0 => self.tier0_base,
            1 => self.tier1_base,
            2 => self.tier2_base,
            3 => self.tier3_base,
            4 => self.tier4_base,
            _ => self.tier5_base,
        }
    }
}

/// Promotion gate thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromotionConfig {
    /// Minimum confidence for the confirmed slot
    pub confirm_threshold: u8,
    /// Max circular month distance that counts as agreement
    pub month_agreement_tolerance: u32,
}

impl Default for PromotionConfig {
    fn default() -> Self {
        Self {
            confirm_threshold: 70,
            month_agreement_tolerance: 1,
        }
    }
}

/// Plausibility validator tolerances
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Allowed span is `ceil(typical_duration_days * factor)`
    pub duration_tolerance_factor: f64,
    /// Max circular distance from the typical month before rejection
    pub month_tolerance: u32,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            duration_tolerance_factor: 2.0,
            month_tolerance: 2,
        }
    }
}

/// Store write behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Read-decide-write cycles before giving up on a contended key
    pub max_write_attempts: u32,
    /// Total time to keep retrying "database is locked"
    pub max_lock_wait_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_write_attempts: 5,
            max_lock_wait_ms: 5000,
        }
    }
}

/// Source classification lists
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// Third-party listing domains (subdomains match too)
    pub aggregator_domains: Vec<String>,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            aggregator_domains: [
                "everfest.com",
                "fest300.com",
                "festivalnet.com",
                "eventbrite.com",
                "allevents.in",
                "songkick.com",
                "bandsintown.com",
                "ticketmaster.com",
                "livenation.com",
                "facebook.com",
                "tripadvisor.com",
                "timeout.com",
                "patch.com",
                "eventful.com",
            ]
            .iter()
            .map(|d| d.to_string())
            .collect(),
        }
    }
}

impl ReconcileConfig {
    /// Reject configurations that would break scoring monotonicity or thresholds
    pub fn validate(&self) -> Result<()> {
        let s = &self.scoring;
        let bases = [
            s.tier5_base,
            s.tier4_base,
            s.tier3_base,
            s.tier2_base,
            s.tier1_base,
            s.tier0_base,
        ];

        if bases.iter().any(|b| !(0..=100).contains(b)) {
            return Err(Error::Config(format!(
                "scoring tier bases must be within 0..=100, got {:?}",
                bases
            )));
        }
        if bases.windows(2).any(|w| w[0] < w[1]) {
            return Err(Error::Config(format!(
                "scoring tier bases must not increase as trust tier decreases, got {:?}",
                bases
            )));
        }
        if s.official_adjustment < s.secondary_adjustment
            || s.secondary_adjustment < s.unknown_adjustment
        {
            return Err(Error::Config(format!(
                "url adjustments must satisfy official >= secondary >= unknown, got {} / {} / {}",
                s.official_adjustment, s.secondary_adjustment, s.unknown_adjustment
            )));
        }
        if s.month_exact_bonus < s.month_adjacent_bonus
            || s.month_adjacent_bonus < 0
            || s.month_mismatch_penalty < 0
        {
            return Err(Error::Config(
                "month bonuses must satisfy exact >= adjacent >= 0 and penalty >= 0".to_string(),
            ));
        }

        let threshold = self.promotion.confirm_threshold;
        if !(1..=100).contains(&threshold) {
            return Err(Error::Config(format!(
                "confirm_threshold must be within 1..=100, got {}",
                threshold
            )));
        }
        if self.promotion.month_agreement_tolerance > 6 || self.validation.month_tolerance > 6 {
            return Err(Error::Config(
                "month tolerances cannot exceed 6 (half a year)".to_string(),
            ));
        }
        if !(self.validation.duration_tolerance_factor >= 1.0) {
            return Err(Error::Config(format!(
                "duration_tolerance_factor must be >= 1.0, got {}",
                self.validation.duration_tolerance_factor
            )));
        }
        if self.store.max_write_attempts == 0 {
            return Err(Error::Config(
                "max_write_attempts must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(ReconcileConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_inverted_tier_bases() {
        let mut config = ReconcileConfig::default();
        config.scoring.tier1_base = 60;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_rejects_inverted_url_adjustments() {
        let mut config = ReconcileConfig::default();
        config.scoring.unknown_adjustment = 20;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_out_of_range_threshold() {
        let mut config = ReconcileConfig::default();
        config.promotion.confirm_threshold = 0;
        assert!(config.validate().is_err());

        config.promotion.confirm_threshold = 101;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_nan_duration_factor() {
        let mut config = ReconcileConfig::default();
        config.validation.duration_tolerance_factor = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: FestrecConfig = toml::from_str(
            r#"
            database_path = "/tmp/festrec.db"

            [promotion]
            confirm_threshold = 75

            [sources]
            aggregator_domains = ["example-listings.com"]
            "#,
        )
        .unwrap();

        assert_eq!(config.reconcile.promotion.confirm_threshold, 75);
        assert_eq!(config.reconcile.promotion.month_agreement_tolerance, 1);
        assert_eq!(config.reconcile.scoring, ScoringConfig::default());
        assert_eq!(
            config.reconcile.sources.aggregator_domains,
            vec!["example-listings.com".to_string()]
        );
        assert_eq!(config.logging.level, "info");
    }
}
