//! Plausibility Validator
//!
//! Rejects festival date candidates that are calendar-invalid or that
//! contradict the entity's priors. Independent of confidence: a
//! high-confidence implausible date is rejected, a low-confidence plausible
//! one passes (and will land in pending at the promotion gate).
//!
//! # Checks (in order, first failure wins)
//! 1. Start and end parse as real calendar dates
//! 2. `end >= start` (missing end means a single-day fact)
//! 3. Inclusive span ≤ `ceil(typical_duration_days × duration_tolerance_factor)`
//! 4. Start month within `month_tolerance` (circular) of the typical month

use crate::config::ValidationConfig;
use crate::services::date_patterns::parse_iso_date;
use crate::types::{month_distance, Priors, RejectReason};
use chrono::{Datelike, NaiveDate};
use tracing::debug;

/// Validation verdict
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    /// Candidate is plausible; carries the parsed (and end-defaulted) dates
    Plausible { start: NaiveDate, end: NaiveDate },
    /// Candidate rejected
    Implausible(RejectReason),
}

impl Validation {
    /// True for `Plausible`
    pub fn is_ok(&self) -> bool {
        matches!(self, Validation::Plausible { .. })
    }
}

/// Plausibility Validator
pub struct PlausibilityValidator {
    config: ValidationConfig,
}

impl PlausibilityValidator {
    /// Create validator with the given tolerances
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Validate a raw start/end pair against the entity's priors
    pub fn validate(&self, candidate_start: &str, candidate_end: Option<&str>, priors: &Priors) -> Validation {
        let verdict = self.check(candidate_start, candidate_end, priors);

        debug!(
            start = candidate_start,
            end = ?candidate_end,
            typical_month = ?priors.typical_month,
            typical_duration_days = ?priors.typical_duration_days,
            plausible = verdict.is_ok(),
            "Plausibility check complete"
        );

        verdict
    }

    fn check(&self, candidate_start: &str, candidate_end: Option<&str>, priors: &Priors) -> Validation {
        // Check 1: real calendar dates
        let Some(start) = parse_iso_date(candidate_start) else {
            return Validation::Implausible(RejectReason::InvalidStart {
                value: candidate_start.to_string(),
            });
        };

        let end = match candidate_end.map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => match parse_iso_date(raw) {
                Some(end) => end,
                None => {
                    return Validation::Implausible(RejectReason::InvalidEnd {
                        value: raw.to_string(),
                    })
                }
            },
            None => start,
        };

        // Check 2: ordering
        if end < start {
            return Validation::Implausible(RejectReason::EndBeforeStart);
        }

        // Check 3: span against typical duration
        if let Some(typical) = priors.typical_duration_days.filter(|d| *d > 0) {
            let span_days = (end - start).num_days() + 1;
            let allowed_days =
                (f64::from(typical) * self.config.duration_tolerance_factor).ceil() as i64;
            if span_days > allowed_days {
                return Validation::Implausible(RejectReason::SpanTooLong {
                    span_days,
                    allowed_days,
                });
            }
        }

        // Check 4: start month against typical month
        if let Some(typical_month) = priors.typical_month {
            let month = start.month();
            match month_distance(month, typical_month) {
                Some(distance) if distance <= self.config.month_tolerance => {}
                Some(_) => {
                    return Validation::Implausible(RejectReason::MonthOutOfRange {
                        month,
                        typical_month,
                    })
                }
                // Out-of-range stored prior; the schema forbids it, so treat as absent
                None => {}
            }
        }

        Validation::Plausible { start, end }
    }
}

impl Default for PlausibilityValidator {
    fn default() -> Self {
        Self::new(ValidationConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn validator() -> PlausibilityValidator {
        PlausibilityValidator::default()
    }

    #[test]
    fn test_rejects_impossible_calendar_dates() {
        let v = validator();
        assert_eq!(
            v.validate("2026-02-30", None, &Priors::default()),
            Validation::Implausible(RejectReason::InvalidStart {
                value: "2026-02-30".to_string()
            })
        );
        assert!(!v.validate("2026-13-01", None, &Priors::default()).is_ok());
        assert!(matches!(
            v.validate("2026-02-01", Some("2026-02-31"), &Priors::default()),
            Validation::Implausible(RejectReason::InvalidEnd { .. })
        ));
    }

    #[test]
    fn test_rejects_end_before_start() {
        assert_eq!(
            validator().validate("2026-10-05", Some("2026-10-03"), &Priors::default()),
            Validation::Implausible(RejectReason::EndBeforeStart)
        );
    }

    #[test]
    fn test_missing_end_is_single_day() {
        assert_eq!(
            validator().validate("2026-10-05", None, &Priors::default()),
            Validation::Plausible {
                start: date(2026, 10, 5),
                end: date(2026, 10, 5)
            }
        );
        assert_eq!(
            validator().validate("2026-10-05", Some("  "), &Priors::default()),
            Validation::Plausible {
                start: date(2026, 10, 5),
                end: date(2026, 10, 5)
            }
        );
    }

    #[test]
    fn test_span_within_tolerance_passes() {
        // 3-day festival, 2x tolerance allows up to 6 days inclusive
        let priors = Priors::new(10, 3);
        assert!(validator().validate("2026-10-01", Some("2026-10-06"), &priors).is_ok());
    }

    #[test]
    fn test_wildly_long_span_rejected() {
        let priors = Priors::new(10, 3);
        assert_eq!(
            validator().validate("2026-10-01", Some("2026-10-07"), &priors),
            Validation::Implausible(RejectReason::SpanTooLong {
                span_days: 7,
                allowed_days: 6
            })
        );
    }

    #[test]
    fn test_month_far_from_prior_rejected() {
        let priors = Priors::new(3, 6);
        assert_eq!(
            validator().validate("2026-10-05", None, &priors),
            Validation::Implausible(RejectReason::MonthOutOfRange {
                month: 10,
                typical_month: 3
            })
        );
    }

    #[test]
    fn test_month_tolerance_wraps_year_end() {
        let priors = Priors {
            typical_month: Some(12),
            typical_duration_days: None,
        };
        assert!(validator().validate("2027-01-02", None, &priors).is_ok());
        assert!(validator().validate("2027-02-02", None, &priors).is_ok());
        assert!(!validator().validate("2027-03-02", None, &priors).is_ok());
    }

    #[test]
    fn test_no_priors_skips_prior_checks() {
        assert!(validator()
            .validate("2026-07-01", Some("2026-08-30"), &Priors::default())
            .is_ok());
    }

    #[test]
    fn test_accepts_datetime_strings_from_markup() {
        assert_eq!(
            validator().validate("2026-10-03T10:00:00-05:00", Some("2026-10-05T22:00:00-05:00"), &Priors::default()),
            Validation::Plausible {
                start: date(2026, 10, 3),
                end: date(2026, 10, 5)
            }
        );
    }
}
