//! Property-based tests for the pure decision components
//!
//! 1. Fingerprints ignore case and whitespace
//! 2. Confidence never decreases with a more trusted method or URL class
//! 3. `should_update` never regresses a stored value
//! 4. Confidence stays inside 0-100

use chrono::NaiveDate;
use festrec_engine::config::ScoringConfig;
use festrec_engine::services::{fingerprint, should_update, ConfidenceScorer};
use festrec_engine::{ExtractionMethod, UrlClass};
use proptest::prelude::*;

// ============================================================================
// Strategies
// ============================================================================

fn method_strategy() -> impl Strategy<Value = ExtractionMethod> {
    prop::sample::select(ExtractionMethod::ALL.to_vec())
}

fn url_class_strategy() -> impl Strategy<Value = UrlClass> {
    prop_oneof![
        Just(UrlClass::Official),
        Just(UrlClass::Secondary),
        Just(UrlClass::Unknown),
    ]
}

fn month_strategy() -> impl Strategy<Value = Option<u32>> {
    prop::option::of(1u32..=12)
}

fn date_strategy() -> impl Strategy<Value = NaiveDate> {
    (2000i32..2100, 1u32..=12, 1u32..=28)
        .prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap())
}

/// Trust order of URL classes, higher is more trusted
fn trust(url_class: UrlClass) -> u8 {
    match url_class {
        UrlClass::Official => 2,
        UrlClass::Secondary => 1,
        UrlClass::Unknown => 0,
    }
}

/// Mangle case and spacing without changing the words
fn respace(words: &[String], upper: bool) -> String {
    let joined = words.join("   ");
    let padded = format!("  {joined}\t");
    if upper {
        padded.to_uppercase()
    } else {
        padded
    }
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_fingerprint_ignores_case_and_whitespace(
        title in prop::collection::vec("[a-z]{1,8}", 1..4),
        venue in prop::collection::vec("[a-z]{1,8}", 1..4),
        date in date_strategy(),
        upper in any::<bool>(),
    ) {
        let plain = fingerprint(&title.join(" "), &venue.join(" "), date);
        let mangled = fingerprint(&respace(&title, upper), &respace(&venue, !upper), date);
        prop_assert_eq!(plain, mangled);
    }

    #[test]
    fn prop_confidence_monotonic_in_method_tier(
        a in method_strategy(),
        b in method_strategy(),
        url_class in url_class_strategy(),
        prior in month_strategy(),
        extracted in month_strategy(),
    ) {
        let scorer = ConfidenceScorer::new(ScoringConfig::default(), 70);
        let (hi, lo) = if a.rank() >= b.rank() { (a, b) } else { (b, a) };
        prop_assert!(
            scorer.compute_confidence(hi, url_class, prior, extracted)
                >= scorer.compute_confidence(lo, url_class, prior, extracted)
        );
    }

    #[test]
    fn prop_confidence_monotonic_in_url_class(
        method in method_strategy(),
        a in url_class_strategy(),
        b in url_class_strategy(),
        prior in month_strategy(),
        extracted in month_strategy(),
    ) {
        let scorer = ConfidenceScorer::new(ScoringConfig::default(), 70);
        let (hi, lo) = if trust(a) >= trust(b) { (a, b) } else { (b, a) };
        prop_assert!(
            scorer.compute_confidence(method, hi, prior, extracted)
                >= scorer.compute_confidence(method, lo, prior, extracted)
        );
    }

    #[test]
    fn prop_url_class_order_holds_under_month_mismatch(
        method in method_strategy(),
        prior in 1u32..=12,
        offset in 2u32..=6,
    ) {
        let scorer = ConfidenceScorer::new(ScoringConfig::default(), 70);
        let extracted = (prior - 1 + offset) % 12 + 1;
        let score = |url_class| scorer.compute_confidence(method, url_class, Some(prior), Some(extracted));

        let official = score(UrlClass::Official);
        let secondary = score(UrlClass::Secondary);
        let unknown = score(UrlClass::Unknown);
        prop_assert!(official >= secondary && secondary >= unknown);
        prop_assert!(official < 70, "mismatched month stays below the confirm threshold");
    }

    #[test]
    fn prop_confidence_within_scale(
        method in method_strategy(),
        url_class in url_class_strategy(),
        prior in month_strategy(),
        extracted in month_strategy(),
    ) {
        let scorer = ConfidenceScorer::new(ScoringConfig::default(), 70);
        let confidence = scorer.compute_confidence(method, url_class, prior, extracted);
        prop_assert!(confidence <= 100);
    }

    #[test]
    fn prop_should_update_never_regresses(
        existing_method in method_strategy(),
        existing_confidence in 0u8..=100,
        new_method in method_strategy(),
        new_confidence in 0u8..=100,
    ) {
        let replaces = should_update(Some((existing_method, existing_confidence)), new_method, new_confidence);
        if new_confidence < existing_confidence
            || (new_confidence == existing_confidence && new_method.rank() <= existing_method.rank())
        {
            prop_assert!(!replaces);
        } else {
            prop_assert!(replaces);
        }
    }
}
