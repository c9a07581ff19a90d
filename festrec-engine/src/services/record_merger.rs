//! Event Record Merging
//!
//! Combines a stored event record with a new observation of the same
//! fingerprint. Merge strategy: fill what is missing, never clear what is
//! there.
//!
//! **Per-field rules:**
//! - Plain fields (end date, start time, ticket/image URL, price): incoming
//!   fills an absent or blank existing value
//! - Description: additionally, a longer incoming description replaces a
//!   shorter one unless it looks like template text
//! - Confidence-bearing fields (extraction method + confidence, category,
//!   source URL/name): taken from the incoming side only when
//!   `should_update` holds for its (method, confidence); otherwise
//!   absent-fill. Method and confidence are always stored as the pair one
//!   side observed, a missing method reading as `Unknown`
//! - Identity fields, guid and revision always come from the existing record

use crate::models::{EventCandidate, EventRecord};
use crate::services::fingerprinter::normalize_identity_text;
use crate::services::promotion_gate::should_update;
use crate::types::ExtractionMethod;
use once_cell::sync::Lazy;
use regex::Regex;

/// Title similarity at or above which a description is treated as a copy of it
const TITLE_SIMILARITY_THRESHOLD: f64 = 0.9;

const PLACEHOLDER_MARKERS: [&str; 5] = ["{{", "}}", "{%", "%s", "[["];

static BOILERPLATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(lorem ipsum|description coming soon|details coming soon|more info(?:rmation)? coming soon|click here for more|no description available|tba|tbd|to be announced)\b",
    )
    .expect("boilerplate pattern compiles")
});

/// Event Record Merger
#[derive(Debug, Default, Clone, Copy)]
pub struct RecordMerger;

impl RecordMerger {
    /// Create new merger
    pub fn new() -> Self {
        Self
    }

    /// Merge `incoming` into `existing`, returning the merged record
    ///
    /// The result equals `existing` when the observation adds nothing, which
    /// the reconciler reports as `Unchanged`.
    pub fn merge(&self, existing: &EventRecord, incoming: &EventCandidate) -> EventRecord {
        let dominating = dominating_provenance(existing, incoming);
        let take_incoming_provenance = dominating.is_some();

        // Confidence-bearing fields travel as a bundle
        let bundle = |existing: &Option<String>, incoming: &Option<String>| {
            if take_incoming_provenance {
                fill(non_blank(incoming), existing)
            } else {
                fill(non_blank(existing), incoming)
            }
        };

        // Method and confidence are one observation; never mix the two sides
        let (extraction_method, extraction_confidence) = match dominating {
            Some((method, confidence)) => (Some(method), Some(confidence)),
            None => (existing.extraction_method, existing.extraction_confidence),
        };

        EventRecord {
            guid: existing.guid,
            fingerprint: existing.fingerprint.clone(),
            title: existing.title.clone(),
            venue_name: existing.venue_name.clone(),
            start_date: existing.start_date,
            end_date: existing.end_date.or(incoming.end_date),
            start_time: existing.start_time.or(incoming.start_time),
            category: bundle(&existing.category, &incoming.category),
            description: merge_description(
                existing.description.as_deref(),
                incoming.description.as_deref(),
                &existing.title,
            ),
            ticket_url: fill(non_blank(&existing.ticket_url), &incoming.ticket_url),
            image_url: fill(non_blank(&existing.image_url), &incoming.image_url),
            price: fill(non_blank(&existing.price), &incoming.price),
            source_url: bundle(&existing.source_url, &incoming.source_url),
            source_name: bundle(&existing.source_name, &incoming.source_name),
            extraction_method,
            extraction_confidence,
            revision: existing.revision,
        }
    }
}

/// The incoming (method, confidence) when it should replace the stored pair
fn dominating_provenance(existing: &EventRecord, incoming: &EventCandidate) -> Option<(ExtractionMethod, u8)> {
    let (method, confidence) = provenance(incoming.extraction_method, incoming.extraction_confidence)?;
    should_update(
        provenance(existing.extraction_method, existing.extraction_confidence),
        method,
        confidence,
    )
    .then_some((method, confidence))
}

fn provenance(method: Option<ExtractionMethod>, confidence: Option<u8>) -> Option<(ExtractionMethod, u8)> {
    if method.is_none() && confidence.is_none() {
        return None;
    }
    Some((
        method.unwrap_or(ExtractionMethod::Unknown),
        confidence.unwrap_or(0),
    ))
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.trim().is_empty()).cloned()
}

/// `primary` if present, else the non-blank `fallback`
fn fill(primary: Option<String>, fallback: &Option<String>) -> Option<String> {
    primary.or_else(|| non_blank(fallback))
}

fn merge_description(existing: Option<&str>, incoming: Option<&str>, title: &str) -> Option<String> {
    let existing = existing.filter(|d| !d.trim().is_empty());
    let incoming = incoming.filter(|d| !d.trim().is_empty());

    match (existing, incoming) {
        (None, incoming) => incoming.map(str::to_string),
        (Some(current), Some(candidate))
            if candidate.trim().chars().count() > current.trim().chars().count()
                && !looks_like_template(candidate, title) =>
        {
            Some(candidate.to_string())
        }
        (Some(current), _) => Some(current.to_string()),
    }
}

/// True for descriptions that are placeholders rather than content
///
/// Unrendered template markers, known boilerplate phrases, or near-copies of
/// the title all count.
pub fn looks_like_template(description: &str, title: &str) -> bool {
    if PLACEHOLDER_MARKERS.iter().any(|m| description.contains(m)) {
        return true;
    }
    if BOILERPLATE_RE.is_match(description) {
        return true;
    }

    let description = normalize_identity_text(description);
    let title = normalize_identity_text(title);
    !title.is_empty() && strsim::normalized_levenshtein(&description, &title) >= TITLE_SIMILARITY_THRESHOLD
}
