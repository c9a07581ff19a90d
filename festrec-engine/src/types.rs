//! Core types shared across the reconciliation pipeline
//!
//! - `ExtractionMethod`: closed set of date-extraction techniques with a fixed trust rank
//! - `UrlClass`: trust class of the page an observation came from
//! - `Priors`: per-entity domain knowledge (typical month, typical duration)
//! - Outcome enums returned to the batch driver

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Extraction Method Ranking
// ============================================================================

/// Technique that produced a date fact, most to least trustworthy
///
/// Parsers hand over loose string tags; `from_tag` maps anything unrecognized
/// to `Unknown` (rank 0) so the pipeline degrades instead of failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ExtractionMethod {
    /// schema.org event markup embedded as linked data
    JsonLd,
    /// `datetime`-bearing markup element (e.g. `<time datetime=...>`)
    TimeElement,
    /// Page metadata date fields
    MetaTag,
    /// Free-text range spanning two months ("March 28 – April 2, 2026")
    CrossMonthRange,
    /// Free-text range within one month ("October 3–5, 2026")
    SameMonthRange,
    /// Free-text single date ("October 5, 2026")
    SingleDate,
    /// Unrecognized tag
    Unknown,
}

impl ExtractionMethod {
    /// Every method, most trusted first
    pub const ALL: [ExtractionMethod; 7] = [
        ExtractionMethod::JsonLd,
        ExtractionMethod::TimeElement,
        ExtractionMethod::MetaTag,
        ExtractionMethod::CrossMonthRange,
        ExtractionMethod::SameMonthRange,
        ExtractionMethod::SingleDate,
        ExtractionMethod::Unknown,
    ];

    /// Trust tier, 5 (structured data) down to 0 (unknown)
    ///
    /// Cross-month and same-month ranges share tier 2; cross-month is only
    /// tried first because it is the more specific pattern.
    pub fn rank(self) -> u8 {
        match self {
            ExtractionMethod::JsonLd => 5,
            ExtractionMethod::TimeElement => 4,
            ExtractionMethod::MetaTag => 3,
            ExtractionMethod::CrossMonthRange => 2,
            ExtractionMethod::SameMonthRange => 2,
            ExtractionMethod::SingleDate => 1,
            ExtractionMethod::Unknown => 0,
        }
    }

    /// Stable tag used in storage and observation files
    pub fn as_tag(self) -> &'static str {
        match self {
            ExtractionMethod::JsonLd => "json_ld",
            ExtractionMethod::TimeElement => "time_element",
            ExtractionMethod::MetaTag => "meta_tag",
            ExtractionMethod::CrossMonthRange => "cross_month_range",
            ExtractionMethod::SameMonthRange => "same_month_range",
            ExtractionMethod::SingleDate => "single_date",
            ExtractionMethod::Unknown => "unknown",
        }
    }

    /// Parse a parser-supplied tag; never fails
    ///
    /// Accepts the stable tags plus the spellings scrapers commonly emit
    /// (`jsonld`, `schema_org`, `regex_cross_month`, ...). Case, `-` and
    /// whitespace are ignored.
    pub fn from_tag(tag: &str) -> Self {
        let normalized: String = tag
            .trim()
            .to_ascii_lowercase()
            .chars()
            .map(|c| if c == '-' || c.is_whitespace() { '_' } else { c })
            .collect();

        match normalized.as_str() {
            "json_ld" | "jsonld" | "schema_org" | "ld_json" | "structured_data" => {
                ExtractionMethod::JsonLd
            }
            "time_element" | "time_tag" | "datetime" | "datetime_attr" | "html_time" => {
                ExtractionMethod::TimeElement
            }
            "meta_tag" | "meta" | "page_meta" | "og_meta" => ExtractionMethod::MetaTag,
            "cross_month_range" | "regex_cross_month" | "cross_month" => {
                ExtractionMethod::CrossMonthRange
            }
            "same_month_range" | "regex_range" | "regex_same_month" | "same_month" => {
                ExtractionMethod::SameMonthRange
            }
            "single_date" | "regex_single" | "regex_single_date" | "single" => {
                ExtractionMethod::SingleDate
            }
            _ => {
                if normalized != "unknown" {
                    tracing::warn!(tag = %tag, "Unrecognized extraction method tag, ranking as untrusted");
                }
                ExtractionMethod::Unknown
            }
        }
    }
}

impl fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

impl FromStr for ExtractionMethod {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(ExtractionMethod::from_tag(s))
    }
}

impl From<String> for ExtractionMethod {
    fn from(tag: String) -> Self {
        ExtractionMethod::from_tag(&tag)
    }
}

impl From<ExtractionMethod> for String {
    fn from(method: ExtractionMethod) -> Self {
        method.as_tag().to_string()
    }
}

// ============================================================================
// Source Trust
// ============================================================================

/// Trust class of the page an observation was extracted from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrlClass {
    /// The entity's own website (or a page strongly matching its slug)
    Official,
    /// Known third-party listing/aggregator
    Secondary,
    /// Anything else, including malformed URLs
    Unknown,
}

impl UrlClass {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            UrlClass::Official => "official",
            UrlClass::Secondary => "secondary",
            UrlClass::Unknown => "unknown",
        }
    }
}

impl fmt::Display for UrlClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Priors
// ============================================================================

/// Domain priors for a recurring event
///
/// `None` means "nothing on file", which is distinct from a prior that
/// disagrees with an observation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Priors {
    /// Month the event usually starts in (1-12)
    pub typical_month: Option<u32>,
    /// Usual length of the event in days
    pub typical_duration_days: Option<u32>,
}

impl Priors {
    /// Priors with both values known
    pub fn new(typical_month: u32, typical_duration_days: u32) -> Self {
        Self {
            typical_month: Some(typical_month),
            typical_duration_days: Some(typical_duration_days),
        }
    }
}

/// Circular distance between two months (December and January are 1 apart)
///
/// Returns `None` if either month is outside 1..=12.
pub fn month_distance(a: u32, b: u32) -> Option<u32> {
    if !(1..=12).contains(&a) || !(1..=12).contains(&b) {
        return None;
    }
    let diff = a.abs_diff(b);
    Some(diff.min(12 - diff))
}

// ============================================================================
// Outcomes
// ============================================================================

/// Why a festival date observation was rejected by the plausibility validator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RejectReason {
    /// Start date is not a real calendar date
    InvalidStart { value: String },
    /// End date is not a real calendar date
    InvalidEnd { value: String },
    /// End date precedes start date
    EndBeforeStart,
    /// Span far exceeds the typical duration (likely a mis-parsed range)
    SpanTooLong { span_days: i64, allowed_days: i64 },
    /// Start month too far from the typical month (wrong year or event)
    MonthOutOfRange { month: u32, typical_month: u32 },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::InvalidStart { value } => write!(f, "invalid start date '{}'", value),
            RejectReason::InvalidEnd { value } => write!(f, "invalid end date '{}'", value),
            RejectReason::EndBeforeStart => write!(f, "end date before start date"),
            RejectReason::SpanTooLong {
                span_days,
                allowed_days,
            } => write!(f, "span of {} days exceeds {} allowed", span_days, allowed_days),
            RejectReason::MonthOutOfRange {
                month,
                typical_month,
            } => write!(f, "month {} too far from typical month {}", month, typical_month),
        }
    }
}

/// Why a plausible observation caused no write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The confirmed value is at least as trustworthy
    ConfirmedDominates,
    /// Not confirmable, and repeats the dates already confirmed
    CorroboratesConfirmed,
    /// The pending value is at least as trustworthy
    PendingDominates,
}

/// Result of reconciling one festival date observation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FestivalOutcome {
    /// Written to the confirmed slot (pending cleared)
    Confirmed { confidence: u8 },
    /// Written to the pending slot
    Pending { confidence: u8 },
    /// Failed plausibility validation; nothing written
    Rejected { reason: RejectReason },
    /// Existing state already dominates; nothing written
    Skipped { reason: SkipReason },
}

/// Result of reconciling one event observation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventOutcome {
    /// New fingerprint; record created
    Inserted,
    /// Existing record improved by the merge policy
    Merged,
    /// Merge produced no change
    Unchanged,
}
