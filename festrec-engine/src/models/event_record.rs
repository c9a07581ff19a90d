//! Event records
//!
//! `EventCandidate` is one crawl's observation after basic parsing;
//! `EventRecord` is the stored projection keyed by fingerprint.

use crate::services::date_patterns::{parse_date_text, parse_iso_date};
use crate::services::fingerprinter::fingerprint;
use crate::types::ExtractionMethod;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stored event record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub guid: Uuid,
    /// Natural key; see `services::fingerprinter`
    pub fingerprint: String,
    pub title: String,
    pub venue_name: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub ticket_url: Option<String>,
    pub image_url: Option<String>,
    pub price: Option<String>,
    pub source_url: Option<String>,
    pub source_name: Option<String>,
    pub extraction_method: Option<ExtractionMethod>,
    pub extraction_confidence: Option<u8>,
    pub revision: i64,
}

/// Parsed event observation, ready to reconcile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventCandidate {
    pub title: String,
    pub venue_name: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub ticket_url: Option<String>,
    pub image_url: Option<String>,
    pub price: Option<String>,
    pub source_url: Option<String>,
    pub source_name: Option<String>,
    pub extraction_method: Option<ExtractionMethod>,
    pub extraction_confidence: Option<u8>,
}

impl EventCandidate {
    /// Minimal candidate with only identity fields set
    pub fn new(title: impl Into<String>, venue_name: impl Into<String>, start_date: NaiveDate) -> Self {
        Self {
            title: title.into(),
            venue_name: venue_name.into(),
            start_date,
            end_date: None,
            start_time: None,
            category: None,
            description: None,
            ticket_url: None,
            image_url: None,
            price: None,
            source_url: None,
            source_name: None,
            extraction_method: None,
            extraction_confidence: None,
        }
    }

    /// Content fingerprint of this candidate
    pub fn fingerprint(&self) -> String {
        fingerprint(&self.title, &self.venue_name, self.start_date)
    }

    /// Project into a record with a fresh guid at revision 0
    pub fn into_record(self) -> EventRecord {
        let fingerprint = self.fingerprint();
        EventRecord {
            guid: Uuid::new_v4(),
            fingerprint,
            title: self.title,
            venue_name: self.venue_name,
            start_date: self.start_date,
            end_date: self.end_date,
            start_time: self.start_time,
            category: self.category,
            description: self.description,
            ticket_url: self.ticket_url,
            image_url: self.image_url,
            price: self.price,
            source_url: self.source_url,
            source_name: self.source_name,
            extraction_method: self.extraction_method,
            extraction_confidence: self.extraction_confidence,
            revision: 0,
        }
    }

    /// Build a candidate from a raw parser observation
    ///
    /// Returns `None` ("no candidate") when the title or venue is blank or
    /// the date string is not recognizable. Other malformed fields are
    /// dropped rather than failing the observation.
    pub fn from_observation(raw: RawEventObservation) -> Option<Self> {
        let title = non_blank(raw.title)?;
        let venue_name = non_blank(raw.venue_name)?;
        let parsed = parse_date_text(raw.date.as_deref()?)?;

        let end_date = raw
            .end_date
            .as_deref()
            .and_then(parse_iso_date)
            .or(parsed.end)
            .filter(|end| *end >= parsed.start);

        let extraction_method = raw
            .method
            .as_deref()
            .map(ExtractionMethod::from_tag)
            .or_else(|| (parsed.method != ExtractionMethod::Unknown).then_some(parsed.method));

        Some(Self {
            title,
            venue_name,
            start_date: parsed.start,
            end_date,
            start_time: raw.start_time.as_deref().and_then(parse_time),
            category: non_blank(raw.category),
            description: non_blank(raw.description),
            ticket_url: non_blank(raw.ticket_url),
            image_url: non_blank(raw.image_url),
            price: non_blank(raw.price),
            source_url: non_blank(raw.source_url),
            source_name: non_blank(raw.source_name),
            extraction_method,
            extraction_confidence: raw.confidence.map(|c| c.min(100)),
        })
    }
}

/// Event observation as produced by an external parser
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawEventObservation {
    pub title: Option<String>,
    pub venue_name: Option<String>,
    /// ISO date or free-text date/range
    pub date: Option<String>,
    pub end_date: Option<String>,
    pub start_time: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub ticket_url: Option<String>,
    pub image_url: Option<String>,
    pub price: Option<String>,
    pub source_url: Option<String>,
    pub source_name: Option<String>,
    pub method: Option<String>,
    pub confidence: Option<u8>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse "19:30", "19:30:00" or "7:30 PM"
fn parse_time(value: &str) -> Option<NaiveTime> {
    let value = value.trim();
    ["%H:%M", "%H:%M:%S", "%I:%M %p", "%I:%M%p"]
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(&value.to_uppercase(), fmt).ok())
}
