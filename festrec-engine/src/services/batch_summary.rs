//! Per-source batch counters
//!
//! The batch driver records one outcome per observation. Failures are
//! counted, never propagated, so one bad source cannot abort a batch.

use crate::types::{EventOutcome, FestivalOutcome};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Outcome counts for one source
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SourceSummary {
    /// Observations seen
    pub found: u32,
    pub confirmed: u32,
    pub pending: u32,
    pub rejected: u32,
    pub skipped: u32,
    pub inserted: u32,
    pub merged: u32,
    pub unchanged: u32,
    /// Observations that produced no candidate
    pub no_candidate: u32,
    /// Store or contract errors
    pub failed: u32,
}

impl SourceSummary {
    pub fn record_festival(&mut self, outcome: &FestivalOutcome) {
        self.found += 1;
        match outcome {
            FestivalOutcome::Confirmed { .. } => self.confirmed += 1,
            FestivalOutcome::Pending { .. } => self.pending += 1,
            FestivalOutcome::Rejected { .. } => self.rejected += 1,
            FestivalOutcome::Skipped { .. } => self.skipped += 1,
        }
    }

    pub fn record_event(&mut self, outcome: EventOutcome) {
        self.found += 1;
        match outcome {
            EventOutcome::Inserted => self.inserted += 1,
            EventOutcome::Merged => self.merged += 1,
            EventOutcome::Unchanged => self.unchanged += 1,
        }
    }

    pub fn record_no_candidate(&mut self) {
        self.found += 1;
        self.no_candidate += 1;
    }

    pub fn record_failure(&mut self) {
        self.found += 1;
        self.failed += 1;
    }
}

impl fmt::Display for SourceSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "found={} confirmed={} pending={} rejected={} skipped={} inserted={} merged={} unchanged={} no_candidate={} failed={}",
            self.found,
            self.confirmed,
            self.pending,
            self.rejected,
            self.skipped,
            self.inserted,
            self.merged,
            self.unchanged,
            self.no_candidate,
            self.failed
        )
    }
}

/// Summaries keyed by source name, in name order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct BatchSummary {
    sources: BTreeMap<String, SourceSummary>,
}

impl BatchSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counters for `source`, created on first use
    pub fn source(&mut self, source: &str) -> &mut SourceSummary {
        self.sources.entry(source.to_string()).or_default()
    }

    pub fn get(&self, source: &str) -> Option<&SourceSummary> {
        self.sources.get(source)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &SourceSummary)> {
        self.sources.iter()
    }

    /// Sum over all sources
    pub fn total(&self) -> SourceSummary {
        self.sources.values().fold(SourceSummary::default(), |mut acc, s| {
            acc.found += s.found;
            acc.confirmed += s.confirmed;
            acc.pending += s.pending;
            acc.rejected += s.rejected;
            acc.skipped += s.skipped;
            acc.inserted += s.inserted;
            acc.merged += s.merged;
            acc.unchanged += s.unchanged;
            acc.no_candidate += s.no_candidate;
            acc.failed += s.failed;
            acc
        })
    }
}
