//! Batch Driver
//!
//! Runs a sequence of parser observations through the reconciler, one at a
//! time, and tallies outcomes per source. Store errors are counted as
//! `failed` and the batch moves on.
//!
//! Input is JSON Lines; each line is one tagged observation:
//!
//! ```text
//! {"kind":"event","source":"town-site","title":"Harvest Fair","venue_name":"Town Green","date":"2026-10-03"}
//! {"kind":"festival_date","source":"town-site","entity_id":"…","text":"October 3–5, 2026","url":"https://…"}
//! ```

use crate::db::{EventStore, FestivalStore};
use crate::models::{EventCandidate, RawEventObservation, RawFestivalObservation};
use crate::services::batch_summary::BatchSummary;
use crate::services::priors_cache::PriorsCache;
use crate::services::reconciler::Reconciler;
use serde::Deserialize;
use tracing::{info, warn};

/// Source bucket for lines that are not valid observations
pub const MALFORMED_SOURCE: &str = "_malformed";

/// One line of batch input
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Observation {
    Event {
        source: String,
        #[serde(flatten)]
        observation: RawEventObservation,
    },
    FestivalDate {
        source: String,
        #[serde(flatten)]
        observation: RawFestivalObservation,
    },
}

impl Observation {
    /// Source the observation was crawled from
    pub fn source(&self) -> &str {
        match self {
            Observation::Event { source, .. } | Observation::FestivalDate { source, .. } => source,
        }
    }
}

/// Parse JSON Lines input; blank lines are skipped
///
/// Each entry is either an observation or the parse error for that line
/// (1-based line number).
pub fn parse_observations(input: &str) -> Vec<Result<Observation, (usize, String)>> {
    input
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| serde_json::from_str(line).map_err(|e| (idx + 1, e.to_string())))
        .collect()
}

/// Reconcile every observation in order and return per-source counts
pub async fn run_batch<S>(
    reconciler: &Reconciler<S>,
    observations: Vec<Result<Observation, (usize, String)>>,
) -> BatchSummary
where
    S: EventStore + FestivalStore,
{
    let mut summary = BatchSummary::new();
    let mut cache = PriorsCache::new();

    for entry in observations {
        let observation = match entry {
            Ok(observation) => observation,
            Err((line, message)) => {
                warn!(line, error = %message, "Malformed observation line");
                summary.source(MALFORMED_SOURCE).record_failure();
                continue;
            }
        };

        match observation {
            Observation::Event { source, mut observation } => {
                if observation.source_name.is_none() {
                    observation.source_name = Some(source.clone());
                }
                let Some(candidate) = EventCandidate::from_observation(observation) else {
                    summary.source(&source).record_no_candidate();
                    continue;
                };
                match reconciler.reconcile_event(&candidate).await {
                    Ok(outcome) => summary.source(&source).record_event(outcome),
                    Err(e) => {
                        warn!(source = %source, title = %candidate.title, error = %e, "Event reconciliation failed");
                        summary.source(&source).record_failure();
                    }
                }
            }
            Observation::FestivalDate { source, observation } => {
                let Some(candidate) = observation.into_candidate() else {
                    summary.source(&source).record_no_candidate();
                    continue;
                };
                let result = reconciler
                    .reconcile_festival_date(
                        &mut cache,
                        candidate.entity_id,
                        &candidate.start,
                        candidate.end.as_deref(),
                        candidate.method,
                        &candidate.url,
                    )
                    .await;
                match result {
                    Ok(outcome) => summary.source(&source).record_festival(&outcome),
                    Err(e) => {
                        warn!(
                            source = %source,
                            entity_id = %candidate.entity_id,
                            error = %e,
                            "Festival date reconciliation failed"
                        );
                        summary.source(&source).record_failure();
                    }
                }
            }
        }
    }

    let total = summary.total();
    info!(
        found = total.found,
        failed = total.failed,
        no_candidate = total.no_candidate,
        "Batch complete"
    );
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ExtractionMethod;
    use uuid::Uuid;

    #[test]
    fn test_parse_tagged_lines() {
        let id = Uuid::new_v4();
        let input = format!(
            "{}\n\n{}\nnot json\n",
            r#"{"kind":"event","source":"town-site","title":"Harvest Fair","venue_name":"Town Green","date":"2026-10-03","confidence":80}"#,
            format_args!(
                r#"{{"kind":"festival_date","source":"town-site","entity_id":"{id}","start":"2026-10-03","method":"json_ld","url":"https://harvest-fair.org"}}"#
            ),
        );

        let parsed = parse_observations(&input);
        assert_eq!(parsed.len(), 3);

        match &parsed[0] {
            Ok(Observation::Event { source, observation }) => {
                assert_eq!(source, "town-site");
                assert_eq!(observation.title.as_deref(), Some("Harvest Fair"));
                assert_eq!(observation.confidence, Some(80));
            }
            other => panic!("unexpected: {other:?}"),
        }

        match &parsed[1] {
            Ok(Observation::FestivalDate { observation, .. }) => {
                assert_eq!(observation.entity_id, id);
                let candidate = observation.clone().into_candidate().unwrap();
                assert_eq!(candidate.method, ExtractionMethod::JsonLd);
            }
            other => panic!("unexpected: {other:?}"),
        }

        assert!(matches!(parsed[2], Err((4, _))));
    }

    #[test]
    fn test_unknown_kind_is_error() {
        let parsed = parse_observations(r#"{"kind":"venue","source":"x"}"#);
        assert!(parsed[0].is_err());
    }
}
