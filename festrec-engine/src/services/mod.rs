//! Reconciliation services
//!
//! Pure decision components (fingerprinter, classifier, scorer, gate,
//! merger, date patterns) plus the store-touching reconciler and batch
//! driver built on them.

pub mod batch_driver;
pub mod batch_summary;
pub mod confidence_scorer;
pub mod date_patterns;
pub mod fingerprinter;
pub mod priors_cache;
pub mod promotion_gate;
pub mod reconciler;
pub mod record_merger;
pub mod source_classifier;

pub use batch_driver::{parse_observations, run_batch, Observation};
pub use batch_summary::{BatchSummary, SourceSummary};
pub use confidence_scorer::ConfidenceScorer;
pub use date_patterns::{extract_date_candidate, DateCandidate};
pub use fingerprinter::fingerprint;
pub use priors_cache::PriorsCache;
pub use promotion_gate::{should_update, PromotionDecision, PromotionGate};
pub use reconciler::Reconciler;
pub use record_merger::RecordMerger;
pub use source_classifier::SourceClassifier;
