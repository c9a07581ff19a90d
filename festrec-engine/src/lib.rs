//! festrec-engine library interface
//!
//! Reconciles noisy, repeated observations of events and recurring
//! festivals into one stored fact per identity.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod types;
pub mod utils;
pub mod validators;

pub use crate::config::{FestrecConfig, ReconcileConfig};
pub use crate::db::{EventStore, FestivalStore, SqliteStore};
pub use crate::error::{ReconcileError, ReconcileResult};
pub use crate::services::{PriorsCache, Reconciler};
pub use crate::types::{EventOutcome, ExtractionMethod, FestivalOutcome, Priors, RejectReason, SkipReason, UrlClass};
