//! Error types for festrec-engine
//!
//! Bad data is never an error here: rejected, skipped and "no candidate"
//! observations are ordinary return values. These variants cover store
//! failures and caller contract violations only.

use thiserror::Error;
use uuid::Uuid;

/// Reconciliation error type
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Store or configuration failure from festrec-common
    #[error("Common error: {0}")]
    Common(#[from] festrec_common::Error),

    /// Festival date reconciled for an entity that was never registered
    #[error("Unknown entity: {0}")]
    UnknownEntity(Uuid),

    /// Conditional write lost the race on every attempt
    #[error("Write contention on {key} after {attempts} attempts")]
    Contention { key: String, attempts: u32 },

    /// Stored row could not be decoded (bad date, unknown uuid format)
    #[error("Corrupt row: {0}")]
    CorruptRow(String),
}

impl From<sqlx::Error> for ReconcileError {
    fn from(err: sqlx::Error) -> Self {
        ReconcileError::Common(festrec_common::Error::Database(err))
    }
}

/// Result type for reconciliation operations
pub type ReconcileResult<T> = Result<T, ReconcileError>;
