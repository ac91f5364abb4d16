//! Domain error model.

use chrono::NaiveDate;
use thiserror::Error;

use crate::dose::DoseQuantity;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// invariants, conflicts). Infrastructure concerns belong elsewhere. None of
/// these kinds are fatal to the process; all are per-operation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. malformed input).
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A requested resource was not found or does not belong to the caller.
    ///
    /// Ownership misses are reported as not-found, never as a distinct
    /// "forbidden" kind, so foreign rows are not leaked.
    #[error("not found")]
    NotFound,

    /// A conflict occurred (e.g. completing an already-completed occurrence).
    #[error("conflict: {0}")]
    Conflict(String),

    /// `complete` was called for a date the schedule's recurrence never
    /// produces.
    #[error("schedule has no occurrence on {date}")]
    OccurrenceMismatch { date: NaiveDate },

    /// A subtraction exhausted the cabinet working set with dose still owed.
    ///
    /// Entries zeroed before the shortfall was detected stay zeroed; the
    /// partial deduction is not rolled back.
    #[error("insufficient stock: {missing} doses still owed")]
    InsufficientStock { missing: DoseQuantity },
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }

    pub fn occurrence_mismatch(date: NaiveDate) -> Self {
        Self::OccurrenceMismatch { date }
    }

    pub fn insufficient_stock(missing: DoseQuantity) -> Self {
        Self::InsufficientStock { missing }
    }
}
