//! Cross-aggregate reconciliation.
//!
//! Completion state (intake ledger) and physical stock (cabinet inventory)
//! are independent aggregates. This crate closes the loop between them:
//! a background worker consumes intake events and applies the matching
//! inventory mutation, and a second worker handles cascade cleanup when a
//! medication is deleted. Reconciliation is eventually consistent: a
//! completed intake whose subtraction fails stays completed.

pub mod cascade;
pub mod reconciler;
pub mod worker;

pub use cascade::MedicationCascade;
pub use reconciler::InventoryReconciler;
pub use worker::{EventWorker, WorkerHandle};
