//! Medication directory (reference data for schedules and cabinet entries).
//!
//! Medications anchor ownership: schedules and cabinet entries reference a
//! medication but are otherwise independent aggregates. Deleting a medication
//! publishes an event that downstream consumers use for cascade cleanup.

pub mod directory;
pub mod medication;

pub use directory::MedicationDirectory;
pub use medication::{Medication, MedicationDeleted, MedicationEvent, MedicationId};
