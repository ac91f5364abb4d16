//! Scheduling domain: recurring intake rules and their completion ledger.
//!
//! Three pieces:
//! - [`schedule`]: the `Schedule` entity and its value objects
//! - [`recurrence`]: pure calendar math expanding a schedule into occurrences
//! - [`registry`] / [`intake`]: the owning services (schedule CRUD + queries,
//!   completion state machine + event publication)
//!
//! Completion state and cabinet inventory are independent aggregates; the
//! intake ledger only publishes events, it never touches the cabinet.

pub mod intake;
pub mod recurrence;
pub mod registry;
pub mod schedule;

pub use intake::{IntakeCompleted, IntakeEvent, IntakeEventId, IntakeLedger, IntakeRecord, IntakeUncompleted};
pub use registry::ScheduleRegistry;
pub use schedule::{DoseInterval, NewSchedule, Schedule, ScheduleId, SchedulePeriod, ScheduleUpdate};
