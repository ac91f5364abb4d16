use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use medtrack_core::{AggregateId, DomainError, DomainResult, DoseQuantity, UserId};
use medtrack_events::{Event, EventBus, EventEnvelope};
use medtrack_medications::MedicationId;

use crate::recurrence;
use crate::registry::ScheduleRegistry;
use crate::schedule::ScheduleId;

/// Intake event identifier (one per completion record).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IntakeEventId(pub AggregateId);

impl IntakeEventId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for IntakeEventId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Completion record for one occurrence of a schedule.
///
/// Only completed occurrences are materialized; a pending occurrence is a
/// computed fact, not a row. At most one record exists per (schedule, date).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntakeRecord {
    id: IntakeEventId,
    user_id: UserId,
    schedule_id: ScheduleId,
    medication_id: MedicationId,
    /// Occurrence date combined with the schedule's time-of-day.
    target: NaiveDateTime,
    completed_at: DateTime<Utc>,
    dose: DoseQuantity,
}

impl IntakeRecord {
    pub fn id_typed(&self) -> IntakeEventId {
        self.id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn schedule_id(&self) -> ScheduleId {
        self.schedule_id
    }

    pub fn medication_id(&self) -> MedicationId {
        self.medication_id
    }

    pub fn target(&self) -> NaiveDateTime {
        self.target
    }

    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    pub fn dose(&self) -> DoseQuantity {
        self.dose
    }
}

/// Event: IntakeCompleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntakeCompleted {
    pub event_id: IntakeEventId,
    pub user_id: UserId,
    pub schedule_id: ScheduleId,
    pub medication_id: MedicationId,
    pub target: NaiveDateTime,
    pub completed_at: DateTime<Utc>,
    pub dose: DoseQuantity,
}

/// Event: IntakeUncompleted (the reversal of a prior completion).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntakeUncompleted {
    pub event_id: IntakeEventId,
    pub user_id: UserId,
    pub schedule_id: ScheduleId,
    pub medication_id: MedicationId,
    pub target: NaiveDateTime,
    pub completed_at: DateTime<Utc>,
    pub uncompleted_at: DateTime<Utc>,
    pub dose: DoseQuantity,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntakeEvent {
    IntakeCompleted(IntakeCompleted),
    IntakeUncompleted(IntakeUncompleted),
}

impl IntakeEvent {
    pub fn medication_id(&self) -> MedicationId {
        match self {
            IntakeEvent::IntakeCompleted(e) => e.medication_id,
            IntakeEvent::IntakeUncompleted(e) => e.medication_id,
        }
    }

    pub fn dose(&self) -> DoseQuantity {
        match self {
            IntakeEvent::IntakeCompleted(e) => e.dose,
            IntakeEvent::IntakeUncompleted(e) => e.dose,
        }
    }
}

impl Event for IntakeEvent {
    fn event_type(&self) -> &'static str {
        match self {
            IntakeEvent::IntakeCompleted(_) => "scheduling.intake.completed",
            IntakeEvent::IntakeUncompleted(_) => "scheduling.intake.uncompleted",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            IntakeEvent::IntakeCompleted(e) => e.completed_at,
            IntakeEvent::IntakeUncompleted(e) => e.uncompleted_at,
        }
    }
}

/// Per-occurrence completion state machine.
///
/// pending → completed via [`complete`](IntakeLedger::complete);
/// completed → pending via [`uncomplete`](IntakeLedger::uncomplete).
///
/// The state change commits to the ledger's own store first; the matching
/// event is published afterwards. Consumers (the inventory reconciler) must
/// not assume delivery inside the ledger's transaction boundary; inventory
/// is eventually consistent with completion, never atomically.
pub struct IntakeLedger<B> {
    registry: Arc<ScheduleRegistry>,
    completions: RwLock<HashMap<(ScheduleId, NaiveDate), IntakeRecord>>,
    // Keyed by medication: intake effects for one medication form one
    // ordered stream (the envelope sequence makes the order observable).
    sequences: Mutex<HashMap<MedicationId, u64>>,
    bus: B,
}

impl<B> IntakeLedger<B>
where
    B: EventBus<EventEnvelope<IntakeEvent>>,
{
    pub fn new(registry: Arc<ScheduleRegistry>, bus: B) -> Self {
        Self {
            registry,
            completions: RwLock::new(HashMap::new()),
            sequences: Mutex::new(HashMap::new()),
            bus,
        }
    }

    /// Complete the occurrence of `schedule_id` on `date`.
    ///
    /// Fails with not-found when the schedule does not belong to the user,
    /// occurrence-mismatch when the recurrence never produces `date`, and
    /// conflict when the occurrence is already completed.
    pub fn complete(
        &self,
        user_id: UserId,
        schedule_id: ScheduleId,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> DomainResult<IntakeRecord> {
        let schedule = self.registry.get(user_id, schedule_id)?;

        if !recurrence::is_occurrence(&schedule, date) {
            return Err(DomainError::occurrence_mismatch(date));
        }

        let record = IntakeRecord {
            id: IntakeEventId::new(AggregateId::new()),
            user_id,
            schedule_id,
            medication_id: schedule.medication_id(),
            target: date.and_time(schedule.time()),
            completed_at: now,
            dose: schedule.dose(),
        };

        {
            let mut map = self
                .completions
                .write()
                .map_err(|_| DomainError::conflict("completion store lock poisoned"))?;
            if map.contains_key(&(schedule_id, date)) {
                return Err(DomainError::conflict("occurrence is already completed"));
            }
            map.insert((schedule_id, date), record.clone());
        }

        self.publish(
            user_id,
            record.medication_id,
            IntakeEvent::IntakeCompleted(IntakeCompleted {
                event_id: record.id,
                user_id,
                schedule_id,
                medication_id: record.medication_id,
                target: record.target,
                completed_at: record.completed_at,
                dose: record.dose,
            }),
        );

        Ok(record)
    }

    /// Revert a completion, returning the occurrence to pending.
    pub fn uncomplete(
        &self,
        user_id: UserId,
        event_id: IntakeEventId,
        now: DateTime<Utc>,
    ) -> DomainResult<IntakeRecord> {
        let record = {
            let mut map = self
                .completions
                .write()
                .map_err(|_| DomainError::conflict("completion store lock poisoned"))?;
            let key = map
                .iter()
                .find(|(_, r)| r.id == event_id && r.user_id == user_id)
                .map(|(k, _)| *k)
                .ok_or(DomainError::NotFound)?;
            map.remove(&key).ok_or(DomainError::NotFound)?
        };

        self.publish(
            user_id,
            record.medication_id,
            IntakeEvent::IntakeUncompleted(IntakeUncompleted {
                event_id: record.id,
                user_id,
                schedule_id: record.schedule_id,
                medication_id: record.medication_id,
                target: record.target,
                completed_at: record.completed_at,
                uncompleted_at: now,
                dose: record.dose,
            }),
        );

        Ok(record)
    }

    /// Whether the occurrence of `schedule_id` on `date` is completed.
    pub fn is_completed(&self, schedule_id: ScheduleId, date: NaiveDate) -> bool {
        self.completions
            .read()
            .map(|map| map.contains_key(&(schedule_id, date)))
            .unwrap_or(false)
    }

    /// Completion records of one schedule, ordered by target timestamp.
    pub fn completions(&self, user_id: UserId, schedule_id: ScheduleId) -> Vec<IntakeRecord> {
        let map = match self.completions.read() {
            Ok(m) => m,
            Err(_) => return vec![],
        };
        let mut out: Vec<IntakeRecord> = map
            .values()
            .filter(|r| r.user_id == user_id && r.schedule_id == schedule_id)
            .cloned()
            .collect();
        out.sort_by_key(|r| r.target);
        out
    }

    /// Remove all completion records of a schedule (cascade for schedule
    /// deletion). No events are published; the doses were taken.
    pub fn purge_schedule(&self, schedule_id: ScheduleId) {
        if let Ok(mut map) = self.completions.write() {
            map.retain(|(sid, _), _| *sid != schedule_id);
        }
    }

    /// Remove all completion records of a medication (cascade for medication
    /// deletion).
    pub fn purge_medication(&self, medication_id: MedicationId) {
        if let Ok(mut map) = self.completions.write() {
            map.retain(|_, r| r.medication_id != medication_id);
        }
    }

    fn publish(&self, user_id: UserId, medication_id: MedicationId, event: IntakeEvent) {
        // Hold the counter lock across the publish so per-medication envelope
        // order matches sequence order.
        match self.sequences.lock() {
            Ok(mut map) => {
                let seq = map.entry(medication_id).or_insert(0);
                *seq += 1;
                let envelope = EventEnvelope::new(
                    Uuid::now_v7(),
                    user_id,
                    medication_id.0,
                    "scheduling.intake",
                    *seq,
                    event,
                );
                if let Err(err) = self.bus.publish(envelope) {
                    warn!(medication = %medication_id, error = ?err, "failed to publish intake event");
                }
            }
            Err(_) => {
                warn!(medication = %medication_id, "sequence lock poisoned; intake event dropped");
            }
        }
    }
}
