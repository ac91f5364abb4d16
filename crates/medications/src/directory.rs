use std::collections::HashMap;
use std::sync::{Mutex, RwLock};

use chrono::{DateTime, Utc};
use tracing::warn;
use uuid::Uuid;

use medtrack_core::{AggregateId, DomainError, DomainResult, UserId};
use medtrack_events::{EventBus, EventEnvelope};

use crate::medication::{
    Medication, MedicationCreated, MedicationDeleted, MedicationEvent, MedicationId,
    MedicationRenamed,
};

/// Directory of medications per user.
///
/// Mutations commit to the store first; the matching event is published
/// afterwards. A failed publish is logged and does not unwind the committed
/// change (the event can be republished).
pub struct MedicationDirectory<B> {
    medications: RwLock<HashMap<MedicationId, Medication>>,
    sequences: Mutex<HashMap<MedicationId, u64>>,
    bus: B,
}

impl<B> MedicationDirectory<B>
where
    B: EventBus<EventEnvelope<MedicationEvent>>,
{
    pub fn new(bus: B) -> Self {
        Self {
            medications: RwLock::new(HashMap::new()),
            sequences: Mutex::new(HashMap::new()),
            bus,
        }
    }

    pub fn create(
        &self,
        user_id: UserId,
        name: impl Into<String>,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> DomainResult<Medication> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }

        let id = MedicationId::new(AggregateId::new());
        let medication = Medication::new(id, user_id, name.clone(), notes);

        {
            let mut map = self
                .medications
                .write()
                .map_err(|_| DomainError::conflict("medication store lock poisoned"))?;
            map.insert(id, medication.clone());
        }

        self.publish(
            user_id,
            id,
            MedicationEvent::MedicationCreated(MedicationCreated {
                user_id,
                medication_id: id,
                name,
                occurred_at: now,
            }),
        );

        Ok(medication)
    }

    pub fn rename(
        &self,
        user_id: UserId,
        id: MedicationId,
        name: impl Into<String>,
        now: DateTime<Utc>,
    ) -> DomainResult<Medication> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }

        let renamed = {
            let mut map = self
                .medications
                .write()
                .map_err(|_| DomainError::conflict("medication store lock poisoned"))?;
            let medication = map
                .get_mut(&id)
                .filter(|m| m.user_id() == user_id)
                .ok_or(DomainError::NotFound)?;
            medication.set_name(name.clone());
            medication.clone()
        };

        self.publish(
            user_id,
            id,
            MedicationEvent::MedicationRenamed(MedicationRenamed {
                user_id,
                medication_id: id,
                name,
                occurred_at: now,
            }),
        );

        Ok(renamed)
    }

    /// Delete a medication.
    ///
    /// Schedules, completion records and cabinet entries referencing the
    /// medication are cleaned up by subscribers of the published
    /// `MedicationDeleted` event, not inside this call.
    pub fn delete(&self, user_id: UserId, id: MedicationId, now: DateTime<Utc>) -> DomainResult<()> {
        {
            let mut map = self
                .medications
                .write()
                .map_err(|_| DomainError::conflict("medication store lock poisoned"))?;
            match map.get(&id) {
                Some(m) if m.user_id() == user_id => {
                    map.remove(&id);
                }
                _ => return Err(DomainError::NotFound),
            }
        }

        self.publish(
            user_id,
            id,
            MedicationEvent::MedicationDeleted(MedicationDeleted {
                user_id,
                medication_id: id,
                occurred_at: now,
            }),
        );

        Ok(())
    }

    pub fn get(&self, user_id: UserId, id: MedicationId) -> DomainResult<Medication> {
        let map = self
            .medications
            .read()
            .map_err(|_| DomainError::conflict("medication store lock poisoned"))?;
        map.get(&id)
            .filter(|m| m.user_id() == user_id)
            .cloned()
            .ok_or(DomainError::NotFound)
    }

    /// All medications of one user, ordered by id (stable for reporting).
    pub fn list(&self, user_id: UserId) -> Vec<Medication> {
        let map = match self.medications.read() {
            Ok(m) => m,
            Err(_) => return vec![],
        };
        let mut out: Vec<Medication> = map
            .values()
            .filter(|m| m.user_id() == user_id)
            .cloned()
            .collect();
        out.sort_by_key(|m| m.id_typed());
        out
    }

    fn publish(&self, user_id: UserId, id: MedicationId, event: MedicationEvent) {
        let seq = self.next_sequence(id);
        let envelope = EventEnvelope::new(
            Uuid::now_v7(),
            user_id,
            id.0,
            "medications.medication",
            seq,
            event,
        );
        if let Err(err) = self.bus.publish(envelope) {
            warn!(medication = %id, error = ?err, "failed to publish medication event");
        }
    }

    fn next_sequence(&self, id: MedicationId) -> u64 {
        match self.sequences.lock() {
            Ok(mut map) => {
                let seq = map.entry(id).or_insert(0);
                *seq += 1;
                *seq
            }
            Err(_) => 0,
        }
    }
}
