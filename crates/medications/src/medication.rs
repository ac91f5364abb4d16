use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use medtrack_core::{AggregateId, Entity, UserId};
use medtrack_events::Event;

/// Medication identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MedicationId(pub AggregateId);

impl MedicationId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for MedicationId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// A medication known to one user.
///
/// Reference data only: dosing rules live on schedules, physical stock on
/// cabinet entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Medication {
    id: MedicationId,
    user_id: UserId,
    name: String,
    notes: Option<String>,
}

impl Medication {
    pub(crate) fn new(
        id: MedicationId,
        user_id: UserId,
        name: String,
        notes: Option<String>,
    ) -> Self {
        Self {
            id,
            user_id,
            name,
            notes,
        }
    }

    pub fn id_typed(&self) -> MedicationId {
        self.id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }
}

impl Entity for Medication {
    type Id = MedicationId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Event: MedicationCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicationCreated {
    pub user_id: UserId,
    pub medication_id: MedicationId,
    pub name: String,
    pub occurred_at: DateTime<Utc>,
}

/// Event: MedicationRenamed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicationRenamed {
    pub user_id: UserId,
    pub medication_id: MedicationId,
    pub name: String,
    pub occurred_at: DateTime<Utc>,
}

/// Event: MedicationDeleted.
///
/// Consumed for cascade cleanup: schedules, completion records and cabinet
/// entries of the medication are removed by subscribers, not by the
/// directory itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicationDeleted {
    pub user_id: UserId,
    pub medication_id: MedicationId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MedicationEvent {
    MedicationCreated(MedicationCreated),
    MedicationRenamed(MedicationRenamed),
    MedicationDeleted(MedicationDeleted),
}

impl Event for MedicationEvent {
    fn event_type(&self) -> &'static str {
        match self {
            MedicationEvent::MedicationCreated(_) => "medications.medication.created",
            MedicationEvent::MedicationRenamed(_) => "medications.medication.renamed",
            MedicationEvent::MedicationDeleted(_) => "medications.medication.deleted",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            MedicationEvent::MedicationCreated(e) => e.occurred_at,
            MedicationEvent::MedicationRenamed(e) => e.occurred_at,
            MedicationEvent::MedicationDeleted(e) => e.occurred_at,
        }
    }
}
