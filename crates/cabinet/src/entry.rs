use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use medtrack_core::{AggregateId, DomainError, DomainResult, DoseQuantity, Entity, UserId};
use medtrack_medications::MedicationId;

/// Cabinet entry identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CabinetEntryId(pub AggregateId);

impl CabinetEntryId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for CabinetEntryId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// One physical package of a medication.
///
/// `remaining` never goes negative; an entry whose balance reaches exactly
/// zero during a subtraction is deleted from the cabinet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CabinetEntry {
    id: CabinetEntryId,
    user_id: UserId,
    medication_id: MedicationId,
    remaining: DoseQuantity,
    capacity: DoseQuantity,
    expiry: NaiveDate,
}

/// Input for registering a package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCabinetEntry {
    pub medication_id: MedicationId,
    pub remaining: DoseQuantity,
    pub capacity: DoseQuantity,
    pub expiry: NaiveDate,
}

impl CabinetEntry {
    /// Validated constructor for direct user input.
    pub fn try_new(id: CabinetEntryId, user_id: UserId, input: NewCabinetEntry) -> DomainResult<Self> {
        Self::check_balance(input.remaining, input.capacity)?;
        Ok(Self {
            id,
            user_id,
            medication_id: input.medication_id,
            remaining: input.remaining,
            capacity: input.capacity,
            expiry: input.expiry,
        })
    }

    pub(crate) fn check_balance(remaining: DoseQuantity, capacity: DoseQuantity) -> DomainResult<()> {
        if !capacity.is_positive() {
            return Err(DomainError::validation("package capacity must be positive"));
        }
        if remaining < DoseQuantity::ZERO {
            return Err(DomainError::validation("remaining doses cannot be negative"));
        }
        if remaining > capacity {
            return Err(DomainError::validation(
                "remaining doses cannot exceed package capacity",
            ));
        }
        Ok(())
    }

    pub fn id_typed(&self) -> CabinetEntryId {
        self.id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn medication_id(&self) -> MedicationId {
        self.medication_id
    }

    pub fn remaining(&self) -> DoseQuantity {
        self.remaining
    }

    pub fn capacity(&self) -> DoseQuantity {
        self.capacity
    }

    pub fn expiry(&self) -> NaiveDate {
        self.expiry
    }

    pub(crate) fn set_remaining(&mut self, remaining: DoseQuantity) {
        self.remaining = remaining;
    }

    pub(crate) fn set_validated(
        &mut self,
        remaining: DoseQuantity,
        capacity: DoseQuantity,
        expiry: NaiveDate,
    ) -> DomainResult<()> {
        Self::check_balance(remaining, capacity)?;
        self.remaining = remaining;
        self.capacity = capacity;
        self.expiry = expiry;
        Ok(())
    }

    /// Restock target for `add`: may exceed capacity, the invariant binds
    /// direct user input only.
    pub(crate) fn restock(&mut self, dose: DoseQuantity) {
        self.remaining = self
            .remaining
            .checked_add(dose)
            .unwrap_or(DoseQuantity::from_millidoses(i64::MAX));
    }
}

impl Entity for CabinetEntry {
    type Id = CabinetEntryId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
