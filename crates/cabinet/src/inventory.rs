use std::collections::HashMap;
use std::sync::RwLock;

use chrono::NaiveDate;
use tracing::debug;

use medtrack_core::{AggregateId, DomainError, DomainResult, DoseQuantity, UserId};
use medtrack_medications::MedicationId;

use crate::entry::{CabinetEntry, CabinetEntryId, NewCabinetEntry};

/// Maximum number of entries one subtraction pass considers.
///
/// Deliberate resource bound, preserved as-is: medications with more than
/// this many concurrently active packages may under-report available stock
/// in a single pass.
pub const WORKING_SET_LIMIT: usize = 20;

/// Input for a direct user edit of an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CabinetEntryUpdate {
    pub remaining: DoseQuantity,
    pub capacity: DoseQuantity,
    pub expiry: NaiveDate,
}

/// Physical inventory of medication packages.
///
/// All mutations take the write lock, so subtract/add passes for one
/// medication observe a consistent snapshot and serialize relative to each
/// other. Consumption order is expiry ascending, ties broken by entry id
/// (time-ordered) for determinism.
#[derive(Debug, Default)]
pub struct CabinetInventory {
    entries: RwLock<HashMap<CabinetEntryId, CabinetEntry>>,
}

impl CabinetInventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_entry(&self, user_id: UserId, input: NewCabinetEntry) -> DomainResult<CabinetEntry> {
        let entry = CabinetEntry::try_new(CabinetEntryId::new(AggregateId::new()), user_id, input)?;

        let mut map = self
            .entries
            .write()
            .map_err(|_| DomainError::conflict("cabinet store lock poisoned"))?;
        map.insert(entry.id_typed(), entry.clone());
        Ok(entry)
    }

    pub fn update_entry(
        &self,
        user_id: UserId,
        id: CabinetEntryId,
        update: CabinetEntryUpdate,
    ) -> DomainResult<CabinetEntry> {
        let mut map = self
            .entries
            .write()
            .map_err(|_| DomainError::conflict("cabinet store lock poisoned"))?;
        let entry = map
            .get_mut(&id)
            .filter(|e| e.user_id() == user_id)
            .ok_or(DomainError::NotFound)?;
        entry.set_validated(update.remaining, update.capacity, update.expiry)?;
        Ok(entry.clone())
    }

    pub fn delete_entry(&self, user_id: UserId, id: CabinetEntryId) -> DomainResult<()> {
        let mut map = self
            .entries
            .write()
            .map_err(|_| DomainError::conflict("cabinet store lock poisoned"))?;
        match map.get(&id) {
            Some(e) if e.user_id() == user_id => {
                map.remove(&id);
                Ok(())
            }
            _ => Err(DomainError::NotFound),
        }
    }

    pub fn get(&self, user_id: UserId, id: CabinetEntryId) -> DomainResult<CabinetEntry> {
        let map = self
            .entries
            .read()
            .map_err(|_| DomainError::conflict("cabinet store lock poisoned"))?;
        map.get(&id)
            .filter(|e| e.user_id() == user_id)
            .cloned()
            .ok_or(DomainError::NotFound)
    }

    /// Entries of one medication in consumption order (expiry ascending).
    pub fn list(&self, user_id: UserId, medication_id: MedicationId) -> Vec<CabinetEntry> {
        let map = match self.entries.read() {
            Ok(m) => m,
            Err(_) => return vec![],
        };
        let mut out: Vec<CabinetEntry> = map
            .values()
            .filter(|e| e.user_id() == user_id && e.medication_id() == medication_id)
            .cloned()
            .collect();
        out.sort_by_key(|e| (e.expiry(), e.id_typed()));
        out
    }

    /// Deduct `dose` total doses from the medication's entries, oldest
    /// expiry first, bounded to a working set of [`WORKING_SET_LIMIT`]
    /// entries.
    ///
    /// Each entry is drained as far as it can cover the remaining deficit;
    /// a drained entry is set to exactly zero and deleted after the pass.
    /// If the working set is exhausted with dose still owed the call fails
    /// with insufficient-stock, and the partial deduction stands: entries
    /// already zeroed stay zeroed. No rollback.
    pub fn subtract(
        &self,
        user_id: UserId,
        medication_id: MedicationId,
        dose: DoseQuantity,
    ) -> DomainResult<()> {
        if !dose.is_positive() {
            return Err(DomainError::validation("subtracted dose must be positive"));
        }

        let mut map = self
            .entries
            .write()
            .map_err(|_| DomainError::conflict("cabinet store lock poisoned"))?;

        let mut working: Vec<(NaiveDate, CabinetEntryId)> = map
            .values()
            .filter(|e| e.user_id() == user_id && e.medication_id() == medication_id)
            .map(|e| (e.expiry(), e.id_typed()))
            .collect();
        working.sort();
        working.truncate(WORKING_SET_LIMIT);

        let mut owed = dose;
        for (_, id) in &working {
            if owed.is_zero() {
                break;
            }
            if let Some(entry) = map.get_mut(id) {
                let (left, still_owed) = entry.remaining().draw(owed);
                entry.set_remaining(left);
                owed = still_owed;
            }
        }

        // Drained packages leave the cabinet.
        for (_, id) in &working {
            if map.get(id).is_some_and(|e| e.remaining().is_zero()) {
                map.remove(id);
            }
        }

        if owed.is_positive() {
            return Err(DomainError::insufficient_stock(owed));
        }
        Ok(())
    }

    /// Restore `dose` doses to the entry with the earliest expiry date.
    ///
    /// Approximate restock target, not necessarily the entry the dose was
    /// originally taken from, and the capacity bound does not apply. With no
    /// entry on record the addition is silently dropped; restocking is
    /// best-effort only while at least one physical package exists.
    pub fn add(&self, user_id: UserId, medication_id: MedicationId, dose: DoseQuantity) {
        let mut map = match self.entries.write() {
            Ok(m) => m,
            Err(_) => return,
        };

        let target = map
            .values()
            .filter(|e| e.user_id() == user_id && e.medication_id() == medication_id)
            .map(|e| (e.expiry(), e.id_typed()))
            .min();

        match target {
            Some((_, id)) => {
                if let Some(entry) = map.get_mut(&id) {
                    entry.restock(dose);
                }
            }
            None => {
                debug!(medication = %medication_id, %dose, "no cabinet entry on record; restock dropped");
            }
        }
    }

    /// Sum of remaining doses across the medication's entries; zero when no
    /// entries exist, never absent.
    pub fn total_remaining(&self, user_id: UserId, medication_id: MedicationId) -> DoseQuantity {
        let map = match self.entries.read() {
            Ok(m) => m,
            Err(_) => return DoseQuantity::ZERO,
        };
        map.values()
            .filter(|e| e.user_id() == user_id && e.medication_id() == medication_id)
            .fold(DoseQuantity::ZERO, |acc, e| {
                acc.checked_add(e.remaining())
                    .unwrap_or(DoseQuantity::from_millidoses(i64::MAX))
            })
    }

    /// Cascade for medication deletion.
    pub fn delete_all_for_medication(&self, user_id: UserId, medication_id: MedicationId) {
        if let Ok(mut map) = self.entries.write() {
            map.retain(|_, e| !(e.user_id() == user_id && e.medication_id() == medication_id));
        }
    }
}
