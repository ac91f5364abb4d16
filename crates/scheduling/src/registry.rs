use std::collections::HashMap;
use std::sync::RwLock;

use chrono::NaiveDate;

use medtrack_core::{AggregateId, DomainError, DomainResult, DoseQuantity, UserId};
use medtrack_medications::MedicationId;

use crate::recurrence;
use crate::schedule::{NewSchedule, Schedule, ScheduleId, ScheduleUpdate};

/// Owns the schedules of all users and answers recurrence queries.
///
/// Validation happens here (zero interval, non-positive dose, malformed
/// period) and is surfaced as a validation error, distinct from not-found;
/// invalid input is never silently corrected. Lookups for schedules owned by
/// another user report not-found without leaking the row's existence.
#[derive(Debug, Default)]
pub struct ScheduleRegistry {
    schedules: RwLock<HashMap<ScheduleId, Schedule>>,
}

impl ScheduleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, user_id: UserId, input: NewSchedule) -> DomainResult<Schedule> {
        let schedule = Schedule::try_new(ScheduleId::new(AggregateId::new()), user_id, input)?;

        let mut map = self
            .schedules
            .write()
            .map_err(|_| DomainError::conflict("schedule store lock poisoned"))?;
        map.insert(schedule.id_typed(), schedule.clone());
        Ok(schedule)
    }

    pub fn update(
        &self,
        user_id: UserId,
        id: ScheduleId,
        update: ScheduleUpdate,
    ) -> DomainResult<Schedule> {
        let mut map = self
            .schedules
            .write()
            .map_err(|_| DomainError::conflict("schedule store lock poisoned"))?;
        let schedule = map
            .get_mut(&id)
            .filter(|s| s.user_id() == user_id)
            .ok_or(DomainError::NotFound)?;
        schedule.apply_update(update)?;
        Ok(schedule.clone())
    }

    /// Delete a schedule, returning the removed entity.
    ///
    /// The caller is responsible for cascading occurrence cleanup via
    /// [`IntakeLedger::purge_schedule`](crate::intake::IntakeLedger::purge_schedule).
    pub fn delete(&self, user_id: UserId, id: ScheduleId) -> DomainResult<Schedule> {
        let mut map = self
            .schedules
            .write()
            .map_err(|_| DomainError::conflict("schedule store lock poisoned"))?;
        match map.get(&id) {
            Some(s) if s.user_id() == user_id => {}
            _ => return Err(DomainError::NotFound),
        }
        map.remove(&id).ok_or(DomainError::NotFound)
    }

    pub fn get(&self, user_id: UserId, id: ScheduleId) -> DomainResult<Schedule> {
        let map = self
            .schedules
            .read()
            .map_err(|_| DomainError::conflict("schedule store lock poisoned"))?;
        map.get(&id)
            .filter(|s| s.user_id() == user_id)
            .cloned()
            .ok_or(DomainError::NotFound)
    }

    /// Schedules of one user, optionally narrowed to a medication, optionally
    /// narrowed to those active on a given date (the caller's local today).
    pub fn list(
        &self,
        user_id: UserId,
        medication_id: Option<MedicationId>,
        active_on: Option<NaiveDate>,
    ) -> Vec<Schedule> {
        let map = match self.schedules.read() {
            Ok(m) => m,
            Err(_) => return vec![],
        };
        let mut out: Vec<Schedule> = map
            .values()
            .filter(|s| s.user_id() == user_id)
            .filter(|s| medication_id.is_none_or(|m| s.medication_id() == m))
            .filter(|s| active_on.is_none_or(|today| s.is_active_on(today)))
            .cloned()
            .collect();
        out.sort_by_key(|s| s.id_typed());
        out
    }

    /// Total doses required for a medication across `[window_start,
    /// window_end]`, summed over all of the user's schedules for it.
    pub fn required_doses_for_medication(
        &self,
        user_id: UserId,
        medication_id: MedicationId,
        window_start: NaiveDate,
        window_end: NaiveDate,
    ) -> DoseQuantity {
        self.list(user_id, Some(medication_id), None)
            .iter()
            .fold(DoseQuantity::ZERO, |acc, s| {
                acc.checked_add(recurrence::required_doses(s, window_start, window_end))
                    .unwrap_or(DoseQuantity::from_millidoses(i64::MAX))
            })
    }

    /// Remove all schedules of a medication (cascade for medication
    /// deletion). Returns the removed schedule ids so completion records can
    /// be purged alongside.
    pub fn purge_medication(&self, user_id: UserId, medication_id: MedicationId) -> Vec<ScheduleId> {
        let mut map = match self.schedules.write() {
            Ok(m) => m,
            Err(_) => return vec![],
        };
        let ids: Vec<ScheduleId> = map
            .values()
            .filter(|s| s.user_id() == user_id && s.medication_id() == medication_id)
            .map(|s| s.id_typed())
            .collect();
        for id in &ids {
            map.remove(id);
        }
        ids
    }
}
