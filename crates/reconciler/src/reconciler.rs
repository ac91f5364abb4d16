use std::sync::Arc;

use medtrack_cabinet::CabinetInventory;
use medtrack_core::DomainResult;
use medtrack_events::{EventBus, EventEnvelope};
use medtrack_scheduling::IntakeEvent;

use crate::worker::{EventWorker, WorkerHandle};

/// Translates intake events into cabinet mutations.
///
/// - completion → `subtract(medication, dose)`
/// - uncompletion → `add(medication, dose)`
///
/// An insufficient-stock failure propagates to the worker boundary, where it
/// is logged and swallowed: the completion already succeeded and is not
/// undone. Uncompletion restocks unconditionally (`add` cannot fail in a
/// user-visible way).
pub struct InventoryReconciler {
    inventory: Arc<CabinetInventory>,
}

impl InventoryReconciler {
    pub fn new(inventory: Arc<CabinetInventory>) -> Self {
        Self { inventory }
    }

    /// Apply one intake event to the cabinet.
    ///
    /// Each delivery is applied as a fresh mutation; duplicate suppression
    /// belongs to the transport (the envelope's event id identifies
    /// redeliveries).
    pub fn handle(&self, envelope: &EventEnvelope<IntakeEvent>) -> DomainResult<()> {
        match envelope.payload() {
            IntakeEvent::IntakeCompleted(e) => {
                self.inventory.subtract(e.user_id, e.medication_id, e.dose)
            }
            IntakeEvent::IntakeUncompleted(e) => {
                self.inventory.add(e.user_id, e.medication_id, e.dose);
                Ok(())
            }
        }
    }

    /// Spawn a worker applying intake events from `bus` to `inventory`.
    pub fn spawn<B>(bus: B, inventory: Arc<CabinetInventory>) -> WorkerHandle
    where
        B: EventBus<EventEnvelope<IntakeEvent>> + Send + Sync + 'static,
    {
        let reconciler = InventoryReconciler::new(inventory);
        EventWorker::spawn("inventory-reconciler", bus, None, move |envelope| {
            reconciler.handle(&envelope)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use uuid::Uuid;

    use medtrack_cabinet::NewCabinetEntry;
    use medtrack_core::{AggregateId, DomainError, DoseQuantity, UserId};
    use medtrack_medications::MedicationId;
    use medtrack_scheduling::{IntakeCompleted, IntakeEventId, IntakeUncompleted, ScheduleId};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn envelope(user: UserId, medication: MedicationId, event: IntakeEvent) -> EventEnvelope<IntakeEvent> {
        EventEnvelope::new(Uuid::now_v7(), user, medication.0, "scheduling.intake", 1, event)
    }

    fn completed(user: UserId, medication: MedicationId, dose: i64) -> IntakeEvent {
        IntakeEvent::IntakeCompleted(IntakeCompleted {
            event_id: IntakeEventId::new(AggregateId::new()),
            user_id: user,
            schedule_id: ScheduleId::new(AggregateId::new()),
            medication_id: medication,
            target: date(2025, 1, 1).and_hms_opt(8, 0, 0).unwrap(),
            completed_at: Utc.with_ymd_and_hms(2025, 1, 1, 8, 5, 0).unwrap(),
            dose: DoseQuantity::from_whole(dose),
        })
    }

    fn uncompleted(user: UserId, medication: MedicationId, dose: i64) -> IntakeEvent {
        IntakeEvent::IntakeUncompleted(IntakeUncompleted {
            event_id: IntakeEventId::new(AggregateId::new()),
            user_id: user,
            schedule_id: ScheduleId::new(AggregateId::new()),
            medication_id: medication,
            target: date(2025, 1, 1).and_hms_opt(8, 0, 0).unwrap(),
            completed_at: Utc.with_ymd_and_hms(2025, 1, 1, 8, 5, 0).unwrap(),
            uncompleted_at: Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap(),
            dose: DoseQuantity::from_whole(dose),
        })
    }

    #[test]
    fn completion_subtracts_from_inventory() {
        let inventory = Arc::new(CabinetInventory::new());
        let reconciler = InventoryReconciler::new(inventory.clone());
        let user = UserId::new();
        let med = MedicationId::new(AggregateId::new());

        inventory
            .create_entry(
                user,
                NewCabinetEntry {
                    medication_id: med,
                    remaining: DoseQuantity::from_whole(10),
                    capacity: DoseQuantity::from_whole(10),
                    expiry: date(2026, 1, 1),
                },
            )
            .unwrap();

        reconciler
            .handle(&envelope(user, med, completed(user, med, 2)))
            .unwrap();

        assert_eq!(inventory.total_remaining(user, med), DoseQuantity::from_whole(8));
    }

    #[test]
    fn insufficiency_surfaces_but_keeps_the_partial_deduction() {
        let inventory = Arc::new(CabinetInventory::new());
        let reconciler = InventoryReconciler::new(inventory.clone());
        let user = UserId::new();
        let med = MedicationId::new(AggregateId::new());

        inventory
            .create_entry(
                user,
                NewCabinetEntry {
                    medication_id: med,
                    remaining: DoseQuantity::from_whole(1),
                    capacity: DoseQuantity::from_whole(1),
                    expiry: date(2026, 1, 1),
                },
            )
            .unwrap();

        let err = reconciler
            .handle(&envelope(user, med, completed(user, med, 3)))
            .unwrap_err();
        assert_eq!(
            err,
            DomainError::InsufficientStock {
                missing: DoseQuantity::from_whole(2)
            }
        );
        assert_eq!(inventory.total_remaining(user, med), DoseQuantity::ZERO);
    }

    #[test]
    fn uncompletion_restocks_and_never_fails() {
        let inventory = Arc::new(CabinetInventory::new());
        let reconciler = InventoryReconciler::new(inventory.clone());
        let user = UserId::new();
        let med = MedicationId::new(AggregateId::new());

        // No entries on record: restock is silently dropped.
        reconciler
            .handle(&envelope(user, med, uncompleted(user, med, 2)))
            .unwrap();
        assert_eq!(inventory.total_remaining(user, med), DoseQuantity::ZERO);

        inventory
            .create_entry(
                user,
                NewCabinetEntry {
                    medication_id: med,
                    remaining: DoseQuantity::from_whole(4),
                    capacity: DoseQuantity::from_whole(10),
                    expiry: date(2026, 1, 1),
                },
            )
            .unwrap();

        reconciler
            .handle(&envelope(user, med, uncompleted(user, med, 2)))
            .unwrap();
        assert_eq!(inventory.total_remaining(user, med), DoseQuantity::from_whole(6));
    }
}
