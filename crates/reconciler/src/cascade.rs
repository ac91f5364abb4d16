use std::sync::Arc;

use tracing::info;

use medtrack_cabinet::CabinetInventory;
use medtrack_core::DomainResult;
use medtrack_events::{EventBus, EventEnvelope};
use medtrack_medications::MedicationEvent;
use medtrack_scheduling::{IntakeEvent, IntakeLedger, ScheduleRegistry};

use crate::worker::{EventWorker, WorkerHandle};

/// Cascade cleanup when a medication is deleted.
///
/// The directory only removes its own row; everything referencing the
/// medication (schedules, completion records, cabinet entries) is removed
/// here, in reaction to the published deletion event. Purges are idempotent,
/// so redelivery is harmless.
pub struct MedicationCascade<B> {
    registry: Arc<ScheduleRegistry>,
    ledger: Arc<IntakeLedger<B>>,
    inventory: Arc<CabinetInventory>,
}

impl<B> MedicationCascade<B>
where
    B: EventBus<EventEnvelope<IntakeEvent>>,
{
    pub fn new(
        registry: Arc<ScheduleRegistry>,
        ledger: Arc<IntakeLedger<B>>,
        inventory: Arc<CabinetInventory>,
    ) -> Self {
        Self {
            registry,
            ledger,
            inventory,
        }
    }

    /// Apply one medication event.
    pub fn handle(&self, envelope: &EventEnvelope<MedicationEvent>) -> DomainResult<()> {
        if let MedicationEvent::MedicationDeleted(e) = envelope.payload() {
            let removed = self.registry.purge_medication(e.user_id, e.medication_id);
            for schedule_id in &removed {
                self.ledger.purge_schedule(*schedule_id);
            }
            self.ledger.purge_medication(e.medication_id);
            self.inventory.delete_all_for_medication(e.user_id, e.medication_id);

            info!(
                medication = %e.medication_id,
                schedules = removed.len(),
                "medication deleted; cascaded cleanup"
            );
        }
        Ok(())
    }

    /// Spawn a worker applying medication events from `bus`.
    pub fn spawn<MB>(
        bus: MB,
        registry: Arc<ScheduleRegistry>,
        ledger: Arc<IntakeLedger<B>>,
        inventory: Arc<CabinetInventory>,
    ) -> WorkerHandle
    where
        MB: EventBus<EventEnvelope<MedicationEvent>> + Send + Sync + 'static,
        B: Send + Sync + 'static,
    {
        let cascade = MedicationCascade::new(registry, ledger, inventory);
        EventWorker::spawn("medication-cascade", bus, None, move |envelope| {
            cascade.handle(&envelope)
        })
    }
}
