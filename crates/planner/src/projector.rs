use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use medtrack_cabinet::CabinetInventory;
use medtrack_core::{DoseQuantity, UserId};
use medtrack_events::{EventBus, EventEnvelope};
use medtrack_medications::{MedicationDirectory, MedicationEvent, MedicationId};
use medtrack_scheduling::ScheduleRegistry;

/// One row of the planner projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicationPlan {
    pub medication_id: MedicationId,
    pub name: String,
    /// Doses currently in the cabinet.
    pub available: DoseQuantity,
    /// Doses the medication's schedules require from today through the
    /// horizon end.
    pub required: DoseQuantity,
}

impl MedicationPlan {
    /// Whether the cabinet covers the horizon's demand.
    pub fn is_covered(&self) -> bool {
        self.available >= self.required
    }
}

/// Read-only forecast composing schedule demand with cabinet stock.
///
/// Both sub-queries are point-in-time snapshots of independent aggregates;
/// no ordering is required between them and nothing here mutates state.
pub struct PlannerProjector<B> {
    directory: Arc<MedicationDirectory<B>>,
    registry: Arc<ScheduleRegistry>,
    inventory: Arc<CabinetInventory>,
}

impl<B> PlannerProjector<B>
where
    B: EventBus<EventEnvelope<MedicationEvent>>,
{
    pub fn new(
        directory: Arc<MedicationDirectory<B>>,
        registry: Arc<ScheduleRegistry>,
        inventory: Arc<CabinetInventory>,
    ) -> Self {
        Self {
            directory,
            registry,
            inventory,
        }
    }

    /// Plan rows for every medication of `user_id`, comparing stock against
    /// demand over `[today, horizon_end]`.
    ///
    /// `today` is the user's timezone-local current date, pre-resolved by
    /// the caller.
    pub fn project(&self, user_id: UserId, today: NaiveDate, horizon_end: NaiveDate) -> Vec<MedicationPlan> {
        self.directory
            .list(user_id)
            .into_iter()
            .map(|medication| {
                let id = medication.id_typed();
                MedicationPlan {
                    medication_id: id,
                    name: medication.name().to_string(),
                    available: self.inventory.total_remaining(user_id, id),
                    required: self.registry.required_doses_for_medication(
                        user_id,
                        id,
                        today,
                        horizon_end,
                    ),
                }
            })
            .collect()
    }
}
