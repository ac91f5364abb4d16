use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use medtrack_core::{AggregateId, DomainError, DomainResult, DoseQuantity, Entity, UserId, ValueObject};
use medtrack_medications::MedicationId;

/// Schedule identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScheduleId(pub AggregateId);

impl ScheduleId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for ScheduleId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Calendar interval between occurrences: years + months + days.
///
/// At least one component must be non-zero; a zero interval has no defined
/// recurrence and is rejected at schedule creation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DoseInterval {
    pub years: u32,
    pub months: u32,
    pub days: u32,
}

impl DoseInterval {
    pub const fn new(years: u32, months: u32, days: u32) -> Self {
        Self { years, months, days }
    }

    pub const fn days(days: u32) -> Self {
        Self::new(0, 0, days)
    }

    pub const fn months(months: u32) -> Self {
        Self::new(0, months, 0)
    }

    pub const fn is_zero(&self) -> bool {
        self.years == 0 && self.months == 0 && self.days == 0
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.is_zero() {
            return Err(DomainError::validation(
                "interval must have at least one non-zero component",
            ));
        }
        Ok(())
    }
}

impl ValueObject for DoseInterval {}

/// Validity period of a schedule: start date inclusive, optional end date
/// inclusive. An absent end means the schedule recurs unbounded.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulePeriod {
    start: NaiveDate,
    end: Option<NaiveDate>,
}

impl SchedulePeriod {
    /// Invariant: a present end must be strictly after the start.
    pub fn new(start: NaiveDate, end: Option<NaiveDate>) -> DomainResult<Self> {
        if let Some(end) = end {
            if end <= start {
                return Err(DomainError::validation(
                    "period end must be strictly after period start",
                ));
            }
        }
        Ok(Self { start, end })
    }

    pub fn unbounded(start: NaiveDate) -> Self {
        Self { start, end: None }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> Option<NaiveDate> {
        self.end
    }

    /// Whether `date` falls within the period (both bounds inclusive).
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && self.end.is_none_or(|end| date <= end)
    }
}

impl ValueObject for SchedulePeriod {}

/// Recurring intake rule for one medication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    id: ScheduleId,
    user_id: UserId,
    medication_id: MedicationId,
    interval: DoseInterval,
    period: SchedulePeriod,
    time: NaiveTime,
    dose: DoseQuantity,
    description: Option<String>,
}

/// Input for creating a schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSchedule {
    pub medication_id: MedicationId,
    pub interval: DoseInterval,
    pub start: NaiveDate,
    pub end: Option<NaiveDate>,
    pub time: NaiveTime,
    pub dose: DoseQuantity,
    pub description: Option<String>,
}

/// Input for updating a schedule (full replacement of the mutable fields;
/// the owning user and medication are fixed at creation).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleUpdate {
    pub interval: DoseInterval,
    pub start: NaiveDate,
    pub end: Option<NaiveDate>,
    pub time: NaiveTime,
    pub dose: DoseQuantity,
    pub description: Option<String>,
}

impl Schedule {
    /// Validated constructor; the registry is the usual entry point.
    pub fn try_new(id: ScheduleId, user_id: UserId, input: NewSchedule) -> DomainResult<Self> {
        input.interval.validate()?;
        if !input.dose.is_positive() {
            return Err(DomainError::validation("dose must be positive"));
        }
        let period = SchedulePeriod::new(input.start, input.end)?;

        Ok(Self {
            id,
            user_id,
            medication_id: input.medication_id,
            interval: input.interval,
            period,
            time: input.time,
            dose: input.dose,
            description: input.description,
        })
    }

    pub(crate) fn apply_update(&mut self, update: ScheduleUpdate) -> DomainResult<()> {
        update.interval.validate()?;
        if !update.dose.is_positive() {
            return Err(DomainError::validation("dose must be positive"));
        }
        let period = SchedulePeriod::new(update.start, update.end)?;

        self.interval = update.interval;
        self.period = period;
        self.time = update.time;
        self.dose = update.dose;
        self.description = update.description;
        Ok(())
    }

    pub fn id_typed(&self) -> ScheduleId {
        self.id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn medication_id(&self) -> MedicationId {
        self.medication_id
    }

    pub fn interval(&self) -> DoseInterval {
        self.interval
    }

    pub fn period(&self) -> SchedulePeriod {
        self.period
    }

    pub fn time(&self) -> NaiveTime {
        self.time
    }

    pub fn dose(&self) -> DoseQuantity {
        self.dose
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Whether the schedule is active on `date` (date falls within the period).
    pub fn is_active_on(&self, date: NaiveDate) -> bool {
        self.period.contains(date)
    }
}

impl Entity for Schedule {
    type Id = ScheduleId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn new_schedule_input() -> NewSchedule {
        NewSchedule {
            medication_id: MedicationId::new(AggregateId::new()),
            interval: DoseInterval::days(1),
            start: date(2025, 1, 1),
            end: None,
            time: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            dose: DoseQuantity::from_whole(1),
            description: None,
        }
    }

    #[test]
    fn zero_interval_is_rejected() {
        let mut input = new_schedule_input();
        input.interval = DoseInterval::new(0, 0, 0);
        let err = Schedule::try_new(ScheduleId::new(AggregateId::new()), UserId::new(), input)
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn non_positive_dose_is_rejected() {
        let mut input = new_schedule_input();
        input.dose = DoseQuantity::ZERO;
        let err = Schedule::try_new(ScheduleId::new(AggregateId::new()), UserId::new(), input)
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn period_end_must_be_after_start() {
        assert!(SchedulePeriod::new(date(2025, 1, 2), Some(date(2025, 1, 2))).is_err());
        assert!(SchedulePeriod::new(date(2025, 1, 2), Some(date(2025, 1, 1))).is_err());
        assert!(SchedulePeriod::new(date(2025, 1, 2), Some(date(2025, 1, 3))).is_ok());
        assert!(SchedulePeriod::new(date(2025, 1, 2), None).is_ok());
    }

    #[test]
    fn period_contains_is_inclusive_on_both_bounds() {
        let period = SchedulePeriod::new(date(2025, 1, 1), Some(date(2025, 1, 31))).unwrap();
        assert!(period.contains(date(2025, 1, 1)));
        assert!(period.contains(date(2025, 1, 31)));
        assert!(!period.contains(date(2024, 12, 31)));
        assert!(!period.contains(date(2025, 2, 1)));

        let unbounded = SchedulePeriod::unbounded(date(2025, 1, 1));
        assert!(unbounded.contains(date(2100, 1, 1)));
    }
}
