//! Assigning plans to calendar days and posting their actual revenue.

use chrono::NaiveDate;
use tracing::{info, warn};
use uuid::Uuid;

use plan_domain::{Schedule, ScheduleStatus};

use crate::{snapshot_service::SnapshotService, storage::PlanningStorage, time::Clock, CoreError};

pub struct ScheduleService;

impl ScheduleService {
    /// Places a plan on a day, freezing its current composition.
    ///
    /// The storage layer arbitrates concurrent assignments: the loser gets
    /// `Conflict` and the existing schedule is left as it was.
    pub fn assign_plan(
        storage: &dyn PlanningStorage,
        clock: &dyn Clock,
        store_id: Uuid,
        plan_id: Uuid,
        date: NaiveDate,
    ) -> Result<Schedule, CoreError> {
        let plan = storage
            .load_plan(plan_id)?
            .filter(|plan| plan.store_id == store_id)
            .ok_or_else(|| CoreError::NotFound(format!("plan {plan_id} in this store")))?;
        let snapshot = SnapshotService::capture(&plan, clock.now());
        let schedule = Schedule::new(store_id, plan_id, date, snapshot);
        match storage.insert_schedule(&schedule) {
            Ok(()) => {
                info!(
                    store = %store_id,
                    plan = %plan_id,
                    %date,
                    total = plan.total(),
                    "plan scheduled"
                );
                Ok(schedule)
            }
            Err(CoreError::Conflict(_)) => {
                warn!(store = %store_id, %date, "assignment rejected: date occupied");
                Err(CoreError::Conflict(format!("{date} is already occupied")))
            }
            Err(err) => Err(err),
        }
    }

    /// Records the day's actual. Zero clears it back to "not yet posted".
    pub fn post_actual(
        storage: &dyn PlanningStorage,
        store_id: Uuid,
        date: NaiveDate,
        amount: i64,
    ) -> Result<Schedule, CoreError> {
        if amount < 0 {
            return Err(CoreError::InvalidInput(format!(
                "actual revenue must be non-negative, got {amount}"
            )));
        }
        let mut schedule = Self::require_on(storage, store_id, date)?;
        let (actual, status) = if amount > 0 {
            (Some(amount), ScheduleStatus::Completed)
        } else {
            (None, ScheduleStatus::Scheduled)
        };
        storage.update_actual(schedule.id, actual, status)?;
        schedule.actual_revenue = actual;
        schedule.status = status;
        info!(store = %store_id, %date, amount, "actual revenue posted");
        Ok(schedule)
    }

    /// Removes an unposted schedule from the calendar.
    pub fn unassign(
        storage: &dyn PlanningStorage,
        store_id: Uuid,
        date: NaiveDate,
    ) -> Result<(), CoreError> {
        let schedule = Self::require_on(storage, store_id, date)?;
        if schedule.has_posted_actual() {
            return Err(CoreError::Conflict(format!(
                "{date} has a posted actual and cannot be unassigned"
            )));
        }
        storage.delete_schedule(schedule.id)?;
        info!(store = %store_id, %date, "schedule removed");
        Ok(())
    }

    pub fn schedule_on(
        storage: &dyn PlanningStorage,
        store_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<Schedule>, CoreError> {
        storage.schedule_on(store_id, date)
    }

    fn require_on(
        storage: &dyn PlanningStorage,
        store_id: Uuid,
        date: NaiveDate,
    ) -> Result<Schedule, CoreError> {
        storage
            .schedule_on(store_id, date)?
            .ok_or_else(|| CoreError::NotFound(format!("no schedule on {date}")))
    }
}
