//! The month-scoped slice of stored state every calculator reads from.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    budget::{DailyTarget, MonthlyBudget},
    catalog::Plan,
    common::BudgetMonth,
    schedule::Schedule,
};

/// Everything known about one store's month: its budget, overrides, schedules
/// and the current state of every plan those schedules still reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthBook {
    pub store_id: Uuid,
    pub month: BudgetMonth,
    pub budget: Option<MonthlyBudget>,
    #[serde(default)]
    pub daily_targets: Vec<DailyTarget>,
    #[serde(default)]
    pub schedules: Vec<Schedule>,
    #[serde(default)]
    pub plans: HashMap<Uuid, Plan>,
}

impl MonthBook {
    pub fn empty(store_id: Uuid, month: BudgetMonth) -> Self {
        Self {
            store_id,
            month,
            budget: None,
            daily_targets: Vec::new(),
            schedules: Vec::new(),
            plans: HashMap::new(),
        }
    }

    /// Monthly target, zero when no budget exists.
    pub fn target_amount(&self) -> i64 {
        self.budget
            .as_ref()
            .map(|budget| budget.target_amount)
            .unwrap_or(0)
    }

    pub fn daily_target_for(&self, date: NaiveDate) -> Option<i64> {
        self.daily_targets
            .iter()
            .find(|target| target.target_date == date)
            .map(|target| target.target_amount)
    }

    /// Schedules that fall inside the month, in date order.
    pub fn month_schedules(&self) -> impl Iterator<Item = &Schedule> {
        let month = self.month;
        self.schedules
            .iter()
            .filter(move |schedule| month.contains(schedule.scheduled_date))
    }

    pub fn schedules_on(&self, date: NaiveDate) -> impl Iterator<Item = &Schedule> {
        self.schedules
            .iter()
            .filter(move |schedule| schedule.scheduled_date == date)
    }

    /// Current state of the schedule's plan, if it still resolves.
    pub fn plan_for(&self, schedule: &Schedule) -> Option<&Plan> {
        schedule.plan_id.and_then(|id| self.plans.get(&id))
    }
}
