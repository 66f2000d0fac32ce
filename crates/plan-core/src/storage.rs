//! Persistence boundary the services read and write through.

use std::collections::HashMap;

use chrono::NaiveDate;
use uuid::Uuid;

use plan_domain::{
    BudgetMonth, DailyTarget, MonthBook, MonthlyBudget, Plan, PlanItemDraft, Product, Schedule,
    ScheduleStatus, SnapshotDocument, Store,
};

use crate::CoreError;

/// Abstraction over the relational store backing the engine.
///
/// Implementations must enforce uniqueness of `(store, month)` budgets,
/// `(budget, date)` daily targets and `(store, scheduled_date)` schedules at
/// the storage layer and report violations as [`CoreError::Conflict`].
pub trait PlanningStorage: Send + Sync {
    fn insert_store(&self, store: &Store) -> Result<(), CoreError>;
    fn find_store_by_name(&self, name: &str) -> Result<Option<Store>, CoreError>;

    fn insert_product(&self, product: &Product) -> Result<(), CoreError>;
    fn find_product_by_name(&self, store_id: Uuid, name: &str)
        -> Result<Option<Product>, CoreError>;
    fn update_product_price(&self, product_id: Uuid, unit_price: i64) -> Result<(), CoreError>;
    fn delete_product(&self, product_id: Uuid) -> Result<(), CoreError>;

    /// Inserts the plan row and its items. Items are priced on read.
    fn insert_plan(&self, plan: &Plan) -> Result<(), CoreError>;
    fn replace_plan_items(&self, plan_id: Uuid, items: &[PlanItemDraft]) -> Result<(), CoreError>;
    /// Deletes the plan; schedules keep their rows with a null plan reference.
    fn delete_plan(&self, plan_id: Uuid) -> Result<(), CoreError>;
    /// Loads a plan with every item priced at the product's current unit price.
    fn load_plan(&self, plan_id: Uuid) -> Result<Option<Plan>, CoreError>;
    fn find_plan_by_name(&self, store_id: Uuid, name: &str) -> Result<Option<Plan>, CoreError>;

    fn load_budget(
        &self,
        store_id: Uuid,
        month: BudgetMonth,
    ) -> Result<Option<MonthlyBudget>, CoreError>;
    /// Creates or updates the budget for `(store, month)`; returns the stored record.
    fn upsert_budget(&self, budget: &MonthlyBudget) -> Result<MonthlyBudget, CoreError>;
    /// Removes the budget, its daily targets and the month's unposted schedules
    /// in one transaction. Fails with `Conflict` when any actual is posted.
    fn delete_budget(&self, store_id: Uuid, month: BudgetMonth) -> Result<(), CoreError>;

    fn load_daily_targets(&self, budget_id: Uuid) -> Result<Vec<DailyTarget>, CoreError>;
    /// Upserts every target on `(budget_id, target_date)` atomically.
    fn upsert_daily_targets(&self, targets: &[DailyTarget]) -> Result<(), CoreError>;
    fn clear_daily_targets(&self, budget_id: Uuid) -> Result<usize, CoreError>;

    /// Inserts a schedule; an occupied `(store, date)` is a `Conflict`.
    fn insert_schedule(&self, schedule: &Schedule) -> Result<(), CoreError>;
    fn load_schedule(&self, schedule_id: Uuid) -> Result<Option<Schedule>, CoreError>;
    fn schedule_on(&self, store_id: Uuid, date: NaiveDate) -> Result<Option<Schedule>, CoreError>;
    fn schedules_between(
        &self,
        store_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Schedule>, CoreError>;
    fn update_actual(
        &self,
        schedule_id: Uuid,
        actual_revenue: Option<i64>,
        status: ScheduleStatus,
    ) -> Result<(), CoreError>;
    /// Stores a snapshot unless one with lines is already present, in which
    /// case the stored one is kept and `Conflict` is returned.
    fn write_snapshot(
        &self,
        schedule_id: Uuid,
        snapshot: &SnapshotDocument,
    ) -> Result<(), CoreError>;
    fn delete_schedule(&self, schedule_id: Uuid) -> Result<(), CoreError>;

    /// Reads the month-scoped slice of state the calculators work on.
    fn load_month_book(&self, store_id: Uuid, month: BudgetMonth) -> Result<MonthBook, CoreError> {
        let mut book = MonthBook::empty(store_id, month);
        if let Some(budget) = self.load_budget(store_id, month)? {
            book.daily_targets = self.load_daily_targets(budget.id)?;
            book.budget = Some(budget);
        }
        book.schedules = self.schedules_between(store_id, month.first_day(), month.last_day())?;
        let mut plans = HashMap::new();
        for plan_id in book.schedules.iter().filter_map(|schedule| schedule.plan_id) {
            if plans.contains_key(&plan_id) {
                continue;
            }
            if let Some(plan) = self.load_plan(plan_id)? {
                plans.insert(plan_id, plan);
            }
        }
        book.plans = plans;
        Ok(book)
    }
}
