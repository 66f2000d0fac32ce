//! Facade that wires storage and a clock to the calculators and services.

use std::path::Path;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::debug;
use uuid::Uuid;

use plan_core::{
    AchievementService, BudgetService, CalendarService, CatalogService, Clock, ForecastService,
    PlanningStorage, ScheduleService, SnapshotService,
};
use plan_domain::{
    BudgetMonth, CalendarWeek, DailyRecord, DailyTargetSummary, ForecastResult, HistoricalRecord,
    MonthBook, MonthReport, MonthlyBudget, Plan, PlanItemDraft, Product, Schedule,
    SnapshotDocument, Store,
};
use plan_storage_sqlite::SqliteStorage;

use crate::errors::{BudgetError, Result};

/// Entry point for every engine operation.
///
/// Reads go through a [`MonthBook`] loaded from storage and are evaluated
/// against the injected clock's "today".
pub struct PlanningEngine {
    storage: Box<dyn PlanningStorage>,
    clock: Box<dyn Clock>,
}

impl PlanningEngine {
    pub fn new(storage: Box<dyn PlanningStorage>, clock: Box<dyn Clock>) -> Self {
        Self { storage, clock }
    }

    /// Opens (creating if needed) the SQLite database at `path`.
    pub fn open(path: &Path, clock: Box<dyn Clock>) -> Result<Self> {
        let storage = SqliteStorage::open(path)?;
        Ok(Self::new(Box::new(storage), clock))
    }

    pub fn in_memory(clock: Box<dyn Clock>) -> Result<Self> {
        let storage = SqliteStorage::open_in_memory()?;
        Ok(Self::new(Box::new(storage), clock))
    }

    pub fn storage(&self) -> &dyn PlanningStorage {
        self.storage.as_ref()
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn month_book(&self, store_id: Uuid, year: i32, month: u32) -> Result<MonthBook> {
        let month = BudgetMonth::new(year, month)?;
        Ok(self.storage.load_month_book(store_id, month)?)
    }

    // --- calculators -----------------------------------------------------

    /// Month-end projection for `(store, year, month)` as of today.
    pub fn forecast(&self, store_id: Uuid, year: i32, month: u32) -> Result<ForecastResult> {
        let book = self.month_book(store_id, year, month)?;
        Ok(ForecastService::forecast(&book, self.today()))
    }

    pub fn daily_achievement_rate(&self, store_id: Uuid, year: i32, month: u32) -> Result<Decimal> {
        let book = self.month_book(store_id, year, month)?;
        Ok(AchievementService::daily_achievement_rate(
            &book,
            self.today(),
        ))
    }

    /// One record per calendar day of the month.
    pub fn build(&self, store_id: Uuid, year: i32, month: u32) -> Result<Vec<DailyRecord>> {
        let book = self.month_book(store_id, year, month)?;
        Ok(CalendarService::build(&book, self.today()))
    }

    pub fn calendar_weeks(&self, store_id: Uuid, year: i32, month: u32) -> Result<Vec<CalendarWeek>> {
        let records = self.build(store_id, year, month)?;
        Ok(CalendarService::weeks(&records))
    }

    pub fn month_report(&self, store_id: Uuid, year: i32, month: u32) -> Result<MonthReport> {
        let book = self.month_book(store_id, year, month)?;
        Ok(CalendarService::month_report(&book, self.today()))
    }

    // --- snapshots -------------------------------------------------------

    /// Freezes a plan's current composition at the clock's "now".
    pub fn capture(&self, plan: &Plan) -> SnapshotDocument {
        SnapshotService::capture(plan, self.clock.now())
    }

    pub fn capture_snapshot(&self, schedule_id: Uuid) -> Result<SnapshotDocument> {
        Ok(SnapshotService::capture_for_schedule(
            self.storage.as_ref(),
            self.clock.as_ref(),
            schedule_id,
        )?)
    }

    pub fn reconstruct(&self, schedule_id: Uuid) -> Result<HistoricalRecord> {
        let schedule = self
            .storage
            .load_schedule(schedule_id)?
            .ok_or_else(|| BudgetError::NotFound(format!("schedule {schedule_id}")))?;
        let plan = match schedule.plan_id {
            Some(plan_id) => self.storage.load_plan(plan_id)?,
            None => None,
        };
        let record = SnapshotService::reconstruct(&schedule, plan.as_ref());
        debug!(schedule = %schedule_id, source = ?record.source(), "schedule reconstructed");
        Ok(record)
    }

    // --- catalog ---------------------------------------------------------

    pub fn add_store(&self, name: &str) -> Result<Store> {
        Ok(CatalogService::add_store(self.storage.as_ref(), name)?)
    }

    pub fn store(&self, name: &str) -> Result<Store> {
        Ok(CatalogService::store_by_name(self.storage.as_ref(), name)?)
    }

    pub fn add_product(&self, store_id: Uuid, name: &str, unit_price: i64) -> Result<Product> {
        Ok(CatalogService::add_product(
            self.storage.as_ref(),
            store_id,
            name,
            unit_price,
        )?)
    }

    pub fn product(&self, store_id: Uuid, name: &str) -> Result<Product> {
        Ok(CatalogService::product_by_name(
            self.storage.as_ref(),
            store_id,
            name,
        )?)
    }

    pub fn set_product_price(&self, product_id: Uuid, unit_price: i64) -> Result<()> {
        Ok(CatalogService::set_product_price(
            self.storage.as_ref(),
            product_id,
            unit_price,
        )?)
    }

    pub fn remove_product(&self, product_id: Uuid) -> Result<()> {
        Ok(CatalogService::remove_product(
            self.storage.as_ref(),
            product_id,
        )?)
    }

    pub fn add_plan(&self, store_id: Uuid, name: &str, items: &[PlanItemDraft]) -> Result<Plan> {
        Ok(CatalogService::add_plan(
            self.storage.as_ref(),
            store_id,
            name,
            items,
        )?)
    }

    pub fn plan(&self, store_id: Uuid, name: &str) -> Result<Plan> {
        Ok(CatalogService::plan_by_name(
            self.storage.as_ref(),
            store_id,
            name,
        )?)
    }

    pub fn set_plan_items(&self, plan_id: Uuid, items: &[PlanItemDraft]) -> Result<Plan> {
        Ok(CatalogService::replace_plan_items(
            self.storage.as_ref(),
            plan_id,
            items,
        )?)
    }

    pub fn remove_plan(&self, plan_id: Uuid) -> Result<()> {
        Ok(CatalogService::remove_plan(self.storage.as_ref(), plan_id)?)
    }

    // --- budgets ---------------------------------------------------------

    pub fn set_monthly_budget(
        &self,
        store_id: Uuid,
        month: BudgetMonth,
        target_amount: i64,
        discount_rate: Option<Decimal>,
    ) -> Result<MonthlyBudget> {
        Ok(BudgetService::set_monthly_budget(
            self.storage.as_ref(),
            store_id,
            month,
            target_amount,
            discount_rate,
        )?)
    }

    pub fn monthly_budget(&self, store_id: Uuid, month: BudgetMonth) -> Result<Option<MonthlyBudget>> {
        Ok(BudgetService::monthly_budget(
            self.storage.as_ref(),
            store_id,
            month,
        )?)
    }

    pub fn delete_monthly_budget(&self, store_id: Uuid, month: BudgetMonth) -> Result<()> {
        Ok(BudgetService::delete_monthly_budget(
            self.storage.as_ref(),
            store_id,
            month,
        )?)
    }

    pub fn set_daily_targets(
        &self,
        store_id: Uuid,
        month: BudgetMonth,
        entries: &[(NaiveDate, i64)],
    ) -> Result<DailyTargetSummary> {
        Ok(BudgetService::set_daily_targets(
            self.storage.as_ref(),
            store_id,
            month,
            entries,
        )?)
    }

    pub fn clear_daily_targets(&self, store_id: Uuid, month: BudgetMonth) -> Result<usize> {
        Ok(BudgetService::clear_daily_targets(
            self.storage.as_ref(),
            store_id,
            month,
        )?)
    }

    pub fn daily_target_summary(
        &self,
        store_id: Uuid,
        month: BudgetMonth,
    ) -> Result<Option<DailyTargetSummary>> {
        Ok(BudgetService::daily_target_summary(
            self.storage.as_ref(),
            store_id,
            month,
        )?)
    }

    // --- schedules -------------------------------------------------------

    pub fn assign_plan(&self, store_id: Uuid, plan_id: Uuid, date: NaiveDate) -> Result<Schedule> {
        Ok(ScheduleService::assign_plan(
            self.storage.as_ref(),
            self.clock.as_ref(),
            store_id,
            plan_id,
            date,
        )?)
    }

    pub fn post_actual(&self, store_id: Uuid, date: NaiveDate, amount: i64) -> Result<Schedule> {
        Ok(ScheduleService::post_actual(
            self.storage.as_ref(),
            store_id,
            date,
            amount,
        )?)
    }

    pub fn unassign(&self, store_id: Uuid, date: NaiveDate) -> Result<()> {
        Ok(ScheduleService::unassign(self.storage.as_ref(), store_id, date)?)
    }

    pub fn schedule_on(&self, store_id: Uuid, date: NaiveDate) -> Result<Option<Schedule>> {
        Ok(ScheduleService::schedule_on(
            self.storage.as_ref(),
            store_id,
            date,
        )?)
    }
}

impl std::fmt::Debug for PlanningEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlanningEngine")
            .field("today", &self.today())
            .finish_non_exhaustive()
    }
}
