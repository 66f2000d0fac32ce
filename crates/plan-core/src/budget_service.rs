//! Budget Allocation Store operations: monthly targets and per-day overrides.

use std::collections::HashSet;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

use plan_domain::{BudgetMonth, DailyTarget, DailyTargetSummary, MonthlyBudget};

use crate::{storage::PlanningStorage, CoreError};

pub struct BudgetService;

impl BudgetService {
    /// Creates or updates the budget for `(store, month)`.
    pub fn set_monthly_budget(
        storage: &dyn PlanningStorage,
        store_id: Uuid,
        month: BudgetMonth,
        target_amount: i64,
        discount_rate: Option<Decimal>,
    ) -> Result<MonthlyBudget, CoreError> {
        if target_amount < 0 {
            return Err(CoreError::InvalidInput(format!(
                "target amount must be non-negative, got {target_amount}"
            )));
        }
        if let Some(rate) = discount_rate {
            if rate < Decimal::ZERO || rate > Decimal::ONE_HUNDRED {
                return Err(CoreError::InvalidInput(format!(
                    "discount rate must be between 0 and 100, got {rate}"
                )));
            }
        }
        let mut budget = match storage.load_budget(store_id, month)? {
            Some(existing) => existing,
            None => MonthlyBudget::new(store_id, month, target_amount),
        }
        .with_discount_rate(discount_rate);
        budget.target_amount = target_amount;
        budget.updated_at = Utc::now();
        let stored = storage.upsert_budget(&budget)?;
        info!(store = %store_id, %month, target = target_amount, "monthly budget saved");
        Ok(stored)
    }

    pub fn monthly_budget(
        storage: &dyn PlanningStorage,
        store_id: Uuid,
        month: BudgetMonth,
    ) -> Result<Option<MonthlyBudget>, CoreError> {
        storage.load_budget(store_id, month)
    }

    /// Deletes the month's budget with its overrides and unposted schedules.
    /// Refused with `Conflict` once any actual has been posted in the month.
    pub fn delete_monthly_budget(
        storage: &dyn PlanningStorage,
        store_id: Uuid,
        month: BudgetMonth,
    ) -> Result<(), CoreError> {
        storage.delete_budget(store_id, month)?;
        info!(store = %store_id, %month, "monthly budget deleted");
        Ok(())
    }

    /// Bulk-upserts explicit daily targets. Every entry is validated before
    /// anything is written. A mismatch with the monthly target is reported,
    /// never rejected.
    pub fn set_daily_targets(
        storage: &dyn PlanningStorage,
        store_id: Uuid,
        month: BudgetMonth,
        entries: &[(NaiveDate, i64)],
    ) -> Result<DailyTargetSummary, CoreError> {
        let mut seen = HashSet::new();
        for (date, amount) in entries {
            if !month.contains(*date) {
                return Err(CoreError::InvalidInput(format!(
                    "{date} is outside {month}"
                )));
            }
            if *amount < 0 {
                return Err(CoreError::InvalidInput(format!(
                    "target for {date} must be non-negative, got {amount}"
                )));
            }
            if !seen.insert(*date) {
                return Err(CoreError::InvalidInput(format!(
                    "{date} appears more than once"
                )));
            }
        }
        let budget = storage
            .load_budget(store_id, month)?
            .ok_or_else(|| CoreError::NotFound(format!("no budget for {month}")))?;
        let targets: Vec<DailyTarget> = entries
            .iter()
            .map(|(date, amount)| DailyTarget::new(budget.id, *date, *amount))
            .collect();
        storage.upsert_daily_targets(&targets)?;
        let stored = storage.load_daily_targets(budget.id)?;
        let summary = DailyTargetSummary::from_targets(budget.target_amount, &stored);
        info!(
            store = %store_id,
            %month,
            written = targets.len(),
            difference = summary.difference,
            "daily targets saved"
        );
        Ok(summary)
    }

    pub fn clear_daily_targets(
        storage: &dyn PlanningStorage,
        store_id: Uuid,
        month: BudgetMonth,
    ) -> Result<usize, CoreError> {
        let budget = storage
            .load_budget(store_id, month)?
            .ok_or_else(|| CoreError::NotFound(format!("no budget for {month}")))?;
        let removed = storage.clear_daily_targets(budget.id)?;
        info!(store = %store_id, %month, removed, "daily targets cleared");
        Ok(removed)
    }

    /// Summary of explicit targets against the monthly target, `None` without a budget.
    pub fn daily_target_summary(
        storage: &dyn PlanningStorage,
        store_id: Uuid,
        month: BudgetMonth,
    ) -> Result<Option<DailyTargetSummary>, CoreError> {
        let Some(budget) = storage.load_budget(store_id, month)? else {
            return Ok(None);
        };
        let targets = storage.load_daily_targets(budget.id)?;
        Ok(Some(DailyTargetSummary::from_targets(
            budget.target_amount,
            &targets,
        )))
    }
}
