//! Month-end projection from posted actuals plus still-open plans.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::debug;

use plan_domain::{BudgetMonth, ForecastResult, MonthBook, MonthPosition, Schedule};

use crate::amounts::{div_round, percent};

pub struct ForecastService;

impl ForecastService {
    /// Projects the month's outcome as of `today`. Never fails: a month with
    /// no budget or no schedules yields zeros.
    pub fn forecast(book: &MonthBook, today: NaiveDate) -> ForecastResult {
        let target_amount = book.target_amount();
        let (actual_amount, planned_amount) = book.month_schedules().fold(
            (0i64, 0i64),
            |(actual, planned), schedule| match schedule.posted_actual() {
                Some(amount) => (actual.saturating_add(amount), planned),
                None => (
                    actual,
                    planned.saturating_add(Self::open_projection(book, schedule)),
                ),
            },
        );

        let forecast_amount = actual_amount.saturating_add(planned_amount);
        let forecast_diff = forecast_amount.saturating_sub(target_amount);
        let remaining_days = Self::remaining_days(book.month, today);
        let required_additional = forecast_diff.saturating_neg().max(0);
        let daily_required = if remaining_days == 0 {
            0
        } else {
            div_round(required_additional, remaining_days as i64)
        };

        let result = ForecastResult {
            store_id: book.store_id,
            month: book.month,
            target_amount,
            actual_amount,
            planned_amount,
            forecast_amount,
            forecast_achievement_rate: percent(forecast_amount, target_amount)
                .unwrap_or(Decimal::ZERO),
            forecast_diff,
            remaining_days,
            required_additional,
            daily_required,
        };
        debug!(
            store = %book.store_id,
            month = %book.month,
            %today,
            actual = result.actual_amount,
            planned = result.planned_amount,
            forecast = result.forecast_amount,
            "forecast computed"
        );
        result
    }

    /// Days left in the month counting today; zero once the month is over,
    /// the full month before it starts.
    pub fn remaining_days(month: BudgetMonth, today: NaiveDate) -> u32 {
        match month.position_of(today) {
            MonthPosition::Past => 0,
            MonthPosition::Future => month.days_in_month(),
            MonthPosition::Current => ((month.last_day() - today).num_days() + 1) as u32,
        }
    }

    /// Revenue still expected from a schedule without a posted actual.
    ///
    /// Reads the plan as it stands now. When the plan has been deleted the
    /// captured snapshot total stands in for it.
    pub fn open_projection(book: &MonthBook, schedule: &Schedule) -> i64 {
        if schedule.has_posted_actual() {
            return 0;
        }
        match book.plan_for(schedule) {
            Some(plan) => plan.total(),
            None => schedule
                .snapshot
                .as_ref()
                .map(|snapshot| snapshot.total)
                .unwrap_or(0),
        }
    }
}
