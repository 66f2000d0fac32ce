//! Cumulative actual against the day-amortized budget, as of yesterday.

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use tracing::debug;

use plan_domain::{BudgetMonth, MonthBook, MonthPosition};

use crate::amounts::{amortized, percent, saturating_sum};

pub struct AchievementService;

impl AchievementService {
    /// Percent of the amortized budget achieved through yesterday.
    ///
    /// The monthly target is spread evenly over calendar days. Before the
    /// month starts the rate is zero; once it is over, the full actual is
    /// compared with the full target.
    pub fn daily_achievement_rate(book: &MonthBook, today: NaiveDate) -> Decimal {
        let target = book.target_amount();
        let (actual, budget) = match book.month.position_of(today) {
            MonthPosition::Future => return Decimal::ZERO,
            MonthPosition::Past => (Self::posted_through(book, book.month.last_day()), target),
            MonthPosition::Current => {
                let yesterday = today - Duration::days(1);
                let days_passed = Self::days_passed(book.month, today);
                (
                    Self::posted_through(book, yesterday),
                    amortized(target, days_passed, book.month.days_in_month()),
                )
            }
        };
        let rate = percent(actual, budget).unwrap_or(Decimal::ZERO);
        debug!(
            store = %book.store_id,
            month = %book.month,
            %today,
            actual,
            budget,
            %rate,
            "daily achievement computed"
        );
        rate
    }

    /// Days from the first of the month through yesterday, at least one once
    /// the month has started.
    pub fn days_passed(month: BudgetMonth, today: NaiveDate) -> u32 {
        match month.position_of(today) {
            MonthPosition::Future => 0,
            MonthPosition::Past => month.days_in_month(),
            MonthPosition::Current => ((today - month.first_day()).num_days() as u32).max(1),
        }
    }

    /// Sum of posted actuals dated on or before `through`.
    pub fn posted_through(book: &MonthBook, through: NaiveDate) -> i64 {
        saturating_sum(
            book.month_schedules()
                .filter(|schedule| schedule.scheduled_date <= through)
                .filter_map(|schedule| schedule.posted_actual()),
        )
    }
}
