//! Monthly revenue targets and their optional per-day overrides.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::BudgetMonth;

/// Revenue target for one store and one calendar month.
///
/// Amounts are integers in the smallest currency unit. At most one record
/// exists per `(store_id, budget_month)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyBudget {
    pub id: Uuid,
    pub store_id: Uuid,
    pub budget_month: BudgetMonth,
    pub target_amount: i64,
    /// Advisory discount rate in percent, shown next to the target and never computed with.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_rate: Option<Decimal>,
    pub updated_at: DateTime<Utc>,
}

impl MonthlyBudget {
    pub fn new(store_id: Uuid, budget_month: BudgetMonth, target_amount: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            store_id,
            budget_month,
            target_amount,
            discount_rate: None,
            updated_at: Utc::now(),
        }
    }

    pub fn with_discount_rate(mut self, rate: Option<Decimal>) -> Self {
        self.discount_rate = rate;
        self
    }
}

/// Explicit target for a single day, overriding the uniform daily share.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyTarget {
    pub id: Uuid,
    pub budget_id: Uuid,
    pub target_date: NaiveDate,
    pub target_amount: i64,
}

impl DailyTarget {
    pub fn new(budget_id: Uuid, target_date: NaiveDate, target_amount: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            budget_id,
            target_date,
            target_amount,
        }
    }
}

/// How the explicit daily targets of a month compare with its monthly target.
///
/// The two are allowed to disagree; this only reports by how much.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyTargetSummary {
    pub monthly_target: i64,
    pub allocated: i64,
    /// `allocated - monthly_target`: negative is a shortfall, positive an excess.
    pub difference: i64,
    pub overridden_days: usize,
}

impl DailyTargetSummary {
    pub fn from_targets(monthly_target: i64, targets: &[DailyTarget]) -> Self {
        let allocated = targets
            .iter()
            .fold(0i64, |sum, target| sum.saturating_add(target.target_amount));
        Self {
            monthly_target,
            allocated,
            difference: allocated.saturating_sub(monthly_target),
            overridden_days: targets.len(),
        }
    }

    pub fn is_balanced(&self) -> bool {
        self.difference == 0
    }

    pub fn shortfall(&self) -> i64 {
        self.difference.saturating_neg().max(0)
    }

    pub fn excess(&self) -> i64 {
        self.difference.max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_reports_shortfall_and_excess() {
        let budget_id = Uuid::new_v4();
        let day = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let targets = vec![
            DailyTarget::new(budget_id, day, 40_000),
            DailyTarget::new(budget_id, day.succ_opt().unwrap(), 50_000),
        ];

        let short = DailyTargetSummary::from_targets(100_000, &targets);
        assert_eq!(short.allocated, 90_000);
        assert_eq!(short.difference, -10_000);
        assert_eq!(short.shortfall(), 10_000);
        assert_eq!(short.excess(), 0);

        let over = DailyTargetSummary::from_targets(80_000, &targets);
        assert_eq!(over.excess(), 10_000);
        assert!(!over.is_balanced());
        assert!(DailyTargetSummary::from_targets(90_000, &targets).is_balanced());
    }
}
