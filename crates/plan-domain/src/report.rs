//! Plain report records handed to dashboards, calendar grids and exports.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    budget::DailyTargetSummary,
    common::BudgetMonth,
    schedule::{RecordSource, ScheduleStatus, SnapshotLine},
};

/// Month-end projection from posted actuals and still-open plans.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub store_id: Uuid,
    pub month: BudgetMonth,
    pub target_amount: i64,
    pub actual_amount: i64,
    pub planned_amount: i64,
    pub forecast_amount: i64,
    /// Percent, one decimal place; zero when the target is zero.
    pub forecast_achievement_rate: Decimal,
    pub forecast_diff: i64,
    pub remaining_days: u32,
    pub required_additional: i64,
    pub daily_required: i64,
}

/// A schedule as it appears inside a calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub schedule_id: Uuid,
    pub status: ScheduleStatus,
    pub plan_id: Option<Uuid>,
    pub plan_name: Option<String>,
    pub source: RecordSource,
    pub lines: Vec<SnapshotLine>,
    pub total: i64,
    pub actual_revenue: Option<i64>,
}

/// One calendar day of a month report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyRecord {
    pub date: NaiveDate,
    pub target: i64,
    pub actual: i64,
    pub planned: i64,
    pub schedules: Vec<ScheduleEntry>,
    /// `None` when the day has no target: achievement is undefined, not failing.
    pub achievement_rate: Option<Decimal>,
    pub diff: i64,
    pub cumulative_target: i64,
    pub cumulative_actual: i64,
    pub is_today: bool,
    pub is_future: bool,
}

/// Seven grid cells, Sunday first. Days outside the month are `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarWeek {
    pub days: [Option<DailyRecord>; 7],
}

impl CalendarWeek {
    pub fn blank() -> Self {
        Self {
            days: Default::default(),
        }
    }

    pub fn records(&self) -> impl Iterator<Item = &DailyRecord> {
        self.days.iter().flatten()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthTotals {
    pub target: i64,
    pub actual: i64,
    pub planned: i64,
    pub achievement_rate: Option<Decimal>,
}

/// The per-day record set for a month joined with its headline figures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthReport {
    pub store_id: Uuid,
    pub month: BudgetMonth,
    pub records: Vec<DailyRecord>,
    pub forecast: ForecastResult,
    pub daily_achievement_rate: Decimal,
    pub totals: MonthTotals,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_targets: Option<DailyTargetSummary>,
}
