//! Builds the per-day record set for a month and its grid/report views.

use chrono::{Datelike, NaiveDate};
use tracing::debug;

use plan_domain::{
    CalendarWeek, DailyRecord, DailyTargetSummary, MonthBook, MonthReport, MonthTotals, Schedule,
    ScheduleEntry,
};

use crate::{
    achievement_service::AchievementService,
    amounts::{percent, saturating_sum, uniform_share},
    forecast_service::ForecastService,
    snapshot_service::SnapshotService,
};

pub struct CalendarService;

impl CalendarService {
    /// One record per calendar day, in order, with running totals.
    ///
    /// A pure function of the book and `today`: calling it twice yields the same sequence.
    pub fn build(book: &MonthBook, today: NaiveDate) -> Vec<DailyRecord> {
        let records: Vec<DailyRecord> = book
            .month
            .days()
            .scan((0i64, 0i64), |running, date| {
                let target = Self::day_target(book, date);
                let day_schedules: Vec<&Schedule> = book.schedules_on(date).collect();
                let actual = saturating_sum(
                    day_schedules
                        .iter()
                        .filter_map(|schedule| schedule.posted_actual()),
                );
                let planned = saturating_sum(
                    day_schedules
                        .iter()
                        .map(|schedule| ForecastService::open_projection(book, schedule)),
                );
                running.0 = running.0.saturating_add(target);
                running.1 = running.1.saturating_add(actual);
                Some(DailyRecord {
                    date,
                    target,
                    actual,
                    planned,
                    schedules: day_schedules
                        .iter()
                        .map(|schedule| Self::schedule_entry(book, schedule))
                        .collect(),
                    achievement_rate: percent(actual, target),
                    diff: actual.saturating_sub(target),
                    cumulative_target: running.0,
                    cumulative_actual: running.1,
                    is_today: date == today,
                    is_future: date > today,
                })
            })
            .collect();
        debug!(
            store = %book.store_id,
            month = %book.month,
            days = records.len(),
            "calendar built"
        );
        records
    }

    /// Target for one day: the explicit override when set, else the uniform share.
    pub fn day_target(book: &MonthBook, date: NaiveDate) -> i64 {
        if !book.month.contains(date) {
            return 0;
        }
        book.daily_target_for(date).unwrap_or_else(|| {
            uniform_share(book.target_amount(), date.day(), book.month.days_in_month())
        })
    }

    /// Groups records into Sunday-first weeks, padding partial weeks with empty cells.
    pub fn weeks(records: &[DailyRecord]) -> Vec<CalendarWeek> {
        let mut weeks = Vec::new();
        let mut current = CalendarWeek::blank();
        for record in records {
            let slot = record.date.weekday().num_days_from_sunday() as usize;
            if slot == 0 && current.records().next().is_some() {
                weeks.push(std::mem::replace(&mut current, CalendarWeek::blank()));
            }
            current.days[slot] = Some(record.clone());
        }
        if current.records().next().is_some() {
            weeks.push(current);
        }
        weeks
    }

    /// Joins the day records with the forecast, achievement rate and totals.
    pub fn month_report(book: &MonthBook, today: NaiveDate) -> MonthReport {
        let records = Self::build(book, today);
        let target = book.target_amount();
        let actual = saturating_sum(records.iter().map(|record| record.actual));
        let planned = saturating_sum(records.iter().map(|record| record.planned));
        let daily_targets = book.budget.as_ref().and_then(|budget| {
            (!book.daily_targets.is_empty()).then(|| {
                DailyTargetSummary::from_targets(budget.target_amount, &book.daily_targets)
            })
        });
        MonthReport {
            store_id: book.store_id,
            month: book.month,
            forecast: ForecastService::forecast(book, today),
            daily_achievement_rate: AchievementService::daily_achievement_rate(book, today),
            totals: MonthTotals {
                target,
                actual,
                planned,
                achievement_rate: percent(actual, target),
            },
            daily_targets,
            records,
        }
    }

    fn schedule_entry(book: &MonthBook, schedule: &Schedule) -> ScheduleEntry {
        let plan = book.plan_for(schedule);
        let record = SnapshotService::reconstruct(schedule, plan);
        ScheduleEntry {
            schedule_id: schedule.id,
            status: schedule.status,
            plan_id: schedule.plan_id,
            plan_name: plan.map(|plan| plan.name.clone()),
            source: record.source(),
            lines: record.lines(),
            total: record.total(),
            actual_revenue: schedule.posted_actual(),
        }
    }
}
