//! Plain-text rendering of amounts, rates, calendar grids and reports.

use chrono::Datelike;
use rust_decimal::Decimal;

use plan_domain::{CalendarWeek, DailyRecord, ForecastResult, MonthReport, RecordSource};

const WEEKDAYS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];
const CELL_WIDTH: usize = 11;

/// Groups digits in threes: `-1234567` becomes `-1,234,567`.
pub fn amount(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if value < 0 {
        grouped.insert(0, '-');
    }
    grouped
}

pub fn rate(value: Option<Decimal>) -> String {
    match value {
        Some(rate) => format!("{rate:.1}%"),
        None => "-".to_string(),
    }
}

pub fn forecast_lines(result: &ForecastResult) -> Vec<String> {
    vec![
        format!("  Target            : {}", amount(result.target_amount)),
        format!("  Actual            : {}", amount(result.actual_amount)),
        format!("  Planned           : {}", amount(result.planned_amount)),
        format!("  Forecast          : {}", amount(result.forecast_amount)),
        format!(
            "  Achievement       : {}",
            rate(Some(result.forecast_achievement_rate))
        ),
        format!("  Difference        : {}", amount(result.forecast_diff)),
        format!("  Remaining days    : {}", result.remaining_days),
        format!("  Still required    : {}", amount(result.required_additional)),
        format!("  Required per day  : {}", amount(result.daily_required)),
    ]
}

/// Sunday-first month grid; each cell shows the day and its achievement rate.
pub fn calendar_lines(weeks: &[CalendarWeek]) -> Vec<String> {
    let mut lines = vec![WEEKDAYS
        .iter()
        .map(|day| format!("{day:<CELL_WIDTH$}"))
        .collect::<String>()
        .trim_end()
        .to_string()];
    for week in weeks {
        let row: String = week
            .days
            .iter()
            .map(|cell| {
                let text = cell.as_ref().map(day_cell).unwrap_or_default();
                format!("{text:<CELL_WIDTH$}")
            })
            .collect();
        lines.push(row.trim_end().to_string());
    }
    lines
}

fn day_cell(record: &DailyRecord) -> String {
    let marker = if record.is_today { "*" } else { "" };
    let status = if record.schedules.is_empty() {
        String::new()
    } else if record.actual > 0 {
        rate(record.achievement_rate)
    } else {
        "plan".to_string()
    };
    format!("{:>2}{marker} {status}", record.date.day())
}

pub fn report_lines(report: &MonthReport) -> Vec<String> {
    let mut lines = vec![format!(
        "{:<10} {:>10} {:>10} {:>10} {:>7} {:>12} {:>12}  {}",
        "Date", "Target", "Actual", "Planned", "Rate", "Cum.target", "Cum.actual", "Plan"
    )];
    for record in &report.records {
        let plans = record
            .schedules
            .iter()
            .map(|entry| {
                let name = entry.plan_name.as_deref().unwrap_or("(deleted plan)");
                match entry.source {
                    RecordSource::Frozen => format!("{name} [{}]", amount(entry.total)),
                    RecordSource::Live => format!("{name} [live {}]", amount(entry.total)),
                    RecordSource::Unavailable => format!("{name} [unavailable]"),
                }
            })
            .collect::<Vec<_>>()
            .join(", ");
        lines.push(
            format!(
                "{:<10} {:>10} {:>10} {:>10} {:>7} {:>12} {:>12}  {}",
                record.date.to_string(),
                amount(record.target),
                amount(record.actual),
                amount(record.planned),
                rate(record.achievement_rate),
                amount(record.cumulative_target),
                amount(record.cumulative_actual),
                plans
            )
            .trim_end()
            .to_string(),
        );
    }
    lines.push(format!(
        "{:<10} {:>10} {:>10} {:>10} {:>7}",
        "Total",
        amount(report.totals.target),
        amount(report.totals.actual),
        amount(report.totals.planned),
        rate(report.totals.achievement_rate)
    ));
    if let Some(summary) = &report.daily_targets {
        lines.push(format!(
            "Daily targets: {} day(s) set, allocated {} vs monthly {} (difference {})",
            summary.overridden_days,
            amount(summary.allocated),
            amount(summary.monthly_target),
            amount(summary.difference)
        ));
    }
    lines
}
