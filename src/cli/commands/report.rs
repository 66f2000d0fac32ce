use rust_decimal::Decimal;
use serde::Serialize;

use plan_domain::{BudgetMonth, ForecastResult, Store};

use crate::cli::core::{arg, parse_month_arg, take_json_flag, CommandError, CommandResult};
use crate::cli::format;
use crate::cli::output;
use crate::cli::registry::CommandEntry;
use crate::cli::shell_context::ShellContext;

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            "forecast",
            "Project month-end revenue against the budget",
            "forecast <store> <YYYY-MM> [--json]",
            cmd_forecast,
        ),
        CommandEntry::new(
            "calendar",
            "Show the month as a Sunday-first calendar",
            "calendar <store> <YYYY-MM> [--json]",
            cmd_calendar,
        ),
        CommandEntry::new(
            "report",
            "Show per-day targets, actuals and plans for a month",
            "report <store> <YYYY-MM> [--json]",
            cmd_report,
        ),
    ]
}

#[derive(Serialize)]
struct ForecastView<'a> {
    #[serde(flatten)]
    forecast: &'a ForecastResult,
    daily_achievement_rate: Decimal,
}

fn store_and_month(
    context: &ShellContext,
    args: &[&str],
) -> Result<(Store, BudgetMonth), CommandError> {
    let store = context.store_arg(arg(args, 0, "store")?)?;
    let month = parse_month_arg(arg(args, 1, "month")?)?;
    Ok((store, month))
}

fn cmd_forecast(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (args, json) = take_json_flag(args);
    if args.is_empty() {
        context.print_usage("forecast");
        return Ok(());
    }
    let (store, month) = store_and_month(context, &args)?;
    let forecast = context
        .engine
        .forecast(store.id, month.year(), month.month())?;
    let daily_rate = context
        .engine
        .daily_achievement_rate(store.id, month.year(), month.month())?;

    if json {
        output::json(&ForecastView {
            forecast: &forecast,
            daily_achievement_rate: daily_rate,
        })?;
        return Ok(());
    }

    output::section(format!("Forecast {} {}", store.name, month));
    for line in format::forecast_lines(&forecast) {
        output::info(line);
    }
    output::info(format!(
        "  Daily achievement : {}",
        format::rate(Some(daily_rate))
    ));
    Ok(())
}

fn cmd_calendar(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (args, json) = take_json_flag(args);
    if args.is_empty() {
        context.print_usage("calendar");
        return Ok(());
    }
    let (store, month) = store_and_month(context, &args)?;
    let weeks = context
        .engine
        .calendar_weeks(store.id, month.year(), month.month())?;

    if json {
        output::json(&weeks)?;
        return Ok(());
    }

    output::section(format!("Calendar {} {}", store.name, month));
    for line in format::calendar_lines(&weeks) {
        output::info(line);
    }
    Ok(())
}

fn cmd_report(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (args, json) = take_json_flag(args);
    if args.is_empty() {
        context.print_usage("report");
        return Ok(());
    }
    let (store, month) = store_and_month(context, &args)?;
    let report = context
        .engine
        .month_report(store.id, month.year(), month.month())?;

    if json {
        output::json(&report)?;
        return Ok(());
    }

    output::section(format!("Report {} {}", store.name, month));
    for line in format::report_lines(&report) {
        output::info(line);
    }
    Ok(())
}
