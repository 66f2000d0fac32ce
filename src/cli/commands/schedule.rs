use chrono::NaiveDate;

use plan_domain::{HistoricalRecord, Schedule, Store};

use crate::cli::core::{
    arg, parse_amount_arg, parse_date_arg, take_json_flag, CommandError, CommandResult,
};
use crate::cli::format;
use crate::cli::output;
use crate::cli::registry::CommandEntry;
use crate::cli::shell_context::ShellContext;
use crate::errors::BudgetError;

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![CommandEntry::new(
        "schedule",
        "Assign plans to days and track what happened",
        "schedule assign <store> <plan> <YYYY-MM-DD>\nschedule actual <store> <YYYY-MM-DD> <amount>\nschedule remove <store> <YYYY-MM-DD>\nschedule snapshot <store> <YYYY-MM-DD>\nschedule show <store> <YYYY-MM-DD> [--json]",
        cmd_schedule,
    )]
}

fn cmd_schedule(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (args, json) = take_json_flag(args);
    match args.first().copied() {
        Some("assign") => {
            let store = context.store_arg(arg(&args, 1, "store")?)?;
            let plan = context.engine.plan(store.id, arg(&args, 2, "plan name")?)?;
            let date = parse_date_arg(arg(&args, 3, "date")?)?;
            let schedule = context.engine.assign_plan(store.id, plan.id, date)?;
            let total = schedule
                .snapshot
                .as_ref()
                .map(|snapshot| snapshot.total)
                .unwrap_or_default();
            output::success(format!(
                "Plan `{}` scheduled on {} (snapshot total {}).",
                plan.name,
                date,
                format::amount(total)
            ));
            Ok(())
        }
        Some("actual") => {
            let store = context.store_arg(arg(&args, 1, "store")?)?;
            let date = parse_date_arg(arg(&args, 2, "date")?)?;
            let amount = parse_amount_arg(arg(&args, 3, "actual revenue")?)?;
            context.engine.post_actual(store.id, date, amount)?;
            if amount == 0 {
                output::success(format!("Actual cleared for {date}; the day counts as planned again."));
            } else {
                output::success(format!("Actual {} posted for {date}.", format::amount(amount)));
            }
            Ok(())
        }
        Some("remove") => {
            let store = context.store_arg(arg(&args, 1, "store")?)?;
            let date = parse_date_arg(arg(&args, 2, "date")?)?;
            context.engine.unassign(store.id, date)?;
            output::success(format!("Schedule on {date} removed."));
            Ok(())
        }
        Some("snapshot") => {
            let store = context.store_arg(arg(&args, 1, "store")?)?;
            let date = parse_date_arg(arg(&args, 2, "date")?)?;
            let schedule = require_schedule(context, &store, date)?;
            let snapshot = context.engine.capture_snapshot(schedule.id)?;
            output::success(format!(
                "Snapshot captured for {date}: {} line(s), total {}.",
                snapshot.lines.len(),
                format::amount(snapshot.total)
            ));
            Ok(())
        }
        Some("show") => {
            let store = context.store_arg(arg(&args, 1, "store")?)?;
            let date = parse_date_arg(arg(&args, 2, "date")?)?;
            let schedule = require_schedule(context, &store, date)?;
            let record = context.engine.reconstruct(schedule.id)?;
            if json {
                output::json(&record)?;
            } else {
                print_record(&schedule, &record);
            }
            Ok(())
        }
        _ => {
            context.print_usage("schedule");
            Ok(())
        }
    }
}

fn require_schedule(
    context: &ShellContext,
    store: &Store,
    date: NaiveDate,
) -> Result<Schedule, CommandError> {
    context.engine.schedule_on(store.id, date)?.ok_or_else(|| {
        CommandError::Core(BudgetError::NotFound(format!(
            "no schedule for {} on {date}",
            store.name
        )))
    })
}

fn print_record(schedule: &Schedule, record: &HistoricalRecord) {
    let label = match record {
        HistoricalRecord::FrozenSnapshot(snapshot) => {
            format!("frozen at {}", snapshot.captured_at.format("%Y-%m-%d %H:%M"))
        }
        HistoricalRecord::LiveFromSource(plan) => format!("live plan `{}`", plan.name),
        HistoricalRecord::Unavailable => "unavailable".to_string(),
    };
    output::section(format!("Schedule {} ({label})", schedule.scheduled_date));
    for line in record.lines() {
        output::info(format!(
            "  {:<20} {:>5} x {:>10} = {:>12}",
            line.product_name,
            line.quantity,
            format::amount(line.unit_price),
            format::amount(line.subtotal)
        ));
    }
    output::info(format!("  {:<20} {:>32}", "Total", format::amount(record.total())));
    if let Some(actual) = schedule.posted_actual() {
        output::info(format!("  {:<20} {:>32}", "Actual", format::amount(actual)));
    }
}
