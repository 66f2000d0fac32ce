use std::str::FromStr;

use rust_decimal::Decimal;
use uuid::Uuid;

use plan_domain::{BudgetMonth, DailyTargetSummary};

use crate::cli::core::{
    arg, parse_amount_arg, parse_date_arg, parse_month_arg, split_pair, CommandError,
    CommandResult,
};
use crate::cli::format;
use crate::cli::output;
use crate::cli::registry::CommandEntry;
use crate::cli::shell_context::ShellContext;

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            "budget",
            "Set, show or remove a monthly budget",
            "budget set <store> <YYYY-MM> <amount> [discount%]\nbudget show <store> <YYYY-MM>\nbudget remove <store> <YYYY-MM>",
            cmd_budget,
        ),
        CommandEntry::new(
            "targets",
            "Override per-day targets for a budgeted month",
            "targets set <store> <YYYY-MM> <YYYY-MM-DD>=<amount> ...\ntargets clear <store> <YYYY-MM>",
            cmd_targets,
        ),
    ]
}

fn cmd_budget(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let action = match args.first().copied() {
        Some(action @ ("set" | "show" | "remove")) => action,
        _ => {
            context.print_usage("budget");
            return Ok(());
        }
    };
    let store = context.store_arg(arg(args, 1, "store")?)?;
    let month = parse_month_arg(arg(args, 2, "month")?)?;

    match action {
        "set" => {
            let amount = parse_amount_arg(arg(args, 3, "target amount")?)?;
            let discount = args
                .get(4)
                .map(|raw| parse_discount(raw))
                .transpose()?;
            let budget = context
                .engine
                .set_monthly_budget(store.id, month, amount, discount)?;
            output::success(format!(
                "Budget for {} {} set to {}.",
                store.name,
                budget.budget_month,
                format::amount(budget.target_amount)
            ));
            Ok(())
        }
        "show" => show_budget(context, store.id, &store.name, month),
        _ => {
            context.engine.delete_monthly_budget(store.id, month)?;
            output::success(format!("Budget for {} {} removed.", store.name, month));
            Ok(())
        }
    }
}

fn show_budget(
    context: &ShellContext,
    store_id: Uuid,
    store_name: &str,
    month: BudgetMonth,
) -> CommandResult {
    let Some(budget) = context.engine.monthly_budget(store_id, month)? else {
        output::warning(format!("No budget for {store_name} {month}."));
        return Ok(());
    };
    output::section(format!("Budget {store_name} {month}"));
    output::info(format!("  Target    : {}", format::amount(budget.target_amount)));
    output::info(format!(
        "  Discount  : {}",
        budget
            .discount_rate
            .map(|rate| format!("{rate}%"))
            .unwrap_or_else(|| "-".into())
    ));
    output::info(format!("  Updated   : {}", budget.updated_at.format("%Y-%m-%d %H:%M")));
    if let Some(summary) = context.engine.daily_target_summary(store_id, month)? {
        print_summary(&summary);
    }
    Ok(())
}

fn cmd_targets(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    match args.first().copied() {
        Some("set") => {
            let store = context.store_arg(arg(args, 1, "store")?)?;
            let month = parse_month_arg(arg(args, 2, "month")?)?;
            if args.len() < 4 {
                return Err(CommandError::InvalidArguments(
                    "provide at least one YYYY-MM-DD=amount entry".into(),
                ));
            }
            let entries = args[3..]
                .iter()
                .map(|entry| {
                    let (date, amount) = split_pair(entry, "daily target")?;
                    Ok((parse_date_arg(date)?, parse_amount_arg(amount)?))
                })
                .collect::<Result<Vec<_>, CommandError>>()?;
            let summary = context.engine.set_daily_targets(store.id, month, &entries)?;
            output::success(format!("{} daily target(s) saved.", entries.len()));
            print_summary(&summary);
            Ok(())
        }
        Some("clear") => {
            let store = context.store_arg(arg(args, 1, "store")?)?;
            let month = parse_month_arg(arg(args, 2, "month")?)?;
            let removed = context.engine.clear_daily_targets(store.id, month)?;
            output::success(format!("{removed} daily target(s) cleared."));
            Ok(())
        }
        _ => {
            context.print_usage("targets");
            Ok(())
        }
    }
}

fn parse_discount(raw: &str) -> Result<Decimal, CommandError> {
    Decimal::from_str(raw.trim().trim_end_matches('%'))
        .map_err(|_| CommandError::InvalidArguments(format!("invalid discount rate `{raw}`")))
}

fn print_summary(summary: &DailyTargetSummary) {
    output::info(format!(
        "  Daily targets: {} day(s), {} allocated of {}",
        summary.overridden_days,
        format::amount(summary.allocated),
        format::amount(summary.monthly_target)
    ));
    if summary.is_balanced() {
        return;
    }
    if summary.shortfall() > 0 {
        output::warning(format!(
            "Daily targets fall short of the monthly target by {}.",
            format::amount(summary.shortfall())
        ));
    } else {
        output::warning(format!(
            "Daily targets exceed the monthly target by {}.",
            format::amount(summary.excess())
        ));
    }
}
