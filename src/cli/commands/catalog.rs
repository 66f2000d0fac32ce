use plan_domain::{Plan, PlanItemDraft, Store};

use crate::cli::core::{arg, parse_amount_arg, split_pair, CommandError, CommandResult};
use crate::cli::format;
use crate::cli::output;
use crate::cli::registry::CommandEntry;
use crate::cli::shell_context::ShellContext;

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new("store", "Register a store", "store add <name>", cmd_store),
        CommandEntry::new(
            "product",
            "Manage products and their current prices",
            "product add <store> <name> <price>\nproduct price <store> <name> <price>\nproduct remove <store> <name>",
            cmd_product,
        ),
        CommandEntry::new(
            "plan",
            "Manage plans (products with quantities)",
            "plan add <store> <name> [Product=qty ...]\nplan items <store> <name> Product=qty ...\nplan show <store> <name>\nplan remove <store> <name>",
            cmd_plan,
        ),
    ]
}

fn cmd_store(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    match args.first().copied() {
        Some("add") => {
            let store = context.engine.add_store(arg(args, 1, "store name")?)?;
            output::success(format!("Store `{}` registered.", store.name));
            Ok(())
        }
        _ => {
            context.print_usage("store");
            Ok(())
        }
    }
}

fn cmd_product(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    match args.first().copied() {
        Some("add") => {
            let store = context.store_arg(arg(args, 1, "store")?)?;
            let name = arg(args, 2, "product name")?;
            let price = parse_amount_arg(arg(args, 3, "unit price")?)?;
            let product = context.engine.add_product(store.id, name, price)?;
            output::success(format!(
                "Product `{}` added at {}.",
                product.name,
                format::amount(product.unit_price)
            ));
            Ok(())
        }
        Some("price") => {
            let store = context.store_arg(arg(args, 1, "store")?)?;
            let product = context.engine.product(store.id, arg(args, 2, "product name")?)?;
            let price = parse_amount_arg(arg(args, 3, "unit price")?)?;
            context.engine.set_product_price(product.id, price)?;
            output::success(format!(
                "Price of `{}` changed from {} to {}.",
                product.name,
                format::amount(product.unit_price),
                format::amount(price)
            ));
            Ok(())
        }
        Some("remove") => {
            let store = context.store_arg(arg(args, 1, "store")?)?;
            let product = context.engine.product(store.id, arg(args, 2, "product name")?)?;
            context.engine.remove_product(product.id)?;
            output::success(format!("Product `{}` removed.", product.name));
            Ok(())
        }
        _ => {
            context.print_usage("product");
            Ok(())
        }
    }
}

fn cmd_plan(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    match args.first().copied() {
        Some("add") => {
            let store = context.store_arg(arg(args, 1, "store")?)?;
            let name = arg(args, 2, "plan name")?;
            let items = parse_items(context, &store, &args[3..])?;
            let plan = context.engine.add_plan(store.id, name, &items)?;
            output::success(format!(
                "Plan `{}` created with total {}.",
                plan.name,
                format::amount(plan.total())
            ));
            Ok(())
        }
        Some("items") => {
            let store = context.store_arg(arg(args, 1, "store")?)?;
            let plan = context.engine.plan(store.id, arg(args, 2, "plan name")?)?;
            if args.len() < 4 {
                return Err(CommandError::InvalidArguments(
                    "provide at least one Product=qty item".into(),
                ));
            }
            let items = parse_items(context, &store, &args[3..])?;
            let plan = context.engine.set_plan_items(plan.id, &items)?;
            output::success(format!(
                "Plan `{}` now totals {}.",
                plan.name,
                format::amount(plan.total())
            ));
            Ok(())
        }
        Some("show") => {
            let store = context.store_arg(arg(args, 1, "store")?)?;
            let plan = context.engine.plan(store.id, arg(args, 2, "plan name")?)?;
            print_plan(&plan);
            Ok(())
        }
        Some("remove") => {
            let store = context.store_arg(arg(args, 1, "store")?)?;
            let plan = context.engine.plan(store.id, arg(args, 2, "plan name")?)?;
            context.engine.remove_plan(plan.id)?;
            output::success(format!("Plan `{}` removed.", plan.name));
            Ok(())
        }
        _ => {
            context.print_usage("plan");
            Ok(())
        }
    }
}

fn parse_items(
    context: &ShellContext,
    store: &Store,
    raw: &[&str],
) -> Result<Vec<PlanItemDraft>, CommandError> {
    raw.iter()
        .map(|entry| {
            let (name, quantity) = split_pair(entry, "plan item")?;
            let quantity: i64 = quantity.parse().map_err(|_| {
                CommandError::InvalidArguments(format!("invalid quantity `{quantity}` for {name}"))
            })?;
            let product = context.engine.product(store.id, name)?;
            Ok(PlanItemDraft {
                product_id: product.id,
                quantity,
            })
        })
        .collect()
}

fn print_plan(plan: &Plan) {
    output::section(format!("Plan {}", plan.name));
    for item in &plan.items {
        output::info(format!(
            "  {:<20} {:>5} x {:>10} = {:>12}",
            item.product_name,
            item.quantity,
            format::amount(item.unit_price),
            format::amount(item.subtotal())
        ));
    }
    output::info(format!("  {:<20} {:>32}", "Total", format::amount(plan.total())));
}
