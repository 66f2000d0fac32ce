use crate::cli::core::{arg, CommandError, CommandResult};
use crate::cli::help;
use crate::cli::output;
use crate::cli::registry::CommandEntry;
use crate::cli::shell_context::ShellContext;
use crate::utils::build_info;

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            "config",
            "Show or change engine preferences",
            "config show\nconfig set <locale|currency|ui_color_enabled|log_filter> <value>",
            cmd_config,
        ),
        CommandEntry::new("version", "Show build metadata", "version", cmd_version),
        CommandEntry::new(
            "help",
            "Show available commands",
            "help [command]",
            cmd_help,
        )
        .with_aliases(&["?"]),
        CommandEntry::new("exit", "Exit the shell", "exit", cmd_exit).with_aliases(&["quit"]),
    ]
}

fn cmd_version(_context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let meta = build_info::current();
    output::section(format!("Budget Forecast {}", meta.version));
    output::info(format!("  CLI version  : {}", build_info::CLI_VERSION));
    output::info(format!(
        "  Build hash   : {} ({})",
        meta.git_hash, meta.git_status
    ));
    output::info(format!("  Built at     : {}", meta.timestamp));
    output::info(format!("  Target       : {}", meta.target));
    output::info(format!("  Profile      : {}", meta.profile));
    output::info(format!("  Rustc        : {}", meta.rustc));
    Ok(())
}

fn cmd_help(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    if let Some(command) = args.first() {
        if let Some(entry) = context.registry.get(command) {
            help::print_command(entry);
        } else {
            context.suggest_command(args[0]);
        }
        return Ok(());
    }

    help::print_overview(&context.registry);
    Ok(())
}

fn cmd_exit(_context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    Err(CommandError::ExitRequested)
}

fn cmd_config(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    match args.first().copied() {
        Some("show") | None => {
            let config = &context.config;
            output::section("Configuration");
            output::info(format!("  Locale       : {}", config.locale));
            output::info(format!("  Currency     : {}", config.currency));
            output::info(format!("  Colors       : {}", config.ui_color_enabled));
            output::info(format!(
                "  Log filter   : {}",
                config.log_filter.as_deref().unwrap_or("(default)")
            ));
            output::info(format!(
                "  Database     : {}",
                context
                    .config_manager
                    .database_path(config)
                    .display()
            ));
            output::info(format!(
                "  Config file  : {}",
                context.config_manager.config_path().display()
            ));
            Ok(())
        }
        Some("set") => {
            let key = arg(args, 1, "config key")?;
            let value = arg(args, 2, "config value")?;
            set_config_value(context, key, value)
        }
        Some(other) => Err(CommandError::InvalidArguments(format!(
            "unknown config action `{other}`"
        ))),
    }
}

fn set_config_value(context: &mut ShellContext, key: &str, value: &str) -> CommandResult {
    let mut updated = context.config.clone();
    match key.to_lowercase().as_str() {
        "locale" => updated.locale = value.to_string(),
        "currency" => updated.currency = value.to_uppercase(),
        "ui_color_enabled" => {
            updated.ui_color_enabled = match value.to_lowercase().as_str() {
                "true" | "on" | "yes" => true,
                "false" | "off" | "no" => false,
                _ => {
                    return Err(CommandError::InvalidArguments(
                        "ui_color_enabled must be on or off".into(),
                    ))
                }
            }
        }
        "log_filter" => {
            updated.log_filter = if value.eq_ignore_ascii_case("none") || value.is_empty() {
                None
            } else {
                Some(value.to_string())
            }
        }
        other => {
            return Err(CommandError::InvalidArguments(format!(
                "unknown config key `{}`",
                other
            )))
        }
    }
    context
        .config_manager
        .save(&updated)
        .map_err(|err| CommandError::Core(err.into()))?;
    context.config = updated;
    output::success("Configuration updated.");
    Ok(())
}
