//! Dispatch, error reporting and argument helpers shared by every command.

use std::io;

use chrono::NaiveDate;
use strsim::levenshtein;

use plan_domain::{parse_date, BudgetMonth, Store};

use crate::cli::{help, output, shell_context::ShellContext};
pub use crate::errors::CliError;
use crate::errors::BudgetError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoopControl {
    Continue,
    Exit,
}

pub type CommandResult = Result<(), CommandError>;

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("{0}")]
    InvalidArguments(String),
    #[error(transparent)]
    Core(#[from] BudgetError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
    #[error("exit requested")]
    ExitRequested,
}

impl From<CommandError> for CliError {
    fn from(err: CommandError) -> Self {
        match err {
            CommandError::Core(inner) => CliError::Core(inner),
            CommandError::InvalidArguments(message) => CliError::Input(message),
            other => CliError::Command(other.to_string()),
        }
    }
}

impl ShellContext {
    pub(crate) fn dispatch(
        &mut self,
        command: &str,
        raw: &str,
        args: &[&str],
    ) -> Result<LoopControl, CommandError> {
        if let Some(handler) = self.registry.handler(command) {
            match handler(self, args) {
                Ok(()) => Ok(LoopControl::Continue),
                Err(CommandError::ExitRequested) => Ok(LoopControl::Exit),
                Err(err) => Err(err),
            }
        } else {
            self.suggest_command(raw);
            Ok(LoopControl::Continue)
        }
    }

    pub(crate) fn suggest_command(&self, input: &str) {
        output::warning(format!(
            "Unknown command `{}`. Type `help` to see available commands.",
            input
        ));

        let needle = input.to_lowercase();
        let best = self
            .registry
            .names()
            .map(|key| (levenshtein(key, &needle), key))
            .min_by_key(|(distance, _)| *distance);

        if let Some((distance, best)) = best {
            if distance <= 3 {
                output::info(format!("Suggestion: `{}`?", best));
            }
        }
    }

    pub(crate) fn report_error(&self, err: CommandError) -> Result<(), CliError> {
        match err {
            CommandError::ExitRequested => Ok(()),
            CommandError::InvalidArguments(message) => {
                output::error(&message);
                output::hint("Use `help <command>` for usage details.");
                Ok(())
            }
            CommandError::Core(BudgetError::Conflict(message)) => {
                output::error(format!("Conflict: {message}"));
                output::hint("The existing record was left unchanged.");
                Ok(())
            }
            CommandError::Core(BudgetError::Unavailable(message)) => {
                Err(CliError::Core(BudgetError::Unavailable(message)))
            }
            other => {
                output::error(other.to_string());
                Ok(())
            }
        }
    }

    pub(crate) fn print_usage(&self, command: &str) {
        if let Some(entry) = self.registry.get(command) {
            help::print_command(entry);
        }
    }

    pub(crate) fn store_arg(&self, raw: &str) -> Result<Store, CommandError> {
        Ok(self.engine.store(raw)?)
    }
}

/// Positional argument `idx`, or a usage error naming `what`.
pub(crate) fn arg<'a>(args: &[&'a str], idx: usize, what: &str) -> Result<&'a str, CommandError> {
    args.get(idx)
        .copied()
        .ok_or_else(|| CommandError::InvalidArguments(format!("missing {what}")))
}

/// Removes a `--json` flag, reporting whether it was present.
pub(crate) fn take_json_flag<'a>(args: &[&'a str]) -> (Vec<&'a str>, bool) {
    let json = args.iter().any(|arg| *arg == "--json");
    let rest = args.iter().copied().filter(|arg| *arg != "--json").collect();
    (rest, json)
}

pub(crate) fn parse_month_arg(input: &str) -> Result<BudgetMonth, CommandError> {
    BudgetMonth::parse(input).map_err(|err| CommandError::InvalidArguments(err.to_string()))
}

pub(crate) fn parse_date_arg(input: &str) -> Result<NaiveDate, CommandError> {
    parse_date(input).map_err(|err| CommandError::InvalidArguments(err.to_string()))
}

pub(crate) fn parse_amount_arg(input: &str) -> Result<i64, CommandError> {
    plan_core::parse_amount(input).map_err(|err| CommandError::InvalidArguments(err.to_string()))
}

/// Splits a `key=value` pair.
pub(crate) fn split_pair<'a>(input: &'a str, what: &str) -> Result<(&'a str, &'a str), CommandError> {
    input
        .split_once('=')
        .filter(|(key, value)| !key.trim().is_empty() && !value.trim().is_empty())
        .map(|(key, value)| (key.trim(), value.trim()))
        .ok_or_else(|| {
            CommandError::InvalidArguments(format!("expected {what} as `key=value`, got `{input}`"))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_flag_is_removed_wherever_it_appears() {
        let (rest, json) = take_json_flag(&["Central", "--json", "2025-03"]);
        assert!(json);
        assert_eq!(rest, vec!["Central", "2025-03"]);

        let (rest, json) = take_json_flag(&["Central"]);
        assert!(!json);
        assert_eq!(rest, vec!["Central"]);
    }

    #[test]
    fn pairs_need_both_sides() {
        assert_eq!(split_pair("Bread=40", "item").unwrap(), ("Bread", "40"));
        assert!(split_pair("Bread=", "item").is_err());
        assert!(split_pair("Bread", "item").is_err());
    }

    #[test]
    fn argument_parsers_report_invalid_input() {
        assert!(parse_month_arg("2025-13").is_err());
        assert!(parse_date_arg("2025/03/01").is_err());
        assert_eq!(parse_amount_arg("1,500").unwrap(), 1_500);
        assert!(matches!(
            arg(&[], 0, "store"),
            Err(CommandError::InvalidArguments(message)) if message == "missing store"
        ));
    }
}
