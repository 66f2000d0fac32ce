use std::{
    borrow::Cow,
    io::{self, BufRead},
};

use rustyline::{
    completion::{Completer, Pair},
    error::ReadlineError,
    highlight::Highlighter,
    hint::Hinter,
    history::DefaultHistory,
    validate::Validator,
    Context as ReadlineContext, Editor, Helper,
};
use shell_words::split;

use crate::cli::core::{CliError, CommandError, LoopControl};
use crate::cli::output;
use crate::cli::shell_context::{CliMode, ShellContext};

pub fn run_cli() -> Result<(), CliError> {
    let mode = CliMode::from_env();
    let mut context = ShellContext::new(mode)?;

    match mode {
        CliMode::Interactive => run_interactive(&mut context),
        CliMode::Script => run_script(&mut context),
    }
}

fn run_interactive(context: &mut ShellContext) -> Result<(), CliError> {
    let mut editor = Editor::<CommandHelper, DefaultHistory>::new()?;
    editor.set_helper(Some(CommandHelper::new(context.command_names())));
    output::section(format!("Budget Forecast (today is {})", context.engine.today()));
    output::info("Type `help` to list commands.");

    while context.running {
        match editor.readline(&context.prompt()) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                editor.add_history_entry(trimmed).ok();
                match handle_line(context, trimmed) {
                    Ok(LoopControl::Continue) => {}
                    Ok(LoopControl::Exit) => break,
                    Err(err) => context.report_error(err)?,
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                output::info("Exiting shell.");
                break;
            }
            Err(err) => return Err(err.into()),
        }
    }
    Ok(())
}

fn run_script(context: &mut ShellContext) -> Result<(), CliError> {
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        if !context.running {
            break;
        }
        let line = line?;
        match handle_line(context, &line) {
            Ok(LoopControl::Continue) => {}
            Ok(LoopControl::Exit) => break,
            Err(err) => context.report_error(err)?,
        }
    }
    Ok(())
}

/// Runs one input line: `#` comments and blank lines are skipped, anything else is dispatched.
pub(crate) fn handle_line(context: &mut ShellContext, line: &str) -> Result<LoopControl, CommandError> {
    let trimmed = line.trim();
    if trimmed.starts_with('#') {
        return Ok(LoopControl::Continue);
    }
    let tokens = match parse_command_line(trimmed) {
        Ok(tokens) => tokens,
        Err(err) => {
            output::warning(&err.message);
            return Ok(LoopControl::Continue);
        }
    };

    if tokens.is_empty() {
        return Ok(LoopControl::Continue);
    }

    let raw = &tokens[0];
    let command = raw.to_lowercase();
    let args: Vec<&str> = tokens.iter().skip(1).map(String::as_str).collect();

    context.last_command = Some(trimmed.to_string());

    match context.dispatch(&command, raw, &args) {
        Ok(LoopControl::Exit) => {
            context.running = false;
            Ok(LoopControl::Exit)
        }
        other => other,
    }
}

struct CommandHelper {
    commands: Vec<String>,
}

impl CommandHelper {
    fn new(names: Vec<&'static str>) -> Self {
        Self {
            commands: names.into_iter().map(str::to_string).collect(),
        }
    }
}

impl Helper for CommandHelper {}

impl Completer for CommandHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &ReadlineContext<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let prefix = &line[..pos];
        // Only the command word is completed.
        if prefix.trim_start().contains(char::is_whitespace) {
            return Ok((pos, Vec::new()));
        }
        let start = prefix.len() - prefix.trim_start().len();
        let needle = prefix[start..].to_ascii_lowercase();
        let candidates = self
            .commands
            .iter()
            .filter(|name| name.starts_with(&needle))
            .map(|name| Pair {
                display: name.clone(),
                replacement: name.clone(),
            })
            .collect();
        Ok((start, candidates))
    }
}

impl Hinter for CommandHelper {
    type Hint = String;
}

impl Highlighter for CommandHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        Cow::Borrowed(line)
    }
}

impl Validator for CommandHelper {}

#[derive(Debug)]
pub(crate) struct ParseError {
    pub message: String,
}

pub(crate) fn parse_command_line(input: &str) -> Result<Vec<String>, ParseError> {
    split(input).map_err(|err| ParseError {
        message: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use plan_config::ConfigManager;
    use plan_core::FixedClock;
    use tempfile::TempDir;

    use super::*;
    use crate::PlanningEngine;

    fn script_context(home: &TempDir) -> ShellContext {
        let config_manager = ConfigManager::with_base_dir(home.path().to_path_buf()).unwrap();
        let config = config_manager.load().unwrap();
        let today = NaiveDate::from_ymd_opt(2025, 3, 15).unwrap();
        let engine = PlanningEngine::in_memory(Box::new(FixedClock::new(today))).unwrap();
        ShellContext::from_parts(CliMode::Script, engine, config_manager, config)
    }

    #[test]
    fn comments_and_blank_lines_are_skipped() {
        let home = TempDir::new().unwrap();
        let mut context = script_context(&home);

        assert_eq!(
            handle_line(&mut context, "  # store add Central").unwrap(),
            LoopControl::Continue
        );
        assert_eq!(handle_line(&mut context, "   ").unwrap(), LoopControl::Continue);
        assert!(context.last_command.is_none());
        assert!(context.engine.store("Central").is_err());
    }

    #[test]
    fn lines_dispatch_through_the_registry() {
        let home = TempDir::new().unwrap();
        let mut context = script_context(&home);

        assert_eq!(
            handle_line(&mut context, "STORE add \"Central Square\"").unwrap(),
            LoopControl::Continue
        );
        assert_eq!(context.engine.store("Central Square").unwrap().name, "Central Square");
        assert_eq!(
            context.last_command.as_deref(),
            Some("STORE add \"Central Square\"")
        );

        let err = handle_line(&mut context, "budget set Nowhere 2025-03 1000").unwrap_err();
        assert!(matches!(err, CommandError::Core(_)));
        assert!(context.running);

        assert_eq!(handle_line(&mut context, "quit").unwrap(), LoopControl::Exit);
        assert!(!context.running);
    }

    #[test]
    fn quoted_names_stay_together() {
        let tokens = parse_command_line(r#"plan add Central "Weekend special" Bread=4"#).unwrap();
        assert_eq!(tokens, vec!["plan", "add", "Central", "Weekend special", "Bread=4"]);
    }

    #[test]
    fn unbalanced_quotes_are_reported() {
        assert!(parse_command_line(r#"store add "Central"#).is_err());
    }
}
