//! Shared runtime state for CLI interactions and command execution.

use std::env;

use plan_config::{default_base_dir, ConfigManager, EngineConfig};
use plan_core::{Clock, FixedClock};
use plan_domain::parse_date;

use crate::{
    cli::{commands, output, registry::CommandRegistry, system_clock::SystemClock},
    errors::CliError,
    PlanningEngine,
};

/// Selects script mode: commands are read from stdin without a prompt.
pub const SCRIPT_ENV: &str = "BUDGET_FORECAST_CLI_SCRIPT";
/// Pins the engine's "today" to a `YYYY-MM-DD` date.
pub const TODAY_ENV: &str = "BUDGET_FORECAST_TODAY";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliMode {
    Interactive,
    Script,
}

impl CliMode {
    pub fn from_env() -> Self {
        if env::var_os(SCRIPT_ENV).is_some() {
            CliMode::Script
        } else {
            CliMode::Interactive
        }
    }
}

pub struct ShellContext {
    pub mode: CliMode,
    pub registry: CommandRegistry,
    pub engine: PlanningEngine,
    pub config_manager: ConfigManager,
    pub config: EngineConfig,
    pub last_command: Option<String>,
    pub running: bool,
}

impl ShellContext {
    pub fn new(mode: CliMode) -> Result<Self, CliError> {
        let config_manager = ConfigManager::with_base_dir(default_base_dir())?;
        let config = config_manager.load()?;
        crate::init_with_filter(config.log_filter.as_deref());
        output::set_color_enabled(config.ui_color_enabled && mode == CliMode::Interactive);

        let engine = PlanningEngine::open(&config_manager.database_path(&config), clock_from_env()?)?;
        Ok(Self::from_parts(mode, engine, config_manager, config))
    }

    /// Wires an already opened engine and loaded config into a shell with every command registered.
    pub(crate) fn from_parts(
        mode: CliMode,
        engine: PlanningEngine,
        config_manager: ConfigManager,
        config: EngineConfig,
    ) -> Self {
        let mut registry = CommandRegistry::new();
        commands::register_all(&mut registry);

        Self {
            mode,
            registry,
            engine,
            config_manager,
            config,
            last_command: None,
            running: true,
        }
    }

    /// Every name and alias the shell accepts, for completion.
    pub fn command_names(&self) -> Vec<&'static str> {
        self.registry.completions("")
    }

    pub fn prompt(&self) -> String {
        format!("budget [{}]> ", self.engine.today())
    }
}

fn clock_from_env() -> Result<Box<dyn Clock>, CliError> {
    match env::var(TODAY_ENV) {
        Ok(raw) if !raw.trim().is_empty() => {
            let today = parse_date(&raw)
                .map_err(|err| CliError::Input(format!("{TODAY_ENV}: {err}")))?;
            Ok(Box::new(FixedClock::new(today)))
        }
        _ => Ok(Box::new(SystemClock)),
    }
}
