use std::result::Result as StdResult;

use plan_config::ConfigError;
use plan_core::CoreError;
use plan_domain::MonthError;
use thiserror::Error;

/// Unified error type for the engine facade.
#[derive(Error, Debug)]
pub enum BudgetError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// The backing store could not be read or written.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

pub type Result<T> = StdResult<T, BudgetError>;

impl BudgetError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, BudgetError::Conflict(_))
    }
}

/// User-facing CLI error wrapper.
#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] BudgetError),
    #[error("Invalid input: {0}")]
    Input(String),
    #[error("Command failed: {0}")]
    Command(String),
}

impl From<CoreError> for BudgetError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotFound(message) => BudgetError::NotFound(message),
            CoreError::Conflict(message) => BudgetError::Conflict(message),
            CoreError::InvalidInput(message) => BudgetError::InvalidInput(message),
            CoreError::Storage(message) => BudgetError::Unavailable(message),
        }
    }
}

impl From<MonthError> for BudgetError {
    fn from(err: MonthError) -> Self {
        BudgetError::InvalidInput(err.to_string())
    }
}

impl From<ConfigError> for BudgetError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Io(io) => BudgetError::Unavailable(io.to_string()),
            ConfigError::Serde(message) => BudgetError::ConfigError(message),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        CliError::from(BudgetError::from(err))
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Command(err.to_string())
    }
}

impl From<rustyline::error::ReadlineError> for CliError {
    fn from(err: rustyline::error::ReadlineError) -> Self {
        CliError::Command(err.to_string())
    }
}
