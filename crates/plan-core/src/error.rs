use plan_domain::MonthError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Storage failure: {0}")]
    Storage(String),
}

impl CoreError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, CoreError::Conflict(_))
    }
}

impl From<MonthError> for CoreError {
    fn from(err: MonthError) -> Self {
        CoreError::InvalidInput(err.to_string())
    }
}
