//! plan-core
//!
//! Forecasting, achievement and calendar calculators plus the budget,
//! schedule and catalog services that mutate stored state.
//! Depends on plan-domain. No CLI, no terminal I/O, no SQL.

pub mod achievement_service;
pub mod amounts;
pub mod budget_service;
pub mod calendar_service;
pub mod catalog_service;
pub mod error;
pub mod forecast_service;
pub mod schedule_service;
pub mod snapshot_service;
pub mod storage;
pub mod time;

pub use achievement_service::*;
pub use amounts::parse_amount;
pub use budget_service::*;
pub use calendar_service::*;
pub use catalog_service::*;
pub use error::CoreError;
pub use forecast_service::*;
pub use schedule_service::*;
pub use snapshot_service::*;
pub use storage::PlanningStorage;
pub use time::{Clock, FixedClock};
