//! plan-domain
//!
//! Pure data types for budget forecasting: months, budgets, daily targets,
//! products, plans, schedules, snapshots and report records.
//! No I/O, no storage, no CLI.

pub mod book;
pub mod budget;
pub mod catalog;
pub mod common;
pub mod report;
pub mod schedule;

pub use book::*;
pub use budget::*;
pub use catalog::*;
pub use common::*;
pub use report::*;
pub use schedule::*;
