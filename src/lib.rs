#![doc(test(attr(deny(warnings))))]

//! Budget Forecast projects monthly revenue against store budgets and
//! reconstructs what was planned on any past day from write-once snapshots.

pub mod cli;
pub mod engine;
pub mod errors;
pub mod utils;

pub use engine::PlanningEngine;
pub use errors::{BudgetError, CliError};
pub use {plan_config, plan_core, plan_domain, plan_storage_sqlite};

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing with the default filter and emits a startup info log.
pub fn init() {
    init_with_filter(None);
}

/// Like [`init`], with a filter directive used when `RUST_LOG` is unset.
pub fn init_with_filter(log_filter: Option<&str>) {
    INIT_TRACING.call_once(|| {
        utils::init_tracing(log_filter);
        tracing::info!("Budget Forecast tracing initialized.");
    });
}
