pub mod budget;
pub mod catalog;
pub mod report;
pub mod schedule;
pub mod system;

use crate::cli::registry::CommandRegistry;

pub fn register_all(registry: &mut CommandRegistry) {
    for entry in catalog::definitions()
        .into_iter()
        .chain(budget::definitions())
        .chain(schedule::definitions())
        .chain(report::definitions())
        .chain(system::definitions())
    {
        registry.register(entry);
    }
}
