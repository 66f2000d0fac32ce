use std::collections::BTreeMap;

use crate::cli::core::CommandResult;
use crate::cli::shell_context::ShellContext;

pub type CommandHandler = fn(&mut ShellContext, &[&str]) -> CommandResult;

/// A top-level shell command. `usage` holds one line per subcommand form.
pub struct CommandEntry {
    pub name: &'static str,
    pub description: &'static str,
    pub usage: &'static str,
    pub aliases: &'static [&'static str],
    pub handler: CommandHandler,
}

impl CommandEntry {
    pub const fn new(
        name: &'static str,
        description: &'static str,
        usage: &'static str,
        handler: CommandHandler,
    ) -> Self {
        Self {
            name,
            description,
            usage,
            aliases: &[],
            handler,
        }
    }

    pub const fn with_aliases(mut self, aliases: &'static [&'static str]) -> Self {
        self.aliases = aliases;
        self
    }
}

/// Commands in registration order, resolvable by name or alias.
#[derive(Default)]
pub struct CommandRegistry {
    entries: Vec<CommandEntry>,
    lookup: BTreeMap<&'static str, usize>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `entry`; a later entry with the same name replaces the earlier one.
    pub fn register(&mut self, entry: CommandEntry) {
        let idx = match self.lookup.get(entry.name) {
            Some(&idx) => {
                self.entries[idx] = entry;
                idx
            }
            None => {
                self.entries.push(entry);
                self.entries.len() - 1
            }
        };
        let entry = &self.entries[idx];
        for key in std::iter::once(entry.name).chain(entry.aliases.iter().copied()) {
            self.lookup.insert(key, idx);
        }
    }

    /// Resolves a command name or alias, ignoring ASCII case.
    pub fn get(&self, name: &str) -> Option<&CommandEntry> {
        let key = name.to_ascii_lowercase();
        self.lookup
            .get(key.as_str())
            .and_then(|&idx| self.entries.get(idx))
    }

    pub fn list(&self) -> impl Iterator<Item = &CommandEntry> + '_ {
        self.entries.iter()
    }

    /// Primary names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|entry| entry.name)
    }

    pub fn handler(&self, name: &str) -> Option<CommandHandler> {
        self.get(name).map(|entry| entry.handler)
    }

    /// Names and aliases starting with `prefix`, sorted.
    pub fn completions(&self, prefix: &str) -> Vec<&'static str> {
        let prefix = prefix.to_ascii_lowercase();
        self.lookup
            .keys()
            .copied()
            .filter(|key| key.starts_with(prefix.as_str()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_context: &mut ShellContext, _args: &[&str]) -> CommandResult {
        Ok(())
    }

    #[test]
    fn aliases_resolve_to_the_primary_entry() {
        let mut registry = CommandRegistry::new();
        registry.register(CommandEntry::new("exit", "Exit", "exit", noop).with_aliases(&["quit"]));
        registry.register(CommandEntry::new("forecast", "Forecast", "forecast", noop));

        assert_eq!(registry.get("QUIT").map(|entry| entry.name), Some("exit"));
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["exit", "forecast"]);
        assert_eq!(registry.completions("f"), vec!["forecast"]);
        assert_eq!(registry.completions("q"), vec!["quit"]);
        assert!(registry.get("report").is_none());
    }

    #[test]
    fn re_registering_replaces_in_place() {
        let mut registry = CommandRegistry::new();
        registry.register(CommandEntry::new("plan", "old", "plan", noop));
        registry.register(CommandEntry::new("plan", "new", "plan", noop));

        assert_eq!(registry.list().count(), 1);
        assert_eq!(registry.get("plan").map(|entry| entry.description), Some("new"));
    }
}
