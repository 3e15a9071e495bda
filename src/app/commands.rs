//! CLI command groups contributed by modules

use std::collections::BTreeMap;
use std::sync::Arc;

use clap::{ArgMatches, Command};

use crate::errors::{Result, WikiError};
use crate::types::AppState;

/// Group name that is replaced by the owning module's identifier
pub const PLACEHOLDER_GROUP: &str = "cli";

/// Sub-commands handled by the binary itself
pub const BUILTIN_COMMANDS: &[&str] = &["run", "modules"];

pub type CommandHandler = Arc<dyn Fn(&AppState, &ArgMatches) -> Result<()> + Send + Sync>;

/// A named clap command group with one handler per sub-command
pub struct CommandSet {
    command: Command,
    handlers: BTreeMap<String, CommandHandler>,
}

impl CommandSet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            command: Command::new(name.into())
                .subcommand_required(true)
                .arg_required_else_help(true),
            handlers: BTreeMap::new(),
        }
    }

    pub fn about(mut self, about: impl Into<String>) -> Self {
        self.command = self.command.about(about.into());
        self
    }

    /// Add a sub-command and the function that runs it
    pub fn subcommand<F>(mut self, command: Command, handler: F) -> Self
    where
        F: Fn(&AppState, &ArgMatches) -> Result<()> + Send + Sync + 'static,
    {
        self.handlers
            .insert(command.get_name().to_string(), Arc::new(handler));
        self.command = self.command.subcommand(command);
        self
    }

    pub fn name(&self) -> &str {
        self.command.get_name()
    }

    pub fn command(&self) -> &Command {
        &self.command
    }

    fn renamed(mut self, name: &str) -> Self {
        self.command = self.command.name(name.to_string());
        self
    }

    /// Run the sub-command selected in `matches`
    pub fn dispatch(&self, state: &AppState, matches: &ArgMatches) -> Result<()> {
        let (name, sub_matches) = matches
            .subcommand()
            .ok_or_else(|| WikiError::Command(format!("'{}' needs a sub-command", self.name())))?;
        let handler = self
            .handlers
            .get(name)
            .ok_or_else(|| WikiError::Command(format!("unknown command '{} {}'", self.name(), name)))?;
        handler(state, sub_matches)
    }
}

/// Every module's command group, keyed by group name
#[derive(Default)]
pub struct CommandTree {
    groups: BTreeMap<String, CommandSet>,
}

impl CommandTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a module's group, renaming the `cli` placeholder to the module
    /// name. Returns the name the group was registered under.
    pub fn merge(&mut self, module: &str, set: CommandSet) -> Result<String> {
        let set = if set.name() == PLACEHOLDER_GROUP {
            set.renamed(module)
        } else {
            set
        };
        let name = set.name().to_string();

        if BUILTIN_COMMANDS.contains(&name.as_str()) || self.groups.contains_key(&name) {
            return Err(WikiError::CommandCollision(name));
        }
        self.groups.insert(name.clone(), set);
        Ok(name)
    }

    /// Group names in sorted order
    pub fn names(&self) -> Vec<&str> {
        self.groups.keys().map(String::as_str).collect()
    }

    pub fn get(&self, name: &str) -> Option<&CommandSet> {
        self.groups.get(name)
    }

    /// Attach every group to the root command
    pub fn attach(&self, root: Command) -> Command {
        self.groups
            .values()
            .fold(root, |root, set| root.subcommand(set.command.clone()))
    }

    /// Dispatch `<group> <sub-command>` to the owning group
    pub fn dispatch(&self, state: &AppState, group: &str, matches: &ArgMatches) -> Result<()> {
        self.groups
            .get(group)
            .ok_or_else(|| WikiError::Command(format!("unknown command '{group}'")))?
            .dispatch(state, matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn group(name: &str) -> CommandSet {
        CommandSet::new(name).subcommand(Command::new("noop"), |_, _| Ok(()))
    }

    #[test]
    fn placeholder_group_takes_module_name() {
        let mut tree = CommandTree::new();
        assert_eq!(tree.merge("search", group("cli")).unwrap(), "search");
        assert_eq!(tree.merge("wiki", group("pages")).unwrap(), "pages");
        assert_eq!(tree.names(), vec!["pages", "search"]);
        assert!(tree.get("cli").is_none());
    }

    #[test]
    fn collisions_are_reported() {
        let mut tree = CommandTree::new();
        tree.merge("a", group("tools")).unwrap();
        assert!(matches!(tree.merge("b", group("tools")), Err(WikiError::CommandCollision(n)) if n == "tools"));
        assert!(matches!(tree.merge("run", group("cli")), Err(WikiError::CommandCollision(n)) if n == "run"));
    }

    #[test]
    fn dispatch_reaches_handler() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let set = CommandSet::new("cli").subcommand(
            Command::new("count").arg(clap::Arg::new("n").required(true)),
            move |_, m| {
                let n: usize = m
                    .get_one::<String>("n")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(0);
                counter.fetch_add(n, Ordering::SeqCst);
                Ok(())
            },
        );

        let mut tree = CommandTree::new();
        tree.merge("search", set).unwrap();
        let root = tree.attach(Command::new("realms"));
        let matches = root.try_get_matches_from(["realms", "search", "count", "3"]).unwrap();
        let (group, sub) = matches.subcommand().unwrap();

        let state = AppState::new(Config::new(), String::new());
        tree.dispatch(&state, group, sub).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
