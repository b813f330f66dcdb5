//! CommandRegistry - name to handler table

use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use super::builtin::{
    ClearCommand, ClickCommand, HttpCommand, JumpCommand, NoRulesCommand, PathCommand, PressCommand, ShellCommand,
    SkillCommand, SleepCommand, TypeCommand,
};
use super::{CommandError, CommandHandler};

/// Registered commands, looked up by exact name
#[derive(Clone)]
pub struct CommandRegistry {
    commands: HashMap<String, Arc<dyn CommandHandler>>,
}

impl CommandRegistry {
    /// Create a registry holding every built-in command
    pub fn standard() -> Self {
        debug!("CommandRegistry::standard: called");
        let builtins: Vec<Arc<dyn CommandHandler>> = vec![
            Arc::new(PathCommand::new("path")),
            Arc::new(PathCommand::new("at")),
            Arc::new(ShellCommand::new("sh")),
            Arc::new(ShellCommand::new("shell")),
            Arc::new(HttpCommand),
            Arc::new(SkillCommand),
            Arc::new(ClearCommand),
            Arc::new(JumpCommand),
            Arc::new(ClickCommand),
            Arc::new(TypeCommand),
            Arc::new(SleepCommand),
            Arc::new(PressCommand),
            Arc::new(NoRulesCommand),
        ];

        let mut commands = HashMap::new();
        for handler in builtins {
            commands.insert(handler.name().to_string(), handler);
        }
        Self { commands }
    }

    /// Create an empty registry (for testing)
    pub fn empty() -> Self {
        debug!("CommandRegistry::empty: called");
        Self {
            commands: HashMap::new(),
        }
    }

    /// Add a command; fails if its name is already taken
    pub fn register(&mut self, handler: Arc<dyn CommandHandler>) -> Result<(), CommandError> {
        let name = handler.name();
        debug!(%name, "CommandRegistry::register: called");
        if self.commands.contains_key(name) {
            debug!(%name, "CommandRegistry::register: duplicate name");
            return Err(CommandError::DuplicateCommand { name: name.to_string() });
        }
        self.commands.insert(name.to_string(), handler);
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<&Arc<dyn CommandHandler>> {
        self.commands.get(name)
    }

    pub fn has_command(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    /// Usage line for the command a `$name...` literal invokes, if registered
    pub fn usage_for(&self, literal: &str) -> Option<&'static str> {
        let rest = literal.strip_prefix('$')?;
        let end = rest.find(|c: char| !(c.is_ascii_alphanumeric() || c == '_')).unwrap_or(rest.len());
        self.lookup(&rest[..end]).map(|handler| handler.usage())
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.commands.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl std::fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandRegistry").field("commands", &self.names()).finish()
    }
}
