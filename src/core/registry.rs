//! The canonical name → command mapping.

use crate::constants::BUILTIN_NAMES;
use crate::models::Command;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// A mutex-guarded map of resolved commands. Inserts are linearizable: a name
/// is never observable without its fully constructed command.
#[derive(Debug, Default)]
pub struct CommandRegistry {
    commands: Mutex<HashMap<String, Arc<Command>>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        CommandRegistry::default()
    }

    /// Inserts a command under its name, returning the previous entry if one
    /// was replaced.
    pub fn add(&self, command: Arc<Command>) -> Option<Arc<Command>> {
        self.commands
            .lock()
            .unwrap()
            .insert(command.name.clone(), command)
    }

    pub fn lookup(&self, name: &str) -> Option<Arc<Command>> {
        self.commands.lock().unwrap().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.commands.lock().unwrap().contains_key(name)
    }

    /// Reports whether `name` shadows a builtin CLI name. Conflicts are
    /// reported, never rejected.
    pub fn conflicts(&self, name: &str) -> bool {
        BUILTIN_NAMES.contains(&name) && self.contains(name)
    }

    pub fn len(&self) -> usize {
        self.commands.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.lock().unwrap().is_empty()
    }

    /// All commands, sorted by name, for display purposes.
    pub fn sorted(&self) -> Vec<Arc<Command>> {
        let mut commands: Vec<Arc<Command>> =
            self.commands.lock().unwrap().values().cloned().collect();
        commands.sort_by(|a, b| a.name.cmp(&b.name));
        commands
    }
}
