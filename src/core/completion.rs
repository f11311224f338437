//! Completion entries for the command listing.
//!
//! Every registered command contributes its name and the `label=` stubs of its
//! argument schema. An interactive front end could feed these to a line editor;
//! the bundled CLI surfaces them through `bolt list`.

use crate::models::Command;
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionEntry {
    pub name: String,
    pub labels: Vec<String>,
}

#[derive(Debug, Default)]
pub struct Completer {
    entries: Mutex<Vec<CompletionEntry>>,
}

impl Completer {
    pub fn new() -> Self {
        Completer::default()
    }

    /// Registers completion data for a freshly added command.
    pub fn add_command(&self, command: &Command) {
        let mut labels: Vec<String> = command
            .args
            .keys()
            .map(|label| format!("{}=", label))
            .collect();
        labels.sort();

        self.entries.lock().unwrap().push(CompletionEntry {
            name: command.name.clone(),
            labels,
        });
    }

    /// All entries, sorted by command name.
    pub fn entries(&self) -> Vec<CompletionEntry> {
        let mut entries = self.entries.lock().unwrap().clone();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::arguments::parse_arg_defs;

    #[test]
    fn test_entries_carry_sorted_label_stubs() {
        let completer = Completer::new();
        completer.add_command(&Command {
            name: "build".to_string(),
            args: parse_arg_defs("target:string, release:bool?").unwrap(),
            ..Command::default()
        });
        completer.add_command(&Command {
            name: "art".to_string(),
            ..Command::default()
        });

        let entries = completer.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "art");
        assert!(entries[0].labels.is_empty());
        assert_eq!(entries[1].name, "build");
        assert_eq!(entries[1].labels, vec!["release=", "target="]);
    }
}
