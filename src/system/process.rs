//! Sub-process bookkeeping.

use std::collections::HashMap;
use std::process::{Command as StdCommand, Stdio};
use std::sync::Mutex;
use uuid::Uuid;

/// One tracked sub-process. The `id` is an opaque token so detached processes
/// without an OS handle can still be addressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessEntry {
    pub id: Uuid,
    pub name: String,
    pub pid: u32,
}

/// The table of live sub-processes, keyed by opaque id.
#[derive(Debug, Default)]
pub struct ProcessTable {
    entries: Mutex<HashMap<Uuid, ProcessEntry>>,
}

impl ProcessTable {
    pub fn new() -> Self {
        ProcessTable::default()
    }

    pub fn add(&self, id: Uuid, name: &str, pid: u32) {
        log::debug!("tracking process '{}' with pid {}", name, pid);
        self.entries.lock().unwrap().insert(
            id,
            ProcessEntry {
                id,
                name: name.to_string(),
                pid,
            },
        );
    }

    /// Removes every entry recorded under `pid`. Idempotent.
    pub fn delete_by_pid(&self, pid: u32) {
        self.entries
            .lock()
            .unwrap()
            .retain(|_, entry| entry.pid != pid);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().unwrap().is_empty()
    }

    /// Sends SIGTERM to every tracked pid and clears the table. Used during
    /// teardown; failures are ignored.
    pub fn signal_all(&self) {
        let entries: Vec<ProcessEntry> = {
            let mut table = self.entries.lock().unwrap();
            table.drain().map(|(_, entry)| entry).collect()
        };

        for entry in entries {
            log::debug!("signalling '{}' (pid {})", entry.name, entry.pid);
            let _ = StdCommand::new("kill")
                .arg(entry.pid.to_string())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status();
        }
    }
}

/// Asks the terminal multiplexer whether the detached session named after a
/// command is still alive. A missing multiplexer reads as "not alive".
pub fn detached_session_alive(name: &str) -> bool {
    let output = match StdCommand::new("screen").arg("-ls").output() {
        Ok(output) => output,
        Err(_) => return false,
    };

    let needle = format!(".{}\t", name);
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .any(|line| line.contains(&needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_delete_by_pid() {
        let table = ProcessTable::new();
        let id = Uuid::new_v4();

        table.add(id, "build", 4242);
        assert_eq!(table.len(), 1);

        table.delete_by_pid(4242);
        assert!(table.is_empty());

        // Idempotent.
        table.delete_by_pid(4242);
        assert!(table.is_empty());
    }

    #[test]
    fn test_delete_removes_every_entry_for_a_pid() {
        let table = ProcessTable::new();
        table.add(Uuid::new_v4(), "build", 4242);
        table.add(Uuid::new_v4(), "build-detached", 4242);
        table.add(Uuid::new_v4(), "other", 4243);

        table.delete_by_pid(4242);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_unknown_session_is_not_alive() {
        assert!(!detached_session_alive("bolt-test-session-that-cannot-exist"));
    }
}
