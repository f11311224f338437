//! The shared execution context.
//!
//! A `Workspace` owns every table the orchestrator needs: the command registry,
//! the parse-job table, the process table, the completion entries, the project
//! data store and the runner configuration. It is created once by the front end
//! and passed explicitly; there are no process-wide singletons.

use crate::constants::{BOLT_DIR, SCRIPT_EXTENSION};
use crate::core::completion::Completer;
use crate::core::config;
use crate::core::jobs::JobTable;
use crate::core::project::ProjectStore;
use crate::core::registry::CommandRegistry;
use crate::models::RunnerConfig;
use crate::system::process::ProcessTable;
use anyhow::{ensure, Context, Result};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

#[derive(Debug)]
pub struct Workspace {
    /// The project root directory.
    pub root: PathBuf,
    /// The script directory (`<root>/.bolt`).
    pub script_dir: PathBuf,
    pub config: RunnerConfig,
    pub registry: CommandRegistry,
    pub jobs: JobTable,
    pub processes: ProcessTable,
    pub completer: Completer,
    pub project: ProjectStore,
    globals: Mutex<Vec<u8>>,
}

impl Workspace {
    /// Opens the workspace rooted at `root`, loading configuration and project
    /// data. Fails when no script directory exists.
    pub fn open(root: &Path) -> Result<Arc<Workspace>> {
        let script_dir = root.join(BOLT_DIR);
        ensure!(
            script_dir.is_dir(),
            "no '{}' directory found in '{}'",
            BOLT_DIR,
            root.display()
        );

        let config = config::load(&script_dir).context("failed to load runner configuration")?;
        let project = ProjectStore::load(&script_dir).context("failed to load project data")?;

        Ok(Arc::new(Workspace {
            root: root.to_path_buf(),
            script_dir,
            config,
            registry: CommandRegistry::new(),
            jobs: JobTable::new(),
            processes: ProcessTable::new(),
            completer: Completer::new(),
            project,
            globals: Mutex::new(Vec::new()),
        }))
    }

    /// The backing script path for a directory-backed command name.
    pub fn script_path(&self, name: &str) -> PathBuf {
        self.script_dir.join(format!("{}{}", name, SCRIPT_EXTENSION))
    }

    /// Derives the command name from a script path: the file name minus the
    /// script extension. `None` when the stem is empty.
    pub fn command_name_for(&self, path: &Path) -> Option<String> {
        let file_name = path.file_name()?.to_str()?;
        let name = file_name.strip_suffix(SCRIPT_EXTENSION)?;
        if name.is_empty() {
            None
        } else {
            Some(name.to_string())
        }
    }

    /// The globals prelude bytes, set by discovery.
    pub fn globals(&self) -> Vec<u8> {
        self.globals.lock().unwrap().clone()
    }

    pub fn set_globals(&self, bytes: Vec<u8>) {
        *self.globals.lock().unwrap() = bytes;
    }

    /// Best-effort teardown: signal and forget every tracked sub-process.
    pub fn cleanup(&self) {
        self.processes.signal_all();
        log::debug!("workspace cleanup complete");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_open_requires_script_dir() {
        let dir = TempDir::new().unwrap();
        assert!(Workspace::open(dir.path()).is_err());

        fs::create_dir(dir.path().join(BOLT_DIR)).unwrap();
        let ws = Workspace::open(dir.path()).unwrap();
        assert_eq!(ws.config, RunnerConfig::default());
    }

    #[test]
    fn test_script_path_and_name_round_trip() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join(BOLT_DIR)).unwrap();
        let ws = Workspace::open(dir.path()).unwrap();

        let path = ws.script_path("build");
        assert!(path.ends_with(".bolt/build.sh"));
        assert_eq!(ws.command_name_for(&path).unwrap(), "build");

        // An extension-only file name has no command name.
        assert!(ws.command_name_for(Path::new(".sh")).is_none());
        assert!(ws.command_name_for(Path::new("notes.txt")).is_none());
    }

    #[test]
    fn test_globals_default_empty() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join(BOLT_DIR)).unwrap();
        let ws = Workspace::open(dir.path()).unwrap();

        assert!(ws.globals().is_empty());
        ws.set_globals(b"set -u\n\n".to_vec());
        assert_eq!(ws.globals(), b"set -u\n\n".to_vec());
    }
}
