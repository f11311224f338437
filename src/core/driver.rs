//! Top-level chain execution.
//!
//! The driver parses a chain string, resolves it, then runs each link in
//! order. A failing link is logged and does not stop the links after it.
//! Progress counters are scoped to one driver invocation, so concurrent
//! drivers cannot interfere with each other's `[i/N]` display.

use crate::core::chain_parser;
use crate::core::resolver;
use crate::core::workspace::Workspace;
use crate::models::CommandChain;
use crate::system::executor;
use anyhow::Result;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Progress counters for one chain invocation.
///
/// `total` grows as dependencies are queued mid-run; `current` advances once
/// per executed command body.
#[derive(Debug, Default)]
pub struct ChainProgress {
    total: AtomicUsize,
    current: AtomicUsize,
}

impl ChainProgress {
    pub fn new(total: usize) -> Self {
        ChainProgress {
            total: AtomicUsize::new(total),
            current: AtomicUsize::new(0),
        }
    }

    /// Queues `n` additional commands onto this run.
    pub fn add_total(&self, n: usize) {
        self.total.fetch_add(n, Ordering::Relaxed);
    }

    /// Marks one more command as started and returns the `(current, total)`
    /// pair for display.
    pub fn advance(&self) -> (usize, usize) {
        let current = self.current.fetch_add(1, Ordering::Relaxed) + 1;
        (current, self.total.load(Ordering::Relaxed))
    }

    pub fn snapshot(&self) -> (usize, usize) {
        (
            self.current.load(Ordering::Relaxed),
            self.total.load(Ordering::Relaxed),
        )
    }
}

/// Counts the commands in a chain, summed transitively over nested chains.
pub fn count_chain(chain: &CommandChain) -> usize {
    chain
        .iter()
        .map(|command| 1 + count_chain(&command.command_chain))
        .sum()
}

/// Parses, resolves and executes a chain string. Returns the number of
/// failures; a chain that cannot be resolved is logged and counts as one.
pub fn execute_chain(ws: &Arc<Workspace>, chain_str: &str) -> Result<usize> {
    let job = ws.jobs.add_job(Path::new(chain_str), false);

    let resolved = chain_parser::parse_chain(chain_str)
        .and_then(|parsed| resolver::get_command_chain(ws, &job, &parsed, None));
    ws.jobs.remove_job(&job);

    let chain = match resolved {
        Ok(chain) => chain,
        Err(e) => {
            log::error!("failed to resolve command chain '{}': {:#}", chain_str, e);
            return Ok(1);
        }
    };

    let progress = Arc::new(ChainProgress::new(count_chain(&chain)));
    let mut failures = 0;

    for command in &chain {
        if let Err(e) = executor::run(ws, &progress, command, &[], command.async_run) {
            log::error!("failed to execute '{}': {:#}", command.name, e);
            failures += 1;
        }
    }

    Ok(failures)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::BOLT_DIR;
    use crate::core::discovery;
    use std::fs;
    use tempfile::TempDir;

    fn scaffold(scripts: &[(&str, String)]) -> (TempDir, Arc<Workspace>) {
        let dir = TempDir::new().unwrap();
        let script_dir = dir.path().join(BOLT_DIR);
        fs::create_dir(&script_dir).unwrap();
        for (name, contents) in scripts {
            fs::write(script_dir.join(format!("{}.sh", name)), contents).unwrap();
        }
        let ws = Workspace::open(dir.path()).unwrap();
        discovery::find_commands(&ws).unwrap();
        (dir, ws)
    }

    #[test]
    fn test_progress_counters() {
        let progress = ChainProgress::new(2);
        assert_eq!(progress.snapshot(), (0, 2));

        progress.add_total(1);
        assert_eq!(progress.advance(), (1, 3));
        assert_eq!(progress.advance(), (2, 3));
    }

    #[test]
    fn test_count_chain_is_transitive() {
        let (_dir, ws) = scaffold(&[
            ("release", "# @chain: build\necho release\n".to_string()),
            ("build", "# @chain: clean\necho build\n".to_string()),
            ("clean", "echo clean\n".to_string()),
        ]);

        let release = ws.registry.lookup("release").unwrap();
        // release + (build + (clean))
        assert_eq!(count_chain(&vec![release]), 3);
    }

    #[test]
    fn test_execute_chain_runs_links_in_order() {
        let dir = TempDir::new().unwrap();
        let marker = dir.path().join("order.txt");
        let (_scripts_dir, ws) = scaffold(&[
            ("first", format!("printf 'first\\n' >> {}\n", marker.display())),
            (
                "second",
                format!("printf 'second\\n' >> {}\n", marker.display()),
            ),
        ]);

        let failures = execute_chain(&ws, "first -> second").unwrap();

        assert_eq!(failures, 0);
        let contents = fs::read_to_string(&marker).unwrap();
        assert_eq!(contents, "first\nsecond\n");
    }

    #[test]
    fn test_failing_link_does_not_stop_the_chain() {
        let dir = TempDir::new().unwrap();
        let marker = dir.path().join("after.txt");
        let (_scripts_dir, ws) = scaffold(&[
            ("boom", "exit 3\n".to_string()),
            ("after", format!("printf 'ran\\n' > {}\n", marker.display())),
        ]);

        let failures = execute_chain(&ws, "boom -> after").unwrap();

        assert_eq!(failures, 1);
        assert_eq!(fs::read_to_string(&marker).unwrap(), "ran\n");
    }

    #[test]
    fn test_unresolvable_chain_is_not_fatal() {
        let (_dir, ws) = scaffold(&[]);
        let failures = execute_chain(&ws, "no-such-command").unwrap();
        assert_eq!(failures, 1);
    }

    #[test]
    fn test_chain_link_params_flow_into_arguments() {
        let dir = TempDir::new().unwrap();
        let marker = dir.path().join("env.txt");
        let (_scripts_dir, ws) = scaffold(&[(
            "deploy",
            format!(
                "# @args: env:string\nprintf '%s\\n' \"$env\" > {}\n",
                marker.display()
            ),
        )]);

        let failures = execute_chain(&ws, "deploy env=staging").unwrap();

        assert_eq!(failures, 0);
        assert_eq!(fs::read_to_string(&marker).unwrap(), "staging\n");
    }
}
