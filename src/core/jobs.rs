//! In-flight parse tracking.
//!
//! Discovery parallelism and chain-resolution recursion can both demand the
//! same script concurrently. The job table guarantees single-parse semantics:
//! the first caller owns a `ParseJob`, later callers block on a per-path
//! notification until the job is removed. Waits are signal-based, never polled.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Condvar, Mutex};

/// Tracking record for one script parse in flight.
///
/// `commands` accumulates every chain invocation seen while this parse (and its
/// recursive descendants) resolve, which is what bounds chain recursion.
#[derive(Debug)]
pub struct ParseJob {
    pub path: PathBuf,
    pub silent: bool,
    commands: Mutex<Vec<Vec<String>>>,
}

impl ParseJob {
    fn new(path: PathBuf, silent: bool) -> Self {
        ParseJob {
            path,
            silent,
            commands: Mutex::new(Vec::new()),
        }
    }

    /// Records a chain invocation seen along this parse's resolution path.
    pub fn record(&self, invocation: Vec<String>) {
        self.commands.lock().unwrap().push(invocation);
    }

    /// Counts how often `name` has been seen along this parse's resolution path.
    pub fn occurrences(&self, name: &str) -> usize {
        self.commands
            .lock()
            .unwrap()
            .iter()
            .filter(|invocation| invocation.first().map(String::as_str) == Some(name))
            .count()
    }

    /// Snapshot of the recorded invocations, for diagnostics.
    pub fn recorded(&self) -> Vec<Vec<String>> {
        self.commands.lock().unwrap().clone()
    }
}

/// Completion gate shared between one job and its waiters.
#[derive(Debug, Default)]
struct Gate {
    done: Mutex<bool>,
    signal: Condvar,
}

#[derive(Debug)]
struct InFlight {
    job: Arc<ParseJob>,
    gate: Arc<Gate>,
}

/// The table of parses currently in flight, keyed by script path.
#[derive(Debug, Default)]
pub struct JobTable {
    inner: Mutex<HashMap<PathBuf, InFlight>>,
}

impl JobTable {
    pub fn new() -> Self {
        JobTable::default()
    }

    /// Inserts and returns a fresh job for `path`. The caller must know no job
    /// exists for this key; use `try_add_job` when another caller might race.
    pub fn add_job(&self, path: &Path, silent: bool) -> Arc<ParseJob> {
        let job = Arc::new(ParseJob::new(path.to_path_buf(), silent));
        let mut table = self.inner.lock().unwrap();
        debug_assert!(!table.contains_key(path), "duplicate parse job for {:?}", path);
        table.insert(
            path.to_path_buf(),
            InFlight {
                job: job.clone(),
                gate: Arc::new(Gate::default()),
            },
        );
        job
    }

    /// Atomically claims the parse for `path`. Returns `None` when another
    /// caller already holds it, in which case `wait_for_job` is the next move.
    pub fn try_add_job(&self, path: &Path, silent: bool) -> Option<Arc<ParseJob>> {
        let mut table = self.inner.lock().unwrap();
        if table.contains_key(path) {
            return None;
        }
        let job = Arc::new(ParseJob::new(path.to_path_buf(), silent));
        table.insert(
            path.to_path_buf(),
            InFlight {
                job: job.clone(),
                gate: Arc::new(Gate::default()),
            },
        );
        Some(job)
    }

    pub fn job_exists(&self, path: &Path) -> bool {
        self.inner.lock().unwrap().contains_key(path)
    }

    /// Blocks until the job for `path` is removed. Returns immediately when no
    /// job is in flight.
    pub fn wait_for_job(&self, path: &Path) {
        let gate = {
            let table = self.inner.lock().unwrap();
            match table.get(path) {
                Some(entry) => entry.gate.clone(),
                None => return,
            }
        };

        let mut done = gate.done.lock().unwrap();
        while !*done {
            done = gate.signal.wait(done).unwrap();
        }
    }

    /// Removes a finished job and wakes everyone blocked in `wait_for_job`.
    pub fn remove_job(&self, job: &ParseJob) {
        let entry = self.inner.lock().unwrap().remove(&job.path);
        if let Some(entry) = entry {
            let mut done = entry.gate.done.lock().unwrap();
            *done = true;
            entry.gate.signal.notify_all();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_add_exists_remove() {
        let table = JobTable::new();
        let path = Path::new("scripts/build.sh");

        assert!(!table.job_exists(path));
        let job = table.add_job(path, false);
        assert!(table.job_exists(path));

        table.remove_job(&job);
        assert!(!table.job_exists(path));
    }

    #[test]
    fn test_try_add_deduplicates() {
        let table = JobTable::new();
        let path = Path::new("scripts/build.sh");

        let first = table.try_add_job(path, false);
        assert!(first.is_some());
        assert!(table.try_add_job(path, false).is_none());

        table.remove_job(&first.unwrap());
        assert!(table.try_add_job(path, false).is_some());
    }

    #[test]
    fn test_wait_without_job_returns_immediately() {
        let table = JobTable::new();
        table.wait_for_job(Path::new("scripts/missing.sh"));
    }

    #[test]
    fn test_waiter_wakes_on_removal() {
        let table = Arc::new(JobTable::new());
        let path = PathBuf::from("scripts/slow.sh");
        let job = table.add_job(&path, false);

        let woke = Arc::new(AtomicBool::new(false));
        let waiter = {
            let table = table.clone();
            let path = path.clone();
            let woke = woke.clone();
            thread::spawn(move || {
                table.wait_for_job(&path);
                woke.store(true, Ordering::SeqCst);
            })
        };

        // Give the waiter time to block; it must not wake on its own.
        thread::sleep(Duration::from_millis(50));
        assert!(!woke.load(Ordering::SeqCst));

        table.remove_job(&job);
        waiter.join().unwrap();
        assert!(woke.load(Ordering::SeqCst));
    }

    #[test]
    fn test_occurrence_counting() {
        let table = JobTable::new();
        let job = table.add_job(Path::new("scripts/a.sh"), false);

        job.record(vec!["a".to_string()]);
        job.record(vec!["b".to_string(), "x=1".to_string()]);
        job.record(vec!["a".to_string()]);

        assert_eq!(job.occurrences("a"), 2);
        assert_eq!(job.occurrences("b"), 1);
        assert_eq!(job.occurrences("c"), 0);
    }
}
