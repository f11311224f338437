// src/constants.rs

use std::time::Duration;

/// The name of the directory containing bolt scripts for a project.
pub const BOLT_DIR: &str = ".bolt";

/// The extension a file must carry to be picked up as a command script.
pub const SCRIPT_EXTENSION: &str = ".sh";

/// Basename prefix of the globals prelude script (inside .bolt/).
pub const GLOBALS_PREFIX: &str = "globals";

/// The name of the inline command file (inside .bolt/).
pub const BOLTFILE_NAME: &str = "Boltfile";

/// The name of the runner configuration file (inside .bolt/).
pub const CONFIG_FILENAME: &str = "config.toml";

/// The name of the persisted project data file (inside .bolt/).
pub const PROJECT_DATA_FILENAME: &str = "data.toml";

/// Script count above which discovery parses in two parallel halves.
pub const PARALLEL_PARSE_THRESHOLD: usize = 10;

/// Pause after detaching an async command so the caller's output stays ordered.
pub const ASYNC_LAUNCH_DELAY: Duration = Duration::from_millis(50);

/// Interval between liveness probes of a detached session.
pub const DETACH_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Names reserved by the CLI front end. A user command shadowing one of these
/// still runs, but discovery reports the collision.
pub const BUILTIN_NAMES: &[&str] = &["run", "list", "info", "help", "version"];
